//! Scene-level error taxonomy
//!
//! Identity errors (`NotFound`, `InvalidArgument`) are expected to reach the
//! request boundary. `NotInitialized` and `Exhausted` indicate defects or a
//! manager that can no longer allocate.

use crate::backend::DeviceError;
use thiserror::Error;

/// Result alias used across the scene graph
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors raised by the scene graph and its managers
#[derive(Error, Debug)]
pub enum SceneError {
    /// Unknown id or absent required component
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, rejected before any mutation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Object used before it was attached or started
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// Identifier space exhausted
    #[error("Exhausted: {0}")]
    Exhausted(String),

    /// Command queue or reply channel closed
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// Native device failure
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Error category, for callers that only need to branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`SceneError::NotFound`]
    NotFound,
    /// See [`SceneError::InvalidArgument`]
    InvalidArgument,
    /// See [`SceneError::NotInitialized`]
    NotInitialized,
    /// See [`SceneError::Exhausted`]
    Exhausted,
    /// See [`SceneError::Disconnected`]
    Disconnected,
    /// See [`SceneError::Device`]
    Device,
}

impl SceneError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotInitialized(_) => ErrorKind::NotInitialized,
            Self::Exhausted(_) => ErrorKind::Exhausted,
            Self::Disconnected(_) => ErrorKind::Disconnected,
            Self::Device(_) => ErrorKind::Device,
        }
    }

    /// Whether the error is meant to be reported to the end user
    pub fn is_user_facing(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::InvalidArgument)
    }
}
