//! # Core Module
//!
//! Shared abstractions used throughout the engine:
//!
//! - **Config**: engine configuration structures
//! - **Error**: the scene error taxonomy

pub mod config;
pub mod error;

pub use config::{CameraConfig, EngineConfig, FramebufferConfig, LoggingConfig, RendererConfig};
pub use error::{ErrorKind, SceneError, SceneResult};
