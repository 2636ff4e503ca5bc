//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the TRS transform
//! - Axis-aligned bounds
//! - Dirty tracking
//! - Id allocation
//! - Logging setup

pub mod bounds;
pub mod id_factory;
pub mod logging;
pub mod math;
pub mod modified;

pub use bounds::Bounds;
pub use id_factory::{IdFactory, IdType};
pub use modified::ModifiedFlag;
