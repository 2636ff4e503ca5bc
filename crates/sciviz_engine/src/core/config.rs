//! # Engine Configuration
//!
//! All configuration structures of the engine in one place: logging,
//! renderer, framebuffer and initial camera. Every section has defaults so
//! partial files load fine.

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter string, e.g. `info` or `sciviz_engine=debug`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Renderer parameters pushed to the native renderer object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Samples per pixel per frame
    pub samples_per_pixel: u32,
    /// Maximum ray bounces
    pub max_ray_depth: u32,
    /// Background colour (RGBA)
    pub background: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1,
            max_ray_depth: 3,
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Framebuffer size and accumulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramebufferConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Accumulate samples across frames until the scene changes
    pub accumulation: bool,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            accumulation: true,
        }
    }
}

/// Initial camera placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Eye position
    pub position: [f32; 3],
    /// Look-at target
    pub target: [f32; 3],
    /// Up vector
    pub up: [f32; 3],
    /// Vertical field of view in degrees (perspective only)
    pub fovy: f32,
    /// Use an orthographic projection
    pub orthographic: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 10.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fovy: 45.0,
            orthographic: false,
        }
    }
}

impl CameraConfig {
    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Target as a vector
    pub fn target(&self) -> Vec3 {
        Vec3::from(self.target)
    }

    /// Up as a vector
    pub fn up(&self) -> Vec3 {
        Vec3::from(self.up)
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logging setup
    pub logging: LoggingConfig,
    /// Renderer parameters
    pub renderer: RendererConfig,
    /// Framebuffer parameters
    pub framebuffer: FramebufferConfig,
    /// Initial camera
    pub camera: CameraConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Check values the device would reject
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.framebuffer.width == 0 || self.framebuffer.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "framebuffer size {}x{}",
                self.framebuffer.width, self.framebuffer.height
            )));
        }
        if self.renderer.samples_per_pixel == 0 {
            return Err(ConfigError::Invalid("samples_per_pixel must be > 0".to_string()));
        }
        if !(self.camera.fovy > 0.0 && self.camera.fovy < 180.0) {
            return Err(ConfigError::Invalid(format!("fovy {}", self.camera.fovy)));
        }
        if self.camera.position == self.camera.target {
            return Err(ConfigError::Invalid("camera position equals target".to_string()));
        }
        Ok(())
    }
}
