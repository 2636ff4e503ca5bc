//! Render target
//!
//! The device accumulates samples across frames into the framebuffer.
//! Any committed change to the framebuffer restarts accumulation, so a
//! scene or camera change is made visible through [`Framebuffer::reset_accumulation`].

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::config::FramebufferConfig;
use crate::core::error::{SceneError, SceneResult};
use crate::foundation::ModifiedFlag;

/// Native framebuffer
#[derive(Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    accumulation: bool,
    frames: u64,
    modified: ModifiedFlag,
    native: NativeObject,
}

impl Framebuffer {
    /// Framebuffer of the configured size
    pub fn new(device: &DeviceRef, config: &FramebufferConfig) -> SceneResult<Self> {
        check_size(config.width, config.height)?;
        Ok(Self {
            width: config.width,
            height: config.height,
            accumulation: config.accumulation,
            frames: 0,
            modified: ModifiedFlag::modified(),
            native: NativeObject::create(device, ObjectKind::Framebuffer)?,
        })
    }

    /// Size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Width over height
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Resize. Zero sizes are rejected.
    pub fn resize(&mut self, width: u32, height: u32) -> SceneResult<bool> {
        check_size(width, height)?;
        if (width, height) == (self.width, self.height) {
            return Ok(false);
        }
        self.width = width;
        self.height = height;
        self.modified.set_modified();
        log::info!("Framebuffer resized to {}x{}", width, height);
        Ok(true)
    }

    /// Whether samples accumulate across frames
    pub fn accumulation(&self) -> bool {
        self.accumulation
    }

    /// Turn accumulation on or off
    pub fn set_accumulation(&mut self, accumulation: bool) -> bool {
        self.modified.update(&mut self.accumulation, accumulation)
    }

    /// Discard accumulated samples on the next commit
    pub fn reset_accumulation(&mut self) {
        self.modified.set_modified();
    }

    /// Frames rendered into this framebuffer
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub(crate) fn frame_rendered(&mut self) {
        self.frames += 1;
    }

    /// Whether there are uncommitted changes
    pub fn is_modified(&self) -> bool {
        self.modified.is_modified()
    }

    /// Native framebuffer handle
    pub fn handle(&self) -> NativeHandle {
        self.native.handle()
    }

    /// Commit if modified
    pub fn commit(&mut self) -> SceneResult<bool> {
        if !self.modified.is_modified() {
            return Ok(false);
        }
        self.native.set("size", ParamValue::Vec3([self.width as f32, self.height as f32, 0.0]))?;
        self.native.set("accumulation", ParamValue::Bool(self.accumulation))?;
        self.native.commit()?;
        self.modified.reset();
        log::trace!("Committed framebuffer {}", self.native.handle());
        Ok(true)
    }
}

fn check_size(width: u32, height: u32) -> SceneResult<()> {
    if width == 0 || height == 0 {
        return Err(SceneError::InvalidArgument(format!(
            "framebuffer size {width}x{height}"
        )));
    }
    Ok(())
}
