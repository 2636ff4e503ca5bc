//! Renderer settings object

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::config::RendererConfig;
use crate::core::error::{SceneError, SceneResult};
use crate::foundation::ModifiedFlag;

/// Native renderer with its sampling parameters
#[derive(Debug)]
pub struct Renderer {
    settings: RendererConfig,
    modified: ModifiedFlag,
    native: NativeObject,
}

impl Renderer {
    /// Renderer using `settings`
    pub fn new(device: &DeviceRef, settings: RendererConfig) -> SceneResult<Self> {
        Ok(Self {
            settings,
            modified: ModifiedFlag::modified(),
            native: NativeObject::create(device, ObjectKind::Renderer)?,
        })
    }

    /// Current settings
    pub fn settings(&self) -> &RendererConfig {
        &self.settings
    }

    /// Replace all settings, returning whether anything changed
    pub fn set_settings(&mut self, settings: RendererConfig) -> SceneResult<bool> {
        if settings.samples_per_pixel == 0 {
            return Err(SceneError::InvalidArgument("samples_per_pixel must be > 0".to_string()));
        }
        Ok(self.modified.update(&mut self.settings, settings))
    }

    /// Change the samples taken per pixel each frame
    pub fn set_samples_per_pixel(&mut self, samples: u32) -> SceneResult<bool> {
        let settings = RendererConfig {
            samples_per_pixel: samples,
            ..self.settings.clone()
        };
        self.set_settings(settings)
    }

    /// Change the background colour
    pub fn set_background(&mut self, background: [f32; 4]) -> bool {
        let mut settings = self.settings.clone();
        settings.background = background;
        self.modified.update(&mut self.settings, settings)
    }

    /// Whether there are uncommitted changes
    pub fn is_modified(&self) -> bool {
        self.modified.is_modified()
    }

    /// Native renderer handle
    pub fn handle(&self) -> NativeHandle {
        self.native.handle()
    }

    /// Push parameters and commit if modified
    pub fn commit(&mut self) -> SceneResult<bool> {
        if !self.modified.is_modified() {
            return Ok(false);
        }
        self.native
            .set("pixelSamples", ParamValue::UInt(self.settings.samples_per_pixel))?;
        self.native
            .set("maxPathLength", ParamValue::UInt(self.settings.max_ray_depth))?;
        self.native
            .set("backgroundColor", ParamValue::Vec4(self.settings.background))?;
        self.native.commit()?;
        self.modified.reset();
        log::debug!("Committed renderer {:?}", self.settings);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;
    use std::sync::Arc;

    #[test]
    fn test_settings_reach_device_once() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut renderer = Renderer::new(&device, RendererConfig::default()).unwrap();
        assert!(renderer.commit().unwrap());
        assert!(!renderer.commit().unwrap());

        assert!(renderer.set_samples_per_pixel(8).unwrap());
        assert!(renderer.commit().unwrap());
        assert_eq!(headless.param(renderer.handle(), "pixelSamples"), Some(ParamValue::UInt(8)));
        assert_eq!(headless.commit_count(renderer.handle()), Some(2));
    }

    #[test]
    fn test_zero_samples_rejected() {
        let device: DeviceRef = Arc::new(HeadlessDevice::new());
        let mut renderer = Renderer::new(&device, RendererConfig::default()).unwrap();
        renderer.commit().unwrap();
        assert!(renderer.set_samples_per_pixel(0).is_err());
        assert!(!renderer.is_modified());
        assert!(!renderer.set_background(RendererConfig::default().background));
    }
}
