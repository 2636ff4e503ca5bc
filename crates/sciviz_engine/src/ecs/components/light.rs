//! Light sources carried by a model

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::component::Component;
use crate::foundation::math::Vec3;
use crate::foundation::ModifiedFlag;
use crate::scene::RenderViews;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One light source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    /// Parallel rays, like sunlight
    Directional {
        /// Direction the light travels
        direction: [f32; 3],
        /// RGB colour
        color: [f32; 3],
        /// Intensity multiplier
        intensity: f32,
    },
    /// Light radiating from a point
    Point {
        /// World space position
        position: [f32; 3],
        /// Radius of the emitting sphere, 0 for a true point
        radius: f32,
        /// RGB colour
        color: [f32; 3],
        /// Intensity multiplier
        intensity: f32,
    },
    /// Uniform light from every direction
    Ambient {
        /// RGB colour
        color: [f32; 3],
        /// Intensity multiplier
        intensity: f32,
    },
}

impl Light {
    /// Directional light with a normalized direction
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self::Directional {
            direction: direction.normalize().into(),
            color: color.into(),
            intensity,
        }
    }

    /// White ambient light
    pub fn ambient(intensity: f32) -> Self {
        Self::Ambient {
            color: [1.0, 1.0, 1.0],
            intensity,
        }
    }

    /// Type name set on the native light
    pub fn device_type(&self) -> &'static str {
        match self {
            Self::Directional { .. } => "distant",
            Self::Point { .. } => "sphere",
            Self::Ambient { .. } => "ambient",
        }
    }

    fn apply(&self, native: &NativeObject) -> SceneResult<()> {
        native.set("type", ParamValue::String(self.device_type().to_string()))?;
        let (color, intensity) = match *self {
            Self::Directional {
                direction,
                color,
                intensity,
            } => {
                native.set("direction", ParamValue::Vec3(direction))?;
                (color, intensity)
            }
            Self::Point {
                position,
                radius,
                color,
                intensity,
            } => {
                native.set("position", ParamValue::Vec3(position))?;
                native.set("radius", ParamValue::Float(radius))?;
                (color, intensity)
            }
            Self::Ambient { color, intensity } => (color, intensity),
        };
        native.set("color", ParamValue::Vec3(color))?;
        native.set("intensity", ParamValue::Float(intensity))?;
        Ok(())
    }
}

/// Lights contributed by a model.
///
/// Native lights are recreated whenever the list changes, so the handle set
/// reported to the render group may change on any commit.
#[derive(Default)]
pub struct LightComponent {
    lights: Vec<Light>,
    modified: ModifiedFlag,
    device: Option<DeviceRef>,
    natives: Vec<NativeObject>,
}

impl LightComponent {
    /// Component holding `lights`
    pub fn new(lights: Vec<Light>) -> Self {
        Self {
            lights,
            modified: ModifiedFlag::modified(),
            device: None,
            natives: Vec::new(),
        }
    }

    /// Current lights
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Append a light
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
        self.modified.set_modified();
    }

    /// Replace every light, returning whether anything changed
    pub fn set_lights(&mut self, lights: Vec<Light>) -> bool {
        self.modified.update(&mut self.lights, lights)
    }

    /// Remove every light
    pub fn clear(&mut self) -> bool {
        self.set_lights(Vec::new())
    }

    /// Native handles, in light order
    pub fn handles(&self) -> Vec<NativeHandle> {
        self.natives.iter().map(NativeObject::handle).collect()
    }
}

impl Component for LightComponent {
    fn on_start(&mut self, device: &DeviceRef) -> SceneResult<()> {
        self.device = Some(Arc::clone(device));
        self.modified.set_modified();
        Ok(())
    }

    fn on_commit(&mut self) -> SceneResult<bool> {
        if !self.modified.is_modified() {
            return Ok(false);
        }
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| SceneError::NotInitialized("light used before start".to_string()))?;

        let mut natives = Vec::with_capacity(self.lights.len());
        for light in &self.lights {
            let native = NativeObject::create(device, ObjectKind::Light)?;
            light.apply(&native)?;
            native.commit()?;
            natives.push(native);
        }
        log::debug!("Committed {} light(s)", natives.len());
        self.natives = natives;
        self.modified.reset();
        Ok(true)
    }

    fn on_destroyed(&mut self) {
        self.natives.clear();
    }

    fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + std::mem::size_of_val(self.lights.as_slice())
    }

    fn collect_views(&self, views: &mut RenderViews) {
        views.lights.extend(self.natives.iter().map(NativeObject::handle));
    }
}

impl std::fmt::Debug for LightComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightComponent")
            .field("lights", &self.lights)
            .field("handles", &self.handles())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;

    const EPSILON: f32 = 0.001;

    #[test]
    fn test_directional_is_normalized() {
        let Light::Directional { direction, .. } =
            Light::directional(Vec3::new(0.0, -2.0, 0.0), Vec3::repeat(1.0), 1.0)
        else {
            panic!("expected a directional light");
        };
        assert!((direction[1] + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_relist_replaces_natives() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut component = LightComponent::new(vec![Light::ambient(0.4)]);
        component.on_start(&device).unwrap();
        assert!(component.on_commit().unwrap());
        let first = component.handles();
        assert_eq!(first.len(), 1);

        component.add_light(Light::directional(Vec3::new(1.0, -1.0, 0.0), Vec3::repeat(1.0), 2.0));
        assert!(component.on_commit().unwrap());
        assert_eq!(component.handles().len(), 2);
        assert!(!headless.contains(first[0]));
        assert_eq!(headless.live_objects_of(ObjectKind::Light), 2);
        assert!(!component.on_commit().unwrap());
    }

    #[test]
    fn test_commit_requires_start() {
        let mut component = LightComponent::new(vec![Light::ambient(1.0)]);
        assert!(component.on_commit().is_err());
    }
}
