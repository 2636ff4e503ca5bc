//! Surface material

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::component::Component;
use crate::foundation::ModifiedFlag;
use serde::{Deserialize, Serialize};

/// Material parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// Phong-like default material
    Default {
        /// Diffuse colour
        diffuse: [f32; 3],
        /// Specular colour
        specular: [f32; 3],
        /// Specular exponent
        shininess: f32,
        /// Opacity in `[0, 1]`
        opacity: f32,
    },
    /// Purely diffuse surface
    Matte {
        /// Diffuse colour
        diffuse: [f32; 3],
    },
    /// Conductor
    Metal {
        /// Reflected colour
        color: [f32; 3],
        /// Surface roughness in `[0, 1]`
        roughness: f32,
    },
    /// Dielectric
    Glass {
        /// Index of refraction
        ior: f32,
        /// Colour absorbed per unit distance
        attenuation: [f32; 3],
    },
    /// Light-emitting surface
    Emissive {
        /// Emitted colour
        color: [f32; 3],
        /// Radiance multiplier
        intensity: f32,
    },
}

impl Default for Material {
    fn default() -> Self {
        Self::Default {
            diffuse: [0.8, 0.8, 0.8],
            specular: [0.0, 0.0, 0.0],
            shininess: 10.0,
            opacity: 1.0,
        }
    }
}

impl Material {
    /// Type name set on the native material
    pub fn device_type(&self) -> &'static str {
        match self {
            Self::Default { .. } => "obj",
            Self::Matte { .. } => "matte",
            Self::Metal { .. } => "metal",
            Self::Glass { .. } => "glass",
            Self::Emissive { .. } => "luminous",
        }
    }

    fn apply(&self, native: &NativeObject) -> SceneResult<()> {
        native.set("type", ParamValue::String(self.device_type().to_string()))?;
        match *self {
            Self::Default {
                diffuse,
                specular,
                shininess,
                opacity,
            } => {
                native.set("kd", ParamValue::Vec3(diffuse))?;
                native.set("ks", ParamValue::Vec3(specular))?;
                native.set("ns", ParamValue::Float(shininess))?;
                native.set("d", ParamValue::Float(opacity))?;
            }
            Self::Matte { diffuse } => native.set("kd", ParamValue::Vec3(diffuse))?,
            Self::Metal { color, roughness } => {
                native.set("color", ParamValue::Vec3(color))?;
                native.set("roughness", ParamValue::Float(roughness))?;
            }
            Self::Glass { ior, attenuation } => {
                native.set("eta", ParamValue::Float(ior))?;
                native.set("attenuationColor", ParamValue::Vec3(attenuation))?;
            }
            Self::Emissive { color, intensity } => {
                native.set("color", ParamValue::Vec3(color))?;
                native.set("intensity", ParamValue::Float(intensity))?;
            }
        }
        Ok(())
    }
}

/// Material applied to the model's geometry
#[derive(Debug, Default)]
pub struct MaterialComponent {
    material: Material,
    modified: ModifiedFlag,
    native: Option<NativeObject>,
}

impl MaterialComponent {
    /// Wrap a material
    pub fn new(material: Material) -> Self {
        Self {
            material,
            modified: ModifiedFlag::modified(),
            native: None,
        }
    }

    /// Current parameters
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Replace the material, returning whether it changed
    pub fn set_material(&mut self, material: Material) -> bool {
        self.modified.update(&mut self.material, material)
    }

    /// Native material handle, once started
    pub fn handle(&self) -> Option<NativeHandle> {
        self.native.as_ref().map(NativeObject::handle)
    }
}

impl Component for MaterialComponent {
    fn on_start(&mut self, device: &DeviceRef) -> SceneResult<()> {
        self.native = Some(NativeObject::create(device, ObjectKind::Material)?);
        self.modified.set_modified();
        Ok(())
    }

    fn on_commit(&mut self) -> SceneResult<bool> {
        if !self.modified.is_modified() {
            return Ok(false);
        }
        let native = self
            .native
            .as_ref()
            .ok_or_else(|| SceneError::NotInitialized("material used before start".to_string()))?;
        self.material.apply(native)?;
        native.commit()?;
        self.modified.reset();
        Ok(true)
    }

    fn on_destroyed(&mut self) {
        self.native = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;
    use std::sync::Arc;

    #[test]
    fn test_switching_material_type() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut component = MaterialComponent::default();
        component.on_start(&device).unwrap();
        assert!(component.on_commit().unwrap());
        let handle = component.handle().unwrap();
        assert_eq!(headless.param(handle, "type"), Some(ParamValue::String("obj".into())));

        assert!(component.set_material(Material::Glass {
            ior: 1.5,
            attenuation: [1.0, 1.0, 1.0],
        }));
        assert!(component.on_commit().unwrap());
        assert_eq!(headless.param(handle, "type"), Some(ParamValue::String("glass".into())));
        assert_eq!(headless.param(handle, "eta"), Some(ParamValue::Float(1.5)));
        assert!(!component.on_commit().unwrap());
    }

    #[test]
    fn test_same_material_is_not_a_change() {
        let mut component = MaterialComponent::new(Material::Matte { diffuse: [1.0, 0.0, 0.0] });
        assert!(!component.set_material(Material::Matte { diffuse: [1.0, 0.0, 0.0] }));
    }
}
