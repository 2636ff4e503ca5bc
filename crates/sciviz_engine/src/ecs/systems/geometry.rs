//! Geometry systems: derive the view from raw data and keep it in sync

use crate::core::error::{SceneError, SceneResult};
use crate::ecs::components::{GeometryComponent, GeometryViewComponent, MaterialComponent};
use crate::ecs::storage::Components;
use crate::ecs::system::{CommitSystem, InitSystem};

/// Geometry view of a model, created from its raw geometry if missing.
///
/// Fails with `NotFound` when the model has no geometry at all.
pub fn geometry_view_mut(components: &mut Components) -> SceneResult<&mut GeometryViewComponent> {
    let kind = components
        .find::<GeometryComponent>()
        .map(|raw| raw.geometry().kind());
    match kind {
        Some(kind) => Ok(components.get_or_add(|| GeometryViewComponent::new(kind))),
        None => components
            .get_mut::<GeometryViewComponent>()
            .map_err(|_| SceneError::NotFound("model has no geometry".to_string())),
    }
}

/// Creates the geometry view of models carrying raw geometry
#[derive(Debug, Default)]
pub struct GeometryInitSystem;

impl InitSystem for GeometryInitSystem {
    fn execute(&self, components: &mut Components) -> SceneResult<()> {
        if components.has::<GeometryComponent>() && !components.has::<GeometryViewComponent>() {
            geometry_view_mut(components)?;
            log::trace!("Created geometry view");
        }
        Ok(())
    }
}

/// Moves modified raw geometry into the view and binds the material
#[derive(Debug, Default)]
pub struct GeometryCommitSystem;

impl GeometryCommitSystem {
    fn upload(components: &mut Components) -> SceneResult<bool> {
        let geometry = match components.find::<GeometryComponent>() {
            Some(raw) if raw.is_modified() => raw.geometry().clone(),
            _ => return Ok(false),
        };
        components.get_mut::<GeometryViewComponent>()?.upload(&geometry)?;
        components.get_mut::<GeometryComponent>()?.mark_synchronized();
        Ok(true)
    }

    fn bind_material(components: &mut Components) -> SceneResult<bool> {
        let material = components.find::<MaterialComponent>().and_then(MaterialComponent::handle);
        match components.find_mut::<GeometryViewComponent>() {
            Some(view) => Ok(view.set_material(material)),
            None => Ok(false),
        }
    }
}

impl CommitSystem for GeometryCommitSystem {
    fn execute(&self, components: &mut Components) -> SceneResult<bool> {
        let uploaded = Self::upload(components)?;
        let bound = Self::bind_material(components)?;
        Ok(uploaded || bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceRef, HeadlessDevice};
    use crate::core::error::ErrorKind;
    use crate::ecs::components::{Geometry, Material, MetadataComponent, Sphere};
    use crate::foundation::math::Vec3;
    use std::sync::Arc;

    fn spheres(count: usize) -> Geometry {
        Geometry::Spheres(vec![Sphere::new(Vec3::zeros(), 1.0); count])
    }

    #[test]
    fn test_init_creates_view_once() {
        let mut components = Components::new();
        components.add(GeometryComponent::new(spheres(1)));
        GeometryInitSystem.execute(&mut components).unwrap();
        components.get_mut::<GeometryViewComponent>().unwrap().set_color([0.0; 4]);
        GeometryInitSystem.execute(&mut components).unwrap();
        assert_eq!(components.get::<GeometryViewComponent>().unwrap().color(), [0.0; 4]);
    }

    #[test]
    fn test_no_geometry_no_view() {
        let mut components = Components::new();
        components.add(MetadataComponent::default());
        GeometryInitSystem.execute(&mut components).unwrap();
        assert!(!components.has::<GeometryViewComponent>());
        assert_eq!(geometry_view_mut(&mut components).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_commit_uploads_modified_geometry_once() {
        let device: DeviceRef = Arc::new(HeadlessDevice::new());
        let mut components = Components::new();
        components.add(GeometryComponent::new(spheres(2)));
        GeometryInitSystem.execute(&mut components).unwrap();
        components.start_pending(&device).unwrap();

        assert!(GeometryCommitSystem.execute(&mut components).unwrap());
        assert!(!GeometryCommitSystem.execute(&mut components).unwrap());
        assert_eq!(components.get::<GeometryViewComponent>().unwrap().primitive_count(), 2);

        components
            .get_mut::<GeometryComponent>()
            .unwrap()
            .set_geometry(spheres(5));
        assert!(GeometryCommitSystem.execute(&mut components).unwrap());
        assert_eq!(components.get::<GeometryViewComponent>().unwrap().primitive_count(), 5);
    }

    #[test]
    fn test_failed_upload_keeps_raw_modified() {
        let mut components = Components::new();
        components.add(GeometryComponent::new(spheres(1)));
        GeometryInitSystem.execute(&mut components).unwrap();
        assert!(GeometryCommitSystem.execute(&mut components).is_err());
        assert!(components.get::<GeometryComponent>().unwrap().is_modified());
    }

    #[test]
    fn test_material_binding() {
        let device: DeviceRef = Arc::new(HeadlessDevice::new());
        let mut components = Components::new();
        components.add(GeometryComponent::new(spheres(1)));
        components.add(MaterialComponent::new(Material::Matte {
            diffuse: [0.2, 0.4, 0.6],
        }));
        GeometryInitSystem.execute(&mut components).unwrap();
        components.start_pending(&device).unwrap();
        GeometryCommitSystem.execute(&mut components).unwrap();

        let material = components.get::<MaterialComponent>().unwrap().handle();
        assert!(material.is_some());
        assert_eq!(components.get::<GeometryViewComponent>().unwrap().material(), material);
    }
}
