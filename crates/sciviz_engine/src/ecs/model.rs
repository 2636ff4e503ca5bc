//! Model: a named bundle of components and systems
//!
//! A model has no id of its own; ids belong to the instances placing it in
//! a scene. The model owns its render group once initialized.

use crate::backend::{DeviceRef, NativeHandle};
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::component::Component;
use crate::ecs::components::TransformComponent;
use crate::ecs::storage::Components;
use crate::ecs::system::{FrameParameters, ModelProperties, Systems};
use crate::ecs::systems::standard_systems;
use crate::foundation::math::Mat4;
use crate::foundation::Bounds;
use crate::scene::RenderGroup;
use std::sync::Arc;

/// Immutable description of a model, shared with attached components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    model_type: String,
    name: String,
}

impl ModelInfo {
    /// Create a description
    pub fn new(model_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model_type: model_type.into(),
            name: name.into(),
        }
    }

    /// Type tag set by the loader (e.g. `"spheres"`, `"volume"`)
    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    /// Human readable name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Scene entity made of components and the systems operating on them
pub struct Model {
    info: Arc<ModelInfo>,
    components: Components,
    systems: Systems,
    group: Option<RenderGroup>,
    group_pending: bool,
}

impl Model {
    /// Create a model named after its type
    pub fn new(model_type: impl Into<String>) -> Self {
        let model_type = model_type.into();
        Self::named(model_type.clone(), model_type)
    }

    /// Create a model with an explicit name and the standard systems
    pub fn named(model_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_systems(model_type, name, standard_systems())
    }

    /// Create a model with a custom system registry
    pub fn with_systems(model_type: impl Into<String>, name: impl Into<String>, systems: Systems) -> Self {
        let info = Arc::new(ModelInfo::new(model_type, name));
        Self {
            components: Components::with_owner(Arc::clone(&info)),
            info,
            systems,
            group: None,
            group_pending: false,
        }
    }

    /// Builder pattern: add a component
    pub fn with_component<T: Component>(mut self, component: T) -> Self {
        self.components.add(component);
        self
    }

    /// Description shared with the components
    pub fn info(&self) -> &Arc<ModelInfo> {
        &self.info
    }

    /// Model name
    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// Model type tag
    pub fn model_type(&self) -> &str {
        self.info.model_type()
    }

    /// Component storage
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Mutable component storage
    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    /// System registry
    pub fn systems(&self) -> &Systems {
        &self.systems
    }

    /// Mutable system registry
    pub fn systems_mut(&mut self) -> &mut Systems {
        &mut self.systems
    }

    /// Whether [`Model::init`] completed at least once
    pub fn is_initialized(&self) -> bool {
        self.group.is_some()
    }

    /// Render group, once initialized
    pub fn group(&self) -> Option<&RenderGroup> {
        self.group.as_ref()
    }

    /// Handle of the native group
    pub fn group_handle(&self) -> SceneResult<NativeHandle> {
        self.group
            .as_ref()
            .map(RenderGroup::handle)
            .ok_or_else(|| self.not_initialized())
    }

    /// Init stage: derived components, component start, render group.
    ///
    /// Idempotent; runs every frame so components added since the last
    /// frame get started.
    pub fn init(&mut self, device: &DeviceRef) -> SceneResult<()> {
        self.systems.run_init(&mut self.components)?;
        let started = self.components.start_pending(device)?;
        if started > 0 {
            log::debug!("Model '{}' started {} component(s)", self.name(), started);
        }
        if self.group.is_none() {
            self.group = Some(RenderGroup::new(device)?);
        }
        Ok(())
    }

    /// Update stage
    pub fn update(&mut self, params: &FrameParameters) -> SceneResult<()> {
        self.systems.run_update(params, &mut self.components)
    }

    /// Commit stage. Returns whether the render group was recommitted.
    ///
    /// A change seen by a failed commit keeps the group pending, so the
    /// next commit resubmits it.
    pub fn commit(&mut self) -> SceneResult<bool> {
        if self.group.is_none() {
            return Err(self.not_initialized());
        }
        match self.commit_components() {
            Ok(changed) => self.group_pending |= changed,
            Err(err) => {
                self.group_pending = true;
                return Err(err);
            }
        }

        let Some(group) = self.group.as_mut() else {
            return Err(self.not_initialized());
        };
        let recommitted = group.commit(&self.components, self.group_pending)?;
        self.group_pending = false;
        self.components.reset_structure_modified();
        if recommitted {
            log::debug!("Model '{}' recommitted its render group", self.info.name());
        }
        Ok(recommitted)
    }

    fn commit_components(&mut self) -> SceneResult<bool> {
        let systems_changed = self.systems.run_commit(&mut self.components)?;
        let components_changed = self.components.commit_all()?;
        Ok(systems_changed || components_changed || self.components.is_structure_modified())
    }

    /// Fan out the pre-render hook
    pub fn pre_render(&mut self, params: &FrameParameters) {
        self.components.pre_render(params);
    }

    /// Fan out the post-render hook
    pub fn post_render(&mut self, params: &FrameParameters) {
        self.components.post_render(params);
    }

    /// Model base transform, identity without a [`TransformComponent`]
    pub fn base_matrix(&self) -> Mat4 {
        self.components
            .find::<TransformComponent>()
            .map_or_else(Mat4::identity, TransformComponent::matrix)
    }

    /// Bounds of every contributing component under `transform * base`
    pub fn compute_bounds(&self, transform: &Mat4) -> Bounds {
        let matrix = transform * self.base_matrix();
        self.components.compute_bounds(&matrix)
    }

    /// Approximate memory footprint of the components
    pub fn size_in_bytes(&self) -> usize {
        self.components.size_in_bytes()
    }

    /// Description produced by the data system
    pub fn properties(&self) -> ModelProperties {
        self.systems.properties(&self.info, &self.components)
    }

    fn not_initialized(&self) -> SceneError {
        SceneError::NotInitialized(format!("model '{}' has no render group", self.info.name()))
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("info", &self.info)
            .field("components", &self.components)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessDevice, ObjectKind};
    use crate::core::error::ErrorKind;
    use crate::ecs::components::{
        Geometry, GeometryComponent, GeometryViewComponent, MetadataComponent, Sphere,
    };
    use crate::foundation::math::{Transform, Vec3};
    use approx::assert_relative_eq;

    fn sphere_model() -> Model {
        Model::new("spheres").with_component(GeometryComponent::new(Geometry::Spheres(vec![
            Sphere::new(Vec3::zeros(), 1.0),
        ])))
    }

    #[test]
    fn test_commit_before_init_fails() {
        let mut model = sphere_model();
        assert_eq!(model.commit().unwrap_err().kind(), ErrorKind::NotInitialized);
        assert_eq!(model.group_handle().unwrap_err().kind(), ErrorKind::NotInitialized);
    }

    #[test]
    fn test_init_creates_group() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut model = sphere_model();
        model.init(&device).unwrap();
        model.init(&device).unwrap();
        assert_eq!(headless.live_objects_of(ObjectKind::Group), 1);
        assert!(model.is_initialized());
    }

    #[test]
    fn test_structural_change_recommits_group() {
        let device: DeviceRef = Arc::new(HeadlessDevice::new());
        let mut model = Model::new("meta").with_component(MetadataComponent::default());
        model.init(&device).unwrap();
        assert!(model.commit().unwrap());
        assert!(!model.commit().unwrap());

        model.components_mut().remove::<MetadataComponent>();
        assert!(model.commit().unwrap());
    }

    #[test]
    fn test_failed_group_commit_is_retried() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut model = sphere_model();
        model.init(&device).unwrap();
        assert!(model.commit().unwrap());
        let group = model.group_handle().unwrap();

        model
            .components_mut()
            .get_mut::<GeometryViewComponent>()
            .unwrap()
            .set_color([1.0, 0.0, 0.0, 1.0]);
        headless.fail_commits_of(group);
        assert!(model.commit().is_err());
        assert_eq!(headless.commit_count(group), Some(1));

        headless.clear_failures();
        assert!(model.commit().unwrap());
        assert_eq!(headless.commit_count(group), Some(2));
        assert!(!model.commit().unwrap());
    }

    #[test]
    fn test_bounds_compose_instance_and_base() {
        let model = sphere_model().with_component(TransformComponent::new(
            Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
        ));
        let instance = Transform::from_uniform_scale(2.0).to_matrix();
        let bounds = model.compute_bounds(&instance);
        assert_relative_eq!(bounds.min(), Vec3::new(0.0, -2.0, -2.0));
        assert_relative_eq!(bounds.max(), Vec3::new(4.0, 2.0, 2.0));
    }

    #[test]
    fn test_bounds_empty_without_geometry() {
        let model = Model::new("empty").with_component(MetadataComponent::default());
        assert!(model.compute_bounds(&Mat4::identity()).is_empty());
    }

    #[test]
    fn test_size_sums_components() {
        let model = sphere_model();
        let geometry = model.components().get::<GeometryComponent>().unwrap();
        assert_eq!(model.size_in_bytes(), geometry.size_in_bytes());
        assert!(model.size_in_bytes() >= std::mem::size_of::<Sphere>());
    }
}
