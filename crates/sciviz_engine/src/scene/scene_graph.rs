//! Whole-frame composition
//!
//! The scene turns the committed state of both managers into the native
//! world consumed by frame rendering. The world's instance list is sent
//! whole, and only when the set of instances changed.

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::error::SceneResult;
use crate::ecs::FrameParameters;
use crate::foundation::Bounds;
use crate::scene::clip_manager::ClipManager;
use crate::scene::model_manager::ModelManager;
use crate::scene::ChangeFlags;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Result of a scene commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneCommit {
    /// What changed, including changes still pending from a failed commit
    pub flags: ChangeFlags,
    /// Model instances whose render group was recommitted
    pub changed_instances: Vec<u32>,
}

impl SceneCommit {
    /// Whether the world was recommitted
    pub fn is_changed(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// Models, clipping models and the native world
#[derive(Debug)]
pub struct Scene {
    models: ModelManager,
    clippers: ClipManager,
    world: NativeObject,
    instances: Vec<NativeHandle>,
    pending: ChangeFlags,
    pending_instances: BTreeSet<u32>,
}

impl Scene {
    /// Empty scene on `device`
    pub fn new(device: &DeviceRef) -> SceneResult<Self> {
        Ok(Self {
            models: ModelManager::new(Arc::clone(device)),
            clippers: ClipManager::new(Arc::clone(device)),
            world: NativeObject::create(device, ObjectKind::World)?,
            instances: Vec::new(),
            pending: ChangeFlags::STRUCTURE,
            pending_instances: BTreeSet::new(),
        })
    }

    /// Model manager
    pub fn models(&self) -> &ModelManager {
        &self.models
    }

    /// Mutable model manager
    pub fn models_mut(&mut self) -> &mut ModelManager {
        &mut self.models
    }

    /// Clip manager
    pub fn clip_manager(&self) -> &ClipManager {
        &self.clippers
    }

    /// Mutable clip manager
    pub fn clip_manager_mut(&mut self) -> &mut ClipManager {
        &mut self.clippers
    }

    /// Native world handle
    pub fn world_handle(&self) -> NativeHandle {
        self.world.handle()
    }

    /// Instance list of the last successful commit
    pub fn instance_handles(&self) -> &[NativeHandle] {
        &self.instances
    }

    /// Init and update stages of every model
    pub fn update(&mut self, params: &FrameParameters) -> SceneResult<()> {
        self.models.update(params)?;
        self.clippers.update(params)
    }

    /// Commit both managers, then the world if anything changed.
    ///
    /// Changes reported by a manager stay pending until the world commit
    /// succeeds.
    pub fn commit(&mut self) -> SceneResult<SceneCommit> {
        let models = self.models.commit()?;
        self.pending |= models.flags;
        self.pending_instances.extend(models.changed_instances);
        let clips = self.clippers.commit()?;
        self.pending |= clips.flags;

        if self.pending.contains(ChangeFlags::STRUCTURE) {
            let mut handles = self.models.visible_handles();
            handles.extend(self.clippers.handles());
            self.world.set("instance", ParamValue::HandleList(handles.clone()))?;
            log::debug!("World instance list rebuilt with {} instance(s)", handles.len());
            self.instances = handles;
        }
        if !self.pending.is_empty() {
            self.world.commit()?;
        }

        let models = &self.models;
        let changed_instances = std::mem::take(&mut self.pending_instances)
            .into_iter()
            .filter(|id| models.get(*id).is_ok())
            .collect();
        Ok(SceneCommit {
            flags: std::mem::take(&mut self.pending),
            changed_instances,
        })
    }

    /// Fan the pre-render hook out to every model
    pub fn pre_render(&mut self, params: &FrameParameters) {
        self.models.pre_render(params);
    }

    /// Fan the post-render hook out to every model
    pub fn post_render(&mut self, params: &FrameParameters) {
        self.models.post_render(params);
    }

    /// Bounds of every visible model instance
    pub fn compute_bounds(&self) -> Bounds {
        self.models.compute_bounds()
    }

    /// Memory footprint of models and clipping models
    pub fn size_in_bytes(&self) -> usize {
        self.models.size_in_bytes() + self.clippers.size_in_bytes()
    }

    /// Remove every model and clipping model
    pub fn clear(&mut self) {
        self.models.clear();
        self.clippers.remove_all_clipping_models();
        self.pending_instances.clear();
        log::info!("Scene cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;
    use crate::ecs::components::{ClipperComponent, MetadataComponent};
    use crate::ecs::Model;

    #[test]
    fn test_empty_scene_commits_world_once() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut scene = Scene::new(&device).unwrap();
        scene.update(&FrameParameters::default()).unwrap();

        let first = scene.commit().unwrap();
        assert_eq!(first.flags, ChangeFlags::STRUCTURE);
        assert_eq!(
            headless.param(scene.world_handle(), "instance"),
            Some(ParamValue::HandleList(Vec::new()))
        );
        assert!(!scene.commit().unwrap().is_changed());
        assert_eq!(headless.commit_count(scene.world_handle()), Some(1));
    }

    #[test]
    fn test_failed_clip_commit_keeps_model_structure() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut scene = Scene::new(&device).unwrap();
        let clip = scene
            .clip_manager_mut()
            .add_clipping_model(
                Model::new("clip").with_component(ClipperComponent::new(vec![[0.0, 0.0, 1.0, 0.0]])),
            )
            .unwrap();
        scene.update(&FrameParameters::default()).unwrap();
        scene.commit().unwrap();

        let id = scene
            .models_mut()
            .add(Model::new("meta").with_component(MetadataComponent::default()))
            .unwrap();
        scene
            .clip_manager_mut()
            .get_mut(clip)
            .unwrap()
            .components_mut()
            .get_mut::<ClipperComponent>()
            .unwrap()
            .set_planes(vec![[0.0, 1.0, 0.0, 0.0]]);
        scene.update(&FrameParameters::default()).unwrap();
        let clip_group = scene.clip_manager().get(clip).unwrap().group_handle().unwrap();
        headless.fail_commits_of(clip_group);
        assert!(scene.commit().is_err());

        headless.clear_failures();
        scene.update(&FrameParameters::default()).unwrap();
        let retry = scene.commit().unwrap();
        assert!(retry.flags.contains(ChangeFlags::STRUCTURE));
        assert_eq!(retry.changed_instances, vec![id]);
        let instance = scene.models().get(id).unwrap().handle();
        assert!(scene.instance_handles().contains(&instance));
        assert_eq!(scene.instance_handles().len(), 2);
    }

    #[test]
    fn test_failed_world_commit_stays_pending() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut scene = Scene::new(&device).unwrap();
        headless.fail_commits_of(scene.world_handle());
        assert!(scene.commit().is_err());
        headless.clear_failures();
        assert!(scene.commit().unwrap().flags.contains(ChangeFlags::STRUCTURE));
    }
}
