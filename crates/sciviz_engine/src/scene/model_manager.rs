//! Instance identity and model lifetime
//!
//! The manager is the sole owner of every model. Models live in a slot map
//! arena; instances hold arena keys and are addressed from outside by `u32`
//! ids handed out by an [`IdFactory`]. A model is dropped, releasing its
//! native objects, when its last instance is removed.

use crate::backend::{DeviceRef, NativeHandle};
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::{FrameParameters, Model};
use crate::foundation::math::Transform;
use crate::foundation::{Bounds, IdFactory, ModifiedFlag};
use crate::scene::instance::ModelInstance;
use crate::scene::ChangeFlags;
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet, HashSet};

slotmap::new_key_type! {
    /// Stable key of a model inside its manager's arena
    pub struct ModelKey;
}

struct ModelEntry {
    model: Model,
    instances: usize,
}

/// Snapshot of one instance, detached from the manager
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceInfo {
    /// Instance id
    pub id: u32,
    /// Model name
    pub name: String,
    /// Model type tag
    pub model_type: String,
    /// Instance transform
    pub transform: Transform,
    /// Visibility
    pub visible: bool,
    /// Bounding box visibility
    pub bounding_box_visible: bool,
    /// World space bounds
    pub bounds: Bounds,
    /// Whether other instances share the model
    pub shared: bool,
}

/// Result of a manager commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerCommit {
    /// What changed
    pub flags: ChangeFlags,
    /// Instances whose model recommitted its render group
    pub changed_instances: Vec<u32>,
}

/// Owner of all models and instances of a scene
pub struct ModelManager {
    device: DeviceRef,
    models: SlotMap<ModelKey, ModelEntry>,
    instances: BTreeMap<u32, ModelInstance>,
    ids: IdFactory<u32>,
    structure: ModifiedFlag,
    pending: ChangeFlags,
    pending_groups: HashSet<ModelKey>,
}

impl ModelManager {
    /// Empty manager creating native objects on `device`
    pub fn new(device: DeviceRef) -> Self {
        Self {
            device,
            models: SlotMap::with_key(),
            instances: BTreeMap::new(),
            ids: IdFactory::new(),
            structure: ModifiedFlag::new(),
            pending: ChangeFlags::empty(),
            pending_groups: HashSet::new(),
        }
    }

    /// Add a model with one instance, returning the instance id
    pub fn add(&mut self, model: Model) -> SceneResult<u32> {
        let name = model.name().to_string();
        let key = self.models.insert(ModelEntry { model, instances: 0 });
        match self.place(key) {
            Ok(id) => {
                log::info!("Added model '{}' as instance {}", name, id);
                Ok(id)
            }
            Err(err) => {
                self.models.remove(key);
                Err(err)
            }
        }
    }

    /// Add another instance of the model behind `source`
    pub fn add_instance(&mut self, source: u32) -> SceneResult<u32> {
        let key = self.get(source)?.model_key();
        let id = self.place(key)?;
        log::info!("Added instance {} of instance {}", id, source);
        Ok(id)
    }

    fn place(&mut self, key: ModelKey) -> SceneResult<u32> {
        let id = self.ids.generate_id()?;
        let instance = match ModelInstance::new(id, key, &self.device) {
            Ok(instance) => instance,
            Err(err) => {
                self.ids.release_id(id);
                return Err(err);
            }
        };
        self.instances.insert(id, instance);
        if let Some(entry) = self.models.get_mut(key) {
            entry.instances += 1;
        }
        self.structure.set_modified();
        Ok(id)
    }

    /// Remove one instance
    pub fn remove(&mut self, id: u32) -> SceneResult<()> {
        let instance = self.instances.remove(&id).ok_or_else(|| not_found(id))?;
        self.release(instance);
        log::info!("Removed instance {}", id);
        Ok(())
    }

    /// Remove several instances, or none if any id is unknown
    pub fn remove_many(&mut self, ids: &[u32]) -> SceneResult<()> {
        let unknown: Vec<u32> = ids
            .iter()
            .copied()
            .filter(|id| !self.instances.contains_key(id))
            .collect();
        if !unknown.is_empty() {
            return Err(SceneError::InvalidArgument(format!("unknown instance ids {unknown:?}")));
        }
        for id in ids.iter().copied().collect::<BTreeSet<_>>() {
            self.remove(id)?;
        }
        Ok(())
    }

    /// Remove every instance matching `predicate`, returning their ids
    pub fn remove_if<F>(&mut self, mut predicate: F) -> Vec<u32>
    where
        F: FnMut(&ModelInstance, &Model) -> bool,
    {
        let doomed: Vec<u32> = self
            .instances
            .values()
            .filter(|instance| {
                self.models
                    .get(instance.model_key())
                    .is_some_and(|entry| predicate(instance, &entry.model))
            })
            .map(ModelInstance::id)
            .collect();
        for id in &doomed {
            if let Some(instance) = self.instances.remove(id) {
                self.release(instance);
            }
        }
        if !doomed.is_empty() {
            log::info!("Removed {} instance(s) by predicate", doomed.len());
        }
        doomed
    }

    fn release(&mut self, instance: ModelInstance) {
        let key = instance.model_key();
        self.ids.release_id(instance.id());
        drop(instance);
        let orphaned = self.models.get_mut(key).is_some_and(|entry| {
            entry.instances = entry.instances.saturating_sub(1);
            entry.instances == 0
        });
        if orphaned {
            if let Some(entry) = self.models.remove(key) {
                log::debug!("Dropped model '{}'", entry.model.name());
            }
        }
        self.structure.set_modified();
    }

    /// Remove everything and restart ids from the beginning
    pub fn clear(&mut self) {
        let count = self.instances.len();
        self.instances.clear();
        self.models.clear();
        self.pending_groups.clear();
        self.ids.clear();
        self.structure.set_modified();
        log::info!("Cleared {} instance(s)", count);
    }

    /// Instance by id
    pub fn get(&self, id: u32) -> SceneResult<&ModelInstance> {
        self.instances.get(&id).ok_or_else(|| not_found(id))
    }

    /// Mutable instance by id
    pub fn get_mut(&mut self, id: u32) -> SceneResult<&mut ModelInstance> {
        self.instances.get_mut(&id).ok_or_else(|| not_found(id))
    }

    /// Model behind an instance
    pub fn model(&self, id: u32) -> SceneResult<&Model> {
        let key = self.get(id)?.model_key();
        self.models
            .get(key)
            .map(|entry| &entry.model)
            .ok_or_else(|| not_found(id))
    }

    /// Mutable model behind an instance; changes affect every instance of it
    pub fn model_mut(&mut self, id: u32) -> SceneResult<&mut Model> {
        let key = self.get(id)?.model_key();
        self.models
            .get_mut(key)
            .map(|entry| &mut entry.model)
            .ok_or_else(|| not_found(id))
    }

    /// Snapshot of every instance, in id order
    pub fn get_all(&self) -> Vec<InstanceInfo> {
        self.instances
            .values()
            .filter_map(|instance| {
                let entry = self.models.get(instance.model_key())?;
                Some(InstanceInfo {
                    id: instance.id(),
                    name: entry.model.name().to_string(),
                    model_type: entry.model.model_type().to_string(),
                    transform: *instance.transform(),
                    visible: instance.is_visible(),
                    bounding_box_visible: instance.is_bounding_box_visible(),
                    bounds: entry.model.compute_bounds(&instance.transform().to_matrix()),
                    shared: entry.instances > 1,
                })
            })
            .collect()
    }

    /// Live ids, ascending
    pub fn ids(&self) -> Vec<u32> {
        self.instances.keys().copied().collect()
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether there is no instance
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of distinct models
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Union of the bounds of visible instances
    pub fn compute_bounds(&self) -> Bounds {
        self.instances
            .values()
            .filter(|instance| instance.is_visible())
            .filter_map(|instance| {
                let entry = self.models.get(instance.model_key())?;
                Some(entry.model.compute_bounds(&instance.transform().to_matrix()))
            })
            .fold(Bounds::empty(), |acc, bounds| acc.union(&bounds))
    }

    /// Memory footprint of all models, shared models counted once
    pub fn size_in_bytes(&self) -> usize {
        self.models.values().map(|entry| entry.model.size_in_bytes()).sum()
    }

    /// Native handles of visible instances, in id order
    pub fn visible_handles(&self) -> Vec<NativeHandle> {
        self.instances
            .values()
            .filter(|instance| instance.is_visible())
            .map(ModelInstance::handle)
            .collect()
    }

    /// Run the init and update stages of every model
    pub fn update(&mut self, params: &FrameParameters) -> SceneResult<()> {
        for entry in self.models.values_mut() {
            entry.model.init(&self.device)?;
            entry.model.update(params)?;
        }
        Ok(())
    }

    /// Fan the pre-render hook out to every model
    pub fn pre_render(&mut self, params: &FrameParameters) {
        for entry in self.models.values_mut() {
            entry.model.pre_render(params);
        }
    }

    /// Fan the post-render hook out to every model
    pub fn post_render(&mut self, params: &FrameParameters) {
        for entry in self.models.values_mut() {
            entry.model.post_render(params);
        }
    }

    /// Commit every model, then every instance.
    ///
    /// STRUCTURE is reported when instances were added or removed or
    /// visibility toggled since the last successful commit; DATA when any
    /// instance was recommitted. Nothing is acknowledged until everything
    /// succeeded, so whatever a failed commit saw is reported again next time.
    pub fn commit(&mut self) -> SceneResult<ManagerCommit> {
        for (key, entry) in &mut self.models {
            if entry.model.commit()? {
                self.pending_groups.insert(key);
            }
        }

        if self.structure.is_modified() {
            self.pending |= ChangeFlags::STRUCTURE;
        }
        let mut changed_instances = Vec::new();
        for instance in self.instances.values_mut() {
            let key = instance.model_key();
            let Some(entry) = self.models.get(key) else {
                continue;
            };
            if instance.is_visibility_modified() {
                self.pending |= ChangeFlags::STRUCTURE;
            }
            let group_changed = self.pending_groups.contains(&key);
            if instance.commit(entry.model.group_handle()?, &entry.model.base_matrix(), group_changed)? {
                self.pending |= ChangeFlags::DATA;
            }
            if group_changed {
                changed_instances.push(instance.id());
            }
        }

        for instance in self.instances.values_mut() {
            instance.acknowledge_visibility();
        }
        self.structure.reset();
        self.pending_groups.clear();
        let result = ManagerCommit {
            flags: std::mem::take(&mut self.pending),
            changed_instances,
        };
        if !result.flags.is_empty() {
            log::debug!("Model manager commit: {:?}", result.flags);
        }
        Ok(result)
    }
}

fn not_found(id: u32) -> SceneError {
    SceneError::NotFound(format!("instance {id}"))
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("instances", &self.ids())
            .field("models", &self.models.len())
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
    use crate::foundation::math::Vec3;
    use std::sync::Arc;

    fn manager() -> (HeadlessDevice, ModelManager) {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        (headless, ModelManager::new(device))
    }

    fn sphere(name: &str) -> Model {
        Model::named("spheres", name).with_component(GeometryComponent::new(Geometry::Spheres(vec![
            Sphere::new(Vec3::zeros(), 1.0),
        ])))
    }

    fn frame(manager: &mut ModelManager) -> ManagerCommit {
        manager.update(&FrameParameters::default()).unwrap();
        manager.commit().unwrap()
    }

    #[test]
    fn test_ids_are_unique_and_reused_lifo() {
        let (_headless, mut manager) = manager();
        let ids: Vec<u32> = (0..3).map(|i| manager.add(sphere(&i.to_string())).unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        manager.remove(1).unwrap();
        manager.remove(2).unwrap();
        assert_eq!(manager.add(sphere("x")).unwrap(), 2);
        assert_eq!(manager.add(sphere("y")).unwrap(), 1);
        assert_eq!(manager.add(sphere("z")).unwrap(), 4);
        assert_eq!(manager.ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_ids() {
        let (_headless, mut manager) = manager();
        assert_eq!(manager.remove(9).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(manager.get(9).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(manager.model(9).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(manager.add_instance(9).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_remove_many_is_all_or_nothing() {
        let (_headless, mut manager) = manager();
        let a = manager.add(sphere("a")).unwrap();
        let b = manager.add(sphere("b")).unwrap();
        let err = manager.remove_many(&[a, 42]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(manager.len(), 2);

        manager.remove_many(&[a, b, a]).unwrap();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_remove_if_releases_ids() {
        let (_headless, mut manager) = manager();
        manager.add(sphere("keep")).unwrap();
        manager.add(sphere("drop")).unwrap();
        manager.add(sphere("drop")).unwrap();
        let removed = manager.remove_if(|_, model| model.name() == "drop");
        assert_eq!(removed, vec![2, 3]);
        assert_eq!(manager.ids(), vec![1]);
        assert_eq!(manager.add(sphere("next")).unwrap(), 3);
    }

    #[test]
    fn test_clear_restarts_ids() {
        let (headless, mut manager) = manager();
        manager.add(sphere("a")).unwrap();
        manager.add(sphere("b")).unwrap();
        frame(&mut manager);
        manager.clear();
        assert_eq!(headless.live_objects_of(ObjectKind::Group), 0);
        assert_eq!(headless.live_objects_of(ObjectKind::Instance), 0);
        assert_eq!(manager.add(sphere("c")).unwrap(), 1);
    }

    #[test]
    fn test_instances_share_model_until_last_removed() {
        let (headless, mut manager) = manager();
        let source = manager.add(sphere("shared")).unwrap();
        let copy = manager.add_instance(source).unwrap();
        assert_eq!(manager.model_count(), 1);
        frame(&mut manager);
        assert_eq!(headless.live_objects_of(ObjectKind::Group), 1);
        assert_eq!(headless.live_objects_of(ObjectKind::Instance), 2);
        assert!(manager.get_all().iter().all(|info| info.shared));

        manager.remove(source).unwrap();
        assert_eq!(manager.model(copy).unwrap().name(), "shared");
        manager.remove(copy).unwrap();
        assert_eq!(manager.model_count(), 0);
        assert_eq!(headless.live_objects_of(ObjectKind::Group), 0);
        assert_eq!(headless.live_objects_of(ObjectKind::GeometricModel), 0);
    }

    #[test]
    fn test_commit_flags() {
        let (_headless, mut manager) = manager();
        let id = manager.add(sphere("a")).unwrap();
        let first = frame(&mut manager);
        assert_eq!(first.flags, ChangeFlags::STRUCTURE | ChangeFlags::DATA);
        assert_eq!(first.changed_instances, vec![id]);
        assert!(frame(&mut manager).flags.is_empty());

        manager
            .get_mut(id)
            .unwrap()
            .set_transform(Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(frame(&mut manager).flags, ChangeFlags::DATA);

        manager.get_mut(id).unwrap().set_visible(false);
        assert_eq!(frame(&mut manager).flags, ChangeFlags::STRUCTURE);
        assert!(manager.visible_handles().is_empty());
    }

    #[test]
    fn test_failed_commit_keeps_structure_pending() {
        let (headless, mut manager) = manager();
        let id = manager.add(sphere("a")).unwrap();
        manager.update(&FrameParameters::default()).unwrap();
        let handle = manager.get(id).unwrap().handle();
        headless.fail_commits_of(handle);
        assert!(manager.commit().is_err());

        headless.clear_failures();
        let retry = manager.commit().unwrap();
        assert!(retry.flags.contains(ChangeFlags::STRUCTURE | ChangeFlags::DATA));
    }

    #[test]
    fn test_failed_model_commit_keeps_earlier_groups_pending() {
        let (headless, mut manager) = manager();
        let a = manager.add(sphere("a")).unwrap();
        let b = manager.add(sphere("b")).unwrap();
        frame(&mut manager);

        for id in [a, b] {
            manager
                .model_mut(id)
                .unwrap()
                .components_mut()
                .get_mut::<GeometryViewComponent>()
                .unwrap()
                .set_color([0.0, 1.0, 0.0, 1.0]);
        }
        let group_b = manager.model(b).unwrap().group_handle().unwrap();
        headless.fail_commits_of(group_b);
        assert!(manager.commit().is_err());

        headless.clear_failures();
        let retry = manager.commit().unwrap();
        assert_eq!(retry.flags, ChangeFlags::DATA);
        assert_eq!(retry.changed_instances, vec![a, b]);
        let instance_a = manager.get(a).unwrap().handle();
        assert_eq!(headless.commit_count(instance_a), Some(2));
    }

    #[test]
    fn test_bounds_ignore_hidden_instances() {
        let (_headless, mut manager) = manager();
        let a = manager.add(sphere("a")).unwrap();
        let b = manager.add_instance(a).unwrap();
        manager
            .get_mut(b)
            .unwrap()
            .set_transform(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(manager.compute_bounds().max().x, 11.0);
        manager.get_mut(b).unwrap().set_visible(false);
        assert_eq!(manager.compute_bounds().max().x, 1.0);
    }

    #[test]
    fn test_size_counts_shared_models_once() {
        let (_headless, mut manager) = manager();
        let a = manager.add(Model::new("meta").with_component(MetadataComponent::default())).unwrap();
        let single = manager.size_in_bytes();
        manager.add_instance(a).unwrap();
        assert_eq!(manager.size_in_bytes(), single);
    }
}
