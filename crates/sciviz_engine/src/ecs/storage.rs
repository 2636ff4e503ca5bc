//! Type-keyed component storage
//!
//! One instance per component type per model. Typed access goes through
//! `TypeId` downcasts; the untyped walk over every slot is reserved for the
//! polymorphic hooks of [`Component`].

use crate::backend::DeviceRef;
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::component::Component;
use crate::ecs::model::ModelInfo;
use crate::ecs::system::FrameParameters;
use crate::foundation::math::Mat4;
use crate::foundation::{Bounds, ModifiedFlag};
use crate::scene::RenderViews;
use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::sync::Arc;

struct Slot {
    component: Box<dyn Component>,
    started: bool,
}

/// Exclusive owner of a model's components
#[derive(Default)]
pub struct Components {
    slots: BTreeMap<TypeId, Slot>,
    owner: Option<Arc<ModelInfo>>,
    structure: ModifiedFlag,
}

fn missing<T>() -> SceneError {
    SceneError::NotFound(format!("component {}", type_name::<T>()))
}

impl Components {
    /// Storage not bound to any model
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose components get attached to `owner`
    pub fn with_owner(owner: Arc<ModelInfo>) -> Self {
        let mut components = Self::default();
        components.owner = Some(owner);
        components
    }

    /// Add a component, replacing (and destroying) any previous one of the same type
    pub fn add<T: Component>(&mut self, component: T) -> &mut T {
        if let Some(owner) = &self.owner {
            if let Some(attachment) = component.attachment() {
                attachment.attach(owner);
            }
        }
        let slot = Slot {
            component: Box::new(component),
            started: false,
        };
        if let Some(mut previous) = self.slots.insert(TypeId::of::<T>(), slot) {
            log::trace!("Replacing component {}", type_name::<T>());
            previous.component.on_destroyed();
        }
        self.structure.set_modified();
        self.typed_mut::<T>().expect("component inserted above")
    }

    /// Component of type `T`, constructed with `make` if absent
    pub fn get_or_add<T: Component>(&mut self, make: impl FnOnce() -> T) -> &mut T {
        if !self.has::<T>() {
            return self.add(make());
        }
        self.typed_mut::<T>().expect("presence checked above")
    }

    /// Component of type `T`, default-constructed if absent
    pub fn get_or_default<T: Component + Default>(&mut self) -> &mut T {
        self.get_or_add(T::default)
    }

    /// Component of type `T`, failing with `NotFound` if absent
    pub fn get<T: Component>(&self) -> SceneResult<&T> {
        self.find::<T>().ok_or_else(missing::<T>)
    }

    /// Mutable component of type `T`, failing with `NotFound` if absent
    pub fn get_mut<T: Component>(&mut self) -> SceneResult<&mut T> {
        self.find_mut::<T>().ok_or_else(missing::<T>)
    }

    /// Component of type `T`, if present
    pub fn find<T: Component>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| (*slot.component).as_any().downcast_ref::<T>())
    }

    /// Mutable component of type `T`, if present
    pub fn find_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.typed_mut::<T>()
    }

    /// Whether a component of type `T` is present
    pub fn has<T: Component>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Remove and return the component of type `T`
    pub fn remove<T: Component>(&mut self) -> Option<T> {
        let mut slot = self.slots.remove(&TypeId::of::<T>())?;
        self.structure.set_modified();
        slot.component.on_destroyed();
        slot.component.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no components
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Names of the stored component types
    pub fn type_names(&self) -> Vec<&'static str> {
        self.slots.values().map(|slot| slot.component.type_name()).collect()
    }

    /// Whether a component was added or removed since the last reset
    pub fn is_structure_modified(&self) -> bool {
        self.structure.is_modified()
    }

    /// Acknowledge structural changes
    pub fn reset_structure_modified(&mut self) {
        self.structure.reset();
    }

    /// Start every component that has not been started yet.
    ///
    /// A component whose start fails stays pending and is retried next time.
    pub fn start_pending(&mut self, device: &DeviceRef) -> SceneResult<usize> {
        let mut started = 0;
        for slot in self.slots.values_mut().filter(|slot| !slot.started) {
            slot.component.on_start(device)?;
            slot.started = true;
            started += 1;
        }
        Ok(started)
    }

    /// Whether every component has been started
    pub fn all_started(&self) -> bool {
        self.slots.values().all(|slot| slot.started)
    }

    /// Fan `on_pre_render` out to every component
    pub fn pre_render(&mut self, params: &FrameParameters) {
        for slot in self.slots.values_mut() {
            slot.component.on_pre_render(params);
        }
    }

    /// Fan `on_post_render` out to every component
    pub fn post_render(&mut self, params: &FrameParameters) {
        for slot in self.slots.values_mut() {
            slot.component.on_post_render(params);
        }
    }

    /// Commit every component, returning whether any of them changed.
    ///
    /// All components are visited; the first error aborts the walk.
    pub fn commit_all(&mut self) -> SceneResult<bool> {
        let mut changed = false;
        for slot in self.slots.values_mut() {
            if !slot.started {
                return Err(SceneError::NotInitialized(format!(
                    "component {} committed before start",
                    slot.component.type_name()
                )));
            }
            let component_changed = slot.component.on_commit()?;
            if component_changed {
                log::trace!("Component {} changed", slot.component.type_name());
            }
            changed |= component_changed;
        }
        Ok(changed)
    }

    /// Union of every component's bounds under `matrix`
    pub fn compute_bounds(&self, matrix: &Mat4) -> Bounds {
        self.slots
            .values()
            .filter_map(|slot| slot.component.compute_bounds(matrix))
            .fold(Bounds::empty(), |acc, bounds| acc.union(&bounds))
    }

    /// Sum of the components' sizes
    pub fn size_in_bytes(&self) -> usize {
        self.slots.values().map(|slot| slot.component.size_in_bytes()).sum()
    }

    /// Gather the native views of every component
    pub fn collect_views(&self, views: &mut RenderViews) {
        for slot in self.slots.values() {
            slot.component.collect_views(views);
        }
    }

    fn typed_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| (*slot.component).as_any_mut().downcast_mut::<T>())
    }
}

impl Drop for Components {
    fn drop(&mut self) {
        for slot in self.slots.values_mut() {
            slot.component.on_destroyed();
        }
    }
}

impl std::fmt::Debug for Components {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Components")
            .field("types", &self.type_names())
            .finish_non_exhaustive()
    }
}
