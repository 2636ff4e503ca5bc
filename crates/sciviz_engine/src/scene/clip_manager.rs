//! Scene-wide clipping models
//!
//! Same identity scheme as [`ModelManager`], with its own id space. Only
//! models carrying a [`ClipperComponent`] are accepted.

use crate::backend::{DeviceRef, NativeHandle};
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::components::ClipperComponent;
use crate::ecs::{FrameParameters, Model};
use crate::scene::model_manager::{ManagerCommit, ModelManager};

/// Owner of the clipping models
#[derive(Debug)]
pub struct ClipManager {
    models: ModelManager,
}

impl ClipManager {
    /// Empty manager creating native objects on `device`
    pub fn new(device: DeviceRef) -> Self {
        Self {
            models: ModelManager::new(device),
        }
    }

    /// Add a clipping model, returning its id
    pub fn add_clipping_model(&mut self, model: Model) -> SceneResult<u32> {
        if !model.components().has::<ClipperComponent>() {
            return Err(SceneError::InvalidArgument(format!(
                "model '{}' has no clipping geometry",
                model.name()
            )));
        }
        self.models.add(model)
    }

    /// Remove clipping models. Unknown ids fail the whole call before
    /// anything is removed.
    pub fn remove_clipping_models(&mut self, ids: &[u32]) -> SceneResult<()> {
        self.models.remove_many(ids)
    }

    /// Remove every clipping model
    pub fn remove_all_clipping_models(&mut self) {
        self.models.clear();
    }

    /// Clipping model by id
    pub fn get(&self, id: u32) -> SceneResult<&Model> {
        self.models.model(id)
    }

    /// Mutable clipping model by id
    pub fn get_mut(&mut self, id: u32) -> SceneResult<&mut Model> {
        self.models.model_mut(id)
    }

    /// Live ids, ascending
    pub fn ids(&self) -> Vec<u32> {
        self.models.ids()
    }

    /// Number of clipping models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether there is no clipping model
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Native instance handles of the clipping models
    pub fn handles(&self) -> Vec<NativeHandle> {
        self.models.visible_handles()
    }

    /// Memory footprint
    pub fn size_in_bytes(&self) -> usize {
        self.models.size_in_bytes()
    }

    /// Run the init and update stages
    pub fn update(&mut self, params: &FrameParameters) -> SceneResult<()> {
        self.models.update(params)
    }

    /// Commit every clipping model
    pub fn commit(&mut self) -> SceneResult<ManagerCommit> {
        self.models.commit()
    }
}
