//! Component trait and model attachment

use crate::backend::DeviceRef;
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::model::ModelInfo;
use crate::ecs::system::FrameParameters;
use crate::foundation::math::Mat4;
use crate::foundation::Bounds;
use crate::scene::RenderViews;
use std::any::Any;
use std::sync::{Arc, OnceLock, Weak};

/// Downcasting support for type-erased components
pub trait AsAny: Any {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Convert a box into `Box<dyn Any>`
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Piece of data attached to a model.
///
/// Every hook has an empty default, so a component only implements what it
/// takes part in. `on_commit` returns whether anything downstream must be
/// recomposed.
pub trait Component: AsAny + Send {
    /// Called once, before the first commit, with the device native objects
    /// are created on
    fn on_start(&mut self, _device: &DeviceRef) -> SceneResult<()> {
        Ok(())
    }

    /// Called before each frame is rendered
    fn on_pre_render(&mut self, _params: &FrameParameters) {}

    /// Called after each frame is rendered
    fn on_post_render(&mut self, _params: &FrameParameters) {}

    /// Push pending changes to the native side
    fn on_commit(&mut self) -> SceneResult<bool> {
        Ok(false)
    }

    /// Called when the component is removed or its model destroyed
    fn on_destroyed(&mut self) {}

    /// Bounds of the component's content under `matrix`
    fn compute_bounds(&self, _matrix: &Mat4) -> Option<Bounds> {
        None
    }

    /// Approximate memory footprint
    fn size_in_bytes(&self) -> usize {
        std::mem::size_of_val(self)
    }

    /// Report the native views this component contributes to its render group
    fn collect_views(&self, _views: &mut RenderViews) {}

    /// Back-reference slot, for components that need their model
    fn attachment(&self) -> Option<&Attachment> {
        None
    }

    /// Name used in logs
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Non-owning link from a component to its model, bound exactly once.
#[derive(Debug, Default)]
pub struct Attachment {
    model: OnceLock<Weak<ModelInfo>>,
}

impl Attachment {
    /// An unbound attachment
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to a model. Returns false if already bound.
    pub(crate) fn attach(&self, model: &Arc<ModelInfo>) -> bool {
        self.model.set(Arc::downgrade(model)).is_ok()
    }

    /// Whether the component was attached
    pub fn is_attached(&self) -> bool {
        self.model.get().is_some()
    }

    /// Owning model's description
    pub fn model(&self) -> SceneResult<Arc<ModelInfo>> {
        self.model
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| SceneError::NotInitialized("component is not attached to a model".to_string()))
    }
}

impl Clone for Attachment {
    /// Copies start detached; they belong to whichever model adds them next.
    fn clone(&self) -> Self {
        Self::new()
    }
}
