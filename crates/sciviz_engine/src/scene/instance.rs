//! Placed occurrence of a model

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::error::SceneResult;
use crate::foundation::math::{matrix_to_array, Mat4, Transform};
use crate::foundation::ModifiedFlag;
use crate::scene::model_manager::ModelKey;

/// A model placed in the scene with its own transform and visibility.
///
/// The instance refers to its model through a [`ModelKey`] and never owns
/// it; several instances may share one model.
#[derive(Debug)]
pub struct ModelInstance {
    id: u32,
    model: ModelKey,
    transform: Transform,
    visible: bool,
    bounding_box_visible: bool,
    native: NativeObject,
    transform_modified: ModifiedFlag,
    visibility_modified: ModifiedFlag,
    submitted: Option<Submitted>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Submitted {
    group: NativeHandle,
    matrix: [f32; 16],
}

impl ModelInstance {
    pub(crate) fn new(id: u32, model: ModelKey, device: &DeviceRef) -> SceneResult<Self> {
        Ok(Self {
            id,
            model,
            transform: Transform::identity(),
            visible: true,
            bounding_box_visible: false,
            native: NativeObject::create(device, ObjectKind::Instance)?,
            transform_modified: ModifiedFlag::modified(),
            visibility_modified: ModifiedFlag::new(),
            submitted: None,
        })
    }

    /// Id, unique within the owning manager
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Key of the instanced model
    pub fn model_key(&self) -> ModelKey {
        self.model
    }

    /// Native instance handle
    pub fn handle(&self) -> NativeHandle {
        self.native.handle()
    }

    /// Instance transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Replace the instance transform, returning whether it changed
    pub fn set_transform(&mut self, transform: Transform) -> bool {
        self.transform_modified.update(&mut self.transform, transform)
    }

    /// Whether the instance is part of the rendered world
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the instance. Toggling changes the world's instance list.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        self.visibility_modified.update(&mut self.visible, visible)
    }

    /// Whether the bounding box should be drawn
    pub fn is_bounding_box_visible(&self) -> bool {
        self.bounding_box_visible
    }

    /// Show or hide the bounding box
    pub fn set_bounding_box_visible(&mut self, visible: bool) -> bool {
        if self.bounding_box_visible == visible {
            return false;
        }
        self.bounding_box_visible = visible;
        true
    }

    /// Whether visibility changed since the last acknowledged commit
    pub fn is_visibility_modified(&self) -> bool {
        self.visibility_modified.is_modified()
    }

    pub(crate) fn acknowledge_visibility(&mut self) {
        self.visibility_modified.reset();
    }

    /// Whether the instance has been committed at least once
    pub fn is_committed(&self) -> bool {
        self.submitted.is_some()
    }

    /// Commit the native instance when its group, its full matrix or the
    /// group's content changed. `base` is the model's own transform.
    pub(crate) fn commit(&mut self, group: NativeHandle, base: &Mat4, group_changed: bool) -> SceneResult<bool> {
        let submitted = Submitted {
            group,
            matrix: matrix_to_array(&(self.transform.to_matrix() * base)),
        };
        let stale = self.submitted != Some(submitted);
        if !stale && !group_changed && !self.transform_modified.is_modified() {
            return Ok(false);
        }
        self.native.set("group", ParamValue::Handle(group))?;
        self.native.set("transform", ParamValue::Mat4(submitted.matrix))?;
        self.native.commit()?;
        self.submitted = Some(submitted);
        self.transform_modified.reset();
        Ok(true)
    }
}
