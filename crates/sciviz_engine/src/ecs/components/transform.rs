//! Model base transform
//!
//! Pure data component. Instances compose their own transform with this one,
//! so moving the base moves every instance of the model.

use crate::core::error::SceneResult;
use crate::ecs::component::Component;
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::foundation::ModifiedFlag;

/// Base transform applied to every instance of a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformComponent {
    transform: Transform,
    modified: ModifiedFlag,
}

impl TransformComponent {
    /// Create from a transform
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            modified: ModifiedFlag::modified(),
        }
    }

    /// Create identity transform
    pub fn identity() -> Self {
        Self::new(Transform::identity())
    }

    /// Create from position only
    pub fn from_position(position: Vec3) -> Self {
        Self::new(Transform::from_translation(position))
    }

    /// Current transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Replace the transform, returning whether it changed
    pub fn set_transform(&mut self, transform: Transform) -> bool {
        self.modified.update(&mut self.transform, transform)
    }

    /// Replace the rotation only
    pub fn set_rotation(&mut self, rotation: Quat) -> bool {
        let transform = self.transform.with_rotation(rotation);
        self.set_transform(transform)
    }

    /// Transformation matrix (TRS order)
    pub fn matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }
}

impl Component for TransformComponent {
    fn on_commit(&mut self) -> SceneResult<bool> {
        Ok(self.modified.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_reports_change_once() {
        let mut component = TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(component.on_commit().unwrap());
        assert!(!component.on_commit().unwrap());

        assert!(!component.set_transform(*component.transform()));
        assert!(component.set_transform(Transform::from_uniform_scale(3.0)));
        assert!(component.on_commit().unwrap());
    }

    #[test]
    fn test_copy_is_modified() {
        let mut component = TransformComponent::identity();
        component.on_commit().unwrap();
        let mut copy = component.clone();
        assert!(copy.on_commit().unwrap());
    }
}
