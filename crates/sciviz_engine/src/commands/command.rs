//! Scene mutations expressed as values

use crate::core::error::SceneResult;
use crate::ecs::components::SimulationComponent;
use crate::ecs::systems::geometry_view_mut;
use crate::ecs::Model;
use crate::foundation::math::Transform;
use crate::scene::Scene;

/// One mutation of the scene, applied between frames
#[derive(Debug)]
pub enum SceneCommand {
    /// Add a fully built model with one instance
    AddModel(Model),
    /// Add a clipping model
    AddClippingModel(Model),
    /// Add another instance of an existing model
    AddInstance {
        /// Instance whose model is shared
        source: u32,
    },
    /// Place an instance
    SetTransform {
        /// Instance id
        id: u32,
        /// New instance transform
        transform: Transform,
    },
    /// Show or hide an instance
    SetVisible {
        /// Instance id
        id: u32,
        /// Visibility
        visible: bool,
    },
    /// Show or hide an instance's bounding box
    SetBoundingBoxVisible {
        /// Instance id
        id: u32,
        /// Visibility
        visible: bool,
    },
    /// Change the uniform colour of a model's geometry
    SetColor {
        /// Instance id
        id: u32,
        /// RGBA colour
        color: [f32; 4],
    },
    /// Turn simulation colouring on or off
    EnableSimulation {
        /// Instance id
        id: u32,
        /// Whether simulation colours are applied
        enabled: bool,
    },
    /// Remove instances, all or none
    RemoveModels(Vec<u32>),
    /// Remove clipping models, all or none
    RemoveClippingModels(Vec<u32>),
    /// Remove everything
    Clear,
}

/// What a successful command produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Applied, nothing to report
    Done,
    /// Applied, creating the given id
    Id(u32),
}

impl SceneCommand {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddModel(_) => "add_model",
            Self::AddClippingModel(_) => "add_clipping_model",
            Self::AddInstance { .. } => "add_instance",
            Self::SetTransform { .. } => "set_transform",
            Self::SetVisible { .. } => "set_visible",
            Self::SetBoundingBoxVisible { .. } => "set_bounding_box_visible",
            Self::SetColor { .. } => "set_color",
            Self::EnableSimulation { .. } => "enable_simulation",
            Self::RemoveModels(_) => "remove_models",
            Self::RemoveClippingModels(_) => "remove_clipping_models",
            Self::Clear => "clear",
        }
    }

    /// Apply to `scene`. Nothing is committed here; changes reach the
    /// device with the next scene commit.
    pub fn apply(self, scene: &mut Scene) -> SceneResult<CommandOutcome> {
        let outcome = match self {
            Self::AddModel(model) => CommandOutcome::Id(scene.models_mut().add(model)?),
            Self::AddClippingModel(model) => {
                CommandOutcome::Id(scene.clip_manager_mut().add_clipping_model(model)?)
            }
            Self::AddInstance { source } => {
                CommandOutcome::Id(scene.models_mut().add_instance(source)?)
            }
            Self::SetTransform { id, transform } => {
                scene.models_mut().get_mut(id)?.set_transform(transform);
                CommandOutcome::Done
            }
            Self::SetVisible { id, visible } => {
                scene.models_mut().get_mut(id)?.set_visible(visible);
                CommandOutcome::Done
            }
            Self::SetBoundingBoxVisible { id, visible } => {
                scene.models_mut().get_mut(id)?.set_bounding_box_visible(visible);
                CommandOutcome::Done
            }
            Self::SetColor { id, color } => {
                let components = scene.models_mut().model_mut(id)?.components_mut();
                geometry_view_mut(components)?.set_color(color);
                CommandOutcome::Done
            }
            Self::EnableSimulation { id, enabled } => {
                let components = scene.models_mut().model_mut(id)?.components_mut();
                components.get_mut::<SimulationComponent>()?.set_enabled(enabled);
                CommandOutcome::Done
            }
            Self::RemoveModels(ids) => {
                scene.models_mut().remove_many(&ids)?;
                CommandOutcome::Done
            }
            Self::RemoveClippingModels(ids) => {
                scene.clip_manager_mut().remove_clipping_models(&ids)?;
                CommandOutcome::Done
            }
            Self::Clear => {
                scene.clear();
                CommandOutcome::Done
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceRef, HeadlessDevice};
    use crate::core::error::ErrorKind;
    use crate::ecs::components::{ColorRamp, Geometry, GeometryComponent, GeometryViewComponent, Sphere};
    use crate::foundation::math::Vec3;
    use std::sync::Arc;

    fn scene() -> Scene {
        let device: DeviceRef = Arc::new(HeadlessDevice::new());
        Scene::new(&device).unwrap()
    }

    fn spheres() -> Model {
        Model::new("spheres").with_component(GeometryComponent::new(Geometry::Spheres(vec![
            Sphere::new(Vec3::zeros(), 1.0),
        ])))
    }

    #[test]
    fn test_add_and_set_color() {
        let mut scene = scene();
        let outcome = SceneCommand::AddModel(spheres()).apply(&mut scene).unwrap();
        assert_eq!(outcome, CommandOutcome::Id(1));

        SceneCommand::SetColor {
            id: 1,
            color: [0.0, 1.0, 0.0, 1.0],
        }
        .apply(&mut scene)
        .unwrap();
        let view = scene
            .models()
            .model(1)
            .unwrap()
            .components()
            .get::<GeometryViewComponent>()
            .unwrap();
        assert_eq!(view.color(), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_ids_fail() {
        let mut scene = scene();
        let err = SceneCommand::SetVisible { id: 4, visible: false }
            .apply(&mut scene)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = SceneCommand::RemoveModels(vec![4]).apply(&mut scene).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_simulation_toggle_requires_component() {
        let mut scene = scene();
        SceneCommand::AddModel(spheres()).apply(&mut scene).unwrap();
        let err = SceneCommand::EnableSimulation { id: 1, enabled: true }
            .apply(&mut scene)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let model = spheres().with_component(SimulationComponent::new(vec![vec![0.5]], ColorRamp::default()));
        SceneCommand::AddModel(model).apply(&mut scene).unwrap();
        SceneCommand::EnableSimulation { id: 2, enabled: true }
            .apply(&mut scene)
            .unwrap();
        let simulation = scene
            .models()
            .model(2)
            .unwrap()
            .components()
            .get::<SimulationComponent>()
            .unwrap();
        assert!(simulation.is_enabled());
    }

    #[test]
    fn test_clipping_commands() {
        let mut scene = scene();
        let err = SceneCommand::AddClippingModel(spheres()).apply(&mut scene).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(SceneCommand::RemoveClippingModels(vec![1]).apply(&mut scene).is_err());
        assert_eq!(SceneCommand::Clear.apply(&mut scene).unwrap(), CommandOutcome::Done);
    }
}
