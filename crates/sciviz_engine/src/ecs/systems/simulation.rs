//! Simulation frame selection

use crate::core::error::SceneResult;
use crate::ecs::components::{GeometryViewComponent, SimulationComponent};
use crate::ecs::storage::Components;
use crate::ecs::system::{FrameParameters, UpdateSystem};

/// Follows the animation frame and recolours the geometry view.
///
/// The simulation stays modified until a view exists to receive the colours.
#[derive(Debug, Default)]
pub struct SimulationUpdateSystem;

impl UpdateSystem for SimulationUpdateSystem {
    fn execute(&self, params: &FrameParameters, components: &mut Components) -> SceneResult<()> {
        let Some(simulation) = components.find_mut::<SimulationComponent>() else {
            return Ok(());
        };
        simulation.select_frame(params.animation_frame);
        if !simulation.is_modified() {
            return Ok(());
        }
        let colors = simulation.colors();
        let Some(view) = components.find_mut::<GeometryViewComponent>() else {
            return Ok(());
        };
        view.set_colors(colors);
        components.get_mut::<SimulationComponent>()?.mark_applied();
        log::trace!("Simulation frame {} applied", params.animation_frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{ColorRamp, GeometryKind};

    fn components() -> Components {
        let mut components = Components::new();
        components.add(GeometryViewComponent::new(GeometryKind::Spheres));
        components.add(SimulationComponent::new(
            vec![vec![0.0, 0.0], vec![1.0, 1.0]],
            ColorRamp::default(),
        ));
        components
    }

    fn params(animation_frame: u32) -> FrameParameters {
        FrameParameters {
            animation_frame,
            ..FrameParameters::default()
        }
    }

    #[test]
    fn test_disabled_simulation_leaves_view() {
        let mut components = components();
        SimulationUpdateSystem.execute(&params(1), &mut components).unwrap();
        assert!(components.get::<GeometryViewComponent>().unwrap().colors().is_none());
    }

    #[test]
    fn test_enabled_simulation_follows_frame() {
        let mut components = components();
        components.get_mut::<SimulationComponent>().unwrap().set_enabled(true);

        SimulationUpdateSystem.execute(&params(0), &mut components).unwrap();
        let view = components.get::<GeometryViewComponent>().unwrap();
        assert_eq!(view.colors().unwrap()[0], [0.0, 0.0, 1.0, 1.0]);

        SimulationUpdateSystem.execute(&params(1), &mut components).unwrap();
        let view = components.get::<GeometryViewComponent>().unwrap();
        assert_eq!(view.colors().unwrap()[1], [1.0, 0.0, 0.0, 1.0]);
        assert!(!components.get::<SimulationComponent>().unwrap().is_modified());
    }

    #[test]
    fn test_disabling_clears_colors() {
        let mut components = components();
        components.get_mut::<SimulationComponent>().unwrap().set_enabled(true);
        SimulationUpdateSystem.execute(&params(0), &mut components).unwrap();
        components.get_mut::<SimulationComponent>().unwrap().set_enabled(false);
        SimulationUpdateSystem.execute(&params(0), &mut components).unwrap();
        assert!(components.get::<GeometryViewComponent>().unwrap().colors().is_none());
    }
}
