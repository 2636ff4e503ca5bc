//! Systems shipped with the engine

pub mod geometry;
pub mod simulation;
pub mod summary;

pub use geometry::{geometry_view_mut, GeometryCommitSystem, GeometryInitSystem};
pub use simulation::SimulationUpdateSystem;
pub use summary::SummaryDataSystem;

use crate::ecs::system::Systems;

/// Registry with every built-in system; each one skips models it does not apply to
pub fn standard_systems() -> Systems {
    let mut systems = Systems::new();
    systems
        .add_init(GeometryInitSystem)
        .add_update(SimulationUpdateSystem)
        .add_commit(GeometryCommitSystem)
        .set_data(SummaryDataSystem);
    systems
}
