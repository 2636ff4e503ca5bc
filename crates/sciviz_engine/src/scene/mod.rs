//! Scene composition
//!
//! ```text
//! Model ──components──▶ RenderGroup ──▶ ModelInstance ─┐
//!                                                      ├─▶ Scene (world)
//! ClipManager ──────────────────────────▶ ModelInstance ┘
//! ```
//!
//! Every level commits only when something below it reported a change.

mod clip_manager;
mod instance;
mod model_manager;
mod render_group;
mod scene_graph;

#[cfg(test)]
mod tests;

pub use clip_manager::ClipManager;
pub use instance::ModelInstance;
pub use model_manager::{InstanceInfo, ManagerCommit, ModelKey, ModelManager};
pub use render_group::{RenderGroup, RenderViews};
pub use scene_graph::{Scene, SceneCommit};

bitflags::bitflags! {
    /// Kinds of change reported by a commit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChangeFlags: u8 {
        /// The set of instances changed; lists must be resubmitted
        const STRUCTURE = 1 << 0;
        /// Committed data changed without affecting any list
        const DATA = 1 << 1;
    }
}

impl Default for ChangeFlags {
    fn default() -> Self {
        Self::empty()
    }
}
