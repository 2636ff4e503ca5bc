//! Model / component / system container
//!
//! A [`Model`] owns one [`Components`] storage and one [`Systems`] registry.
//! Systems run init, update, commit in that order every frame.

pub mod component;
pub mod components;
pub mod model;
pub mod storage;
pub mod system;
pub mod systems;

pub use component::{AsAny, Attachment, Component};
pub use model::{Model, ModelInfo};
pub use storage::Components;
pub use system::{
    CommitSystem, DataSystem, FrameParameters, InitSystem, ModelProperties, Systems, UpdateSystem,
};
