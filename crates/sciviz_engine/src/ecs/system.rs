//! Model systems
//!
//! Systems are stateless operations applied to a model's components once
//! per frame, always in the order init, update, commit.

use crate::core::error::SceneResult;
use crate::ecs::model::ModelInfo;
use crate::ecs::storage::Components;
use std::collections::BTreeMap;

/// Per-frame values handed to update systems and render hooks
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameParameters {
    /// Render loop iteration
    pub frame: u64,
    /// Simulation/animation frame selected by the user
    pub animation_frame: u32,
    /// Seconds since the previous iteration
    pub delta_time: f32,
}

/// Creates derived components that are not present yet
pub trait InitSystem: Send {
    /// Run the system
    fn execute(&self, components: &mut Components) -> SceneResult<()>;
}

/// Per-frame logic
pub trait UpdateSystem: Send {
    /// Run the system
    fn execute(&self, params: &FrameParameters, components: &mut Components) -> SceneResult<()>;
}

/// Cross-component synchronisation before the component commits
pub trait CommitSystem: Send {
    /// Run the system, returning whether anything changed
    fn execute(&self, components: &mut Components) -> SceneResult<bool>;
}

/// Key/value description of a model
pub type ModelProperties = BTreeMap<String, String>;

/// Describes a model for inspection
pub trait DataSystem: Send {
    /// Build the description
    fn properties(&self, info: &ModelInfo, components: &Components) -> ModelProperties;
}

/// Registry of the systems attached to one model
#[derive(Default)]
pub struct Systems {
    init: Vec<Box<dyn InitSystem>>,
    update: Vec<Box<dyn UpdateSystem>>,
    commit: Vec<Box<dyn CommitSystem>>,
    data: Option<Box<dyn DataSystem>>,
}

impl Systems {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an init system
    pub fn add_init<S: InitSystem + 'static>(&mut self, system: S) -> &mut Self {
        self.init.push(Box::new(system));
        self
    }

    /// Register an update system
    pub fn add_update<S: UpdateSystem + 'static>(&mut self, system: S) -> &mut Self {
        self.update.push(Box::new(system));
        self
    }

    /// Register a commit system
    pub fn add_commit<S: CommitSystem + 'static>(&mut self, system: S) -> &mut Self {
        self.commit.push(Box::new(system));
        self
    }

    /// Set the data system, replacing the previous one
    pub fn set_data<S: DataSystem + 'static>(&mut self, system: S) -> &mut Self {
        self.data = Some(Box::new(system));
        self
    }

    /// Run every init system
    pub fn run_init(&self, components: &mut Components) -> SceneResult<()> {
        for system in &self.init {
            system.execute(components)?;
        }
        Ok(())
    }

    /// Run every update system
    pub fn run_update(&self, params: &FrameParameters, components: &mut Components) -> SceneResult<()> {
        for system in &self.update {
            system.execute(params, components)?;
        }
        Ok(())
    }

    /// Run every commit system; all of them run even after one reports a change
    pub fn run_commit(&self, components: &mut Components) -> SceneResult<bool> {
        let mut changed = false;
        for system in &self.commit {
            changed |= system.execute(components)?;
        }
        Ok(changed)
    }

    /// Model description, empty without a data system
    pub fn properties(&self, info: &ModelInfo, components: &Components) -> ModelProperties {
        self.data
            .as_ref()
            .map(|system| system.properties(info, components))
            .unwrap_or_default()
    }

    /// Number of registered systems, data system included
    pub fn len(&self) -> usize {
        self.init.len() + self.update.len() + self.commit.len() + usize::from(self.data.is_some())
    }

    /// Whether no system is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
