//! # SciViz Engine
//!
//! Scene graph and commit pipeline for retained-mode scientific rendering.
//!
//! ## Features
//!
//! - **Model / component / system container**: type-indexed components with
//!   init, update and commit systems per model
//! - **Dirty tracking**: only modified components push to the device; render
//!   groups and the world recompose only on change
//! - **Instancing**: stable `u32` ids with LIFO reuse, shared models
//! - **Clipping**: scene-wide clipping models with their own id space
//! - **Command queue**: cross-thread scene mutation serialised with the loop
//! - **Headless device**: in-process backend recording every native call
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sciviz_engine::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), SceneError> {
//!     let device: DeviceRef = Arc::new(HeadlessDevice::new());
//!     let mut engine = Engine::new(&EngineConfig::default(), device)?;
//!     let spheres = Geometry::Spheres(vec![Sphere::new(Vec3::zeros(), 1.0)]);
//!     engine
//!         .scene_mut()
//!         .models_mut()
//!         .add(Model::new("spheres").with_component(GeometryComponent::new(spheres)))?;
//!     let report = engine.frame()?;
//!     println!("{} instance(s)", report.stats.instance_count);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod commands;
pub mod config;
pub mod core;
pub mod ecs;
pub mod foundation;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{Engine, FrameReport, InFlightFrame};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        backend::{DeviceRef, FrameStats, HeadlessDevice, RenderDevice},
        commands::{CommandOutcome, CommandSender, SceneCommand},
        config::Config,
        core::{EngineConfig, ErrorKind, SceneError, SceneResult},
        ecs::{
            components::{
                ClipperComponent, Geometry, GeometryComponent, GeometryViewComponent, Light,
                LightComponent, Material, MaterialComponent, MetadataComponent,
                SimulationComponent, Sphere, TransformComponent, VolumeComponent,
            },
            Component, FrameParameters, Model,
        },
        foundation::{
            math::{Mat4, Transform, Vec3},
            Bounds,
        },
        render::{Camera, Framebuffer, Projection, Renderer},
        scene::{ChangeFlags, Scene, SceneCommit},
        Engine, FrameReport,
    };
}
