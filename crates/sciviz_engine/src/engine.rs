//! Core engine implementation
//!
//! The engine owns the scene and the render objects and runs the frame
//! cycle: apply queued commands, update, commit, render.

use crate::backend::{DeviceRef, FrameFuture, FrameStats};
use crate::commands::{CommandQueue, CommandSender};
use crate::core::config::EngineConfig;
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::FrameParameters;
use crate::render::{Camera, FrameRenderer, Framebuffer, Renderer};
use crate::scene::{Scene, SceneCommit};
use std::time::Instant;

/// What one frame did
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Parameters the frame ran with
    pub params: FrameParameters,
    /// Commands applied before the update
    pub commands: usize,
    /// Scene commit result
    pub scene: SceneCommit,
    /// Whether the camera was recommitted
    pub camera_changed: bool,
    /// Whether the renderer was recommitted
    pub renderer_changed: bool,
    /// Whether accumulated samples were discarded
    pub accumulation_reset: bool,
    /// Device statistics
    pub stats: FrameStats,
}

/// A frame the device is still rendering
#[derive(Debug)]
pub struct InFlightFrame {
    future: FrameFuture,
    params: FrameParameters,
    commands: usize,
    scene: SceneCommit,
    camera_changed: bool,
    renderer_changed: bool,
    accumulation_reset: bool,
}

impl InFlightFrame {
    /// Poll the device without blocking
    pub fn is_ready(&mut self) -> bool {
        self.future.is_ready()
    }
}

struct Prepared {
    params: FrameParameters,
    commands: usize,
    scene: SceneCommit,
    camera_changed: bool,
    renderer_changed: bool,
    accumulation_reset: bool,
}

/// Main engine struct
///
/// Mutation from other threads goes through [`Engine::command_sender`];
/// everything else happens on the thread calling [`Engine::frame`].
pub struct Engine {
    device: DeviceRef,
    scene: Scene,
    camera: Camera,
    renderer: Renderer,
    framebuffer: Framebuffer,
    frame_renderer: FrameRenderer,
    commands: CommandQueue,
    frame: u64,
    animation_frame: u32,
    last_frame: Option<Instant>,
}

impl Engine {
    /// Create an engine rendering on `device`
    pub fn new(config: &EngineConfig, device: DeviceRef) -> SceneResult<Self> {
        log::info!("Initializing engine...");
        config
            .validate()
            .map_err(|err| SceneError::InvalidArgument(err.to_string()))?;

        let framebuffer = Framebuffer::new(&device, &config.framebuffer)?;
        let camera = Camera::from_config(&device, &config.camera, framebuffer.aspect())?;
        let renderer = Renderer::new(&device, config.renderer.clone())?;
        let scene = Scene::new(&device)?;
        let (width, height) = framebuffer.size();
        log::info!("Engine ready ({}x{})", width, height);

        Ok(Self {
            frame_renderer: FrameRenderer::new(std::sync::Arc::clone(&device)),
            device,
            scene,
            camera,
            renderer,
            framebuffer,
            commands: CommandQueue::new(),
            frame: 0,
            animation_frame: 0,
            last_frame: None,
        })
    }

    /// Rendering device
    pub fn device(&self) -> &DeviceRef {
        &self.device
    }

    /// Scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene, for the thread running the loop
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Renderer settings
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Mutable renderer settings
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Framebuffer
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Resize the framebuffer and keep the camera aspect in step
    pub fn resize(&mut self, width: u32, height: u32) -> SceneResult<bool> {
        if !self.framebuffer.resize(width, height)? {
            return Ok(false);
        }
        self.camera.set_aspect(self.framebuffer.aspect());
        Ok(true)
    }

    /// Handle for submitting commands from any thread
    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Simulation frame shown
    pub fn animation_frame(&self) -> u32 {
        self.animation_frame
    }

    /// Select the simulation frame shown from the next frame on
    pub fn set_animation_frame(&mut self, animation_frame: u32) {
        self.animation_frame = animation_frame;
    }

    /// Move the camera so every visible instance is in view
    pub fn frame_scene(&mut self) -> bool {
        let bounds = self.scene.compute_bounds();
        self.camera.frame_bounds(&bounds)
    }

    fn next_params(&mut self) -> FrameParameters {
        let now = Instant::now();
        let delta_time = self
            .last_frame
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_frame = Some(now);
        self.frame += 1;
        FrameParameters {
            frame: self.frame,
            animation_frame: self.animation_frame,
            delta_time,
        }
    }

    fn prepare(&mut self) -> SceneResult<Prepared> {
        let commands = self.commands.drain(&mut self.scene);
        let params = self.next_params();

        self.scene.update(&params)?;
        let scene = self.scene.commit()?;
        if scene.is_changed() {
            self.framebuffer.reset_accumulation();
        }
        let camera_changed = self.camera.commit()?;
        let renderer_changed = self.renderer.commit()?;
        if camera_changed || renderer_changed {
            self.framebuffer.reset_accumulation();
        }

        let accumulation_reset = self.framebuffer.is_modified();
        self.framebuffer.commit()?;
        self.scene.pre_render(&params);

        Ok(Prepared {
            params,
            commands,
            scene,
            camera_changed,
            renderer_changed,
            accumulation_reset,
        })
    }

    /// Run one frame and wait for the device
    pub fn frame(&mut self) -> SceneResult<FrameReport> {
        let prepared = self.prepare()?;
        let stats = self.frame_renderer.synchronous(
            &self.camera,
            &mut self.framebuffer,
            &self.renderer,
            &self.scene,
        )?;
        self.scene.post_render(&prepared.params);
        log::trace!("Frame {} done", prepared.params.frame);

        Ok(FrameReport {
            params: prepared.params,
            commands: prepared.commands,
            scene: prepared.scene,
            camera_changed: prepared.camera_changed,
            renderer_changed: prepared.renderer_changed,
            accumulation_reset: prepared.accumulation_reset,
            stats,
        })
    }

    /// Run one frame up to the render call and return without waiting.
    ///
    /// Hand the result to [`Engine::complete`] before the next frame.
    pub fn frame_async(&mut self) -> SceneResult<InFlightFrame> {
        let prepared = self.prepare()?;
        let future = self.frame_renderer.asynchronous(
            &self.camera,
            &mut self.framebuffer,
            &self.renderer,
            &self.scene,
        )?;
        Ok(InFlightFrame {
            future,
            params: prepared.params,
            commands: prepared.commands,
            scene: prepared.scene,
            camera_changed: prepared.camera_changed,
            renderer_changed: prepared.renderer_changed,
            accumulation_reset: prepared.accumulation_reset,
        })
    }

    /// Wait for an in-flight frame and run the post-render stage
    pub fn complete(&mut self, frame: InFlightFrame) -> SceneResult<FrameReport> {
        let stats = frame.future.wait()?;
        self.scene.post_render(&frame.params);
        Ok(FrameReport {
            params: frame.params,
            commands: frame.commands,
            scene: frame.scene,
            camera_changed: frame.camera_changed,
            renderer_changed: frame.renderer_changed,
            accumulation_reset: frame.accumulation_reset,
            stats,
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("frame", &self.frame)
            .field("scene", &self.scene)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;
    use crate::commands::{CommandOutcome, SceneCommand};
    use crate::core::error::ErrorKind;
    use crate::ecs::components::{Geometry, GeometryComponent, Sphere};
    use crate::ecs::Model;
    use crate::foundation::math::Vec3;
    use crate::scene::ChangeFlags;
    use std::sync::Arc;

    fn engine() -> (HeadlessDevice, Engine) {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let engine = Engine::new(&EngineConfig::default(), device).unwrap();
        (headless, engine)
    }

    fn spheres() -> Model {
        Model::new("spheres").with_component(GeometryComponent::new(Geometry::Spheres(vec![
            Sphere::new(Vec3::zeros(), 1.0),
        ])))
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.framebuffer.height = 0;
        let err = Engine::new(&config, Arc::new(HeadlessDevice::new())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_accumulation_until_scene_changes() {
        let (_headless, mut engine) = engine();
        let first = engine.frame().unwrap();
        assert!(first.accumulation_reset);
        assert!(first.camera_changed && first.renderer_changed);
        assert_eq!(first.stats.accumulation, 1);

        let idle = engine.frame().unwrap();
        assert!(!idle.accumulation_reset);
        assert_eq!(idle.stats.accumulation, 2);

        let sender = engine.command_sender();
        let reply = sender.request(SceneCommand::AddModel(spheres())).unwrap();
        let changed = engine.frame().unwrap();
        assert_eq!(reply.wait().unwrap(), CommandOutcome::Id(1));
        assert_eq!(changed.commands, 1);
        assert!(changed.scene.flags.contains(ChangeFlags::STRUCTURE));
        assert!(changed.accumulation_reset);
        assert_eq!(changed.stats.accumulation, 1);
        assert_eq!(changed.stats.instance_count, 1);
    }

    #[test]
    fn test_color_command_resets_accumulation() {
        let (_headless, mut engine) = engine();
        engine.scene_mut().models_mut().add(spheres()).unwrap();
        engine.frame().unwrap();
        engine.frame().unwrap();

        engine
            .command_sender()
            .submit(SceneCommand::SetColor {
                id: 1,
                color: [0.5, 0.5, 0.5, 1.0],
            })
            .unwrap();
        let report = engine.frame().unwrap();
        assert_eq!(report.scene.changed_instances, vec![1]);
        assert_eq!(report.scene.flags, ChangeFlags::DATA);
        assert_eq!(report.stats.accumulation, 1);
    }

    #[test]
    fn test_failed_camera_commit_keeps_scene_reset() {
        let (headless, mut engine) = engine();
        engine.frame().unwrap();
        engine.frame().unwrap();

        engine.scene_mut().models_mut().add(spheres()).unwrap();
        engine.camera_mut().set_position(Vec3::new(0.0, 0.0, 8.0));
        headless.fail_commits_of(engine.camera().handle());
        assert!(engine.frame().is_err());
        assert!(engine.framebuffer().is_modified());

        headless.clear_failures();
        let retry = engine.frame().unwrap();
        assert!(retry.accumulation_reset);
        assert!(retry.camera_changed);
        assert_eq!(retry.stats.accumulation, 1);
        assert_eq!(retry.stats.instance_count, 1);
    }

    #[test]
    fn test_async_frame() {
        let (headless, mut engine) = engine();
        engine.scene_mut().models_mut().add(spheres()).unwrap();
        let in_flight = engine.frame_async().unwrap();
        let report = engine.complete(in_flight).unwrap();
        assert_eq!(report.params.frame, 1);
        assert_eq!(report.stats.instance_count, 1);
        assert_eq!(headless.frame_count(), 1);
        assert_eq!(engine.framebuffer().frame_count(), 1);
    }

    #[test]
    fn test_resize_updates_camera_aspect() {
        let (_headless, mut engine) = engine();
        engine.frame().unwrap();
        assert!(engine.resize(400, 400).unwrap());
        assert_eq!(engine.camera().aspect(), 1.0);
        let report = engine.frame().unwrap();
        assert!(report.camera_changed);
        assert_eq!(report.stats.accumulation, 1);
    }

    #[test]
    fn test_animation_frame_passed_to_systems() {
        let (_headless, mut engine) = engine();
        engine.set_animation_frame(3);
        let report = engine.frame().unwrap();
        assert_eq!(report.params.animation_frame, 3);
        assert_eq!(report.params.delta_time, 0.0);
        assert_eq!(engine.frame().unwrap().params.frame, 2);
    }
}
