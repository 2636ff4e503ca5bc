//! SciViz headless viewer
//!
//! Builds a demo scene on the in-process device, mutates it from a worker
//! thread through the command queue and renders a fixed number of frames.
//!
//! Usage: `viewer [config.toml|config.ron] [frames]`

mod demo_scene;

use demo_scene::{DemoIds, SIMULATION_FRAMES};
use sciviz_engine::config::ConfigError;
use sciviz_engine::foundation::logging;
use sciviz_engine::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_FRAMES: u64 = 60;

#[derive(Error, Debug)]
enum ViewerError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("scene: {0}")]
    Scene(#[from] SceneError),

    #[error("invalid frame count '{0}'")]
    FrameCount(String),

    #[error("worker thread panicked")]
    Worker,
}

/// Scripted edits, as a remote client would send them
fn run_worker(sender: &CommandSender, ids: DemoIds) -> Result<(), SceneError> {
    sender.submit(SceneCommand::EnableSimulation {
        id: ids.spheres,
        enabled: true,
    })?;

    let copy = match sender.execute(SceneCommand::AddInstance { source: ids.spheres })? {
        CommandOutcome::Id(id) => id,
        CommandOutcome::Done => return Ok(()),
    };
    log::info!("Worker added instance {}", copy);

    for step in 0..10_u8 {
        let offset = Vec3::new(0.0, 0.0, -4.0 - f32::from(step) * 0.5);
        sender.submit(SceneCommand::SetTransform {
            id: copy,
            transform: Transform::from_translation(offset),
        })?;
        if step % 3 == 0 {
            let shade = f32::from(step) / 10.0;
            sender.submit(SceneCommand::SetColor {
                id: ids.boxes,
                color: [shade, 0.5, 1.0 - shade, 1.0],
            })?;
        }
        thread::sleep(Duration::from_millis(5));
    }

    sender.submit(SceneCommand::SetVisible {
        id: ids.volume,
        visible: false,
    })?;
    sender.execute(SceneCommand::RemoveClippingModels(vec![ids.clip]))?;
    if let Err(err) = sender.execute(SceneCommand::RemoveModels(vec![copy, 999])) {
        log::info!("Rejected as expected: {}", err);
    }
    sender.execute(SceneCommand::RemoveModels(vec![copy]))?;
    Ok(())
}

fn main() -> Result<(), ViewerError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig::default(),
    };
    let frames = match args.next() {
        Some(text) => text.parse().map_err(|_| ViewerError::FrameCount(text))?,
        None => DEFAULT_FRAMES,
    };

    logging::init(&config.logging);
    log::info!("Starting SciViz viewer");

    let device: DeviceRef = Arc::new(HeadlessDevice::new());
    let mut engine = Engine::new(&config, device)?;
    let ids = demo_scene::populate(engine.scene_mut())?;
    log::info!("Lights are instance {}", ids.lights);
    engine.frame_scene();

    let sender = engine.command_sender();
    let worker = thread::spawn(move || run_worker(&sender, ids));

    let mut rendered = 0_u64;
    while rendered < frames || !worker.is_finished() {
        #[allow(clippy::cast_possible_truncation)]
        engine.set_animation_frame((rendered / 4 % u64::from(SIMULATION_FRAMES)) as u32);
        let report = engine.frame()?;
        rendered += 1;
        if report.scene.is_changed() || report.commands > 0 {
            log::info!(
                "Frame {}: {} command(s), {:?}, {} instance(s) recommitted",
                report.params.frame,
                report.commands,
                report.scene.flags,
                report.scene.changed_instances.len()
            );
        }
        log::debug!(
            "Frame {}: accumulation {}, variance {:.4}",
            report.stats.frame,
            report.stats.accumulation,
            report.stats.variance
        );
    }

    match worker.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::warn!("Worker stopped early: {}", err),
        Err(_) => return Err(ViewerError::Worker),
    }

    let in_flight = engine.frame_async()?;
    let last = engine.complete(in_flight)?;
    log::info!(
        "Rendered {} frame(s); last frame saw {} instance(s)",
        engine.framebuffer().frame_count(),
        last.stats.instance_count
    );
    for info in engine.scene().models().get_all() {
        log::info!(
            "  instance {} '{}' ({}) visible={} shared={}",
            info.id,
            info.name,
            info.model_type,
            info.visible,
            info.shared
        );
    }
    Ok(())
}
