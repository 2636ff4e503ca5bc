//! Frame trigger
//!
//! The frame renderer does no change tracking of its own. Callers commit
//! the scene, camera, renderer and framebuffer first; this only asks the
//! device to render what is committed.

use crate::backend::{DeviceRef, FrameFuture, FrameRequest, FrameStats};
use crate::core::error::SceneResult;
use crate::render::{Camera, Framebuffer, Renderer};
use crate::scene::Scene;

/// Issues render calls on a device
#[derive(Clone)]
pub struct FrameRenderer {
    device: DeviceRef,
}

impl FrameRenderer {
    /// Renderer for `device`
    pub fn new(device: DeviceRef) -> Self {
        Self { device }
    }

    fn request(camera: &Camera, framebuffer: &Framebuffer, renderer: &Renderer, scene: &Scene) -> FrameRequest {
        FrameRequest {
            camera: camera.handle(),
            framebuffer: framebuffer.handle(),
            renderer: renderer.handle(),
            world: scene.world_handle(),
        }
    }

    /// Render a frame and block until the device is done
    pub fn synchronous(
        &self,
        camera: &Camera,
        framebuffer: &mut Framebuffer,
        renderer: &Renderer,
        scene: &Scene,
    ) -> SceneResult<FrameStats> {
        let request = Self::request(camera, framebuffer, renderer, scene);
        let stats = self.device.render_frame(&request)?;
        framebuffer.frame_rendered();
        log::trace!("Rendered frame {} ({} accumulated)", stats.frame, stats.accumulation);
        Ok(stats)
    }

    /// Start a frame and return a waitable handle. The handle may be
    /// dropped without waiting.
    pub fn asynchronous(
        &self,
        camera: &Camera,
        framebuffer: &mut Framebuffer,
        renderer: &Renderer,
        scene: &Scene,
    ) -> SceneResult<FrameFuture> {
        let request = Self::request(camera, framebuffer, renderer, scene);
        let future = self.device.render_frame_async(&request)?;
        framebuffer.frame_rendered();
        Ok(future)
    }
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer").finish_non_exhaustive()
    }
}
