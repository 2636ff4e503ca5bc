//! Render objects and the frame trigger
//!
//! Camera, renderer and framebuffer each own one native object and commit
//! only when modified. [`FrameRenderer`] renders whatever is committed.

mod camera;
mod frame_renderer;
mod framebuffer;
mod renderer;

pub use camera::{Camera, Projection};
pub use frame_renderer::FrameRenderer;
pub use framebuffer::Framebuffer;
pub use renderer::Renderer;
