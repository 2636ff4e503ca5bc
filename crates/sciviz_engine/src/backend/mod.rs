//! Rendering device abstraction
//!
//! [`RenderDevice`] is the contract every backend implements;
//! [`HeadlessDevice`] is the in-process implementation used by the viewer
//! and the test-suite.

mod device;
mod frame_future;
mod headless;

pub use device::{
    DeviceError, DeviceRef, DeviceResult, FrameRequest, FrameStats, NativeHandle, NativeObject,
    ObjectKind, ParamValue, RenderDevice,
};
pub use frame_future::{FrameCompleter, FrameFuture};
pub use headless::HeadlessDevice;
