//! Native rendering device contract
//!
//! The scene graph never talks to a renderer directly. It creates opaque
//! objects on a [`RenderDevice`], sets their parameters, pushes buffers and
//! commits them. The device has no partial update for list parameters, so
//! lists are always resubmitted whole.

use super::frame_future::FrameFuture;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors reported by a device
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Handle was never created or already released
    #[error("unknown native handle {0}")]
    UnknownHandle(u64),

    /// Handle exists but has the wrong type for the operation
    #[error("handle {handle} is a {actual:?}, expected {expected:?}")]
    WrongKind {
        /// Offending handle
        handle: u64,
        /// Kind the operation needed
        expected: ObjectKind,
        /// Kind of the object behind the handle
        actual: ObjectKind,
    },

    /// Device rejected the operation
    #[error("operation rejected: {0}")]
    Rejected(String),

    /// Internal device state is unusable after a panic
    #[error("device state poisoned")]
    Poisoned,

    /// Asynchronous frame was dropped before completion
    #[error("frame dropped before completion")]
    FrameDropped,
}

/// Opaque handle to a native object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Native object types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Primitive buffers (spheres, meshes, boxes, planes)
    Geometry,
    /// Geometry plus appearance
    GeometricModel,
    /// Surface material
    Material,
    /// Structured volume data
    Volume,
    /// Volume plus transfer function
    VolumetricModel,
    /// Light source
    Light,
    /// Per-model aggregate of views
    Group,
    /// Placed group
    Instance,
    /// Whole-frame aggregate of instances
    World,
    /// Camera
    Camera,
    /// Renderer settings
    Renderer,
    /// Framebuffer
    Framebuffer,
}

/// Parameter values understood by the device
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean
    Bool(bool),
    /// Unsigned integer
    UInt(u32),
    /// Float
    Float(f32),
    /// 3-component vector
    Vec3([f32; 3]),
    /// 4-component vector
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
    /// String
    String(String),
    /// Reference to another object
    Handle(NativeHandle),
    /// List of references, always submitted in full
    HandleList(Vec<NativeHandle>),
}

/// Everything needed to render one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    /// Committed camera
    pub camera: NativeHandle,
    /// Target framebuffer
    pub framebuffer: NativeHandle,
    /// Committed renderer
    pub renderer: NativeHandle,
    /// Committed world
    pub world: NativeHandle,
}

/// Outcome of a rendered frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Frames rendered by the device so far
    pub frame: u64,
    /// Accumulated frames in the target framebuffer
    pub accumulation: u32,
    /// Convergence estimate, lower is better
    pub variance: f32,
    /// Instances in the world at render time
    pub instance_count: usize,
}

/// Native rendering device
pub trait RenderDevice: Send + Sync {
    /// Create an object, uncommitted
    fn create_object(&self, kind: ObjectKind) -> DeviceResult<NativeHandle>;

    /// Stage a parameter for the next commit
    fn set_param(&self, handle: NativeHandle, name: &str, value: ParamValue) -> DeviceResult<()>;

    /// Stage a data buffer for the next commit
    fn push_buffer(&self, handle: NativeHandle, name: &str, data: &[u8]) -> DeviceResult<()>;

    /// Stage the removal of a parameter or buffer
    fn remove_param(&self, handle: NativeHandle, name: &str) -> DeviceResult<()>;

    /// Apply staged changes
    fn commit(&self, handle: NativeHandle) -> DeviceResult<()>;

    /// Destroy an object. Unknown handles are ignored.
    fn release(&self, handle: NativeHandle);

    /// Render a frame and wait for it
    fn render_frame(&self, request: &FrameRequest) -> DeviceResult<FrameStats>;

    /// Start rendering a frame
    fn render_frame_async(&self, request: &FrameRequest) -> DeviceResult<FrameFuture>;
}

/// Shared device reference
pub type DeviceRef = Arc<dyn RenderDevice>;

/// Exclusive owner of one native handle, released on drop.
pub struct NativeObject {
    device: DeviceRef,
    handle: NativeHandle,
    kind: ObjectKind,
}

impl NativeObject {
    /// Create a native object of `kind`
    pub fn create(device: &DeviceRef, kind: ObjectKind) -> DeviceResult<Self> {
        let handle = device.create_object(kind)?;
        log::trace!("Created {:?} {}", kind, handle);
        Ok(Self {
            device: Arc::clone(device),
            handle,
            kind,
        })
    }

    /// Handle usable in other objects' parameters
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Object type
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Stage a parameter
    pub fn set(&self, name: &str, value: ParamValue) -> DeviceResult<()> {
        self.device.set_param(self.handle, name, value)
    }

    /// Stage a buffer of plain data
    pub fn push<T: bytemuck::Pod>(&self, name: &str, data: &[T]) -> DeviceResult<()> {
        self.device.push_buffer(self.handle, name, bytemuck::cast_slice(data))
    }

    /// Stage the removal of a parameter or buffer
    pub fn remove(&self, name: &str) -> DeviceResult<()> {
        self.device.remove_param(self.handle, name)
    }

    /// Apply staged changes
    pub fn commit(&self) -> DeviceResult<()> {
        self.device.commit(self.handle)
    }

    /// Device owning the handle
    pub fn device(&self) -> &DeviceRef {
        &self.device
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObject")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Drop for NativeObject {
    fn drop(&mut self) {
        log::trace!("Releasing {:?} {}", self.kind, self.handle);
        self.device.release(self.handle);
    }
}
