//! # Camera
//!
//! Perspective or orthographic camera backed by one native camera object.
//! Setters only mark the camera modified; parameters reach the device on
//! the next [`Camera::commit`].

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::config::CameraConfig;
use crate::core::error::{SceneError, SceneResult};
use crate::foundation::math::Vec3;
use crate::foundation::{Bounds, ModifiedFlag};

/// Camera projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in degrees
        fovy: f32,
    },
    /// Orthographic projection
    Orthographic {
        /// Visible height in world units
        height: f32,
    },
}

impl Projection {
    fn device_type(self) -> &'static str {
        match self {
            Self::Perspective { .. } => "perspective",
            Self::Orthographic { .. } => "orthographic",
        }
    }
}

/// Scene camera
#[derive(Debug)]
pub struct Camera {
    projection: Projection,
    position: Vec3,
    target: Vec3,
    up: Vec3,
    aspect: f32,
    modified: ModifiedFlag,
    native: NativeObject,
}

impl Camera {
    /// Perspective camera at `position` looking at the origin
    pub fn perspective(device: &DeviceRef, position: Vec3, fovy: f32, aspect: f32) -> SceneResult<Self> {
        Ok(Self {
            projection: Projection::Perspective { fovy },
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            aspect,
            modified: ModifiedFlag::modified(),
            native: NativeObject::create(device, ObjectKind::Camera)?,
        })
    }

    /// Camera from its configuration section
    pub fn from_config(device: &DeviceRef, config: &CameraConfig, aspect: f32) -> SceneResult<Self> {
        let mut camera = Self::perspective(device, config.position(), config.fovy, aspect)?;
        camera.look_at(config.target(), config.up())?;
        if config.orthographic {
            let height = 2.0 * (config.position() - config.target()).norm() * (config.fovy.to_radians() * 0.5).tan();
            camera.set_projection(Projection::Orthographic { height });
        }
        Ok(camera)
    }

    /// Current projection
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Switch projection
    pub fn set_projection(&mut self, projection: Projection) -> bool {
        self.modified.update(&mut self.projection, projection)
    }

    /// Eye position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the eye
    pub fn set_position(&mut self, position: Vec3) -> bool {
        self.modified.update(&mut self.position, position)
    }

    /// Look-at target
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Change the aspect ratio, typically after a framebuffer resize
    pub fn set_aspect(&mut self, aspect: f32) -> bool {
        self.modified.update(&mut self.aspect, aspect)
    }

    /// Point the camera at `target`.
    ///
    /// Fails when the target is the eye position or `up` is parallel to the
    /// view direction.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) -> SceneResult<bool> {
        let direction = target - self.position;
        if direction.norm_squared() <= f32::EPSILON {
            return Err(SceneError::InvalidArgument("camera target equals position".to_string()));
        }
        if direction.cross(&up).norm_squared() <= f32::EPSILON {
            return Err(SceneError::InvalidArgument("camera up is parallel to view direction".to_string()));
        }
        let target_changed = self.modified.update(&mut self.target, target);
        let up_changed = self.modified.update(&mut self.up, up);
        Ok(target_changed || up_changed)
    }

    /// Normalized view direction
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Move the camera back along its view direction until `bounds` fit
    pub fn frame_bounds(&mut self, bounds: &Bounds) -> bool {
        if bounds.is_empty() {
            return false;
        }
        let direction = self.direction();
        let center = bounds.center();
        let radius = (bounds.dimensions().norm() * 0.5).max(f32::EPSILON);
        let projection = self.projection;
        let distance = match projection {
            Projection::Perspective { fovy } => radius / (fovy.to_radians() * 0.5).sin(),
            Projection::Orthographic { .. } => {
                self.modified
                    .update(&mut self.projection, Projection::Orthographic { height: 2.0 * radius });
                2.0 * radius
            }
        };
        let position = center - direction * distance;
        let moved = self.modified.update(&mut self.position, position);
        let retargeted = self.modified.update(&mut self.target, center);
        log::debug!("Camera framed bounds at distance {:.3}", distance);
        moved || retargeted
    }

    /// Whether there are uncommitted changes
    pub fn is_modified(&self) -> bool {
        self.modified.is_modified()
    }

    /// Native camera handle
    pub fn handle(&self) -> NativeHandle {
        self.native.handle()
    }

    /// Push parameters and commit if modified, returning whether it did
    pub fn commit(&mut self) -> SceneResult<bool> {
        if !self.modified.is_modified() {
            return Ok(false);
        }
        let native = &self.native;
        native.set("type", ParamValue::String(self.projection.device_type().to_string()))?;
        native.set("position", ParamValue::Vec3(self.position.into()))?;
        native.set("direction", ParamValue::Vec3(self.direction().into()))?;
        native.set("up", ParamValue::Vec3(self.up.into()))?;
        native.set("aspect", ParamValue::Float(self.aspect))?;
        match self.projection {
            Projection::Perspective { fovy } => native.set("fovy", ParamValue::Float(fovy))?,
            Projection::Orthographic { height } => native.set("height", ParamValue::Float(height))?,
        }
        native.commit()?;
        self.modified.reset();
        log::debug!("Committed camera {}", self.native.handle());
        Ok(true)
    }
}
