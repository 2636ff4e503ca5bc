//! Clipping planes
//!
//! Clipping geometry cuts away whatever lies on the positive side of each
//! plane. Models carrying it are managed by the scene's clip manager.

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::component::Component;
use crate::foundation::math::Vec3;
use crate::foundation::ModifiedFlag;
use crate::scene::RenderViews;

/// Plane `n . p + d = 0`, stored as `[nx, ny, nz, d]`
pub type Plane = [f32; 4];

/// Build a plane from a normal and a point on it
pub fn plane(normal: Vec3, point: Vec3) -> Plane {
    let n = normal.normalize();
    [n.x, n.y, n.z, -n.dot(&point)]
}

struct Natives {
    geometry: NativeObject,
    model: NativeObject,
}

/// Clipping planes of a model
pub struct ClipperComponent {
    planes: Vec<Plane>,
    invert_normals: bool,
    modified: ModifiedFlag,
    natives: Option<Natives>,
}

impl ClipperComponent {
    /// Component holding `planes`
    pub fn new(planes: Vec<Plane>) -> Self {
        Self {
            planes,
            invert_normals: false,
            modified: ModifiedFlag::modified(),
            natives: None,
        }
    }

    /// Current planes
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Replace the planes
    pub fn set_planes(&mut self, planes: Vec<Plane>) -> bool {
        self.modified.update(&mut self.planes, planes)
    }

    /// Whether the kept side is flipped
    pub fn invert_normals(&self) -> bool {
        self.invert_normals
    }

    /// Flip the kept side
    pub fn set_invert_normals(&mut self, invert: bool) -> bool {
        self.modified.update(&mut self.invert_normals, invert)
    }

    /// Handle of the clipping model, once started
    pub fn handle(&self) -> Option<NativeHandle> {
        self.natives.as_ref().map(|natives| natives.model.handle())
    }
}

impl Component for ClipperComponent {
    fn on_start(&mut self, device: &DeviceRef) -> SceneResult<()> {
        self.natives = Some(Natives {
            geometry: NativeObject::create(device, ObjectKind::Geometry)?,
            model: NativeObject::create(device, ObjectKind::GeometricModel)?,
        });
        Ok(())
    }

    fn on_commit(&mut self) -> SceneResult<bool> {
        if !self.modified.is_modified() {
            return Ok(false);
        }
        let natives = self
            .natives
            .as_ref()
            .ok_or_else(|| SceneError::NotInitialized("clipper used before start".to_string()))?;

        natives.geometry.set("type", ParamValue::String("plane".to_string()))?;
        natives.geometry.push("plane.coefficients", &self.planes)?;
        natives.geometry.commit()?;
        natives.model.set("geometry", ParamValue::Handle(natives.geometry.handle()))?;
        natives.model.set("invertNormals", ParamValue::Bool(self.invert_normals))?;
        natives.model.commit()?;

        self.modified.reset();
        Ok(true)
    }

    fn on_destroyed(&mut self) {
        self.natives = None;
    }

    fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + std::mem::size_of_val(self.planes.as_slice())
    }

    fn collect_views(&self, views: &mut RenderViews) {
        if let Some(handle) = self.handle() {
            views.clippers.push(handle);
        }
    }
}

impl std::fmt::Debug for ClipperComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipperComponent")
            .field("planes", &self.planes)
            .field("invert_normals", &self.invert_normals)
            .finish_non_exhaustive()
    }
}
