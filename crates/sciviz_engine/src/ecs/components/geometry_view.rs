//! Native side of a model's geometry
//!
//! Owns the device geometry and the geometric model binding it to an
//! appearance (colour, per-primitive colours, material). Buffers are staged
//! by [`GeometryViewComponent::upload`] and only committed in `on_commit`.

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::component::{Attachment, Component};
use crate::ecs::components::geometry::{Geometry, GeometryKind};
use crate::foundation::ModifiedFlag;
use crate::scene::RenderViews;

/// Colour used until something else is set
pub const DEFAULT_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

struct Natives {
    geometry: NativeObject,
    model: NativeObject,
}

/// Geometry and geometric model on the device
pub struct GeometryViewComponent {
    kind: GeometryKind,
    primitive_count: usize,
    color: [f32; 4],
    colors: Option<Vec<[f32; 4]>>,
    material: Option<NativeHandle>,
    geometry_modified: ModifiedFlag,
    appearance_modified: ModifiedFlag,
    natives: Option<Natives>,
    attachment: Attachment,
}

impl GeometryViewComponent {
    /// A view for geometry of `kind`, with the default colour
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            primitive_count: 0,
            color: DEFAULT_COLOR,
            colors: None,
            material: None,
            geometry_modified: ModifiedFlag::new(),
            appearance_modified: ModifiedFlag::modified(),
            natives: None,
            attachment: Attachment::new(),
        }
    }

    /// Primitive family
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Primitives uploaded so far
    pub fn primitive_count(&self) -> usize {
        self.primitive_count
    }

    /// Uniform colour
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Set the uniform colour, returning whether it changed
    pub fn set_color(&mut self, color: [f32; 4]) -> bool {
        self.appearance_modified.update(&mut self.color, color)
    }

    /// Per-primitive colours, overriding the uniform colour
    pub fn colors(&self) -> Option<&[[f32; 4]]> {
        self.colors.as_deref()
    }

    /// Set or clear per-primitive colours
    pub fn set_colors(&mut self, colors: Option<Vec<[f32; 4]>>) -> bool {
        self.appearance_modified.update(&mut self.colors, colors)
    }

    /// Material bound to the geometric model
    pub fn material(&self) -> Option<NativeHandle> {
        self.material
    }

    /// Bind a material
    pub fn set_material(&mut self, material: Option<NativeHandle>) -> bool {
        self.appearance_modified.update(&mut self.material, material)
    }

    /// Whether anything is waiting for the next commit
    pub fn is_modified(&self) -> bool {
        self.geometry_modified.is_modified() || self.appearance_modified.is_modified()
    }

    /// Handle of the geometric model, once started
    pub fn handle(&self) -> Option<NativeHandle> {
        self.natives.as_ref().map(|natives| natives.model.handle())
    }

    /// Handle of the native geometry, once started
    pub fn geometry_handle(&self) -> Option<NativeHandle> {
        self.natives.as_ref().map(|natives| natives.geometry.handle())
    }

    /// Stage primitive buffers on the native geometry.
    ///
    /// Nothing is visible to the device until the next commit.
    pub fn upload(&mut self, geometry: &Geometry) -> SceneResult<()> {
        let natives = self.natives()?;
        let target = &natives.geometry;
        target.set("type", ParamValue::String(geometry.kind().device_type().to_string()))?;
        match geometry {
            Geometry::Spheres(spheres) => target.push("sphere", spheres)?,
            Geometry::Mesh(mesh) => {
                target.push("vertex.position", &mesh.positions)?;
                if !mesh.normals.is_empty() {
                    target.push("vertex.normal", &mesh.normals)?;
                }
                target.push("index", &mesh.indices)?;
            }
            Geometry::Boxes(boxes) => target.push("box", boxes)?,
        }
        self.kind = geometry.kind();
        self.primitive_count = geometry.primitive_count();
        self.geometry_modified.set_modified();
        Ok(())
    }

    fn natives(&self) -> SceneResult<&Natives> {
        self.natives.as_ref().ok_or_else(|| {
            SceneError::NotInitialized("geometry view used before start".to_string())
        })
    }
}

impl Component for GeometryViewComponent {
    fn on_start(&mut self, device: &DeviceRef) -> SceneResult<()> {
        let geometry = NativeObject::create(device, ObjectKind::Geometry)?;
        let model = NativeObject::create(device, ObjectKind::GeometricModel)?;
        self.natives = Some(Natives { geometry, model });
        Ok(())
    }

    fn on_commit(&mut self) -> SceneResult<bool> {
        if !self.is_modified() {
            return Ok(false);
        }
        let natives = self.natives()?;
        if self.geometry_modified.is_modified() {
            natives.geometry.commit()?;
        }

        let model = &natives.model;
        model.set("geometry", ParamValue::Handle(natives.geometry.handle()))?;
        model.set("color", ParamValue::Vec4(self.color))?;
        match &self.colors {
            Some(colors) => model.push("color.primitive", colors)?,
            None => model.remove("color.primitive")?,
        }
        match self.material {
            Some(material) => model.set("material", ParamValue::Handle(material))?,
            None => model.remove("material")?,
        }
        model.commit()?;

        self.geometry_modified.reset();
        self.appearance_modified.reset();
        Ok(true)
    }

    fn on_destroyed(&mut self) {
        self.natives = None;
    }

    fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.colors.as_ref().map_or(0, |c| std::mem::size_of_val(c.as_slice()))
    }

    fn collect_views(&self, views: &mut RenderViews) {
        if let Some(handle) = self.handle() {
            views.geometries.push(handle);
        }
    }

    fn attachment(&self) -> Option<&Attachment> {
        Some(&self.attachment)
    }
}

impl Clone for GeometryViewComponent {
    /// The copy has no native objects and is fully dirty
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            primitive_count: self.primitive_count,
            color: self.color,
            colors: self.colors.clone(),
            material: self.material,
            geometry_modified: self.geometry_modified.clone(),
            appearance_modified: self.appearance_modified.clone(),
            natives: None,
            attachment: self.attachment.clone(),
        }
    }
}

impl std::fmt::Debug for GeometryViewComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryViewComponent")
            .field("kind", &self.kind)
            .field("primitive_count", &self.primitive_count)
            .field("color", &self.color)
            .field("handle", &self.handle())
            .finish_non_exhaustive()
    }
}
