//! Raw geometry data
//!
//! The CPU-side primitives a loader hands over. This component never touches
//! the device: [`GeometryViewComponent`](super::GeometryViewComponent) owns
//! the native side and the geometry commit system moves data across.

use crate::ecs::component::Component;
use crate::foundation::math::{Mat4, Vec3};
use crate::foundation::{Bounds, ModifiedFlag};
use bytemuck::{Pod, Zeroable};

/// Sphere primitive, laid out as the device buffer expects
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Sphere {
    /// Centre
    pub center: [f32; 3],
    /// Radius
    pub radius: f32,
}

impl Sphere {
    /// Create a sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center: center.into(),
            radius,
        }
    }

    fn bounds(&self) -> Bounds {
        let center = Vec3::from(self.center);
        let extents = Vec3::repeat(self.radius.abs());
        Bounds::from_points([center - extents, center + extents])
    }
}

/// Axis-aligned box primitive
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BoxPrimitive {
    /// Lower corner
    pub min: [f32; 3],
    /// Upper corner
    pub max: [f32; 3],
}

impl BoxPrimitive {
    /// Create a box from two corners, in any order
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b).into(),
            max: a.sup(&b).into(),
        }
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals, empty if absent
    pub normals: Vec<[f32; 3]>,
    /// Triangle vertex indices
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create a mesh without normals
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            indices,
        }
    }
}

/// Primitive family of a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Spheres
    Spheres,
    /// Triangle mesh
    Mesh,
    /// Axis-aligned boxes
    Boxes,
}

impl GeometryKind {
    /// Type name set on the native geometry
    pub fn device_type(self) -> &'static str {
        match self {
            Self::Spheres => "sphere",
            Self::Mesh => "mesh",
            Self::Boxes => "box",
        }
    }
}

/// Raw primitives of one model
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Sphere list
    Spheres(Vec<Sphere>),
    /// Triangle mesh
    Mesh(TriangleMesh),
    /// Box list
    Boxes(Vec<BoxPrimitive>),
}

impl Geometry {
    /// Primitive family
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Spheres(_) => GeometryKind::Spheres,
            Self::Mesh(_) => GeometryKind::Mesh,
            Self::Boxes(_) => GeometryKind::Boxes,
        }
    }

    /// Number of primitives (triangles for a mesh)
    pub fn primitive_count(&self) -> usize {
        match self {
            Self::Spheres(spheres) => spheres.len(),
            Self::Mesh(mesh) => mesh.indices.len(),
            Self::Boxes(boxes) => boxes.len(),
        }
    }

    /// Whether there is nothing to render
    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }

    /// Bounds in model space
    pub fn local_bounds(&self) -> Bounds {
        match self {
            Self::Spheres(spheres) => spheres
                .iter()
                .fold(Bounds::empty(), |acc, sphere| acc.union(&sphere.bounds())),
            Self::Mesh(mesh) => Bounds::from_points(mesh.positions.iter().copied().map(Vec3::from)),
            Self::Boxes(boxes) => Bounds::from_points(
                boxes
                    .iter()
                    .flat_map(|b| [Vec3::from(b.min), Vec3::from(b.max)]),
            ),
        }
    }

    /// Size of the primitive buffers
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Spheres(spheres) => std::mem::size_of_val(spheres.as_slice()),
            Self::Mesh(mesh) => {
                std::mem::size_of_val(mesh.positions.as_slice())
                    + std::mem::size_of_val(mesh.normals.as_slice())
                    + std::mem::size_of_val(mesh.indices.as_slice())
            }
            Self::Boxes(boxes) => std::mem::size_of_val(boxes.as_slice()),
        }
    }
}

/// Raw geometry of a model
#[derive(Debug, Clone)]
pub struct GeometryComponent {
    geometry: Geometry,
    modified: ModifiedFlag,
}

impl GeometryComponent {
    /// Wrap geometry; it counts as modified until first synchronised
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            modified: ModifiedFlag::modified(),
        }
    }

    /// Raw primitives
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Replace the primitives, returning whether they changed
    pub fn set_geometry(&mut self, geometry: Geometry) -> bool {
        self.modified.update(&mut self.geometry, geometry)
    }

    /// Whether the data changed since the view last took it
    pub fn is_modified(&self) -> bool {
        self.modified.is_modified()
    }

    pub(crate) fn mark_synchronized(&mut self) {
        self.modified.reset();
    }
}

impl Component for GeometryComponent {
    fn compute_bounds(&self, matrix: &Mat4) -> Option<Bounds> {
        let bounds = self.geometry.local_bounds();
        (!bounds.is_empty()).then(|| bounds.transformed(matrix))
    }

    fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.geometry.byte_size()
    }
}
