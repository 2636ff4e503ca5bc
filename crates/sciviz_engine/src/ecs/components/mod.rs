//! Components shipped with the engine

pub mod clipper;
pub mod geometry;
pub mod geometry_view;
pub mod light;
pub mod material;
pub mod metadata;
pub mod simulation;
pub mod transform;
pub mod volume;

pub use clipper::{plane, ClipperComponent, Plane};
pub use geometry::{BoxPrimitive, Geometry, GeometryComponent, GeometryKind, Sphere, TriangleMesh};
pub use geometry_view::{GeometryViewComponent, DEFAULT_COLOR};
pub use light::{Light, LightComponent};
pub use material::{Material, MaterialComponent};
pub use metadata::MetadataComponent;
pub use simulation::{ColorRamp, SimulationComponent};
pub use transform::TransformComponent;
pub use volume::{RegularGrid, TransferFunction, VolumeComponent};
