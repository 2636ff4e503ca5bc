//! Demo scene content

use sciviz_engine::ecs::components::{
    plane, BoxPrimitive, ColorRamp, RegularGrid, TransferFunction,
};
use sciviz_engine::prelude::*;

/// Ids of the demo content
#[derive(Debug, Clone, Copy)]
pub struct DemoIds {
    /// Simulated sphere cloud
    pub spheres: u32,
    /// Boxes with a metal material
    pub boxes: u32,
    /// Scalar volume
    pub volume: u32,
    /// Lights
    pub lights: u32,
    /// Clipping plane
    pub clip: u32,
}

/// Number of simulation frames in the sphere cloud
pub const SIMULATION_FRAMES: u32 = 8;

const GRID: u32 = 6;

#[allow(clippy::cast_precision_loss)]
fn sphere_cloud() -> Model {
    let mut spheres = Vec::new();
    for x in 0..GRID {
        for y in 0..GRID {
            let center = Vec3::new(x as f32, y as f32, 0.0) - Vec3::repeat((GRID - 1) as f32 * 0.5);
            spheres.push(Sphere::new(center, 0.35));
        }
    }
    let count = spheres.len();
    let frames = (0..SIMULATION_FRAMES)
        .map(|frame| {
            (0..count)
                .map(|i| ((i as f32 * 0.3) + frame as f32 * 0.5).sin() * 0.5 + 0.5)
                .collect()
        })
        .collect();

    Model::named("spheres", "sphere cloud")
        .with_component(GeometryComponent::new(Geometry::Spheres(spheres)))
        .with_component(SimulationComponent::new(frames, ColorRamp::default()))
        .with_component(MetadataComponent::new([("source", "synthetic")]))
}

fn boxes() -> Model {
    let boxes = vec![
        BoxPrimitive::new(Vec3::new(-4.0, -4.0, -1.0), Vec3::new(4.0, -3.5, 1.0)),
        BoxPrimitive::new(Vec3::new(-4.0, 3.5, -1.0), Vec3::new(4.0, 4.0, 1.0)),
    ];
    Model::named("boxes", "frame")
        .with_component(GeometryComponent::new(Geometry::Boxes(boxes)))
        .with_component(MaterialComponent::new(Material::Metal {
            color: [0.9, 0.9, 0.95],
            roughness: 0.2,
        }))
        .with_component(TransformComponent::from_position(Vec3::new(0.0, 0.0, -2.0)))
}

#[allow(clippy::cast_precision_loss)]
fn volume() -> SceneResult<Model> {
    let n = 16_u32;
    let mut voxels = Vec::with_capacity((n * n * n) as usize);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let p = Vec3::new(x as f32, y as f32, z as f32) / (n - 1) as f32 - Vec3::repeat(0.5);
                voxels.push(1.0 - (p.norm() * 2.0).min(1.0));
            }
        }
    }
    let grid = RegularGrid::new([n; 3], voxels)?
        .with_origin(Vec3::new(5.0, -1.0, -1.0))
        .with_spacing(Vec3::repeat(2.0 / (n - 1) as f32));
    let mut component = VolumeComponent::new(grid);
    component.set_transfer_function(TransferFunction {
        value_range: [0.0, 1.0],
        colors: vec![[0.1, 0.1, 0.6], [0.9, 0.9, 0.2], [0.9, 0.1, 0.1]],
        opacities: vec![0.0, 0.2, 0.8],
    });
    Ok(Model::named("volume", "radial field").with_component(component))
}

fn lights() -> Model {
    Model::named("lights", "key and fill").with_component(LightComponent::new(vec![
        Light::ambient(0.2),
        Light::directional(Vec3::new(-1.0, -1.0, -1.0), Vec3::repeat(1.0), 2.0),
    ]))
}

fn clipper() -> Model {
    Model::named("clip", "half space")
        .with_component(ClipperComponent::new(vec![plane(Vec3::z(), Vec3::new(0.0, 0.0, 1.5))]))
}

/// Add the demo content to `scene`
pub fn populate(scene: &mut Scene) -> SceneResult<DemoIds> {
    let models = scene.models_mut();
    let spheres = models.add(sphere_cloud())?;
    let boxes = models.add(boxes())?;
    let volume = models.add(volume()?)?;
    let lights = models.add(lights())?;
    let clip = scene.clip_manager_mut().add_clipping_model(clipper())?;
    log::info!(
        "Demo scene: {} instance(s), {} clipping model(s), {} bytes",
        scene.models().len(),
        scene.clip_manager().len(),
        scene.size_in_bytes()
    );
    Ok(DemoIds {
        spheres,
        boxes,
        volume,
        lights,
        clip,
    })
}
