//! Model description for the request boundary

use crate::ecs::components::{
    GeometryComponent, GeometryViewComponent, LightComponent, SimulationComponent, VolumeComponent,
};
use crate::ecs::model::ModelInfo;
use crate::ecs::storage::Components;
use crate::ecs::system::{DataSystem, ModelProperties};
use crate::foundation::math::Mat4;

/// Summarises name, type, content and footprint of a model
#[derive(Debug, Default)]
pub struct SummaryDataSystem;

impl DataSystem for SummaryDataSystem {
    fn properties(&self, info: &ModelInfo, components: &Components) -> ModelProperties {
        let mut properties = ModelProperties::new();
        properties.insert("name".into(), info.name().to_string());
        properties.insert("type".into(), info.model_type().to_string());
        properties.insert("components".into(), components.len().to_string());
        properties.insert("size_in_bytes".into(), components.size_in_bytes().to_string());

        if let Some(geometry) = components.find::<GeometryComponent>() {
            let geometry = geometry.geometry();
            properties.insert("geometry".into(), geometry.kind().device_type().to_string());
            properties.insert("primitives".into(), geometry.primitive_count().to_string());
        }
        if let Some(view) = components.find::<GeometryViewComponent>() {
            properties.insert("color".into(), format!("{:?}", view.color()));
        }
        if let Some(volume) = components.find::<VolumeComponent>() {
            properties.insert("dimensions".into(), format!("{:?}", volume.grid().dimensions()));
        }
        if let Some(lights) = components.find::<LightComponent>() {
            properties.insert("lights".into(), lights.lights().len().to_string());
        }
        if let Some(simulation) = components.find::<SimulationComponent>() {
            properties.insert("simulation.enabled".into(), simulation.is_enabled().to_string());
            properties.insert("simulation.frames".into(), simulation.frame_count().to_string());
        }

        let bounds = components.compute_bounds(&Mat4::identity());
        if !bounds.is_empty() {
            properties.insert("bounds.min".into(), format!("{:?}", bounds.min().as_slice()));
            properties.insert("bounds.max".into(), format!("{:?}", bounds.max().as_slice()));
        }
        properties
    }
}
