//! Structured volume on a regular grid

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::error::{SceneError, SceneResult};
use crate::ecs::component::Component;
use crate::foundation::math::{Mat4, Vec3};
use crate::foundation::{Bounds, ModifiedFlag};
use crate::scene::RenderViews;

/// Maps voxel values to colour and opacity
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    /// Value mapped to the first entry
    pub value_range: [f32; 2],
    /// RGB control points, evenly spread over the range
    pub colors: Vec<[f32; 3]>,
    /// Opacity control points, evenly spread over the range
    pub opacities: Vec<f32>,
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self {
            value_range: [0.0, 1.0],
            colors: vec![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]],
            opacities: vec![0.0, 1.0],
        }
    }
}

/// Regular grid of scalar values
#[derive(Debug, Clone, PartialEq)]
pub struct RegularGrid {
    dimensions: [u32; 3],
    origin: Vec3,
    spacing: Vec3,
    voxels: Vec<f32>,
}

impl RegularGrid {
    /// Create a grid, failing if the voxel count does not match the dimensions
    pub fn new(dimensions: [u32; 3], voxels: Vec<f32>) -> SceneResult<Self> {
        let expected = dimensions.iter().map(|&d| d as usize).product::<usize>();
        if expected == 0 || voxels.len() != expected {
            return Err(SceneError::InvalidArgument(format!(
                "grid {:?} needs {} voxels, got {}",
                dimensions,
                expected,
                voxels.len()
            )));
        }
        Ok(Self {
            dimensions,
            origin: Vec3::zeros(),
            spacing: Vec3::repeat(1.0),
            voxels,
        })
    }

    /// Builder pattern: set world position of the first voxel
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    /// Builder pattern: set distance between voxels
    pub fn with_spacing(mut self, spacing: Vec3) -> Self {
        self.spacing = spacing;
        self
    }

    /// Voxel counts per axis
    pub fn dimensions(&self) -> [u32; 3] {
        self.dimensions
    }

    /// Voxel values, x fastest
    pub fn voxels(&self) -> &[f32] {
        &self.voxels
    }

    /// Smallest and largest voxel value
    pub fn value_range(&self) -> [f32; 2] {
        self.voxels
            .iter()
            .fold([f32::INFINITY, f32::NEG_INFINITY], |[lo, hi], &v| [lo.min(v), hi.max(v)])
    }

    /// Bounds spanned by the voxel centres
    pub fn bounds(&self) -> Bounds {
        let cells = Vec3::new(
            self.dimensions[0].saturating_sub(1) as f32,
            self.dimensions[1].saturating_sub(1) as f32,
            self.dimensions[2].saturating_sub(1) as f32,
        );
        Bounds::from_points([self.origin, self.origin + cells.component_mul(&self.spacing)])
    }
}

struct Natives {
    volume: NativeObject,
    model: NativeObject,
}

/// Volume data plus its transfer function
pub struct VolumeComponent {
    grid: RegularGrid,
    transfer: TransferFunction,
    data_modified: ModifiedFlag,
    transfer_modified: ModifiedFlag,
    natives: Option<Natives>,
}

impl VolumeComponent {
    /// Wrap a grid with the default transfer function over its value range
    pub fn new(grid: RegularGrid) -> Self {
        let transfer = TransferFunction {
            value_range: grid.value_range(),
            ..TransferFunction::default()
        };
        Self {
            grid,
            transfer,
            data_modified: ModifiedFlag::modified(),
            transfer_modified: ModifiedFlag::modified(),
            natives: None,
        }
    }

    /// Grid data
    pub fn grid(&self) -> &RegularGrid {
        &self.grid
    }

    /// Replace the grid
    pub fn set_grid(&mut self, grid: RegularGrid) -> bool {
        self.data_modified.update(&mut self.grid, grid)
    }

    /// Transfer function
    pub fn transfer_function(&self) -> &TransferFunction {
        &self.transfer
    }

    /// Replace the transfer function
    pub fn set_transfer_function(&mut self, transfer: TransferFunction) -> bool {
        self.transfer_modified.update(&mut self.transfer, transfer)
    }

    /// Handle of the volumetric model, once started
    pub fn handle(&self) -> Option<NativeHandle> {
        self.natives.as_ref().map(|natives| natives.model.handle())
    }
}

impl Component for VolumeComponent {
    fn on_start(&mut self, device: &DeviceRef) -> SceneResult<()> {
        self.natives = Some(Natives {
            volume: NativeObject::create(device, ObjectKind::Volume)?,
            model: NativeObject::create(device, ObjectKind::VolumetricModel)?,
        });
        Ok(())
    }

    fn on_commit(&mut self) -> SceneResult<bool> {
        let data = self.data_modified.is_modified();
        let transfer = self.transfer_modified.is_modified();
        if !data && !transfer {
            return Ok(false);
        }
        let natives = self
            .natives
            .as_ref()
            .ok_or_else(|| SceneError::NotInitialized("volume used before start".to_string()))?;

        if data {
            let volume = &natives.volume;
            let [x, y, z] = self.grid.dimensions;
            volume.set("type", ParamValue::String("structuredRegular".to_string()))?;
            volume.set("dimensions", ParamValue::Vec3([x as f32, y as f32, z as f32]))?;
            volume.set("gridOrigin", ParamValue::Vec3(self.grid.origin.into()))?;
            volume.set("gridSpacing", ParamValue::Vec3(self.grid.spacing.into()))?;
            volume.push("data", &self.grid.voxels)?;
            volume.commit()?;
        }

        let model = &natives.model;
        model.set("volume", ParamValue::Handle(natives.volume.handle()))?;
        let [lo, hi] = self.transfer.value_range;
        model.set("value", ParamValue::Vec4([lo, hi, 0.0, 0.0]))?;
        model.push("color", &self.transfer.colors)?;
        model.push("opacity", &self.transfer.opacities)?;
        model.commit()?;

        self.data_modified.reset();
        self.transfer_modified.reset();
        Ok(true)
    }

    fn on_destroyed(&mut self) {
        self.natives = None;
    }

    fn compute_bounds(&self, matrix: &Mat4) -> Option<Bounds> {
        Some(self.grid.bounds().transformed(matrix))
    }

    fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + std::mem::size_of_val(self.grid.voxels.as_slice())
    }

    fn collect_views(&self, views: &mut RenderViews) {
        if let Some(handle) = self.handle() {
            views.volumes.push(handle);
        }
    }
}

impl std::fmt::Debug for VolumeComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeComponent")
            .field("dimensions", &self.grid.dimensions)
            .field("handle", &self.handle())
            .finish_non_exhaustive()
    }
}
