//! Per-frame simulation reports
//!
//! A simulation holds one scalar per primitive for every frame. While
//! enabled, the selected frame is mapped through a colour ramp and written
//! to the geometry view as per-primitive colours.

use crate::core::error::{SceneError, SceneResult};
use crate::ecs::component::Component;
use crate::foundation::ModifiedFlag;
use serde::{Deserialize, Serialize};

/// Linear colour map over a value range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    colors: Vec<[f32; 4]>,
    range: [f32; 2],
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            colors: vec![[0.0, 0.0, 1.0, 1.0], [1.0, 0.0, 0.0, 1.0]],
            range: [0.0, 1.0],
        }
    }
}

impl ColorRamp {
    /// Create a ramp, failing on an empty palette or an inverted range
    pub fn new(colors: Vec<[f32; 4]>, range: [f32; 2]) -> SceneResult<Self> {
        if colors.is_empty() {
            return Err(SceneError::InvalidArgument("colour ramp needs at least one colour".to_string()));
        }
        if !(range[0] <= range[1]) {
            return Err(SceneError::InvalidArgument(format!("invalid ramp range {range:?}")));
        }
        Ok(Self { colors, range })
    }

    /// Value range mapped onto the palette
    pub fn range(&self) -> [f32; 2] {
        self.range
    }

    /// Colour of `value`, clamped to the range
    pub fn sample(&self, value: f32) -> [f32; 4] {
        let [lo, hi] = self.range;
        let t = if hi > lo { ((value - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.0 };
        let last = self.colors.len() - 1;
        let position = t * last as f32;
        let index = (position.floor() as usize).min(last);
        let next = (index + 1).min(last);
        let weight = position - index as f32;
        let (a, b) = (self.colors[index], self.colors[next]);
        std::array::from_fn(|i| a[i] + (b[i] - a[i]) * weight)
    }
}

/// Simulation values attached to a model
#[derive(Debug, Clone)]
pub struct SimulationComponent {
    frames: Vec<Vec<f32>>,
    ramp: ColorRamp,
    enabled: bool,
    frame: u32,
    modified: ModifiedFlag,
}

impl SimulationComponent {
    /// Component over `frames`, disabled until [`Self::set_enabled`]
    pub fn new(frames: Vec<Vec<f32>>, ramp: ColorRamp) -> Self {
        Self {
            frames,
            ramp,
            enabled: false,
            frame: 0,
            modified: ModifiedFlag::new(),
        }
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Selected frame
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Whether values are shown
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Show or hide the values
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        self.modified.update(&mut self.enabled, enabled)
    }

    /// Colour ramp
    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    /// Replace the colour ramp
    pub fn set_ramp(&mut self, ramp: ColorRamp) -> bool {
        self.modified.update(&mut self.ramp, ramp)
    }

    /// Select the frame for `animation_frame`, clamped to the last one
    pub fn select_frame(&mut self, animation_frame: u32) -> bool {
        let last = u32::try_from(self.frames.len().saturating_sub(1)).unwrap_or(u32::MAX);
        self.modified.update(&mut self.frame, animation_frame.min(last))
    }

    /// Values of the selected frame
    pub fn values(&self) -> Option<&[f32]> {
        self.frames.get(self.frame as usize).map(Vec::as_slice)
    }

    /// Per-primitive colours to show, `None` when disabled
    pub fn colors(&self) -> Option<Vec<[f32; 4]>> {
        if !self.enabled {
            return None;
        }
        self.values()
            .map(|values| values.iter().map(|&v| self.ramp.sample(v)).collect())
    }

    /// Whether the view needs refreshing
    pub fn is_modified(&self) -> bool {
        self.modified.is_modified()
    }

    pub(crate) fn mark_applied(&mut self) {
        self.modified.reset();
    }
}

impl Component for SimulationComponent {
    fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self
                .frames
                .iter()
                .map(|frame| std::mem::size_of_val(frame.as_slice()))
                .sum::<usize>()
    }
}
