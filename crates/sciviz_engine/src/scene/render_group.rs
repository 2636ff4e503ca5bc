//! Per-model aggregate of committed native views

use crate::backend::{DeviceRef, NativeHandle, NativeObject, ObjectKind, ParamValue};
use crate::core::error::SceneResult;
use crate::ecs::storage::Components;

/// Native handles contributed by a model's components, by category.
///
/// The handles are borrowed: each one stays owned by its component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderViews {
    /// Geometric models
    pub geometries: Vec<NativeHandle>,
    /// Volumetric models
    pub volumes: Vec<NativeHandle>,
    /// Lights
    pub lights: Vec<NativeHandle>,
    /// Clipping geometric models
    pub clippers: Vec<NativeHandle>,
}

impl RenderViews {
    /// Gather the views of every component
    pub fn collect(components: &Components) -> Self {
        let mut views = Self::default();
        components.collect_views(&mut views);
        views
    }

    /// Total number of handles
    pub fn len(&self) -> usize {
        self.geometries.len() + self.volumes.len() + self.lights.len() + self.clippers.len()
    }

    /// Whether no component contributed anything
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Native group holding every view of one model
#[derive(Debug)]
pub struct RenderGroup {
    group: NativeObject,
    views: RenderViews,
    commits: u64,
}

impl RenderGroup {
    /// Create an empty, uncommitted group
    pub fn new(device: &DeviceRef) -> SceneResult<Self> {
        Ok(Self {
            group: NativeObject::create(device, ObjectKind::Group)?,
            views: RenderViews::default(),
            commits: 0,
        })
    }

    /// Handle referenced by instances
    pub fn handle(&self) -> NativeHandle {
        self.group.handle()
    }

    /// Views submitted by the last successful commit
    pub fn views(&self) -> &RenderViews {
        &self.views
    }

    /// Number of successful commits
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Resubmit every view list and commit, if `force` is set.
    ///
    /// Lists are always sent whole; the device cannot remove a single entry.
    /// Returns whether the group was committed.
    pub fn commit(&mut self, components: &Components, force: bool) -> SceneResult<bool> {
        if !force {
            return Ok(false);
        }
        let views = RenderViews::collect(components);
        self.group
            .set("geometry", ParamValue::HandleList(views.geometries.clone()))?;
        self.group
            .set("volume", ParamValue::HandleList(views.volumes.clone()))?;
        self.group
            .set("light", ParamValue::HandleList(views.lights.clone()))?;
        self.group
            .set("clippingGeometry", ParamValue::HandleList(views.clippers.clone()))?;
        self.group.commit()?;

        log::debug!("Group {} committed with {} view(s)", self.group.handle(), views.len());
        self.views = views;
        self.commits += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessDevice;
    use crate::ecs::components::{Light, LightComponent};
    use crate::ecs::Component;
    use std::sync::Arc;

    #[test]
    fn test_unforced_commit_is_noop() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut group = RenderGroup::new(&device).unwrap();
        assert!(!group.commit(&Components::new(), false).unwrap());
        assert_eq!(headless.commit_count(group.handle()), Some(0));
    }

    #[test]
    fn test_forced_commit_resubmits_lists() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut components = Components::new();
        components.add(LightComponent::new(vec![Light::ambient(1.0), Light::ambient(0.5)]));
        components.start_pending(&device).unwrap();
        components.commit_all().unwrap();

        let mut group = RenderGroup::new(&device).unwrap();
        assert!(group.commit(&components, true).unwrap());
        let lights = components.get::<LightComponent>().unwrap().handles();
        assert_eq!(group.views().lights, lights);
        assert_eq!(
            headless.param(group.handle(), "light"),
            Some(ParamValue::HandleList(lights))
        );
        assert_eq!(
            headless.param(group.handle(), "geometry"),
            Some(ParamValue::HandleList(Vec::new()))
        );
        assert_eq!(group.commit_count(), 1);
    }

    #[test]
    fn test_failed_commit_keeps_previous_views() {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        let mut light = LightComponent::new(vec![Light::ambient(1.0)]);
        light.on_start(&device).unwrap();
        light.on_commit().unwrap();
        let mut components = Components::new();
        components.add(light);

        let mut group = RenderGroup::new(&device).unwrap();
        headless.fail_commits_of(group.handle());
        assert!(group.commit(&components, true).is_err());
        assert!(group.views().is_empty());
        assert_eq!(group.commit_count(), 0);
    }
}
