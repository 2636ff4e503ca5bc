//! In-process device that records every native operation
//!
//! Nothing is shaded. Objects live in a slot map; each one keeps its staged
//! and committed parameters, buffer sizes and counters so callers can see
//! exactly which handles were pushed and committed.

use super::device::{
    DeviceError, DeviceResult, FrameRequest, FrameStats, NativeHandle, ObjectKind, ParamValue,
    RenderDevice,
};
use super::frame_future::FrameFuture;
use slotmap::{DefaultKey, Key, KeyData, SlotMap};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct DeviceObject {
    kind: ObjectKind,
    staged: HashMap<String, ParamValue>,
    committed: HashMap<String, ParamValue>,
    removed: HashSet<String>,
    buffers: HashMap<String, usize>,
    commit_count: u64,
    push_count: u64,
    accumulation: u32,
}

impl DeviceObject {
    fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            staged: HashMap::new(),
            committed: HashMap::new(),
            removed: HashSet::new(),
            buffers: HashMap::new(),
            commit_count: 0,
            push_count: 0,
            accumulation: 0,
        }
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    objects: SlotMap<DefaultKey, DeviceObject>,
    released: u64,
    frames: u64,
    failing_commits: HashSet<NativeHandle>,
}

impl DeviceState {
    fn key(handle: NativeHandle) -> DefaultKey {
        KeyData::from_ffi(handle.0).into()
    }

    fn object(&self, handle: NativeHandle) -> DeviceResult<&DeviceObject> {
        self.objects
            .get(Self::key(handle))
            .ok_or(DeviceError::UnknownHandle(handle.0))
    }

    fn object_mut(&mut self, handle: NativeHandle) -> DeviceResult<&mut DeviceObject> {
        self.objects
            .get_mut(Self::key(handle))
            .ok_or(DeviceError::UnknownHandle(handle.0))
    }

    fn expect_kind(&self, handle: NativeHandle, expected: ObjectKind) -> DeviceResult<()> {
        let actual = self.object(handle)?.kind;
        if actual != expected {
            return Err(DeviceError::WrongKind {
                handle: handle.0,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn render(&mut self, request: &FrameRequest) -> DeviceResult<FrameStats> {
        self.expect_kind(request.camera, ObjectKind::Camera)?;
        self.expect_kind(request.renderer, ObjectKind::Renderer)?;
        self.expect_kind(request.world, ObjectKind::World)?;
        self.expect_kind(request.framebuffer, ObjectKind::Framebuffer)?;

        let instance_count = match self.object(request.world)?.committed.get("instance") {
            Some(ParamValue::HandleList(list)) => list.len(),
            _ => 0,
        };

        let framebuffer = self.object_mut(request.framebuffer)?;
        let accumulate = !matches!(
            framebuffer.committed.get("accumulation"),
            Some(ParamValue::Bool(false))
        );
        framebuffer.accumulation = if accumulate {
            framebuffer.accumulation.saturating_add(1)
        } else {
            1
        };
        let accumulation = framebuffer.accumulation;

        self.frames += 1;
        Ok(FrameStats {
            frame: self.frames,
            accumulation,
            variance: 1.0 / accumulation as f32,
            instance_count,
        })
    }
}

/// Device keeping all objects in memory
#[derive(Debug, Default, Clone)]
pub struct HeadlessDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl HeadlessDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DeviceResult<MutexGuard<'_, DeviceState>> {
        self.state.lock().map_err(|_| DeviceError::Poisoned)
    }

    fn inspect<R>(&self, f: impl FnOnce(&DeviceState) -> R) -> R {
        match self.state.lock() {
            Ok(state) => f(&*state),
            Err(poisoned) => f(&*poisoned.into_inner()),
        }
    }

    /// Number of successful commits of `handle`
    pub fn commit_count(&self, handle: NativeHandle) -> Option<u64> {
        self.inspect(|s| s.object(handle).ok().map(|o| o.commit_count))
    }

    /// Number of buffers pushed to `handle`
    pub fn push_count(&self, handle: NativeHandle) -> Option<u64> {
        self.inspect(|s| s.object(handle).ok().map(|o| o.push_count))
    }

    /// Committed value of a parameter
    pub fn param(&self, handle: NativeHandle, name: &str) -> Option<ParamValue> {
        self.inspect(|s| s.object(handle).ok().and_then(|o| o.committed.get(name).cloned()))
    }

    /// Byte size of the committed buffer `name`
    pub fn buffer_size(&self, handle: NativeHandle, name: &str) -> Option<usize> {
        self.inspect(|s| s.object(handle).ok().and_then(|o| o.buffers.get(name).copied()))
    }

    /// Kind of a live object
    pub fn kind(&self, handle: NativeHandle) -> Option<ObjectKind> {
        self.inspect(|s| s.object(handle).ok().map(|o| o.kind))
    }

    /// Whether the handle is alive
    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.kind(handle).is_some()
    }

    /// Number of live objects
    pub fn live_objects(&self) -> usize {
        self.inspect(|s| s.objects.len())
    }

    /// Number of live objects of one kind
    pub fn live_objects_of(&self, kind: ObjectKind) -> usize {
        self.inspect(|s| s.objects.values().filter(|o| o.kind == kind).count())
    }

    /// Number of released objects
    pub fn released_count(&self) -> u64 {
        self.inspect(|s| s.released)
    }

    /// Number of frames rendered
    pub fn frame_count(&self) -> u64 {
        self.inspect(|s| s.frames)
    }

    /// Make every commit of `handle` fail until [`Self::clear_failures`]
    pub fn fail_commits_of(&self, handle: NativeHandle) {
        if let Ok(mut state) = self.lock() {
            state.failing_commits.insert(handle);
        }
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.lock() {
            state.failing_commits.clear();
        }
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_object(&self, kind: ObjectKind) -> DeviceResult<NativeHandle> {
        let mut state = self.lock()?;
        let key = state.objects.insert(DeviceObject::new(kind));
        Ok(NativeHandle(key.data().as_ffi()))
    }

    fn set_param(&self, handle: NativeHandle, name: &str, value: ParamValue) -> DeviceResult<()> {
        let mut state = self.lock()?;
        if let ParamValue::Handle(target) = &value {
            state.object(*target)?;
        }
        if let ParamValue::HandleList(targets) = &value {
            for target in targets {
                state.object(*target)?;
            }
        }
        let object = state.object_mut(handle)?;
        object.removed.remove(name);
        object.staged.insert(name.to_string(), value);
        Ok(())
    }

    fn push_buffer(&self, handle: NativeHandle, name: &str, data: &[u8]) -> DeviceResult<()> {
        let mut state = self.lock()?;
        let object = state.object_mut(handle)?;
        object.removed.remove(name);
        object.buffers.insert(name.to_string(), data.len());
        object.push_count += 1;
        Ok(())
    }

    fn remove_param(&self, handle: NativeHandle, name: &str) -> DeviceResult<()> {
        let mut state = self.lock()?;
        let object = state.object_mut(handle)?;
        object.staged.remove(name);
        object.removed.insert(name.to_string());
        Ok(())
    }

    fn commit(&self, handle: NativeHandle) -> DeviceResult<()> {
        let mut state = self.lock()?;
        if state.failing_commits.contains(&handle) {
            return Err(DeviceError::Rejected(format!("commit of {handle} failed")));
        }
        let object = state.object_mut(handle)?;
        for name in std::mem::take(&mut object.removed) {
            object.committed.remove(&name);
            object.buffers.remove(&name);
        }
        let staged: Vec<_> = object.staged.drain().collect();
        object.committed.extend(staged);
        object.commit_count += 1;
        if object.kind == ObjectKind::Framebuffer {
            object.accumulation = 0;
        }
        Ok(())
    }

    fn release(&self, handle: NativeHandle) {
        if let Ok(mut state) = self.lock() {
            if state.objects.remove(DeviceState::key(handle)).is_some() {
                state.released += 1;
            }
        }
    }

    fn render_frame(&self, request: &FrameRequest) -> DeviceResult<FrameStats> {
        self.lock()?.render(request)
    }

    fn render_frame_async(&self, request: &FrameRequest) -> DeviceResult<FrameFuture> {
        let (future, completer) = FrameFuture::pending();
        let state = Arc::clone(&self.state);
        let request = *request;
        std::thread::spawn(move || {
            let result = state
                .lock()
                .map_err(|_| DeviceError::Poisoned)
                .and_then(|mut state| state.render(&request));
            completer.complete(result);
        });
        Ok(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceRef, NativeObject};

    fn device() -> (HeadlessDevice, DeviceRef) {
        let headless = HeadlessDevice::new();
        let device: DeviceRef = Arc::new(headless.clone());
        (headless, device)
    }

    #[test]
    fn test_params_visible_after_commit() {
        let (headless, device) = device();
        let object = NativeObject::create(&device, ObjectKind::Material).unwrap();
        object.set("kd", ParamValue::Vec3([1.0, 0.0, 0.0])).unwrap();
        assert_eq!(headless.param(object.handle(), "kd"), None);
        object.commit().unwrap();
        assert_eq!(
            headless.param(object.handle(), "kd"),
            Some(ParamValue::Vec3([1.0, 0.0, 0.0]))
        );
        assert_eq!(headless.commit_count(object.handle()), Some(1));
    }

    #[test]
    fn test_drop_releases() {
        let (headless, device) = device();
        let object = NativeObject::create(&device, ObjectKind::Geometry).unwrap();
        let handle = object.handle();
        assert!(headless.contains(handle));
        drop(object);
        assert!(!headless.contains(handle));
        assert_eq!(headless.released_count(), 1);
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let (_headless, device) = device();
        let group = NativeObject::create(&device, ObjectKind::Group).unwrap();
        let stale = NativeObject::create(&device, ObjectKind::GeometricModel)
            .unwrap()
            .handle();
        let err = group
            .set("geometry", ParamValue::HandleList(vec![stale]))
            .unwrap_err();
        assert_eq!(err, DeviceError::UnknownHandle(stale.0));
    }

    #[test]
    fn test_removal_applies_on_commit() {
        let (headless, device) = device();
        let object = NativeObject::create(&device, ObjectKind::GeometricModel).unwrap();
        object.set("color", ParamValue::Vec4([1.0; 4])).unwrap();
        object.push("color.primitive", &[[1.0_f32; 4]; 2]).unwrap();
        object.commit().unwrap();

        object.remove("color").unwrap();
        object.remove("color.primitive").unwrap();
        assert!(headless.param(object.handle(), "color").is_some());
        object.commit().unwrap();
        assert_eq!(headless.param(object.handle(), "color"), None);
        assert_eq!(headless.buffer_size(object.handle(), "color.primitive"), None);
    }

    #[test]
    fn test_failure_injection() {
        let (headless, device) = device();
        let object = NativeObject::create(&device, ObjectKind::Light).unwrap();
        headless.fail_commits_of(object.handle());
        assert!(matches!(object.commit(), Err(DeviceError::Rejected(_))));
        headless.clear_failures();
        assert!(object.commit().is_ok());
    }

    #[test]
    fn test_push_counts_bytes() {
        let (headless, device) = device();
        let object = NativeObject::create(&device, ObjectKind::Geometry).unwrap();
        object.push("sphere.position", &[[0.0f32; 3]; 4]).unwrap();
        assert_eq!(headless.push_count(object.handle()), Some(1));
        assert_eq!(headless.buffer_size(object.handle(), "sphere.position"), Some(48));
    }

    #[test]
    fn test_render_checks_kinds() {
        let (_headless, device) = device();
        let camera = NativeObject::create(&device, ObjectKind::Camera).unwrap();
        let renderer = NativeObject::create(&device, ObjectKind::Renderer).unwrap();
        let framebuffer = NativeObject::create(&device, ObjectKind::Framebuffer).unwrap();
        let request = FrameRequest {
            camera: camera.handle(),
            framebuffer: framebuffer.handle(),
            renderer: renderer.handle(),
            world: camera.handle(),
        };
        assert!(matches!(
            device.render_frame(&request),
            Err(DeviceError::WrongKind { .. })
        ));
    }
}
