/// Shared-scene coordinator.
///
/// Single source of truth for "what objects exist, which are selected,"
/// and the sole scheduler of render work shared by any number of
/// independently-lifecycled viewports. Mutations flow one way
/// (UI/viewport -> coordinator -> pool -> render fan-out) and observation
/// flows back through the event registry; viewports never write the pool.
///
/// Execution is single-threaded and cooperative. The only asynchronous
/// boundary is the host's per-frame callback: `render()` sets a
/// single-flight flag, and the host calls `run_frame()` once per animation
/// opportunity. Any number of synchronous mutations between two frame
/// boundaries are visible together in the next single pass.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::event::{EventKind, EventRegistry, ListenerKey, SceneEvent};
use crate::{scene_debug, scene_info, scene_warn};

use super::instance::InstanceAttributes;
use super::instance_buffer::DirtyFlags;
use super::instance_pool::InstancePool;
use super::point_cloud::{PointCloud, PointCloudData, PointCloudLoader};
use super::viewport::Viewport;

/// Default row count of the annotation-box pool, sized for hand-authored
/// annotation sets.
pub const DEFAULT_BOX_CAPACITY: u32 = 1000;

/// Coordinator owning the box pool, the point-cloud dataset, the current
/// selection, the attached viewports, and the coalescing render scheduler.
pub struct SharedScene {
    boxes: InstancePool,
    point_cloud: PointCloud,
    /// Selected ids, in selection order; always a subset of the pool's ids
    selection: Vec<String>,
    /// Attached viewports, in attachment order
    views: Vec<Arc<Mutex<dyn Viewport>>>,
    events: EventRegistry,
    /// Single-flight flag: at most one pending frame regardless of how
    /// many mutations occur between frames
    render_scheduled: bool,
    disposed: bool,
}

impl SharedScene {
    /// Create a scene with the default box-pool capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BOX_CAPACITY)
    }

    /// Create a scene with an explicit box-pool capacity
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            boxes: InstancePool::new(capacity),
            point_cloud: PointCloud::new(),
            selection: Vec::new(),
            views: Vec::new(),
            events: EventRegistry::new(),
            render_scheduled: false,
            disposed: false,
        }
    }

    // ===== ACCESSORS =====

    /// The annotation-box pool (read-only; mutations go through
    /// [`add_object`](Self::add_object) and friends)
    pub fn boxes(&self) -> &InstancePool {
        &self.boxes
    }

    /// Drain the box buffer's dirty flags for upload.
    ///
    /// The upload side calls this before [`run_frame`](Self::run_frame),
    /// the way an updater phase runs before the draw phase.
    pub fn take_boxes_dirty(&mut self) -> DirtyFlags {
        self.boxes.take_dirty()
    }

    /// Current selection, in selection order
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// The current point-cloud dataset
    pub fn point_cloud(&self) -> &PointCloud {
        &self.point_cloud
    }

    /// Number of attached viewports
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Whether a frame pass is pending
    pub fn is_render_scheduled(&self) -> bool {
        self.render_scheduled
    }

    // ===== EVENTS =====

    /// Subscribe a callback to one event kind. Dispatch order among
    /// subscribers of the same kind is registration order.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> ListenerKey
    where
        F: FnMut(&SceneEvent) + Send + 'static,
    {
        self.events.subscribe(kind, callback)
    }

    /// Detach a listener; unknown keys are ignored
    pub fn off(&mut self, key: ListenerKey) {
        self.events.unsubscribe(key);
    }

    // ===== MUTATION =====

    /// Add or update annotation objects. Emits `AddObject` and requests a
    /// coalesced render.
    pub fn add_object(&mut self, objects: &[InstanceAttributes]) {
        self.boxes.upsert(objects);
        let ids = objects.iter().map(|object| object.id.clone()).collect();
        self.events.dispatch(&SceneEvent::AddObject { ids });
        self.render();
    }

    /// Remove annotation objects by id. Unknown ids are silently ignored.
    ///
    /// If any removed id was selected, the selection drops the missing ids
    /// and `Select` is re-emitted before `RemoveObject`. Requests a
    /// coalesced render.
    pub fn remove_object<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.boxes.remove(ids);

        let removed: FxHashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        if self.selection.iter().any(|id| removed.contains(id.as_str())) {
            let remaining: Vec<String> = self
                .selection
                .iter()
                .filter(|id| !removed.contains(id.as_str()))
                .cloned()
                .collect();
            self.select_object(&remaining);
        }

        let ids = ids.iter().map(|id| id.as_ref().to_string()).collect();
        self.events.dispatch(&SceneEvent::RemoveObject { ids });
        self.render();
    }

    /// Replace the selection wholesale and emit `Select`.
    ///
    /// This is a full-replace semantic, not a toggle: multi-select
    /// gestures resolve to a final id list before calling this. Ids absent
    /// from the pool are dropped and repeats are deduplicated, so the
    /// selection is always a subset of the pool's live ids. Passing an
    /// empty slice clears the selection.
    pub fn select_object<S: AsRef<str>>(&mut self, ids: &[S]) {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        self.selection = ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| self.boxes.contains(id) && seen.insert(*id))
            .map(str::to_string)
            .collect();
        let ids = self.selection.clone();
        self.events.dispatch(&SceneEvent::Select { ids });
    }

    /// Clear the selection (`select_object` with no ids)
    pub fn clear_selection(&mut self) {
        self.select_object::<&str>(&[]);
    }

    /// Resolve ids through the pool before selecting; ids that no longer
    /// exist are silently dropped.
    pub fn select_object_by_id<S: AsRef<str>>(&mut self, ids: &[S]) {
        let resolved: Vec<&str> = ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| self.boxes.instance(id).is_some())
            .collect();
        self.select_object(&resolved);
    }

    /// Clear the selection and every annotation object, emit `ClearData`,
    /// and request a render.
    pub fn clear_data(&mut self) {
        self.clear_selection();
        self.boxes.clear();
        self.events.dispatch(&SceneEvent::ClearData);
        self.render();
    }

    // ===== POINT CLOUD =====

    /// Install the point-cloud source used by
    /// [`load_point_cloud`](Self::load_point_cloud)
    pub fn set_point_cloud_loader(&mut self, loader: Box<dyn PointCloudLoader>) {
        self.point_cloud.set_loader(loader);
    }

    /// Swap in a point-cloud dataset, emit `PointsChange`, and request a
    /// render.
    pub fn set_point_cloud(&mut self, data: PointCloudData) {
        self.point_cloud.update_data(data);
        self.events.dispatch(&SceneEvent::PointsChange);
        self.render();
    }

    /// Load a point cloud through the configured source.
    ///
    /// # Errors
    ///
    /// Load failures propagate to the caller, are not retried, and leave
    /// pool, selection, and point-cloud state untouched: no events fire
    /// and no render is requested.
    pub fn load_point_cloud(&mut self, url: &str) -> Result<()> {
        if let Err(err) = self.point_cloud.load(url) {
            scene_warn!(
                "cloudbox3d::SharedScene",
                "point cloud load failed for '{}': {}",
                url,
                err
            );
            return Err(err);
        }
        scene_info!(
            "cloudbox3d::SharedScene",
            "loaded point cloud '{}' ({} points)",
            url,
            self.point_cloud.point_count()
        );
        self.events.dispatch(&SceneEvent::PointsChange);
        self.render();
        Ok(())
    }

    // ===== VIEWPORTS =====

    /// Attach a viewport. Idempotent: attaching the same viewport twice
    /// is a no-op.
    pub fn add_view(&mut self, view: Arc<Mutex<dyn Viewport>>) {
        if self.views.iter().any(|existing| Arc::ptr_eq(existing, &view)) {
            return;
        }
        if let Ok(view_lock) = view.lock() {
            scene_debug!("cloudbox3d::SharedScene", "attached view '{}'", view_lock.name());
        }
        self.views.push(view);
    }

    /// Detach a viewport. No-op if it was never attached.
    pub fn remove_view(&mut self, view: &Arc<Mutex<dyn Viewport>>) {
        self.views.retain(|existing| !Arc::ptr_eq(existing, view));
    }

    // ===== RENDER SCHEDULING =====

    /// Request a coalesced render.
    ///
    /// If a frame is already scheduled this returns immediately: multiple
    /// calls within the same tick collapse into exactly one actual pass.
    /// The pass itself runs when the host next calls
    /// [`run_frame`](Self::run_frame).
    pub fn render(&mut self) {
        if self.render_scheduled {
            return;
        }
        self.render_scheduled = true;
    }

    /// Run the pending frame pass, if any.
    ///
    /// The host event loop calls this once per animation opportunity. When
    /// a frame is scheduled it emits `RenderBefore`, invokes each attached
    /// viewport's render method in attachment order, emits `RenderAfter`,
    /// clears the scheduled flag, and returns `true`. Otherwise, and after
    /// [`dispose`](Self::dispose), it is a no-op returning `false`.
    ///
    /// The pass reflects the final state after every mutation since the
    /// last frame; there is no per-mutation render guarantee.
    pub fn run_frame(&mut self) -> bool {
        if self.disposed || !self.render_scheduled {
            return false;
        }

        self.events.dispatch(&SceneEvent::RenderBefore);
        let views = self.views.clone();
        for view in &views {
            if let Ok(mut view) = view.lock() {
                view.render(self);
            }
        }
        self.events.dispatch(&SceneEvent::RenderAfter);
        self.render_scheduled = false;
        true
    }

    // ===== LIFECYCLE =====

    /// Dispose the pool, clear the selection, dispose and detach every
    /// attached viewport.
    ///
    /// A frame still pending at dispose time never runs:
    /// [`run_frame`](Self::run_frame) is a no-op once disposed.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.boxes.dispose();
        self.selection.clear();
        for view in &self.views {
            if let Ok(mut view) = view.lock() {
                view.dispose();
            }
        }
        self.views.clear();
        self.disposed = true;
        scene_info!("cloudbox3d::SharedScene", "disposed");
    }
}

impl Default for SharedScene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "share_scene_tests.rs"]
mod tests;
