/// Instance pool: id-addressed instanced storage with slot recycling.
///
/// Presents a capacity-bounded, randomly-indexable store of renderable
/// instances addressed by caller-stable string ids. Storage rows are
/// recycled through a free-list arena and the backing buffer grows by an
/// amortized 1.5x factor, so inserts stay O(1) amortized while ids never
/// change meaning for the caller.

use glam::{Mat4, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::SlotArena;
use crate::{scene_debug, scene_error, scene_info};

use super::instance::{Aabb, InstanceAttributes};
use super::instance_buffer::{DirtyFlags, InstanceBuffer};

// ===== SNAPSHOT =====

/// Full-state export of a pool: current capacity plus every live instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Buffer row count at export time
    pub capacity: u32,
    /// Live instances, order unspecified
    pub instances: Vec<InstanceAttributes>,
}

// ===== INSTANCE POOL =====

/// Capacity-bounded pool of instanced annotation objects.
///
/// Three structures stay in lockstep: `instances` (id -> attributes),
/// `slot_of` (id -> buffer row, bijective over live ids), and the arena's
/// free list of recyclable rows. Every row in `[0, capacity)` is either
/// live, on the free list, or never yet used.
///
/// Slot indices are stable except across capacity growth, and growth
/// preserves them too: only the backing storage is reallocated. They are
/// still never handed out as persistent identifiers; callers hold ids.
pub struct InstancePool {
    buffer: InstanceBuffer,
    instances: FxHashMap<String, InstanceAttributes>,
    slot_of: FxHashMap<String, u32>,
    arena: SlotArena,
    /// Transform of the pool itself (it renders as one grouped object)
    world_transform: Mat4,
    /// Local-space bounds of the base geometry the instances share
    local_bounds: Aabb,
}

impl InstancePool {
    /// Create a pool with `capacity` buffer rows and unit-box base bounds
    pub fn new(capacity: u32) -> Self {
        Self {
            buffer: InstanceBuffer::with_capacity(capacity),
            instances: FxHashMap::default(),
            slot_of: FxHashMap::default(),
            arena: SlotArena::new(),
            world_transform: Mat4::IDENTITY,
            local_bounds: Aabb::UNIT,
        }
    }

    // ===== ACCESSORS =====

    /// Current buffer row count
    pub fn capacity(&self) -> u32 {
        self.buffer.capacity()
    }

    /// Number of live instances
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Rows still available before the next growth (free-listed or never
    /// yet used)
    pub fn available_slots(&self) -> u32 {
        self.capacity() - self.instance_count() as u32
    }

    /// Whether an id is live in the pool
    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    /// Look up one instance's attributes. Pure lookup, no mutation.
    pub fn instance(&self, id: &str) -> Option<&InstanceAttributes> {
        self.instances.get(id)
    }

    /// Iterate over all live instances.
    ///
    /// Order is unspecified but stable for a given pool state.
    pub fn instances(&self) -> impl Iterator<Item = &InstanceAttributes> {
        self.instances.values()
    }

    /// Iterate over all live ids
    pub fn instance_ids(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(|id| id.as_str())
    }

    /// The pool's own world transform (its parent transform in the scene)
    pub fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    /// Set the pool's own world transform
    pub fn set_world_transform(&mut self, transform: Mat4) {
        self.world_transform = transform;
    }

    /// Local-space bounds of the shared base geometry
    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    /// Replace the base geometry bounds
    pub fn set_local_bounds(&mut self, bounds: Aabb) {
        self.local_bounds = bounds;
    }

    /// The backing row storage, for the upload side
    pub fn buffer(&self) -> &InstanceBuffer {
        &self.buffer
    }

    /// Drain the buffer's pending dirty flags for upload
    pub fn take_dirty(&mut self) -> DirtyFlags {
        self.buffer.take_dirty()
    }

    // ===== MUTATION =====

    /// Add or update a batch of instances.
    ///
    /// Existing ids keep their slot and are rewritten in place; new ids
    /// take a free-listed slot if one exists, otherwise the next unused
    /// row at the tail. If the batch's new ids exceed the available rows
    /// the buffer grows first to
    /// `max(ceil(capacity * 1.5), size + new_count)`, so slot assignment
    /// never observes a half-grown buffer. Always succeeds.
    ///
    /// Buffers are marked dirty once per call, not once per instance.
    pub fn upsert(&mut self, batch: &[InstanceAttributes]) -> &mut Self {
        let new_count = batch
            .iter()
            .filter(|attributes| !self.instances.contains_key(&attributes.id))
            .map(|attributes| attributes.id.as_str())
            .collect::<FxHashSet<_>>()
            .len() as u32;

        if new_count > self.available_slots() {
            let target = (self.capacity() * 3)
                .div_ceil(2)
                .max(self.instance_count() as u32 + new_count);
            self.grow(target);
        }

        let mut flags = DirtyFlags::TRANSFORMS;
        for attributes in batch {
            let slot = match self.slot_of.get(&attributes.id) {
                Some(&slot) => slot,
                None => {
                    let slot = self.arena.alloc();
                    debug_assert!(slot < self.capacity(), "slot {} past capacity", slot);
                    self.slot_of.insert(attributes.id.clone(), slot);
                    slot
                }
            };
            self.buffer.write(slot, attributes);
            if attributes.color.is_some() {
                flags |= DirtyFlags::COLORS;
            }
            self.instances.insert(attributes.id.clone(), attributes.clone());
        }

        self.buffer.mark_dirty(flags);
        self
    }

    /// Remove a batch of instances by id. Unknown ids are silently
    /// ignored: removal races with the UI are expected and must not crash
    /// the render loop.
    ///
    /// The freed row's transform is zero-scaled so the instance draws
    /// nothing without shifting any other row, and the row goes back on
    /// the free list. Buffers are marked dirty once per call.
    pub fn remove<S: AsRef<str>>(&mut self, ids: &[S]) -> &mut Self {
        for id in ids {
            let id = id.as_ref();
            let slot = match self.slot_of.remove(id) {
                Some(slot) => slot,
                None => continue,
            };
            self.buffer.zero_slot(slot);
            self.arena.release(slot);
            self.instances.remove(id);
        }
        self.buffer.mark_dirty(DirtyFlags::TRANSFORMS);
        self
    }

    /// Remove every live instance. Capacity is unchanged.
    pub fn clear(&mut self) -> &mut Self {
        let ids: Vec<String> = self.instances.keys().cloned().collect();
        self.remove(&ids);
        self
    }

    // ===== PICKING =====

    /// Reverse lookup from a buffer row (as reported by a picking or
    /// raycast pass) back to the caller's id.
    pub fn instance_id_from_render_slot(&self, render_slot: u32) -> Option<&str> {
        // Linear scan: picking runs at human-interaction rate, not per
        // frame. Correctness does not depend on scan order.
        self.slot_of
            .iter()
            .find(|(_, slot)| **slot == render_slot)
            .map(|(id, _)| id.as_str())
    }

    // ===== WORLD-SPACE QUERIES =====

    /// World matrix of one instance: the pool's own transform composed
    /// with the slot's local transform.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InstanceNotFound`] for an absent id. Callers
    /// obtain ids from this same pool, so that is a programming error,
    /// not a recoverable condition.
    pub fn world_matrix(&self, id: &str) -> Result<Mat4> {
        let slot = self.slot_of.get(id).ok_or_else(|| self.not_found(id))?;
        Ok(self.world_transform * self.buffer.transform(*slot))
    }

    /// World-space position of one instance
    pub fn world_position(&self, id: &str) -> Result<Vec3> {
        Ok(self.world_matrix(id)?.col(3).truncate())
    }

    /// World-space bounding box of one instance (base bounds transformed
    /// by the instance's world matrix)
    pub fn world_box(&self, id: &str) -> Result<Aabb> {
        Ok(self.local_bounds.transformed(&self.world_matrix(id)?))
    }

    fn not_found(&self, id: &str) -> Error {
        scene_error!("cloudbox3d::InstancePool", "instance '{}' not found", id);
        Error::InstanceNotFound(id.to_string())
    }

    // ===== SNAPSHOT =====

    /// Export the pool's full state
    pub fn serialize(&self) -> PoolSnapshot {
        PoolSnapshot {
            capacity: self.capacity(),
            instances: self.instances.values().cloned().collect(),
        }
    }

    /// Rebuild the pool from a snapshot.
    ///
    /// Defined purely in terms of the public operations: clear, reset
    /// capacity to zero, grow to the snapshot capacity, upsert the
    /// instances. This guarantees round-trip consistency with
    /// [`serialize`](Self::serialize).
    pub fn deserialize(&mut self, snapshot: PoolSnapshot) -> &mut Self {
        self.clear();
        self.arena.reset();
        self.buffer = InstanceBuffer::with_capacity(0);
        self.grow(snapshot.capacity);
        self.upsert(&snapshot.instances);
        self
    }

    // ===== LIFECYCLE =====

    /// Release the backing storage and clear all state.
    ///
    /// Safe to call at most once; using the pool afterwards is undefined.
    pub fn dispose(&mut self) {
        let count = self.instance_count();
        self.buffer.dispose();
        self.instances.clear();
        self.slot_of.clear();
        self.arena.reset();
        scene_info!("cloudbox3d::InstancePool", "disposed ({} instances released)", count);
    }

    /// Grow the backing buffer to `new_capacity` rows.
    ///
    /// Every active id's rows are re-written into the new storage at the
    /// *same* slot index before the swap: growth is never partially
    /// visible and `slot_of` needs no remapping.
    fn grow(&mut self, new_capacity: u32) {
        if new_capacity <= self.capacity() {
            return;
        }
        scene_debug!(
            "cloudbox3d::InstancePool",
            "growing instance buffer {} -> {} rows",
            self.capacity(),
            new_capacity
        );
        self.buffer.grow(new_capacity, self.slot_of.values().copied());
    }
}

#[cfg(test)]
#[path = "instance_pool_tests.rs"]
mod tests;
