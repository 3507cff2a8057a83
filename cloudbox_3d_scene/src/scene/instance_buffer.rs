/// Instanced row storage backing the pool.
///
/// Two parallel arrays, one row per slot: a 4x4 transform and an RGB
/// color. Freed and never-used rows hold a zero-scale transform so they
/// draw nothing without shifting any other row. The upload side drains the
/// dirty flags once per frame and reads the raw byte views.

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

use super::instance::InstanceAttributes;

bitflags! {
    /// Which row arrays changed since the last upload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u32 {
        /// Transform rows changed
        const TRANSFORMS = 1 << 0;
        /// Color rows changed
        const COLORS = 1 << 1;
    }
}

/// Transform stored in rows that must draw nothing.
///
/// Zero scale collapses the instance while keeping w = 1, matching what an
/// instanced draw expects of a still-present row.
fn zero_scale_matrix() -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO)
}

/// Rows freed or never written default to white, the base line-material
/// color of the annotation wireframe.
const DEFAULT_COLOR: Vec3 = Vec3::ONE;

/// Capacity-bounded instanced row storage.
///
/// Owned exclusively by [`InstancePool`]; slots are assigned by the pool's
/// arena and never exposed to callers as persistent identifiers.
///
/// [`InstancePool`]: super::InstancePool
pub struct InstanceBuffer {
    transforms: Vec<Mat4>,
    colors: Vec<Vec3>,
    dirty: DirtyFlags,
}

impl InstanceBuffer {
    /// Create storage with every row zero-scaled (drawing nothing)
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            transforms: vec![zero_scale_matrix(); capacity as usize],
            colors: vec![DEFAULT_COLOR; capacity as usize],
            dirty: DirtyFlags::empty(),
        }
    }

    /// Current row count
    pub fn capacity(&self) -> u32 {
        self.transforms.len() as u32
    }

    /// Write one instance's rows. Does NOT mark the buffer dirty: the
    /// pool marks once per batch, not once per instance.
    pub fn write(&mut self, slot: u32, attributes: &InstanceAttributes) {
        self.transforms[slot as usize] = attributes.local_matrix();
        if let Some(color) = attributes.color {
            self.colors[slot as usize] = color;
        }
    }

    /// Zero-scale a freed row so it draws nothing
    pub fn zero_slot(&mut self, slot: u32) {
        self.transforms[slot as usize] = zero_scale_matrix();
    }

    /// Transform row at a slot
    pub fn transform(&self, slot: u32) -> Mat4 {
        self.transforms[slot as usize]
    }

    /// Color row at a slot
    pub fn color(&self, slot: u32) -> Vec3 {
        self.colors[slot as usize]
    }

    /// Grow to `new_capacity` rows, preserving every active slot's rows at
    /// the *same* index. No-op if `new_capacity` does not exceed the
    /// current capacity.
    ///
    /// Allocates fresh storage, re-writes the active rows, then swaps: the
    /// old storage is never observable half-migrated, and slot indices are
    /// not remapped.
    pub fn grow(&mut self, new_capacity: u32, active_slots: impl Iterator<Item = u32>) {
        if new_capacity <= self.capacity() {
            return;
        }

        let mut transforms = vec![zero_scale_matrix(); new_capacity as usize];
        let mut colors = vec![DEFAULT_COLOR; new_capacity as usize];
        for slot in active_slots {
            transforms[slot as usize] = self.transforms[slot as usize];
            colors[slot as usize] = self.colors[slot as usize];
        }
        self.transforms = transforms;
        self.colors = colors;
        self.dirty = DirtyFlags::all();
    }

    /// Mark row arrays as needing upload. Called once per pool batch.
    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }

    /// Drain and return the pending dirty flags
    pub fn take_dirty(&mut self) -> DirtyFlags {
        let dirty = self.dirty;
        self.dirty = DirtyFlags::empty();
        dirty
    }

    /// Pending dirty flags without draining them
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Raw bytes of the transform rows, for upload
    pub fn raw_transforms(&self) -> &[u8] {
        bytemuck::cast_slice(&self.transforms)
    }

    /// Raw bytes of the color rows, for upload
    pub fn raw_colors(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Release the backing storage
    pub fn dispose(&mut self) {
        self.transforms = Vec::new();
        self.colors = Vec::new();
        self.dirty = DirtyFlags::empty();
    }
}

#[cfg(test)]
#[path = "instance_buffer_tests.rs"]
mod tests;
