/// Instance attribute types for the pool.
///
/// An InstanceAttributes describes one annotated object: a stable,
/// caller-assigned id plus the transform and appearance of its instanced
/// buffer row. The pool never exposes row indices as identifiers: callers
/// only ever hold ids.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

// ===== INSTANCE ATTRIBUTES =====

/// Attributes of one annotated object.
///
/// Created by the caller and handed to [`InstancePool::upsert`]; re-calling
/// `upsert` with the same id mutates the object in place, and
/// [`InstancePool::remove`] destroys it.
///
/// [`InstancePool::upsert`]: super::InstancePool::upsert
/// [`InstancePool::remove`]: super::InstancePool::remove
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceAttributes {
    /// Stable, caller-assigned, unique id
    pub id: String,
    /// Translation
    pub position: Vec3,
    /// Rotation
    pub orientation: Quat,
    /// Per-axis scale
    pub scale: Vec3,
    /// Optional RGB color (white when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec3>,
    /// Optional opaque payload carried alongside the instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<serde_json::Value>,
}

impl InstanceAttributes {
    /// Create attributes with no color and no user data
    pub fn new(id: impl Into<String>, position: Vec3, orientation: Quat, scale: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            orientation,
            scale,
            color: None,
            user_data: None,
        }
    }

    /// Attach an RGB color
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = Some(color);
        self
    }

    /// Attach an opaque payload
    pub fn with_user_data(mut self, user_data: serde_json::Value) -> Self {
        self.user_data = Some(user_data);
        self
    }

    /// Local transform composed from position, orientation, and scale
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }
}

// ===== AABB =====

/// Axis-Aligned Bounding Box
///
/// Stored in local space for the pool's base geometry and transformed by
/// an instance's world matrix when a world-space box is requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Aabb {
    /// Unit box centered at the origin: the base wireframe geometry the
    /// annotation boxes are instanced from.
    pub const UNIT: Aabb = Aabb {
        min: Vec3::new(-0.5, -0.5, -0.5),
        max: Vec3::new(0.5, 0.5, 0.5),
    };

    /// Transform this local-space AABB by a matrix, returning a new AABB.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the AABB
    /// extents for an exact (tight) result without transforming all 8
    /// corners.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        Aabb { min: new_min, max: new_max }
    }

    /// Center point of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent of the box along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
