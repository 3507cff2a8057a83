/// Point-cloud seam: the dataset collaborator the coordinator owns.
///
/// File parsing lives outside this crate; sources implement
/// [`PointCloudLoader`] and hand back raw sample arrays. The holder keeps
/// the current arrays plus a bounding box recomputed on every data swap.

use glam::Vec3;

use crate::error::Result;
use crate::scene_bail;

use super::instance::Aabb;

/// Raw point-cloud sample arrays.
///
/// `position` holds xyz triplets; the remaining channels are optional and
/// empty when the source does not provide them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudData {
    pub position: Vec<f32>,
    pub normal: Vec<f32>,
    pub color: Vec<f32>,
    pub intensity: Vec<f32>,
    pub label: Vec<i32>,
}

/// Point-cloud source contract implemented by embedders.
///
/// Failures are propagated to the caller of
/// [`SharedScene::load_point_cloud`] and never retried; implementations
/// should report them as [`Error::LoadFailed`].
///
/// [`SharedScene::load_point_cloud`]: super::SharedScene::load_point_cloud
/// [`Error::LoadFailed`]: crate::error::Error::LoadFailed
pub trait PointCloudLoader: Send {
    fn load(&self, url: &str) -> Result<PointCloudData>;
}

/// Current point-cloud dataset and its bounds.
pub struct PointCloud {
    data: PointCloudData,
    bounds: Option<Aabb>,
    loader: Option<Box<dyn PointCloudLoader>>,
}

impl PointCloud {
    /// Create an empty holder with no loader configured
    pub fn new() -> Self {
        Self {
            data: PointCloudData::default(),
            bounds: None,
            loader: None,
        }
    }

    /// Install the source used by [`load`](Self::load)
    pub fn set_loader(&mut self, loader: Box<dyn PointCloudLoader>) {
        self.loader = Some(loader);
    }

    /// Whether a loader is configured
    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    /// Replace the sample arrays and recompute the bounds
    pub fn update_data(&mut self, data: PointCloudData) {
        self.bounds = compute_bounds(&data.position);
        self.data = data;
    }

    /// Load from a source url and swap the data in.
    ///
    /// # Errors
    ///
    /// Fails if no loader is configured or the loader rejects the url; a
    /// failed load leaves the current data untouched.
    pub fn load(&mut self, url: &str) -> Result<()> {
        let Some(loader) = self.loader.as_ref() else {
            scene_bail!("cloudbox3d::PointCloud", "no point-cloud loader configured");
        };
        let data = loader.load(url)?;
        self.update_data(data);
        Ok(())
    }

    /// Current sample arrays
    pub fn data(&self) -> &PointCloudData {
        &self.data
    }

    /// Bounding box of the positions (None when the cloud is empty)
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Number of points in the current dataset
    pub fn point_count(&self) -> usize {
        self.data.position.len() / 3
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_bounds(position: &[f32]) -> Option<Aabb> {
    if position.len() < 3 {
        return None;
    }
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for point in position.chunks_exact(3) {
        let point = Vec3::new(point[0], point[1], point[2]);
        min = min.min(point);
        max = max.max(point);
    }
    Some(Aabb { min, max })
}

#[cfg(test)]
#[path = "point_cloud_tests.rs"]
mod tests;
