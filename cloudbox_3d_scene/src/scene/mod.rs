//! Shared scene module
//!
//! Provides the instance pool (id-addressed instanced storage with slot
//! recycling and capacity growth), the shared-scene coordinator (selection,
//! events, coalesced render scheduling), and the collaborator seams for
//! viewports and point-cloud sources.

mod instance;
mod instance_buffer;
mod instance_pool;
#[cfg(test)]
mod mock_viewport;
mod point_cloud;
mod share_scene;
mod viewport;

pub use instance::{Aabb, InstanceAttributes};
pub use instance_buffer::{DirtyFlags, InstanceBuffer};
pub use instance_pool::{InstancePool, PoolSnapshot};
#[cfg(test)]
pub use mock_viewport::MockViewport;
pub use point_cloud::{PointCloud, PointCloudData, PointCloudLoader};
pub use share_scene::{SharedScene, DEFAULT_BOX_CAPACITY};
pub use viewport::Viewport;
