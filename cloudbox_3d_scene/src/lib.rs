/*!
# Cloudbox 3D Scene

Shared scene core for a multi-viewport point-cloud annotation editor.

Many camera views (perspective, orthographic top/side/rear) observe one
shared data model: a point-cloud dataset plus a dynamically-changing set of
instanced annotation boxes. This crate provides the two subsystems every
view depends on:

- **InstancePool**: a capacity-bounded, id-addressed store of renderable
  instances backed by a single instanced buffer, with slot recycling and
  amortized 1.5x capacity growth.
- **SharedScene**: the single source of truth for which objects exist and
  which are selected, and the sole scheduler of render work: mutations
  from any number of viewports collapse into one coalesced frame pass.

Rendering backends, cameras, and input handling live outside this crate.
Viewports attach through the [`scene::Viewport`] trait and point-cloud
sources through the [`scene::PointCloudLoader`] trait.
*/

// Internal modules
pub mod error;
pub mod event;
pub mod log;
pub mod scene;
pub mod utils;

// Main cloudbox3d namespace module
pub mod cloudbox3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Event sub-module
    pub mod event {
        pub use crate::event::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
