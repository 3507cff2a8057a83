//! Error types for the shared scene core.
//!
//! Two of the failure classes described by the crate never surface here:
//! removing an unknown id and selecting a vanished id are tolerated
//! silently (UI races are expected), and capacity growth is assumed to
//! succeed (host allocation failure is not handled).

use std::fmt;

/// Result type for scene core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Scene core errors
#[derive(Debug, Clone)]
pub enum Error {
    /// World-space query for an id absent from the pool.
    ///
    /// Callers only ever obtain ids from the same pool, so this is a
    /// programming-error signal rather than a recoverable condition.
    InstanceNotFound(String),

    /// Invalid resource or configuration (missing loader, bad snapshot)
    InvalidResource(String),

    /// Point-cloud load failed upstream; propagated, never retried
    LoadFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InstanceNotFound(id) => write!(f, "Instance not found: {}", id),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::LoadFailed(msg) => write!(f, "Point cloud load failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an error and produce an [`Error::InvalidResource`] value.
///
/// # Example
///
/// ```no_run
/// # use cloudbox_3d_scene::scene_err;
/// let err = scene_err!("cloudbox3d::SharedScene", "no loader configured");
/// ```
#[macro_export]
macro_rules! scene_err {
    ($source:expr, $($arg:tt)*) => {{
        $crate::scene_error!($source, $($arg)*);
        $crate::error::Error::InvalidResource(format!($($arg)*))
    }};
}

/// Log an error and return early with an [`Error::InvalidResource`].
///
/// # Example
///
/// ```no_run
/// # use cloudbox_3d_scene::{scene_bail, error::Result};
/// # fn load() -> Result<()> {
/// scene_bail!("cloudbox3d::PointCloud", "no loader configured");
/// # }
/// ```
#[macro_export]
macro_rules! scene_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::scene_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
