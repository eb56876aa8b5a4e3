//! Blob store implementations.

pub mod local;
pub mod memory;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

use filenest_core::error::AppError;
use filenest_core::result::AppResult;

/// Normalize a `/`-separated blob path.
///
/// Leading and trailing separators are dropped and empty segments are
/// collapsed. `.` and `..` segments are rejected so no path can leave the
/// store root. An empty result is allowed and denotes the root prefix.
pub fn normalize_path(path: &str) -> AppResult<String> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" => continue,
            "." | ".." => {
                return Err(AppError::validation(format!(
                    "Blob path must not contain relative segments: {path}"
                )));
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

/// Progress fraction after `done` of `total` bytes.
pub(crate) fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        (done as f64 / total as f64).clamp(0.0, 1.0)
    }
}
