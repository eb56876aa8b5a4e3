//! Blob path layout.
//!
//! Objects live under `{owner}/{parent folder id | "root"}/`, so every
//! folder's direct files share one prefix. Owner and folder ids must be
//! single path segments, otherwise one owner's prefix could nest inside
//! another's.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use filenest_core::error::AppError;
use filenest_core::result::AppResult;
use filenest_core::types::{FolderId, OwnerId};

/// Prefix segment used for files at the root of an owner's tree.
pub const ROOT_SEGMENT: &str = "root";

/// Replace path separators in a user-supplied file name.
pub fn sanitize_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Check that `value` can stand alone as one blob path segment.
pub fn check_segment(value: &str, what: &str) -> AppResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || value.contains(['/', '\\']) {
        return Err(AppError::validation(format!(
            "{what} '{value}' is not a valid path segment"
        )));
    }
    Ok(())
}

/// Prefix holding the direct files of `folder` (or the root).
pub fn folder_prefix(owner: &OwnerId, folder: Option<&FolderId>) -> AppResult<String> {
    check_segment(owner.as_str(), "Owner id")?;
    let segment = match folder {
        Some(id) => {
            check_segment(id.as_str(), "Folder id")?;
            id.as_str()
        }
        None => ROOT_SEGMENT,
    };
    Ok(format!("{owner}/{segment}"))
}

/// Full object path for an upload started at `at`.
///
/// The random segment keeps same-named uploads within one millisecond
/// apart.
pub fn blob_path(
    owner: &OwnerId,
    folder: Option<&FolderId>,
    at: DateTime<Utc>,
    name: &str,
) -> AppResult<String> {
    Ok(format!(
        "{}/{}-{}-{}",
        folder_prefix(owner, folder)?,
        at.timestamp_millis(),
        Uuid::now_v7().simple(),
        sanitize_name(name)
    ))
}
