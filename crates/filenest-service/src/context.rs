//! Session context carrying the identity every manager operation acts as.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use filenest_core::error::AppError;
use filenest_core::result::AppResult;
use filenest_core::types::OwnerId;

use crate::paths;

/// Identity of the signed-in user for the lifetime of a manager.
///
/// Built by whatever authenticates the user and handed to
/// [`HierarchicalStorageManager::new`](crate::HierarchicalStorageManager::new),
/// so every query and mutation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// The owner all records are scoped to.
    pub owner_id: OwnerId,
    /// The current session ID.
    pub session_id: Uuid,
    /// Human-readable name, when known.
    pub display_name: Option<String>,
    /// When the session was established.
    pub created_at: DateTime<Utc>,
}

impl SessionContext {
    /// Creates a session for `owner_id`.
    ///
    /// The owner id becomes the first segment of every blob path, so blank
    /// ids, ids containing `/` or `\`, and `.` or `..` are rejected.
    pub fn new(owner_id: impl Into<OwnerId>) -> AppResult<Self> {
        let owner_id = owner_id.into();
        if owner_id.is_blank() {
            return Err(AppError::validation("Owner id must not be empty"));
        }
        paths::check_segment(owner_id.as_str(), "Owner id")?;
        Ok(Self {
            owner_id,
            session_id: Uuid::new_v4(),
            display_name: None,
            created_at: Utc::now(),
        })
    }

    /// Attach a display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Whether `owner` is the session's owner.
    pub fn owns(&self, owner: &OwnerId) -> bool {
        &self.owner_id == owner
    }
}
