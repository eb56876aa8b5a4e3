//! Folder record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filenest_core::error::AppError;
use filenest_core::result::AppResult;
use filenest_core::traits::Document;
use filenest_core::types::{FolderId, OwnerId};

/// A folder in a user's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    /// Store-assigned folder identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// The folder owner.
    pub owner_id: OwnerId,
    /// Parent folder ID (None for root folders).
    pub parent_folder_id: Option<FolderId>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl FolderRecord {
    /// Join a document id with its decoded body.
    pub fn from_create(id: FolderId, body: CreateFolder) -> Self {
        Self {
            id,
            name: body.name,
            owner_id: body.owner_id,
            parent_folder_id: body.parent_folder_id,
            created_at: body.created_at,
        }
    }

    /// Decode a folder from a `folders` document.
    pub fn from_document(doc: &Document) -> AppResult<Self> {
        let body: CreateFolder = serde_json::from_value(doc.data.clone()).map_err(|e| {
            AppError::with_source(
                filenest_core::ErrorKind::Serialization,
                format!("Malformed folder document '{}'", doc.id),
                e,
            )
        })?;
        Ok(Self::from_create(FolderId::new(doc.id.clone()), body))
    }

    /// Check if this is a root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_folder_id.is_none()
    }
}

/// Document body of a folder, as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolder {
    /// Folder name.
    pub name: String,
    /// The folder owner.
    pub owner_id: OwnerId,
    /// Parent folder (None for root).
    #[serde(default)]
    pub parent_folder_id: Option<FolderId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CreateFolder {
    /// Serialize into a store document body.
    pub fn to_document(&self) -> AppResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
