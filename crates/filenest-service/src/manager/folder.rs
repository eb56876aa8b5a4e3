//! Folder creation, single-record reads, and ancestry.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use filenest_core::error::{AppError, StoreOperation};
use filenest_core::result::AppResult;
use filenest_core::types::{FileId, FolderId};
use filenest_entity::{Collection, CreateFolder, FileRecord, FolderRecord};

use super::HierarchicalStorageManager;

/// Request to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name, already trimmed.
    #[validate(length(min = 1, max = 100, message = "Folder name must be 1-100 characters"))]
    pub name: String,
    /// Parent folder ID (None for root-level).
    pub parent_folder_id: Option<FolderId>,
}

impl CreateFolderRequest {
    /// Build a request, trimming the name.
    pub fn new(parent_folder_id: Option<&FolderId>, name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            parent_folder_id: parent_folder_id.cloned(),
        }
    }
}

impl HierarchicalStorageManager {
    /// Create a folder named `name` under `parent` (`None` for the root).
    pub async fn create_folder(
        &self,
        parent: Option<&FolderId>,
        name: &str,
    ) -> AppResult<FolderRecord> {
        let req = CreateFolderRequest::new(parent, name);
        req.validate()?;
        self.require_parent(req.parent_folder_id.as_ref()).await?;

        let body = CreateFolder {
            name: req.name,
            owner_id: self.owner().clone(),
            parent_folder_id: req.parent_folder_id,
            created_at: Utc::now(),
        };
        let id = self
            .metadata
            .insert(Collection::Folders.as_str(), body.to_document()?)
            .await?;

        let folder = FolderRecord::from_create(FolderId::new(id), body);
        info!(
            owner_id = %self.owner(),
            folder_id = %folder.id,
            name = %folder.name,
            "Folder created"
        );
        Ok(folder)
    }

    /// Gets one of the owner's folders by ID.
    pub async fn get_folder(&self, id: &FolderId) -> AppResult<FolderRecord> {
        self.load_folder(id)
            .await?
            .filter(|f| self.ctx.owns(&f.owner_id))
            .ok_or_else(|| AppError::not_found(format!("Folder not found: {id}")))
    }

    /// Gets one of the owner's files by ID.
    pub async fn get_file(&self, id: &FileId) -> AppResult<FileRecord> {
        self.load_file(id)
            .await?
            .filter(|f| self.ctx.owns(&f.owner_id))
            .ok_or_else(|| AppError::not_found(format!("File not found: {id}")))
    }

    /// Folders from the root down to `folder`, inclusive.
    ///
    /// The walk stops early at a missing or foreign ancestor.
    pub async fn breadcrumbs(&self, folder: Option<&FolderId>) -> AppResult<Vec<FolderRecord>> {
        let Some(folder) = folder else {
            return Ok(Vec::new());
        };

        let start = self.get_folder(folder).await?;
        let mut visited = HashSet::from([start.id.clone()]);
        let mut next = start.parent_folder_id.clone();
        let mut chain = vec![start];

        while let Some(id) = next {
            if !visited.insert(id.clone()) {
                warn!(owner_id = %self.owner(), folder_id = %id, "Folder ancestry has a cycle");
                break;
            }
            match self.load_folder(&id).await? {
                Some(parent) if self.ctx.owns(&parent.owner_id) => {
                    next = parent.parent_folder_id.clone();
                    chain.push(parent);
                }
                _ => break,
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// URL the file's contents can be fetched from.
    pub async fn download_url(&self, file: &FileRecord) -> AppResult<String> {
        self.require_owned(
            &file.owner_id,
            Collection::Files,
            file.id.as_str(),
            StoreOperation::GetUrl,
        )?;
        self.blobs.get_url(&file.blob_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_trims_and_validates() {
        assert!(CreateFolderRequest::new(None, "  Docs  ").validate().is_ok());
        assert_eq!(CreateFolderRequest::new(None, "  Docs  ").name, "Docs");
        assert!(CreateFolderRequest::new(None, "   ").validate().is_err());
        assert!(CreateFolderRequest::new(None, &"x".repeat(101)).validate().is_err());
        assert!(CreateFolderRequest::new(None, &"é".repeat(100)).validate().is_ok());
    }
}
