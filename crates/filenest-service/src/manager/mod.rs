//! The hierarchical storage manager.
//!
//! One manager serves one [`SessionContext`]. Folder and file records live
//! in the metadata store; file contents live in the blob store. The manager
//! keeps the two consistent: uploads write the blob before the record, and
//! deletes remove records before blobs, so a crash can orphan a blob but
//! never leave a record pointing at nothing.

pub mod delete;
pub mod folder;
pub mod listing;
pub mod upload;

use std::sync::Arc;

use tracing::debug;

use filenest_core::config::AppConfig;
use filenest_core::error::{AppError, StoreOperation};
use filenest_core::result::AppResult;
use filenest_core::traits::{BlobStore, MetadataStore};
use filenest_core::types::{FileId, FolderId, OwnerId};
use filenest_entity::{Collection, FileRecord, FolderRecord};

use crate::context::SessionContext;

pub use delete::{BlobCleanupFailure, DeleteOutcome};
pub use folder::CreateFolderRequest;
pub use listing::{ChildrenSnapshot, ChildrenSubscription};

/// Limits applied by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Largest accepted upload.
    pub max_upload_size_bytes: u64,
    /// Operations per metadata commit. The store's own limit also applies.
    pub max_batch_operations: usize,
    /// Concurrent blob deletions during cleanup.
    pub blob_delete_concurrency: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ManagerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_upload_size_bytes: config.storage.max_upload_size_bytes,
            max_batch_operations: config.metadata.max_batch_operations,
            blob_delete_concurrency: config.metadata.blob_delete_concurrency,
        }
    }
}

/// Session-scoped manager for a user's folder and file tree.
#[derive(Debug, Clone)]
pub struct HierarchicalStorageManager {
    /// Who every operation acts as.
    ctx: SessionContext,
    /// Record storage.
    metadata: Arc<dyn MetadataStore>,
    /// Content storage.
    blobs: Arc<dyn BlobStore>,
    /// Limits.
    config: ManagerConfig,
}

impl HierarchicalStorageManager {
    /// Creates a new manager.
    pub fn new(
        ctx: SessionContext,
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        config: ManagerConfig,
    ) -> Self {
        debug!(
            owner_id = %ctx.owner_id,
            metadata = metadata.store_type(),
            blobs = blobs.provider_type(),
            "Storage manager created"
        );
        Self {
            ctx,
            metadata,
            blobs,
            config,
        }
    }

    /// The session this manager acts for.
    pub fn session(&self) -> &SessionContext {
        &self.ctx
    }

    /// The owner every record is scoped to.
    pub fn owner(&self) -> &OwnerId {
        &self.ctx.owner_id
    }

    /// Effective operations per commit.
    fn batch_limit(&self) -> usize {
        self.config
            .max_batch_operations
            .min(self.metadata.max_batch_operations())
            .max(1)
    }

    /// Read a folder record regardless of owner.
    async fn load_folder(&self, id: &FolderId) -> AppResult<Option<FolderRecord>> {
        self.metadata
            .get(Collection::Folders.as_str(), id.as_str())
            .await?
            .map(|doc| FolderRecord::from_document(&doc))
            .transpose()
    }

    /// Read a file record regardless of owner.
    async fn load_file(&self, id: &FileId) -> AppResult<Option<FileRecord>> {
        self.metadata
            .get(Collection::Files.as_str(), id.as_str())
            .await?
            .map(|doc| FileRecord::from_document(&doc))
            .transpose()
    }

    /// Check that `parent`, when given, is an existing folder of the owner.
    async fn require_parent(&self, parent: Option<&FolderId>) -> AppResult<()> {
        let Some(parent) = parent else {
            return Ok(());
        };
        match self.load_folder(parent).await? {
            Some(folder) if self.ctx.owns(&folder.owner_id) => Ok(()),
            _ => Err(AppError::not_found(format!("Parent folder not found: {parent}"))),
        }
    }

    /// Reject records that belong to someone else.
    fn require_owned(
        &self,
        owner: &OwnerId,
        collection: Collection,
        id: &str,
        operation: StoreOperation,
    ) -> AppResult<()> {
        if self.ctx.owns(owner) {
            Ok(())
        } else {
            Err(AppError::authorization_denied(
                format!("{collection}/{id}"),
                operation,
            ))
        }
    }
}
