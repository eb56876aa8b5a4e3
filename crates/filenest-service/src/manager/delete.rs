//! Deletion of files and cascading deletion of folder subtrees.
//!
//! Records are always removed before blobs. Metadata commits are never
//! rolled back; blob cleanup failures are reported in [`DeleteOutcome`]
//! instead of failing the call.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use filenest_core::error::{AppError, ErrorKind, StoreOperation};
use filenest_core::result::AppResult;
use filenest_core::traits::CommitSummary;
use filenest_core::types::FolderId;
use filenest_entity::{Collection, FileRecord, FolderRecord};

use super::HierarchicalStorageManager;
use crate::paths;

/// A blob that could not be removed after its record was deleted.
#[derive(Debug, Clone)]
pub struct BlobCleanupFailure {
    /// Blob path (or listing prefix) that failed.
    pub path: String,
    /// The store's error.
    pub error: AppError,
}

/// Result of a delete operation.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// File records removed. Records that were already gone are not counted.
    pub files_deleted: usize,
    /// Folder records removed.
    pub folders_deleted: usize,
    /// Blobs removed, including ones that were already gone.
    pub blob_paths_deleted: usize,
    /// Blobs left behind.
    pub blob_failures: Vec<BlobCleanupFailure>,
}

impl DeleteOutcome {
    /// Whether every blob was cleaned up.
    pub fn is_clean(&self) -> bool {
        self.blob_failures.is_empty()
    }
}

/// Records of a folder subtree, in deletion order.
#[derive(Debug, Default)]
struct CascadePlan {
    /// `(collection, id)` pairs, children before parents.
    staged: Vec<(Collection, String)>,
    /// Every folder in the subtree, root first.
    folders: Vec<FolderId>,
    /// Every file in the subtree.
    files: Vec<FileRecord>,
}

impl HierarchicalStorageManager {
    /// Delete one file record and its blobs.
    ///
    /// Deleting a file whose record is already gone succeeds.
    pub async fn delete_file(&self, file: &FileRecord) -> AppResult<DeleteOutcome> {
        self.require_owned(
            &file.owner_id,
            Collection::Files,
            file.id.as_str(),
            StoreOperation::Delete,
        )?;

        let mut batch = self.metadata.begin_batch();
        batch.delete(Collection::Files.as_str(), file.id.as_str());
        let summary = self.metadata.commit(batch).await?;

        let paths = file.blob_paths().into_iter().map(String::from).collect();
        let mut outcome = DeleteOutcome {
            files_deleted: summary.removed(Collection::Files.as_str()),
            ..DeleteOutcome::default()
        };
        self.delete_blobs(paths, &mut outcome).await;

        info!(
            owner_id = %self.owner(),
            file_id = %file.id,
            clean = outcome.is_clean(),
            "File deleted"
        );
        Ok(outcome)
    }

    /// Delete several file records, then their blobs.
    ///
    /// Ownership of every file is checked before anything is removed.
    pub async fn delete_files(&self, files: &[FileRecord]) -> AppResult<DeleteOutcome> {
        for file in files {
            self.require_owned(
                &file.owner_id,
                Collection::Files,
                file.id.as_str(),
                StoreOperation::Delete,
            )?;
        }

        let mut seen = HashSet::new();
        let unique: Vec<&FileRecord> = files.iter().filter(|f| seen.insert(&f.id)).collect();
        if unique.is_empty() {
            return Ok(DeleteOutcome::default());
        }

        let staged = unique
            .iter()
            .map(|f| (Collection::Files, f.id.to_string()))
            .collect();
        let summary = self.commit_staged(staged).await?;

        let paths: BTreeSet<String> = unique
            .iter()
            .flat_map(|f| f.blob_paths())
            .map(String::from)
            .collect();
        let mut outcome = DeleteOutcome {
            files_deleted: summary.removed(Collection::Files.as_str()),
            ..DeleteOutcome::default()
        };
        self.delete_blobs(paths.into_iter().collect(), &mut outcome).await;

        info!(
            owner_id = %self.owner(),
            files = outcome.files_deleted,
            blob_failures = outcome.blob_failures.len(),
            "Files deleted"
        );
        Ok(outcome)
    }

    /// Delete a folder, everything beneath it, and all their blobs.
    ///
    /// A folder that no longer exists is a successful no-op.
    pub async fn delete_folder_recursive(&self, folder_id: &FolderId) -> AppResult<DeleteOutcome> {
        let Some(root) = self.load_folder(folder_id).await? else {
            debug!(owner_id = %self.owner(), folder_id = %folder_id, "Folder already gone");
            return Ok(DeleteOutcome::default());
        };
        self.require_owned(
            &root.owner_id,
            Collection::Folders,
            root.id.as_str(),
            StoreOperation::Delete,
        )?;

        let plan = self.plan_cascade(&root).await?;
        let staged_count = plan.staged.len();
        let summary = self.commit_staged(plan.staged).await?;

        let mut outcome = DeleteOutcome {
            files_deleted: summary.removed(Collection::Files.as_str()),
            folders_deleted: summary.removed(Collection::Folders.as_str()),
            ..DeleteOutcome::default()
        };

        let mut paths: BTreeSet<String> = plan
            .files
            .iter()
            .flat_map(|f| f.blob_paths())
            .map(String::from)
            .collect();
        for folder in &plan.folders {
            let listed = match paths::folder_prefix(self.owner(), Some(folder)) {
                Ok(prefix) => self
                    .blobs
                    .list_all_under_prefix(&prefix)
                    .await
                    .map_err(|e| (prefix, e)),
                Err(e) => Err((folder.to_string(), e)),
            };
            match listed {
                Ok(objects) => paths.extend(objects),
                Err((prefix, error)) => {
                    warn!(prefix = %prefix, error = %error, "Blob prefix listing failed");
                    outcome.blob_failures.push(BlobCleanupFailure {
                        path: prefix,
                        error,
                    });
                }
            }
        }
        self.delete_blobs(paths.into_iter().collect(), &mut outcome).await;

        info!(
            owner_id = %self.owner(),
            folder_id = %root.id,
            records = staged_count,
            blobs = outcome.blob_paths_deleted,
            blob_failures = outcome.blob_failures.len(),
            "Folder deleted recursively"
        );
        Ok(outcome)
    }

    /// Walk the subtree under `root` and stage its records children first.
    async fn plan_cascade(&self, root: &FolderRecord) -> AppResult<CascadePlan> {
        let mut pending = vec![root.id.clone()];
        let mut visited = HashSet::new();
        let mut discovered: Vec<(FolderId, Vec<FileRecord>)> = Vec::new();

        while let Some(folder_id) = pending.pop() {
            if !visited.insert(folder_id.clone()) {
                warn!(folder_id = %folder_id, "Folder reached twice during cascade");
                continue;
            }

            let predicates = Collection::children_of(self.owner(), Some(&folder_id));
            let files = self
                .metadata
                .get_once(Collection::Files.as_str(), &predicates)
                .await?
                .iter()
                .map(FileRecord::from_document)
                .collect::<AppResult<Vec<_>>>()?
                .into_iter()
                .filter(|f| self.ctx.owns(&f.owner_id))
                .collect();
            let subfolders = self
                .metadata
                .get_once(Collection::Folders.as_str(), &predicates)
                .await?
                .iter()
                .map(FolderRecord::from_document)
                .collect::<AppResult<Vec<_>>>()?;

            pending.extend(
                subfolders
                    .into_iter()
                    .filter(|f| self.ctx.owns(&f.owner_id) && !visited.contains(&f.id))
                    .map(|f| f.id),
            );
            discovered.push((folder_id, files));
        }

        // Discovery order puts every folder after its parent, so the reverse
        // stages children before parents and the root last.
        let mut plan = CascadePlan::default();
        for (folder_id, files) in discovered.iter().rev() {
            for file in files {
                plan.staged.push((Collection::Files, file.id.to_string()));
            }
            plan.staged.push((Collection::Folders, folder_id.to_string()));
        }
        for (folder_id, files) in discovered {
            plan.folders.push(folder_id);
            plan.files.extend(files);
        }

        debug!(
            folder_id = %root.id,
            folders = plan.folders.len(),
            files = plan.files.len(),
            "Cascade planned"
        );
        Ok(plan)
    }

    /// Commit record deletions in order, in chunks the store accepts.
    ///
    /// A plan that fits one batch is all-or-nothing. Otherwise chunks are
    /// committed in sequence and a failure reports how many records were
    /// already removed.
    async fn commit_staged(&self, staged: Vec<(Collection, String)>) -> AppResult<CommitSummary> {
        let limit = self.batch_limit();
        let total = staged.len();
        let mut committed = 0usize;
        let mut summary = CommitSummary::default();

        for chunk in staged.chunks(limit) {
            let mut batch = self.metadata.begin_batch();
            for (collection, id) in chunk {
                batch.delete(collection.as_str(), id.as_str());
            }

            match self.metadata.commit(batch).await {
                Ok(chunk_summary) => summary.merge(chunk_summary),
                Err(e) if e.is_authorization() => return Err(e),
                Err(e) => {
                    let resource = e.resource.clone();
                    let mut err = AppError::with_source(
                        ErrorKind::BulkDelete,
                        format!(
                            "Metadata commit failed after {committed} of {total} records were removed: {}",
                            e.message
                        ),
                        e,
                    );
                    err.resource = resource;
                    return Err(err);
                }
            }
            committed += chunk.len();
            debug!(committed, total, "Committed delete batch");
        }
        Ok(summary)
    }

    /// Delete `paths` concurrently, recording results in `outcome`.
    ///
    /// A blob that is already gone counts as deleted.
    async fn delete_blobs(&self, paths: Vec<String>, outcome: &mut DeleteOutcome) {
        let concurrency = self.config.blob_delete_concurrency.max(1);
        let results: Vec<(String, AppResult<()>)> = stream::iter(paths)
            .map(|path| {
                let blobs = Arc::clone(&self.blobs);
                async move {
                    let result = blobs.delete(&path).await;
                    (path, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut failures = Vec::new();
        for (path, result) in results {
            match result {
                Ok(()) => outcome.blob_paths_deleted += 1,
                Err(e) if e.is_not_found() => outcome.blob_paths_deleted += 1,
                Err(error) => {
                    warn!(path = %path, error = %error, "Blob cleanup failed");
                    failures.push(BlobCleanupFailure { path, error });
                }
            }
        }
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        outcome.blob_failures.extend(failures);
    }
}
