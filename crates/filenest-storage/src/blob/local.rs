//! Local filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use filenest_core::error::{AppError, ErrorKind, StoreOperation};
use filenest_core::result::AppResult;
use filenest_core::traits::blob::{BlobListing, BlobStore, ProgressFn};

use super::{fraction, normalize_path};

/// Blob store writing objects as files beneath a root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Canonical root directory for all stored objects.
    root: PathBuf,
    /// Bytes written between progress reports.
    chunk_size: usize,
}

impl LocalBlobStore {
    /// Create a store rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: impl AsRef<Path>, chunk_size: usize) -> AppResult<Self> {
        let root = root_path.as_ref();
        fs::create_dir_all(root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        let root = fs::canonicalize(root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            chunk_size: chunk_size.max(1),
        })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob path to a file path within the root.
    fn resolve(&self, path: &str) -> AppResult<(String, PathBuf)> {
        let key = normalize_path(path)?;
        let full = key.split('/').fold(self.root.clone(), |acc, s| acc.join(s));
        Ok((key, full))
    }

    async fn write_chunks(
        &self,
        full_path: &Path,
        data: &Bytes,
        on_progress: ProgressFn<'_>,
    ) -> std::io::Result<()> {
        let mut file = fs::File::create(full_path).await?;
        let total = data.len();
        let mut written = 0usize;
        for chunk in data.chunks(self.chunk_size) {
            file.write_all(chunk).await?;
            written += chunk.len();
            on_progress(fraction(written, total));
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Remove empty directories from `dir` up to, but excluding, the root.
    async fn prune_empty_dirs(&self, mut dir: Option<&Path>) {
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            // Fails on non-empty directories, which ends the walk.
            if fs::remove_dir(current).await.is_err() {
                break;
            }
            dir = current.parent();
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        on_progress: ProgressFn<'_>,
    ) -> AppResult<String> {
        let (key, full_path) = self.resolve(path)?;
        if key.is_empty() {
            return Err(AppError::validation("Blob path must not be empty")
                .on_resource(path, StoreOperation::Upload));
        }

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
                .on_resource(&key, StoreOperation::Upload)
            })?;
        }

        on_progress(0.0);
        if let Err(e) = self.write_chunks(&full_path, &data, on_progress).await {
            if let Err(cleanup) = fs::remove_file(&full_path).await {
                warn!(path = %key, error = %cleanup, "Failed to remove partial blob");
            }
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write blob: {key}"),
                e,
            )
            .on_resource(&key, StoreOperation::Upload));
        }
        if data.is_empty() {
            on_progress(1.0);
        }

        debug!(path = %key, bytes = data.len(), "Wrote blob");
        Ok(key)
    }

    async fn get_url(&self, path: &str) -> AppResult<String> {
        let (key, full_path) = self.resolve(path)?;
        match fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => Ok(format!("file://{}", full_path.display())),
            Ok(_) => Err(AppError::not_found(format!("Blob not found: {key}"))
                .on_resource(&key, StoreOperation::GetUrl)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("Blob not found: {key}"))
                    .on_resource(&key, StoreOperation::GetUrl))
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to stat blob: {key}"),
                e,
            )
            .on_resource(&key, StoreOperation::GetUrl)),
        }
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let (key, full_path) = self.resolve(path)?;
        if key.is_empty() {
            return Err(AppError::validation("Blob path must not be empty")
                .on_resource(path, StoreOperation::Delete));
        }

        fs::remove_file(&full_path).await.map_err(|e| {
            let err = if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete blob: {key}"),
                    e,
                )
            };
            err.on_resource(&key, StoreOperation::Delete)
        })?;

        self.prune_empty_dirs(full_path.parent()).await;
        debug!(path = %key, "Deleted blob");
        Ok(())
    }

    async fn list_under_prefix(&self, prefix: &str) -> AppResult<BlobListing> {
        let (base, full_path) = self.resolve(prefix)?;
        let mut listing = BlobListing::default();

        let mut dir = match fs::read_dir(&full_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(listing),
            Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => return Ok(listing),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list prefix: {base}"),
                    e,
                )
                .on_resource(&base, StoreOperation::List));
            }
        };

        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let file_type = entry.file_type().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to get entry type", e)
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            let entry_path = if base.is_empty() {
                name
            } else {
                format!("{base}/{name}")
            };

            if file_type.is_dir() {
                listing.sub_prefixes.push(entry_path);
            } else if file_type.is_file() {
                listing.objects.push(entry_path);
            }
        }

        listing.objects.sort();
        listing.sub_prefixes.sort();
        Ok(listing)
    }
}
