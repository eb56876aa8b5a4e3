//! File upload: blob first, then the record.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use filenest_core::error::{AppError, ErrorKind, StoreOperation};
use filenest_core::result::AppResult;
use filenest_core::traits::ProgressFn;
use filenest_core::types::{FileId, FolderId};
use filenest_entity::file::guess_mime_type;
use filenest_entity::{Collection, CreateFile, FileRecord};

use super::HierarchicalStorageManager;
use crate::paths;

/// MIME type recorded when none is given and none can be guessed.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Forwards progress clamped to `[0, 1]` and never decreasing.
struct MonotoneProgress<'a> {
    inner: ProgressFn<'a>,
    /// Bit pattern of the highest fraction reported so far. Non-negative
    /// floats order the same as their bit patterns.
    last: AtomicU64,
}

impl<'a> MonotoneProgress<'a> {
    fn new(inner: ProgressFn<'a>) -> Self {
        Self {
            inner,
            last: AtomicU64::new(0f64.to_bits()),
        }
    }

    fn report(&self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let bits = fraction.to_bits();
        let previous = self.last.fetch_max(bits, Ordering::AcqRel);
        (self.inner)(f64::from_bits(previous.max(bits)));
    }

    fn finish(&self) {
        if f64::from_bits(self.last.load(Ordering::Acquire)) < 1.0 {
            self.report(1.0);
        }
    }
}

impl HierarchicalStorageManager {
    /// Upload `data` as `name` into `parent` and record it.
    ///
    /// An empty `mime_type` is guessed from the name's extension.
    pub async fn create_file(
        &self,
        parent: Option<&FolderId>,
        data: Bytes,
        name: &str,
        mime_type: &str,
        on_progress: ProgressFn<'_>,
    ) -> AppResult<FileRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("File name must not be empty"));
        }
        let size_bytes = data.len() as u64;
        if size_bytes > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File of {size_bytes} bytes exceeds the upload limit of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }
        self.require_parent(parent).await?;

        let mime_type = match mime_type.trim() {
            "" => guess_mime_type(name).unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            given => given.to_string(),
        };

        let path = paths::blob_path(self.owner(), parent, Utc::now(), name)?;
        let progress = MonotoneProgress::new(on_progress);
        let report = |fraction: f64| progress.report(fraction);

        let blob_path = match self.blobs.upload(&path, data, &report).await {
            Ok(stored) => stored,
            Err(e) if e.is_authorization() => return Err(e),
            Err(e) => {
                let message = format!("Upload of '{name}' failed: {}", e.message);
                return Err(AppError::with_source(ErrorKind::UploadFailed, message, e)
                    .on_resource(path, StoreOperation::Upload));
            }
        };
        progress.finish();

        let mut body = CreateFile {
            name: name.to_string(),
            size_bytes,
            mime_type,
            created_at: Utc::now(),
            owner_id: self.owner().clone(),
            parent_folder_id: parent.cloned(),
            blob_path,
            thumbnail_path: None,
        };
        if body.is_image() {
            body.thumbnail_path = Some(body.blob_path.clone());
        }

        let id = match self
            .metadata
            .insert(Collection::Files.as_str(), body.to_document()?)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    owner_id = %self.owner(),
                    blob_path = %body.blob_path,
                    error = %e,
                    "File record insert failed; blob is orphaned"
                );
                return Err(e);
            }
        };

        let file = FileRecord::from_create(FileId::new(id), body);
        info!(
            owner_id = %self.owner(),
            file_id = %file.id,
            name = %file.name,
            size = file.size_bytes,
            "File uploaded"
        );
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_is_clamped_and_monotone() {
        let seen = Mutex::new(Vec::new());
        let record = |p: f64| seen.lock().unwrap().push(p);
        let progress = MonotoneProgress::new(&record);

        for p in [0.2, 0.1, 1.5, f64::NAN, 0.5] {
            progress.report(p);
        }
        progress.finish();

        assert_eq!(seen.into_inner().unwrap(), vec![0.2, 0.2, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_finish_reports_completion_once() {
        let seen = Mutex::new(Vec::new());
        let record = |p: f64| seen.lock().unwrap().push(p);
        let progress = MonotoneProgress::new(&record);

        progress.report(0.5);
        progress.finish();
        progress.finish();

        assert_eq!(seen.into_inner().unwrap(), vec![0.5, 1.0]);
    }
}
