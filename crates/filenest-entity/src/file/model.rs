//! File record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filenest_core::error::{AppError, ErrorKind};
use filenest_core::result::AppResult;
use filenest_core::traits::Document;
use filenest_core::types::{FileId, FolderId, OwnerId};

use super::category::FileCategory;

/// A file stored in FileNest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Store-assigned file identifier.
    pub id: FileId,
    /// The file name (including extension).
    pub name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// MIME type of the file.
    pub mime_type: String,
    /// When the upload completed.
    pub created_at: DateTime<Utc>,
    /// The file owner.
    pub owner_id: OwnerId,
    /// The folder containing this file (None at the root).
    pub parent_folder_id: Option<FolderId>,
    /// The path within the blob store.
    pub blob_path: String,
    /// Thumbnail location (image files only).
    pub thumbnail_path: Option<String>,
}

impl FileRecord {
    /// Join a document id with its decoded body.
    pub fn from_create(id: FileId, body: CreateFile) -> Self {
        Self {
            id,
            name: body.name,
            size_bytes: body.size_bytes,
            mime_type: body.mime_type,
            created_at: body.created_at,
            owner_id: body.owner_id,
            parent_folder_id: body.parent_folder_id,
            blob_path: body.blob_path,
            thumbnail_path: body.thumbnail_path,
        }
    }

    /// Decode a file from a `files` document.
    pub fn from_document(doc: &Document) -> AppResult<Self> {
        let body: CreateFile = serde_json::from_value(doc.data.clone()).map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Malformed file document '{}'", doc.id),
                e,
            )
        })?;
        Ok(Self::from_create(FileId::new(doc.id.clone()), body))
    }

    /// Display category derived from MIME type and extension.
    pub fn category(&self) -> FileCategory {
        FileCategory::detect(&self.mime_type, &self.name)
    }

    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }

    /// Every blob this record references, without duplicates.
    pub fn blob_paths(&self) -> Vec<&str> {
        let mut paths = vec![self.blob_path.as_str()];
        if let Some(thumb) = self.thumbnail_path.as_deref() {
            if thumb != self.blob_path {
                paths.push(thumb);
            }
        }
        paths
    }
}

/// Document body of a file, as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFile {
    /// The file name.
    pub name: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// MIME type.
    pub mime_type: String,
    /// Upload completion time.
    pub created_at: DateTime<Utc>,
    /// The file owner.
    pub owner_id: OwnerId,
    /// The folder to place the file in.
    #[serde(default)]
    pub parent_folder_id: Option<FolderId>,
    /// The path within the blob store.
    pub blob_path: String,
    /// Thumbnail location.
    #[serde(default)]
    pub thumbnail_path: Option<String>,
}

impl CreateFile {
    /// Whether the MIME type is in the image family.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Serialize into a store document body.
    pub fn to_document(&self) -> AppResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(mime: &str, thumbnail: Option<&str>) -> FileRecord {
        FileRecord {
            id: FileId::new("f1"),
            name: "Report.Final.PDF".into(),
            size_bytes: 10,
            mime_type: mime.into(),
            created_at: Utc::now(),
            owner_id: OwnerId::new("u1"),
            parent_folder_id: Some(FolderId::new("d1")),
            blob_path: "u1/d1/1-report.pdf".into(),
            thumbnail_path: thumbnail.map(String::from),
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(sample("application/pdf", None).extension(), Some("pdf".into()));
    }

    #[test]
    fn test_blob_paths_dedup_thumbnail() {
        let file = sample("image/png", Some("u1/d1/1-report.pdf"));
        assert_eq!(file.blob_paths(), vec!["u1/d1/1-report.pdf"]);

        let file = sample("image/png", Some("u1/thumbs/1.png"));
        assert_eq!(file.blob_paths().len(), 2);
    }

    #[test]
    fn test_document_uses_camel_case() {
        let file = sample("application/pdf", None);
        let body = CreateFile {
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            mime_type: file.mime_type.clone(),
            created_at: file.created_at,
            owner_id: file.owner_id.clone(),
            parent_folder_id: file.parent_folder_id.clone(),
            blob_path: file.blob_path.clone(),
            thumbnail_path: None,
        };
        assert!(!body.is_image());
        let data = body.to_document().unwrap();
        assert_eq!(data["parentFolderId"], "d1");
        assert_eq!(data["blobPath"], "u1/d1/1-report.pdf");

        let decoded = FileRecord::from_document(&Document {
            id: "f1".into(),
            data,
        })
        .unwrap();
        assert_eq!(decoded, file);
    }
}
