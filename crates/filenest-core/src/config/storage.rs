//! Blob storage and snapshot location configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all runtime data.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Root directory of the filesystem blob store.
    #[serde(default = "default_blob_root")]
    pub blob_root: String,
    /// JSON snapshot file of the local metadata store.
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,
    /// Maximum upload size in bytes (default 5 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Size of each streamed upload chunk; progress is reported per chunk.
    #[serde(default = "default_chunk_size")]
    pub upload_chunk_size_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            blob_root: default_blob_root(),
            metadata_path: default_metadata_path(),
            max_upload_size_bytes: default_max_upload(),
            upload_chunk_size_bytes: default_chunk_size(),
        }
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_blob_root() -> String {
    "./data/blobs".to_string()
}

fn default_metadata_path() -> String {
    "./data/metadata.json".to_string()
}

fn default_max_upload() -> u64 {
    5_368_709_120 // 5 GB
}

fn default_chunk_size() -> u64 {
    262_144 // 256 KB
}
