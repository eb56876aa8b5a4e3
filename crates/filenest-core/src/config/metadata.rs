//! Metadata store and cascade delete configuration.

use serde::{Deserialize, Serialize};

/// Metadata store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Maximum number of operations in one atomic batch commit.
    #[serde(default = "default_max_batch_operations")]
    pub max_batch_operations: usize,
    /// Maximum number of blob deletions in flight during cleanup.
    #[serde(default = "default_blob_delete_concurrency")]
    pub blob_delete_concurrency: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            max_batch_operations: default_max_batch_operations(),
            blob_delete_concurrency: default_blob_delete_concurrency(),
        }
    }
}

fn default_max_batch_operations() -> usize {
    500
}

fn default_blob_delete_concurrency() -> usize {
    16
}
