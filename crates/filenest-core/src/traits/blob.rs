//! Blob store trait for hierarchical object storage backends.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// Upload progress callback receiving a fraction in `[0, 1]`.
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// One level of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobListing {
    /// Full paths of objects directly under the prefix.
    pub objects: Vec<String>,
    /// Full paths of nested prefixes directly under the prefix.
    pub sub_prefixes: Vec<String>,
}

/// Trait for blob storage backends.
///
/// Paths are `/`-separated and relative to the store root. Implementations
/// exist for memory and the local filesystem in `filenest-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Store `data` at `path`, reporting fractional progress as it streams.
    /// Returns the stored path.
    async fn upload(&self, path: &str, data: Bytes, on_progress: ProgressFn<'_>)
    -> AppResult<String>;

    /// Resolve a URL the object can be fetched from.
    async fn get_url(&self, path: &str) -> AppResult<String>;

    /// Delete the object at `path`. Missing objects yield `NotFound`.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// List objects and nested prefixes directly under `prefix`.
    async fn list_under_prefix(&self, prefix: &str) -> AppResult<BlobListing>;

    /// List every object beneath `prefix`, at any depth.
    async fn list_all_under_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut objects = Vec::new();
        let mut pending = vec![prefix.to_string()];
        while let Some(next) = pending.pop() {
            let listing = self.list_under_prefix(&next).await?;
            objects.extend(listing.objects);
            pending.extend(listing.sub_prefixes);
        }
        Ok(objects)
    }
}
