//! In-memory blob store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use filenest_core::error::{AppError, StoreOperation};
use filenest_core::result::AppResult;
use filenest_core::traits::blob::{BlobListing, BlobStore, ProgressFn};

use super::{fraction, normalize_path};

/// Blob store keeping objects in a sorted map.
///
/// Uploads report progress once per chunk and become visible only after
/// the last chunk.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<BTreeMap<String, Bytes>>>,
    chunk_size: usize,
}

impl MemoryBlobStore {
    /// Create an empty store reporting progress every `chunk_size` bytes.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Whether an object exists at `path`.
    pub async fn contains(&self, path: &str) -> bool {
        match normalize_path(path) {
            Ok(key) => self.objects.read().await.contains_key(&key),
            Err(_) => false,
        }
    }

    /// Read an object's bytes.
    pub async fn read(&self, path: &str) -> AppResult<Bytes> {
        let key = normalize_path(path)?;
        self.objects
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {path}")))
    }

    /// All stored paths, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        on_progress: ProgressFn<'_>,
    ) -> AppResult<String> {
        let key = normalize_path(path)?;
        if key.is_empty() {
            return Err(AppError::validation("Blob path must not be empty")
                .on_resource(path, StoreOperation::Upload));
        }

        on_progress(0.0);
        let total = data.len();
        let mut done = 0usize;
        while done < total {
            done = (done + self.chunk_size).min(total);
            on_progress(fraction(done, total));
            tokio::task::yield_now().await;
        }
        if total == 0 {
            on_progress(1.0);
        }

        self.objects.write().await.insert(key.clone(), data);
        debug!(path = %key, bytes = total, "Stored blob");
        Ok(key)
    }

    async fn get_url(&self, path: &str) -> AppResult<String> {
        let key = normalize_path(path)?;
        if !self.objects.read().await.contains_key(&key) {
            return Err(AppError::not_found(format!("Blob not found: {path}"))
                .on_resource(path, StoreOperation::GetUrl));
        }
        Ok(format!("memory://{key}"))
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let key = normalize_path(path)?;
        match self.objects.write().await.remove(&key) {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("Blob not found: {path}"))
                .on_resource(path, StoreOperation::Delete)),
        }
    }

    async fn list_under_prefix(&self, prefix: &str) -> AppResult<BlobListing> {
        let base = normalize_path(prefix)?;
        let lead = if base.is_empty() {
            String::new()
        } else {
            format!("{base}/")
        };

        let objects = self.objects.read().await;
        let mut listing = BlobListing::default();
        let mut prefixes = BTreeSet::new();

        for key in objects.keys().filter(|k| k.starts_with(&lead)) {
            let rest = &key[lead.len()..];
            match rest.split_once('/') {
                Some((dir, _)) => {
                    prefixes.insert(format!("{lead}{dir}"));
                }
                None => listing.objects.push(key.clone()),
            }
        }
        listing.sub_prefixes = prefixes.into_iter().collect();
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_upload_reports_monotone_progress() {
        let store = MemoryBlobStore::new(4);
        let seen = Mutex::new(Vec::new());
        let record = |p: f64| seen.lock().unwrap().push(p);

        store
            .upload("u1/root/a.bin", Bytes::from(vec![0u8; 10]), &record)
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, vec![0.0, 0.4, 0.8, 1.0]);
        assert!(store.contains("u1/root/a.bin").await);
    }

    #[tokio::test]
    async fn test_list_one_level() {
        let store = MemoryBlobStore::default();
        for path in ["u1/f1/a", "u1/f1/b", "u1/f1/sub/c", "u1/f10/d"] {
            store.upload(path, Bytes::from("x"), &|_| {}).await.unwrap();
        }

        let listing = store.list_under_prefix("u1/f1").await.unwrap();
        assert_eq!(listing.objects, vec!["u1/f1/a", "u1/f1/b"]);
        assert_eq!(listing.sub_prefixes, vec!["u1/f1/sub"]);

        let all = store.list_all_under_prefix("u1/f1").await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryBlobStore::default();
        let err = store.delete("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
