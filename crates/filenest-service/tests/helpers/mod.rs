//! Shared test helpers and store doubles for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use filenest_core::error::{AppError, ErrorKind, StoreOperation};
use filenest_core::result::AppResult;
use filenest_core::traits::{
    BlobListing, BlobStore, CommitSummary, Document, LiveQuery, MetadataStore, ProgressFn,
    WriteBatch,
};
use filenest_core::types::{FilterField, FolderId};
use filenest_entity::FileRecord;
use filenest_service::{HierarchicalStorageManager, ManagerConfig, SessionContext};
use filenest_storage::{MemoryBlobStore, MemoryMetadataStore};

/// Metadata store wrapper that records batch sizes and can fail on demand.
#[derive(Debug)]
pub struct ScriptedMetadataStore {
    pub inner: MemoryMetadataStore,
    /// 1-based commit number that fails; 0 never fails.
    pub fail_on_commit: AtomicUsize,
    /// Reject queries with an authorization error.
    pub deny_queries: bool,
    /// Reject inserts with a metadata error.
    pub fail_inserts: bool,
    pub commits: AtomicUsize,
    pub batch_sizes: Mutex<Vec<usize>>,
}

impl ScriptedMetadataStore {
    pub fn new(max_batch_operations: usize) -> Self {
        Self {
            inner: MemoryMetadataStore::new(max_batch_operations),
            fail_on_commit: AtomicUsize::new(0),
            deny_queries: false,
            fail_inserts: false,
            commits: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_commit_number(&self, n: usize) {
        self.fail_on_commit.store(n, Ordering::SeqCst);
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataStore for ScriptedMetadataStore {
    fn store_type(&self) -> &str {
        "scripted"
    }

    async fn query(&self, collection: &str, predicates: &[FilterField]) -> AppResult<LiveQuery> {
        if self.deny_queries {
            return Err(AppError::authorization_denied(collection, StoreOperation::List));
        }
        self.inner.query(collection, predicates).await
    }

    async fn get_once(
        &self,
        collection: &str,
        predicates: &[FilterField],
    ) -> AppResult<Vec<Document>> {
        if self.deny_queries {
            return Err(AppError::authorization_denied(collection, StoreOperation::List));
        }
        self.inner.get_once(collection, predicates).await
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: &str, data: serde_json::Value) -> AppResult<String> {
        if self.fail_inserts {
            return Err(AppError::metadata("insert unavailable")
                .on_resource(collection, StoreOperation::Insert));
        }
        self.inner.insert(collection, data).await
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<CommitSummary> {
        let n = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        self.batch_sizes.lock().unwrap().push(batch.len());
        if n == self.fail_on_commit.load(Ordering::SeqCst) {
            return Err(AppError::metadata("commit rejected")
                .on_resource("batch", StoreOperation::Commit));
        }
        self.inner.commit(batch).await
    }

    fn max_batch_operations(&self) -> usize {
        self.inner.max_batch_operations()
    }
}

/// Blob store wrapper that fails selected operations.
#[derive(Debug)]
pub struct FlakyBlobStore {
    pub inner: MemoryBlobStore,
    /// Deletes of paths containing any of these fragments fail.
    pub fail_deletes_matching: Vec<String>,
    pub fail_uploads: bool,
    pub deny_uploads: bool,
    pub deletes: Mutex<Vec<String>>,
}

impl FlakyBlobStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryBlobStore::new(4),
            fail_deletes_matching: Vec::new(),
            fail_uploads: false,
            deny_uploads: false,
            deletes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    fn provider_type(&self) -> &str {
        "flaky"
    }

    async fn upload(
        &self,
        path: &str,
        data: Bytes,
        on_progress: ProgressFn<'_>,
    ) -> AppResult<String> {
        if self.deny_uploads {
            return Err(AppError::authorization_denied(path, StoreOperation::Upload));
        }
        if self.fail_uploads {
            on_progress(0.3);
            return Err(AppError::storage("connection reset"));
        }
        self.inner.upload(path, data, on_progress).await
    }

    async fn get_url(&self, path: &str) -> AppResult<String> {
        self.inner.get_url(path).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.deletes.lock().unwrap().push(path.to_string());
        if self.fail_deletes_matching.iter().any(|f| path.contains(f)) {
            return Err(AppError::new(ErrorKind::Storage, "delete refused")
                .on_resource(path, StoreOperation::Delete));
        }
        self.inner.delete(path).await
    }

    async fn list_under_prefix(&self, prefix: &str) -> AppResult<BlobListing> {
        self.inner.list_under_prefix(prefix).await
    }
}

/// A manager over in-memory stores.
pub struct TestApp {
    pub metadata: Arc<MemoryMetadataStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub manager: HierarchicalStorageManager,
}

impl TestApp {
    pub fn new(owner: &str) -> Self {
        Self::with_config(owner, ManagerConfig::default())
    }

    pub fn with_config(owner: &str, config: ManagerConfig) -> Self {
        let metadata = Arc::new(MemoryMetadataStore::new(500));
        let blobs = Arc::new(MemoryBlobStore::new(4));
        let manager = HierarchicalStorageManager::new(
            SessionContext::new(owner).unwrap(),
            metadata.clone(),
            blobs.clone(),
            config,
        );
        Self {
            metadata,
            blobs,
            manager,
        }
    }

    /// Another session over the same stores.
    pub fn session(&self, owner: &str) -> HierarchicalStorageManager {
        HierarchicalStorageManager::new(
            SessionContext::new(owner).unwrap(),
            self.metadata.clone(),
            self.blobs.clone(),
            ManagerConfig::default(),
        )
    }
}

/// Upload a small text file.
pub async fn upload(
    manager: &HierarchicalStorageManager,
    parent: Option<&FolderId>,
    name: &str,
) -> FileRecord {
    manager
        .create_file(parent, Bytes::from(format!("contents of {name}")), name, "text/plain", &|_| {})
        .await
        .unwrap()
}
