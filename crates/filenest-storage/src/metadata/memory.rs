//! In-memory document store with live queries and atomic batch commits.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{RwLock, watch};
use tracing::debug;
use uuid::Uuid;

use filenest_core::error::{AppError, ErrorKind, StoreOperation};
use filenest_core::result::AppResult;
use filenest_core::traits::metadata::{
    BatchOp, CommitSummary, Document, LiveQuery, MetadataStore, SnapshotResult, WriteBatch,
};
use filenest_core::types::{FilterField, matches_all};

/// Collection name → document id → document body.
type Collections = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// A registered live query.
#[derive(Debug)]
struct Watcher {
    collection: String,
    predicates: Vec<FilterField>,
    sender: watch::Sender<SnapshotResult>,
}

#[derive(Debug, Default)]
struct Shared {
    collections: Collections,
    watchers: Vec<Watcher>,
}

impl Shared {
    fn select(&self, collection: &str, predicates: &[FilterField]) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| matches_all(predicates, data))
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push fresh snapshots to the watchers of `touched` collections and
    /// drop watchers whose receivers are gone.
    fn notify(&mut self, touched: &BTreeSet<String>) {
        let mut watchers = std::mem::take(&mut self.watchers);
        watchers.retain(|w| !w.sender.is_closed());

        for watcher in &watchers {
            if !touched.contains(&watcher.collection) {
                continue;
            }
            let fresh = self.select(&watcher.collection, &watcher.predicates);
            watcher.sender.send_if_modified(|current| {
                if matches!(current, Ok(docs) if **docs == fresh) {
                    return false;
                }
                *current = Ok(Arc::new(fresh));
                true
            });
        }

        self.watchers = watchers;
    }
}

/// In-memory [`MetadataStore`].
///
/// Documents are kept per collection in id order. Every committed mutation
/// re-evaluates the live queries of the touched collections. When opened
/// with a snapshot path the whole document set is written to that JSON
/// file after each mutation, and a mutation whose snapshot write fails is
/// not applied.
///
/// The snapshot belongs to one process. It is read once in
/// [`open`](Self::open) and overwritten on every mutation, so concurrent
/// processes sharing a file lose each other's writes.
#[derive(Debug, Clone)]
pub struct MemoryMetadataStore {
    shared: Arc<RwLock<Shared>>,
    snapshot_path: Option<PathBuf>,
    max_batch_operations: usize,
}

impl MemoryMetadataStore {
    /// Create an empty, non-persistent store.
    pub fn new(max_batch_operations: usize) -> Self {
        Self {
            shared: Arc::new(RwLock::new(Shared::default())),
            snapshot_path: None,
            max_batch_operations: max_batch_operations.max(1),
        }
    }

    /// Open a store persisted at `path`, loading the snapshot if it exists.
    pub async fn open(path: impl AsRef<Path>, max_batch_operations: usize) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let collections: Collections = match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Metadata,
                    format!("Corrupt metadata snapshot: {}", path.display()),
                    e,
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collections::new(),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Metadata,
                    format!("Failed to read metadata snapshot: {}", path.display()),
                    e,
                ));
            }
        };

        debug!(
            path = %path.display(),
            collections = collections.len(),
            "Opened metadata snapshot"
        );

        Ok(Self {
            shared: Arc::new(RwLock::new(Shared {
                collections,
                watchers: Vec::new(),
            })),
            snapshot_path: Some(path),
            max_batch_operations: max_batch_operations.max(1),
        })
    }

    /// Number of live queries still attached.
    pub async fn active_watchers(&self) -> usize {
        let shared = self.shared.read().await;
        shared
            .watchers
            .iter()
            .filter(|w| !w.sender.is_closed())
            .count()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        let shared = self.shared.read().await;
        shared.collections.get(collection).map_or(0, BTreeMap::len)
    }

    async fn persist(&self, collections: &Collections) -> AppResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Metadata,
                    format!("Failed to create snapshot directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        let raw = serde_json::to_vec_pretty(collections)?;
        fs::write(path, raw).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Metadata,
                format!("Failed to write metadata snapshot: {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn query(&self, collection: &str, predicates: &[FilterField]) -> AppResult<LiveQuery> {
        let mut shared = self.shared.write().await;
        let initial = shared.select(collection, predicates);
        let (sender, receiver) = watch::channel::<SnapshotResult>(Ok(Arc::new(initial)));
        shared.watchers.push(Watcher {
            collection: collection.to_string(),
            predicates: predicates.to_vec(),
            sender,
        });
        Ok(LiveQuery::new(collection, receiver))
    }

    async fn get_once(
        &self,
        collection: &str,
        predicates: &[FilterField],
    ) -> AppResult<Vec<Document>> {
        let shared = self.shared.read().await;
        Ok(shared.select(collection, predicates))
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let shared = self.shared.read().await;
        Ok(shared
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn insert(&self, collection: &str, data: serde_json::Value) -> AppResult<String> {
        if !data.is_object() {
            return Err(AppError::validation("Documents must be JSON objects")
                .on_resource(collection, StoreOperation::Insert));
        }

        let id = Uuid::new_v4().simple().to_string();
        let mut shared = self.shared.write().await;

        let mut next = shared.collections.clone();
        next.entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        self.persist(&next).await?;
        shared.collections = next;

        shared.notify(&BTreeSet::from([collection.to_string()]));
        debug!(collection, id = %id, "Inserted document");
        Ok(id)
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<CommitSummary> {
        if batch.len() > self.max_batch_operations {
            return Err(AppError::validation(format!(
                "Batch of {} operations exceeds the limit of {}",
                batch.len(),
                self.max_batch_operations
            )));
        }
        if batch.is_empty() {
            return Ok(CommitSummary::default());
        }

        let mut shared = self.shared.write().await;
        let mut next = shared.collections.clone();
        let mut touched = BTreeSet::new();
        let mut summary = CommitSummary::default();

        for op in batch.into_ops() {
            match op {
                BatchOp::Delete { collection, id } => {
                    if let Some(docs) = next.get_mut(&collection) {
                        if docs.remove(&id).is_some() {
                            summary.record_removed(&collection);
                        }
                    }
                    touched.insert(collection);
                }
            }
        }

        self.persist(&next).await?;
        shared.collections = next;
        shared.notify(&touched);

        debug!(removed = summary.total_removed(), "Committed batch");
        Ok(summary)
    }

    fn max_batch_operations(&self) -> usize {
        self.max_batch_operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filenest_core::types::FilterValue;
    use serde_json::json;

    fn owned_by(owner: &str) -> Vec<FilterField> {
        vec![FilterField::eq("ownerId", FilterValue::String(owner.into()))]
    }

    #[tokio::test]
    async fn test_insert_and_get_once() {
        let store = MemoryMetadataStore::new(10);
        let id = store
            .insert("files", json!({ "ownerId": "a", "name": "x" }))
            .await
            .unwrap();
        store
            .insert("files", json!({ "ownerId": "b", "name": "y" }))
            .await
            .unwrap();

        let docs = store.get_once("files", &owned_by("a")).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert!(store.get("files", &id).await.unwrap().is_some());
        assert!(store.get("folders", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_live_query_sees_changes() {
        let store = MemoryMetadataStore::new(10);
        let mut live = store.query("files", &owned_by("a")).await.unwrap();
        assert!(live.current().unwrap().unwrap().is_empty());

        let id = store
            .insert("files", json!({ "ownerId": "a" }))
            .await
            .unwrap();
        assert!(live.changed().await);
        assert_eq!(live.current().unwrap().unwrap().len(), 1);

        let mut batch = store.begin_batch();
        batch.delete("files", id);
        store.commit(batch).await.unwrap();
        assert!(live.changed().await);
        assert!(live.current().unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unrelated_insert_does_not_wake_watcher() {
        let store = MemoryMetadataStore::new(10);
        let mut live = store.query("files", &owned_by("a")).await.unwrap();
        live.current();

        store
            .insert("files", json!({ "ownerId": "b" }))
            .await
            .unwrap();
        let woke = tokio::time::timeout(std::time::Duration::from_millis(50), live.changed()).await;
        assert!(woke.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_watchers_are_pruned() {
        let store = MemoryMetadataStore::new(10);
        let mut live = store.query("files", &owned_by("a")).await.unwrap();
        assert_eq!(store.active_watchers().await, 1);

        live.cancel();
        store
            .insert("files", json!({ "ownerId": "a" }))
            .await
            .unwrap();
        assert_eq!(store.active_watchers().await, 0);
        assert!(store.shared.read().await.watchers.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected_without_effect() {
        let store = MemoryMetadataStore::new(2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(store.insert("files", json!({})).await.unwrap());
        }

        let mut batch = store.begin_batch();
        for id in &ids {
            batch.delete("files", id.clone());
        }
        let err = store.commit(batch).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(store.count("files").await, 3);
    }

    #[tokio::test]
    async fn test_deleting_missing_document_is_ok() {
        let store = MemoryMetadataStore::new(10);
        let mut batch = store.begin_batch();
        batch.delete("files", "nope");
        let summary = store.commit(batch).await.unwrap();
        assert_eq!(summary.total_removed(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta/store.json");

        let store = MemoryMetadataStore::open(&path, 10).await.unwrap();
        let id = store
            .insert("folders", json!({ "name": "Docs" }))
            .await
            .unwrap();
        drop(store);

        let reopened = MemoryMetadataStore::open(&path, 10).await.unwrap();
        let doc = reopened.get("folders", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Docs");
    }
}
