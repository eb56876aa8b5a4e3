//! Metadata store trait for document-oriented record storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::filter::FilterField;

/// A stored document: the store-assigned id plus its JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned document id.
    pub id: String,
    /// Document body.
    pub data: serde_json::Value,
}

/// The value carried by a live query: the full current result set, or the
/// error the store reported for it.
pub type SnapshotResult = Result<Arc<Vec<Document>>, AppError>;

/// A live query handle.
///
/// The underlying watch always holds the latest full snapshot, so a slow
/// consumer sees the most recent state rather than a backlog. Dropping the
/// handle or calling [`LiveQuery::cancel`] releases the watch; stores prune
/// released watches on their next notification.
#[derive(Debug)]
pub struct LiveQuery {
    collection: String,
    receiver: Option<watch::Receiver<SnapshotResult>>,
}

impl LiveQuery {
    /// Wrap a watch receiver created by a store.
    pub fn new(collection: impl Into<String>, receiver: watch::Receiver<SnapshotResult>) -> Self {
        Self {
            collection: collection.into(),
            receiver: Some(receiver),
        }
    }

    /// Collection this query runs against.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether the query is still attached to its store.
    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    /// Return the current snapshot and mark it as seen.
    ///
    /// Returns `None` once the query has been cancelled.
    pub fn current(&mut self) -> Option<SnapshotResult> {
        self.receiver
            .as_mut()
            .map(|rx| rx.borrow_and_update().clone())
    }

    /// Wait until a snapshot newer than the last seen one is available.
    ///
    /// Returns `false` when the query was cancelled or the store dropped the
    /// watch; no further snapshots will arrive in that case.
    pub async fn changed(&mut self) -> bool {
        match self.receiver.as_mut() {
            Some(rx) => rx.changed().await.is_ok(),
            None => false,
        }
    }

    /// Stop receiving snapshots and release the watch.
    pub fn cancel(&mut self) {
        self.receiver = None;
    }
}

/// One staged mutation in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Delete the document `id` from `collection`.
    Delete {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
    },
}

/// An ordered set of mutations committed atomically by
/// [`MetadataStore::commit`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the deletion of a document.
    pub fn delete(&mut self, collection: impl Into<String>, id: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Delete {
            collection: collection.into(),
            id: id.into(),
        });
        self
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Staged operations in order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consume the batch, returning its operations.
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// What a committed batch actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    removed: BTreeMap<String, usize>,
}

impl CommitSummary {
    /// Count one removed document in `collection`.
    pub fn record_removed(&mut self, collection: &str) {
        *self.removed.entry(collection.to_string()).or_default() += 1;
    }

    /// Documents removed from `collection`.
    pub fn removed(&self, collection: &str) -> usize {
        self.removed.get(collection).copied().unwrap_or(0)
    }

    /// Documents removed across all collections.
    pub fn total_removed(&self) -> usize {
        self.removed.values().sum()
    }

    /// Fold another commit's counts into this one.
    pub fn merge(&mut self, other: CommitSummary) {
        for (collection, n) in other.removed {
            *self.removed.entry(collection).or_default() += n;
        }
    }
}

/// Trait for document-oriented metadata stores.
///
/// Stores provide equality-filtered queries (live and one-shot), single
/// inserts, and all-or-nothing batch commits. Access control is the
/// store's responsibility; a rejected call surfaces as an
/// [`ErrorKind::Authorization`](crate::error::ErrorKind::Authorization)
/// error.
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type name (e.g., "memory").
    fn store_type(&self) -> &str;

    /// Open a live query over `collection` filtered by `predicates`.
    async fn query(&self, collection: &str, predicates: &[FilterField]) -> AppResult<LiveQuery>;

    /// Read the documents matching `predicates` once.
    async fn get_once(
        &self,
        collection: &str,
        predicates: &[FilterField],
    ) -> AppResult<Vec<Document>>;

    /// Read a single document by id.
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    /// Insert a document and return its assigned id.
    async fn insert(&self, collection: &str, data: serde_json::Value) -> AppResult<String>;

    /// Start a new empty batch.
    fn begin_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Apply every operation of `batch`, or none of them.
    ///
    /// Deleting a document that does not exist is not an error; it is
    /// simply not counted in the returned summary.
    async fn commit(&self, batch: WriteBatch) -> AppResult<CommitSummary>;

    /// Maximum number of operations accepted by a single commit.
    fn max_batch_operations(&self) -> usize;
}
