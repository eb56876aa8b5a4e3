//! Core traits defined in `filenest-core` and implemented by other crates.

pub mod blob;
pub mod metadata;

pub use blob::{BlobListing, BlobStore, ProgressFn};
pub use metadata::{
    BatchOp, CommitSummary, Document, LiveQuery, MetadataStore, SnapshotResult, WriteBatch,
};
