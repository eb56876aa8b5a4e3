//! # filenest-storage
//!
//! Store implementations for FileNest: an in-memory document store with
//! live queries and atomic batches (optionally persisted to a JSON
//! snapshot), and blob stores backed by memory or the local filesystem.

pub mod blob;
pub mod metadata;

pub use blob::{LocalBlobStore, MemoryBlobStore};
pub use metadata::MemoryMetadataStore;
