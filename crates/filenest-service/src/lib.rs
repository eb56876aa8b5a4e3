//! # filenest-service
//!
//! The storage manager for FileNest. A [`HierarchicalStorageManager`] acts
//! for one [`SessionContext`] and coordinates a metadata store and a blob
//! store to list, upload, and delete a user's folders and files.
//!
//! Dependencies are provided at construction time via `Arc` references.

pub mod context;
pub mod manager;
pub mod paths;

pub use context::SessionContext;
pub use manager::{
    BlobCleanupFailure, ChildrenSnapshot, ChildrenSubscription, CreateFolderRequest,
    DeleteOutcome, HierarchicalStorageManager, ManagerConfig,
};
