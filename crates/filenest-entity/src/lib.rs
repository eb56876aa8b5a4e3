//! # filenest-entity
//!
//! Domain record models for FileNest. Every record struct in this crate
//! maps to a document in one of the metadata store collections; the
//! document id lives outside the body and is joined back in by
//! `from_document`.

pub mod collection;
pub mod file;
pub mod folder;

pub use collection::{Collection, fields};
pub use file::{CreateFile, FileCategory, FileRecord};
pub use folder::{CreateFolder, FolderRecord};
