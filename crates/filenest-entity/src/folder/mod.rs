//! Folder domain records.

pub mod model;

pub use model::{CreateFolder, FolderRecord};
