//! File domain records.

pub mod category;
pub mod model;

pub use category::{FileCategory, guess_mime_type};
pub use model::{CreateFile, FileRecord};
