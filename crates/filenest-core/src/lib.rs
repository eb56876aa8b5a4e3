//! # filenest-core
//!
//! Core crate for FileNest. Contains the metadata and blob store traits,
//! configuration schemas, typed identifiers, query predicates, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other FileNest crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind, StoreOperation};
pub use result::AppResult;
