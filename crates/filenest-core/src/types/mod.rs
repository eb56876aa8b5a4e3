//! Core type definitions used across the FileNest workspace.

pub mod filter;
pub mod id;

pub use filter::{FilterField, FilterOp, FilterValue, matches_all};
pub use id::*;
