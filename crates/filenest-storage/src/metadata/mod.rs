//! Metadata store implementations.

pub mod memory;

pub use memory::MemoryMetadataStore;
