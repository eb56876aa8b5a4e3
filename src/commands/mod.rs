//! CLI command definitions and dispatch.

pub mod ls;
pub mod mkdir;
pub mod path;
pub mod rm;
pub mod rmdir;
pub mod upload;
pub mod url;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use filenest_core::config::AppConfig;
use filenest_core::result::AppResult;
use filenest_core::types::FolderId;
use filenest_entity::{FileRecord, FolderRecord};
use filenest_service::{DeleteOutcome, HierarchicalStorageManager, ManagerConfig, SessionContext};
use filenest_storage::{LocalBlobStore, MemoryMetadataStore};

use crate::output::{self, OutputFormat};

/// FileNest: per-user folders and files over local storage
#[derive(Debug, Parser)]
#[command(name = "filenest", version, about, long_about = None)]
pub struct Cli {
    /// Path to an additional configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Owner to act as
    #[arg(short, long, default_value = "local")]
    pub owner: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List a folder's children
    Ls(ls::LsArgs),
    /// Create a folder
    Mkdir(mkdir::MkdirArgs),
    /// Upload a local file
    Upload(upload::UploadArgs),
    /// Delete files
    Rm(rm::RmArgs),
    /// Delete a folder and everything beneath it
    Rmdir(rmdir::RmdirArgs),
    /// Show a folder's path from the root
    Path(path::PathArgs),
    /// Show a file's download URL
    Url(url::UrlArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let manager = open_manager(config, &self.owner).await?;
        let format = self.format;
        match &self.command {
            Commands::Ls(args) => ls::execute(args, &manager, format).await,
            Commands::Mkdir(args) => mkdir::execute(args, &manager, format).await,
            Commands::Upload(args) => upload::execute(args, &manager, format).await,
            Commands::Rm(args) => rm::execute(args, &manager, format).await,
            Commands::Rmdir(args) => rmdir::execute(args, &manager, format).await,
            Commands::Path(args) => path::execute(args, &manager, format).await,
            Commands::Url(args) => url::execute(args, &manager, format).await,
        }
    }
}

/// Helper: build a manager over the configured local stores
pub async fn open_manager(
    config: &AppConfig,
    owner: &str,
) -> AppResult<HierarchicalStorageManager> {
    let metadata = MemoryMetadataStore::open(
        &config.storage.metadata_path,
        config.metadata.max_batch_operations,
    )
    .await?;
    let chunk_size = usize::try_from(config.storage.upload_chunk_size_bytes).unwrap_or(usize::MAX);
    let blobs = LocalBlobStore::new(&config.storage.blob_root, chunk_size).await?;

    Ok(HierarchicalStorageManager::new(
        SessionContext::new(owner)?,
        Arc::new(metadata),
        Arc::new(blobs),
        ManagerConfig::from(config),
    ))
}

/// Helper: parse an optional folder argument
pub fn folder_arg(id: Option<&str>) -> Option<FolderId> {
    id.map(FolderId::from)
}

/// One row of a folder listing
#[derive(Debug, Serialize, Tabled)]
pub struct EntryRow {
    /// Folder or file category
    kind: String,
    /// Record ID
    id: String,
    /// Name
    name: String,
    /// Size
    size: String,
    /// Created at
    created: String,
}

impl From<&FolderRecord> for EntryRow {
    fn from(folder: &FolderRecord) -> Self {
        Self {
            kind: "folder".to_string(),
            id: folder.id.to_string(),
            name: folder.name.clone(),
            size: "-".to_string(),
            created: folder.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

impl From<&FileRecord> for EntryRow {
    fn from(file: &FileRecord) -> Self {
        Self {
            kind: file.category().to_string(),
            id: file.id.to_string(),
            name: file.name.clone(),
            size: output::format_bytes(file.size_bytes),
            created: file.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Summary of a delete, for display
#[derive(Debug, Serialize, Tabled)]
pub struct DeleteRow {
    /// Folder records removed
    folders: usize,
    /// File records removed
    files: usize,
    /// Blobs removed
    blobs: usize,
    /// Blobs left behind
    blob_failures: usize,
}

/// Print a delete outcome and warn about leftover blobs
pub fn report_delete(outcome: &DeleteOutcome, format: OutputFormat) {
    let row = DeleteRow {
        folders: outcome.folders_deleted,
        files: outcome.files_deleted,
        blobs: outcome.blob_paths_deleted,
        blob_failures: outcome.blob_failures.len(),
    };
    output::print_item(&row, format);
    for failure in &outcome.blob_failures {
        output::print_warning(&format!(
            "Blob not removed: {} ({})",
            failure.path, failure.error
        ));
    }
}
