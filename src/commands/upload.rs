//! File upload command.

use std::io::Write;
use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;

use filenest_core::error::AppError;
use filenest_core::result::AppResult;
use filenest_service::HierarchicalStorageManager;

use super::EntryRow;
use crate::output::{self, OutputFormat};

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Path to the file to upload
    pub file: PathBuf,

    /// Target folder ID (omit for the root)
    #[arg(long)]
    pub folder: Option<String>,

    /// MIME type (guessed from the name when omitted)
    #[arg(short, long)]
    pub mime: Option<String>,

    /// Override file name
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Execute the upload command
pub async fn execute(
    args: &UploadArgs,
    manager: &HierarchicalStorageManager,
    format: OutputFormat,
) -> AppResult<()> {
    let content = tokio::fs::read(&args.file).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("File not found: {}", args.file.display()))
        } else {
            AppError::from(e)
        }
    })?;

    let file_name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::validation("Upload path has no file name"))?,
    };

    let parent = super::folder_arg(args.folder.as_deref());
    let show_progress = format == OutputFormat::Table;
    let on_progress = |fraction: f64| {
        if show_progress {
            eprint!("\rUploading '{}' {:>3.0}%", file_name, fraction * 100.0);
            let _ = std::io::stderr().flush();
        }
    };

    let file = manager
        .create_file(
            parent.as_ref(),
            Bytes::from(content),
            &file_name,
            args.mime.as_deref().unwrap_or_default(),
            &on_progress,
        )
        .await;
    if show_progress {
        eprintln!();
    }
    let file = file?;

    if show_progress {
        output::print_success(&format!(
            "Uploaded '{}' ({})",
            file.name,
            output::format_bytes(file.size_bytes)
        ));
        output::print_kv("MIME type", &file.mime_type);
        output::print_kv("Blob path", &file.blob_path);
    }
    output::print_item(&EntryRow::from(&file), format);
    Ok(())
}
