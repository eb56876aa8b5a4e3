//! Download URL command.

use clap::Args;
use serde::Serialize;

use filenest_core::result::AppResult;
use filenest_core::types::FileId;
use filenest_service::HierarchicalStorageManager;

use crate::output::{self, OutputFormat};

/// Arguments for the url command
#[derive(Debug, Args)]
pub struct UrlArgs {
    /// File ID
    pub file_id: String,
}

#[derive(Debug, Serialize)]
struct UrlView<'a> {
    id: &'a str,
    name: &'a str,
    url: &'a str,
}

/// Execute the url command
pub async fn execute(
    args: &UrlArgs,
    manager: &HierarchicalStorageManager,
    format: OutputFormat,
) -> AppResult<()> {
    let file = manager
        .get_file(&FileId::from(args.file_id.as_str()))
        .await?;
    let url = manager.download_url(&file).await?;

    match format {
        OutputFormat::Table => {
            output::print_kv("Name", &file.name);
            output::print_kv("URL", &url);
        }
        OutputFormat::Json => output::print_json(&UrlView {
            id: file.id.as_str(),
            name: &file.name,
            url: &url,
        }),
    }
    Ok(())
}
