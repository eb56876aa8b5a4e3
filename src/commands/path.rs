//! Folder breadcrumb command.

use clap::Args;

use filenest_core::result::AppResult;
use filenest_core::types::FolderId;
use filenest_service::HierarchicalStorageManager;

use super::EntryRow;
use crate::output::{self, OutputFormat};

/// Arguments for the path command
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Folder ID
    pub folder_id: String,
}

/// Execute the path command
pub async fn execute(
    args: &PathArgs,
    manager: &HierarchicalStorageManager,
    format: OutputFormat,
) -> AppResult<()> {
    let id = FolderId::from(args.folder_id.as_str());
    let crumbs = manager.breadcrumbs(Some(&id)).await?;

    match format {
        OutputFormat::Table => {
            let names: Vec<&str> = crumbs.iter().map(|f| f.name.as_str()).collect();
            println!("/{}", names.join("/"));
        }
        OutputFormat::Json => {
            let rows: Vec<EntryRow> = crumbs.iter().map(EntryRow::from).collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}
