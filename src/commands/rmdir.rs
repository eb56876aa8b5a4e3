//! Recursive folder deletion command.

use clap::Args;

use filenest_core::result::AppResult;
use filenest_core::types::FolderId;
use filenest_service::HierarchicalStorageManager;

use crate::output::{self, OutputFormat};

/// Arguments for the rmdir command
#[derive(Debug, Args)]
pub struct RmdirArgs {
    /// ID of the folder to delete
    pub folder_id: String,
}

/// Execute the rmdir command
pub async fn execute(
    args: &RmdirArgs,
    manager: &HierarchicalStorageManager,
    format: OutputFormat,
) -> AppResult<()> {
    let id = FolderId::from(args.folder_id.as_str());
    let outcome = manager.delete_folder_recursive(&id).await?;

    if outcome.folders_deleted == 0 && format == OutputFormat::Table {
        output::print_warning(&format!("Folder {} does not exist", id));
    }
    super::report_delete(&outcome, format);
    Ok(())
}
