//! Folder creation command.

use clap::Args;

use filenest_core::result::AppResult;
use filenest_service::HierarchicalStorageManager;

use super::EntryRow;
use crate::output::{self, OutputFormat};

/// Arguments for the mkdir command
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Folder name
    pub name: String,

    /// Parent folder ID (omit for the root)
    #[arg(short, long)]
    pub parent: Option<String>,
}

/// Execute the mkdir command
pub async fn execute(
    args: &MkdirArgs,
    manager: &HierarchicalStorageManager,
    format: OutputFormat,
) -> AppResult<()> {
    let parent = super::folder_arg(args.parent.as_deref());
    let folder = manager.create_folder(parent.as_ref(), &args.name).await?;

    if format == OutputFormat::Table {
        output::print_success(&format!("Folder '{}' created", folder.name));
    }
    output::print_item(&EntryRow::from(&folder), format);
    Ok(())
}
