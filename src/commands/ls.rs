//! Folder listing command.

use clap::Args;
use tracing::debug;

use filenest_core::result::AppResult;
use filenest_service::{ChildrenSnapshot, HierarchicalStorageManager};

use super::EntryRow;
use crate::output::{self, OutputFormat};

/// Arguments for the ls command
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Folder to list (omit for the root)
    #[arg(long)]
    pub folder: Option<String>,
}

fn rows(snapshot: &ChildrenSnapshot) -> Vec<EntryRow> {
    snapshot
        .folders
        .iter()
        .map(EntryRow::from)
        .chain(snapshot.files.iter().map(EntryRow::from))
        .collect()
}

/// Execute the ls command
pub async fn execute(
    args: &LsArgs,
    manager: &HierarchicalStorageManager,
    format: OutputFormat,
) -> AppResult<()> {
    let parent = super::folder_arg(args.folder.as_deref());
    if let Some(parent) = &parent {
        manager.get_folder(parent).await?;
    }

    let mut subscription = manager.list_children(parent.as_ref()).await?;
    let snapshot = subscription.next().await;
    subscription.cancel();

    match snapshot {
        Some(snapshot) => output::print_list(&rows(&snapshot?), format),
        None => debug!("Listing closed before the first snapshot"),
    }
    Ok(())
}
