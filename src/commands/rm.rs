//! File deletion command.

use clap::Args;

use filenest_core::result::AppResult;
use filenest_core::types::FileId;
use filenest_service::HierarchicalStorageManager;

use crate::output::OutputFormat;

/// Arguments for the rm command
#[derive(Debug, Args)]
pub struct RmArgs {
    /// IDs of the files to delete
    #[arg(required = true)]
    pub file_ids: Vec<String>,
}

/// Execute the rm command
pub async fn execute(
    args: &RmArgs,
    manager: &HierarchicalStorageManager,
    format: OutputFormat,
) -> AppResult<()> {
    let mut files = Vec::with_capacity(args.file_ids.len());
    for id in &args.file_ids {
        files.push(manager.get_file(&FileId::from(id.as_str())).await?);
    }

    let outcome = match files.as_slice() {
        [single] => manager.delete_file(single).await?,
        many => manager.delete_files(many).await?,
    };
    super::report_delete(&outcome, format);
    Ok(())
}
