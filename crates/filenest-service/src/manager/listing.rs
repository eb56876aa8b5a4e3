//! Live listing of a folder's direct children.

use futures::Stream;
use tracing::debug;

use filenest_core::result::AppResult;
use filenest_core::traits::{LiveQuery, SnapshotResult};
use filenest_core::types::{FolderId, OwnerId};
use filenest_entity::{Collection, FileRecord, FolderRecord};

use super::HierarchicalStorageManager;

/// The direct children of a folder at one point in time.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ChildrenSnapshot {
    /// Files, newest first.
    pub files: Vec<FileRecord>,
    /// Folders, by name.
    pub folders: Vec<FolderRecord>,
}

impl ChildrenSnapshot {
    /// Whether the folder has no children.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }
}

/// A live view of a folder's children.
///
/// The first [`next`](Self::next) returns the current children at once.
/// Each later call waits for a change to either collection and returns the
/// full new snapshot. After [`cancel`](Self::cancel), or once the store
/// goes away, `next` returns `None`.
#[derive(Debug)]
pub struct ChildrenSubscription {
    owner: OwnerId,
    parent: Option<FolderId>,
    files: LiveQuery,
    folders: LiveQuery,
    primed: bool,
}

impl ChildrenSubscription {
    /// The folder being watched (`None` for the root).
    pub fn parent(&self) -> Option<&FolderId> {
        self.parent.as_ref()
    }

    /// Whether snapshots can still arrive.
    pub fn is_active(&self) -> bool {
        self.files.is_active() && self.folders.is_active()
    }

    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Option<AppResult<ChildrenSnapshot>> {
        if !self.is_active() {
            return None;
        }
        if !self.primed {
            self.primed = true;
            return self.snapshot();
        }

        let alive = tokio::select! {
            alive = self.files.changed() => alive,
            alive = self.folders.changed() => alive,
        };
        if !alive {
            debug!(owner_id = %self.owner, "Children subscription closed by store");
            self.cancel();
            return None;
        }
        self.snapshot()
    }

    /// Stop delivery and release both live queries.
    pub fn cancel(&mut self) {
        self.files.cancel();
        self.folders.cancel();
    }

    /// Adapt the subscription into a stream of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = AppResult<ChildrenSnapshot>> + Send {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|item| (item, sub))
        })
    }

    fn snapshot(&mut self) -> Option<AppResult<ChildrenSnapshot>> {
        let files = self.files.current()?;
        let folders = self.folders.current()?;
        Some(self.build(files, folders))
    }

    fn build(
        &self,
        files: SnapshotResult,
        folders: SnapshotResult,
    ) -> AppResult<ChildrenSnapshot> {
        let mut files = files?
            .iter()
            .map(FileRecord::from_document)
            .filter(|r| r.as_ref().map_or(true, |f| f.owner_id == self.owner))
            .collect::<AppResult<Vec<_>>>()?;
        let mut folders = folders?
            .iter()
            .map(FolderRecord::from_document)
            .filter(|r| r.as_ref().map_or(true, |f| f.owner_id == self.owner))
            .collect::<AppResult<Vec<_>>>()?;

        sort_files(&mut files);
        sort_folders(&mut folders);
        Ok(ChildrenSnapshot { files, folders })
    }
}

/// Newest first; ties by id.
pub(crate) fn sort_files(files: &mut [FileRecord]) {
    files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// Case-insensitive name order; ties by exact name, then id.
pub(crate) fn sort_folders(folders: &mut [FolderRecord]) {
    folders.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

impl HierarchicalStorageManager {
    /// Watch the direct children of `parent` (`None` for the root).
    pub async fn list_children(
        &self,
        parent: Option<&FolderId>,
    ) -> AppResult<ChildrenSubscription> {
        let predicates = Collection::children_of(self.owner(), parent);
        let files = self
            .metadata
            .query(Collection::Files.as_str(), &predicates)
            .await?;
        let folders = self
            .metadata
            .query(Collection::Folders.as_str(), &predicates)
            .await?;

        debug!(
            owner_id = %self.owner(),
            parent = ?parent.map(FolderId::as_str),
            "Children subscription opened"
        );

        Ok(ChildrenSubscription {
            owner: self.owner().clone(),
            parent: parent.cloned(),
            files,
            folders,
            primed: false,
        })
    }
}
