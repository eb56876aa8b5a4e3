//! Metadata store collection names and shared document field names.

use std::fmt;

use filenest_core::types::{FilterField, FilterValue, FolderId, OwnerId};

/// Document field names shared by file and folder documents.
pub mod fields {
    /// Owning user.
    pub const OWNER_ID: &str = "ownerId";
    /// Parent folder id, or null at the root.
    pub const PARENT_FOLDER_ID: &str = "parentFolderId";
}

/// A metadata store collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// File records.
    Files,
    /// Folder records.
    Folders,
}

impl Collection {
    /// The collection name used by the store.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Folders => "folders",
        }
    }

    /// Predicates selecting the direct children of `parent` owned by `owner`.
    pub fn children_of(owner: &OwnerId, parent: Option<&FolderId>) -> Vec<FilterField> {
        vec![
            FilterField::eq(fields::OWNER_ID, FilterValue::String(owner.to_string())),
            FilterField::eq(
                fields::PARENT_FOLDER_ID,
                FilterValue::from_option(parent.map(FolderId::as_str)),
            ),
        ]
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
