use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use snafu::Snafu;

use crate::ext::BestEffortPathExt;

/// Contract for the physical file operations the tracking store delegates.
///
/// Every call blocks on the caller's thread and is attempted exactly once;
/// failures are reported verbatim, never retried or swallowed.
pub trait FileStore {
    fn exists(&self, path: &Path) -> bool;

    fn is_directory(&self, path: &Path) -> bool;

    /// Lists the entries of a directory in the store's own order.
    fn list_directory(
        &self,
        path: &Path,
        options: &DirectoryListingOptions,
    ) -> Result<Vec<DirectoryEntry>, FileStoreError>;

    fn move_item(&self, source: &Path, destination: &Path) -> Result<(), FileStoreError>;

    fn copy_item(&self, source: &Path, destination: &Path) -> Result<(), FileStoreError>;

    fn remove_item(&self, path: &Path) -> Result<(), FileStoreError>;

    fn create_directory(
        &self,
        path: &Path,
        recursive: bool,
        attributes: &DirectoryAttributes,
    ) -> Result<(), FileStoreError>;
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets, devices and similar.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListingOptions {
    /// Whether dot-prefixed names appear in the listing.
    pub include_hidden: bool,
}

impl Default for DirectoryListingOptions {
    fn default() -> Self {
        DirectoryListingOptions {
            include_hidden: true,
        }
    }
}

impl DirectoryListingOptions {
    /// Whether a name would appear in a listing produced with these options.
    pub(crate) fn would_list(&self, name: &OsStr) -> bool {
        self.include_hidden || !name.as_encoded_bytes().starts_with(b".")
    }
}

/// Attributes applied when creating a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryAttributes {
    /// Unix permission bits for the created directory; ignored on platforms
    /// without them.
    pub unix_mode: Option<u32>,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FileStoreError {
    #[snafu(display("I/O operation failed at {}", path.best_effort_path_display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Destination {} already exists", path.best_effort_path_display()))]
    AlreadyExistsError { path: PathBuf },
}
