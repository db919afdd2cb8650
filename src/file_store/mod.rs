//! The physical side of tracking.
//!
//! The tracking store never touches the disk itself; every physical
//! operation goes through the [`FileStore`] trait. [`OsFileStore`] is the
//! crate's own `std::fs` implementation of it.

mod file_store;
mod os_file_store;

pub use file_store::{
    DirectoryAttributes, DirectoryEntry, DirectoryListingOptions, EntryKind, FileStore,
    FileStoreError,
};
pub use os_file_store::OsFileStore;
