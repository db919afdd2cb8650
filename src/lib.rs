//! Stable identities for file-system entries.
//!
//! A [`TrackingStore`] hands out [`TrackedNode`] handles for paths under a
//! root directory. The handle denotes *the entry*, not its path: moves and
//! renames performed through the store relocate the node inside the tracked
//! tree, so the same handle keeps resolving to the entry's current absolute
//! path. Entries that disappear out-of-band are detached lazily when their
//! parent directory is next listed; a detached handle fails to resolve from
//! then on, permanently.
//!
//! Physical operations are delegated to a [`FileStore`] implementation
//! ([`OsFileStore`] covers the host file system), and lifecycle events fan
//! out to weakly-held [`TrackingObserver`]s.
//!
//! A store instance is deliberately single-threaded; handles and stores are
//! `!Send`, so the compiler enforces the confinement.

pub mod ext;
pub mod file_store;
pub mod store;
pub mod tree;

pub use file_store::{
    DirectoryAttributes, DirectoryEntry, DirectoryListingOptions, EntryKind, FileStore,
    FileStoreError, OsFileStore,
};
pub use store::{StoreCreationError, TrackingError, TrackingObserver, TrackingStore};
pub use tree::{ResolveError, TrackedNode};
