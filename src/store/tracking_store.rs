use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::{debug, info, warn};

use crate::ext::{BestEffortPathExt, RelativeComponentsExt};
use crate::file_store::{
    DirectoryAttributes, DirectoryListingOptions, FileStore, FileStoreError,
};
use crate::store::observer::{ObserverRegistry, TrackingObserver};
use crate::tree::TrackedNode;

/// Owns an identity tree rooted at one directory and keeps it consistent
/// with the physical state reported by a [`FileStore`].
///
/// All physical operations go through the file store and complete (or fail)
/// before any tree mutation or notification; on physical failure the tree is
/// left exactly as it was. A store instance is single-threaded by
/// construction (`Rc`/`RefCell` internals), so concurrent misuse is a
/// compile error rather than a data race.
pub struct TrackingStore<S: FileStore> {
    root_path: PathBuf,
    root: TrackedNode,
    file_store: S,
    observers: ObserverRegistry,
}

impl<S: FileStore> TrackingStore<S> {
    /// Creates a store tracking the tree under `root_path`, which must be an
    /// existing directory on the file store.
    pub fn new(root_path: impl Into<PathBuf>, file_store: S) -> Result<Self, StoreCreationError> {
        let root_path = root_path.into();
        ensure!(
            file_store.is_directory(&root_path),
            RootNotADirectorySnafu { path: root_path }
        );

        info!("Tracking tree rooted at {:?}", root_path);
        let root = TrackedNode::new_root(root_path.clone());
        Ok(TrackingStore {
            root_path,
            root,
            file_store,
            observers: ObserverRegistry::new(),
        })
    }

    pub fn root(&self) -> &TrackedNode {
        &self.root
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// True iff `node` belongs to this store's tree.
    pub fn owns(&self, node: &TrackedNode) -> bool {
        node.find_root().is_some_and(|root| root == self.root)
    }

    /// Returns the tracked node for `path`, or `Ok(None)` when the path is
    /// not under the root or does not currently exist — absence is an
    /// expected outcome, not an error.
    ///
    /// Path components not tracked yet are materialized on the way down,
    /// with a `started_tracking` notification per new node. Resolving the
    /// same existing path twice yields the same node instance.
    pub fn resolve(&self, path: &Path) -> Result<Option<TrackedNode>, TrackingError> {
        let Some(components) = path.components_relative_to(&self.root_path) else {
            debug!("Path {:?} is outside the tracked root", path);
            return Ok(None);
        };
        if !self.file_store.exists(path) {
            debug!("Path {:?} does not exist, nothing to track", path);
            return Ok(None);
        }

        Ok(Some(self.track_components(&components)))
    }

    /// Lists the directory behind `node` and returns its tracked children in
    /// the file store's listing order.
    ///
    /// This is also the reconciliation point for out-of-band changes: a
    /// tracked child that the listing no longer contains, and that the file
    /// store confirms gone, is detached. A child the options would have
    /// listed that the file store still reports as existing indicates the
    /// tree and the store contradict each other, which is an integrity fault
    /// this design cannot repair — it panics rather than guessing.
    pub fn list_directory(
        &self,
        node: &TrackedNode,
        options: &DirectoryListingOptions,
    ) -> Result<Vec<TrackedNode>, TrackingError> {
        ensure!(self.owns(node), NotOwnedSnafu);
        let dir_path = node
            .resolve_path()
            .expect("an owned node always resolves to a path");

        let entries = self
            .file_store
            .list_directory(&dir_path, options)
            .context(PhysicalSnafu)?;

        let mut listed = Vec::with_capacity(entries.len());
        for entry in &entries {
            let (child, created) = node.get_or_create_child(&entry.name);
            if created {
                debug!("Started tracking {:?} under {:?}", entry.name, dir_path);
                self.observers.notify_started_tracking(&child);
            }
            listed.push(child);
        }

        let listed_names: HashSet<&OsString> = entries.iter().map(|entry| &entry.name).collect();
        for child in node.tracked_children() {
            let name = child.last_component();
            if listed_names.contains(&name) || !options.would_list(&name) {
                continue;
            }

            let child_path = dir_path.join(&name);
            assert!(
                !self.file_store.exists(&child_path),
                "file store reports {} as existing but omitted it from the listing of {}",
                child_path.best_effort_path_display(),
                dir_path.best_effort_path_display(),
            );

            warn!("Tracked entry {:?} vanished externally, detaching", child_path);
            child.detach_self();
        }

        Ok(listed)
    }

    /// Creates a directory on the file store and returns its tracked node.
    ///
    /// With `recursive` unset, missing intermediate segments surface as the
    /// file store's own failure.
    pub fn create_directory(
        &self,
        path: &Path,
        recursive: bool,
        attributes: &DirectoryAttributes,
    ) -> Result<TrackedNode, TrackingError> {
        let components = self.components_strictly_under_root(path)?;

        self.file_store
            .create_directory(path, recursive, attributes)
            .context(PhysicalSnafu)?;

        Ok(self.track_components(&components))
    }

    /// Moves the entry behind `node` to `destination`, keeping the node's
    /// identity: every handle to it resolves to the new path afterwards,
    /// while the old path no longer resolves to it.
    ///
    /// The physical move happens first; if it fails (collision, moving into
    /// a descendant, ...) the error propagates and the tree is untouched.
    pub fn move_item(&self, node: &TrackedNode, destination: &Path) -> Result<(), TrackingError> {
        ensure!(self.owns(node), NotOwnedSnafu);
        ensure!(node != &self.root, CannotMoveRootSnafu);
        let destination_components = self.components_strictly_under_root(destination)?;

        let source_path = node
            .resolve_path()
            .expect("an owned node always resolves to a path");
        self.file_store
            .move_item(&source_path, destination)
            .context(PhysicalSnafu)?;
        info!("Moved {:?} to {:?}", source_path, destination);

        self.observers.notify_will_move(node, &source_path, destination);

        node.detach_self();
        let (parent_components, new_name) = destination_components
            .split_last()
            .map(|(last, rest)| (rest, last))
            .expect("destination components are never empty here");
        let new_parent = self.track_components(parent_components);
        if let Some(stale) = new_parent.child_named(new_name) {
            // The physical move succeeded, so whatever this node stood for
            // is gone; external change wins, as in listing reconciliation.
            warn!("Destination name {:?} was stale in the tree, detaching", new_name);
            stale.detach_self();
        }
        new_parent.reparent_detached_child(node, new_name);

        Ok(())
    }

    /// Copies `source` to `destination` and returns the destination's
    /// tracked node — a distinct identity; a tracked source is unaffected.
    pub fn copy_item(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<TrackedNode, TrackingError> {
        let destination_components = self.components_strictly_under_root(destination)?;

        self.file_store
            .copy_item(source, destination)
            .context(PhysicalSnafu)?;
        info!("Copied {:?} to {:?}", source, destination);

        Ok(self.track_components(&destination_components))
    }

    /// Removes the entry behind `node` from the file store and detaches the
    /// node. Former children are not swept; they simply stop resolving
    /// through their detached ancestor.
    pub fn remove_item(&self, node: &TrackedNode) -> Result<(), TrackingError> {
        ensure!(self.owns(node), NotOwnedSnafu);
        ensure!(node != &self.root, CannotRemoveRootSnafu);

        let path = node
            .resolve_path()
            .expect("an owned node always resolves to a path");
        self.file_store.remove_item(&path).context(PhysicalSnafu)?;
        info!("Removed {:?}", path);

        self.observers.notify_will_remove(node);
        node.detach_self();

        Ok(())
    }

    pub fn add_observer(&self, observer: &Rc<dyn TrackingObserver>) {
        self.observers.add(observer);
    }

    pub fn remove_observer(&self, observer: &Rc<dyn TrackingObserver>) {
        self.observers.remove(observer);
    }

    /// Walks the tree from the root along `components`, creating missing
    /// nodes and notifying a `started_tracking` per new one.
    fn track_components(&self, components: &[OsString]) -> TrackedNode {
        let mut current = self.root.clone();
        for name in components {
            let (child, created) = current.get_or_create_child(name);
            if created {
                debug!("Started tracking component {:?}", name);
                self.observers.notify_started_tracking(&child);
            }
            current = child;
        }
        current
    }

    /// Component names of `path` relative to the root, rejecting paths
    /// outside the root and the root itself.
    fn components_strictly_under_root(
        &self,
        path: &Path,
    ) -> Result<Vec<OsString>, TrackingError> {
        let components = path
            .components_relative_to(&self.root_path)
            .filter(|components| !components.is_empty())
            .context(InvalidPathSnafu { path })?;
        Ok(components)
    }
}

#[derive(Debug, Snafu)]
pub enum StoreCreationError {
    #[snafu(display("Tracking root {} is not an existing directory", path.best_effort_path_display()))]
    RootNotADirectoryError { path: PathBuf },
}

#[derive(Debug, Snafu)]
pub enum TrackingError {
    #[snafu(display("Node does not belong to this tracking store"))]
    NotOwnedError,
    #[snafu(display("Path {} is not inside the tracked root", path.best_effort_path_display()))]
    InvalidPathError { path: PathBuf },
    #[snafu(display("The tree root cannot be moved"))]
    CannotMoveRootError,
    #[snafu(display("The tree root cannot be removed"))]
    CannotRemoveRootError,
    #[snafu(display("Physical file operation failed"))]
    PhysicalError { source: FileStoreError },
}
