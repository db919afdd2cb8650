use std::cell::RefCell;
use std::ffi::{OsStr, OsString};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use hashlink::LinkedHashMap;
use snafu::{OptionExt, Snafu};
use tracing::debug;

/// Where a node currently sits in its tree.
///
/// The parent link is weak on purpose: the parent owns its children through
/// the `children` map, never the other way around. A node whose weak parent
/// no longer upgrades is detached, and detachment is terminal.
#[derive(Debug)]
enum Location {
    Root {
        path: PathBuf,
    },
    Intermediate {
        parent: Weak<NodeInner>,
        name: OsString,
    },
}

#[derive(Debug)]
struct NodeInner {
    location: RefCell<Location>,
    children: RefCell<LinkedHashMap<OsString, TrackedNode>>,
}

/// A handle to one tracked file-system entry.
///
/// Cloning the handle clones a reference to the same node; equality and
/// hashing follow node identity, never the resolved path — the path of a
/// live node changes whenever an ancestor is moved.
#[derive(Debug, Clone)]
pub struct TrackedNode {
    inner: Rc<NodeInner>,
}

impl PartialEq for TrackedNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for TrackedNode {}

impl Hash for TrackedNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.inner).hash(state);
    }
}

impl TrackedNode {
    /// Creates the root node of a new tree.
    pub(crate) fn new_root(path: impl Into<PathBuf>) -> Self {
        TrackedNode {
            inner: Rc::new(NodeInner {
                location: RefCell::new(Location::Root { path: path.into() }),
                children: RefCell::new(LinkedHashMap::new()),
            }),
        }
    }

    pub(crate) fn is_root(&self) -> bool {
        matches!(&*self.inner.location.borrow(), Location::Root { .. })
    }

    /// Returns the node's own name: the base name of the root path for a
    /// root (or the whole path when it has none, e.g. `/`), the stored name
    /// otherwise. A detached node keeps its last name.
    pub fn last_component(&self) -> OsString {
        match &*self.inner.location.borrow() {
            Location::Root { path } => path
                .file_name()
                .map(OsStr::to_os_string)
                .unwrap_or_else(|| path.as_os_str().to_os_string()),
            Location::Intermediate { name, .. } => name.clone(),
        }
    }

    /// Resolves the node to its current absolute path by walking up to the
    /// root and appending names on the way back down.
    ///
    /// The result is valid only at the instant of the call and is therefore
    /// never cached: a later move of any ancestor changes it.
    pub fn resolve_path(&self) -> Result<PathBuf, ResolveError> {
        match &*self.inner.location.borrow() {
            Location::Root { path } => Ok(path.clone()),
            Location::Intermediate { parent, name } => {
                let parent = parent
                    .upgrade()
                    .map(|inner| TrackedNode { inner })
                    .context(DetachedSnafu)?;
                let mut path = parent.resolve_path()?;
                path.push(name);
                Ok(path)
            }
        }
    }

    /// Walks parent links to the tree's root.
    ///
    /// Returns `None` when the chain is broken, i.e. this node or one of its
    /// ancestors has been detached.
    pub fn find_root(&self) -> Option<TrackedNode> {
        let mut current = self.clone();
        while !current.is_root() {
            current = current.parent()?;
        }
        Some(current)
    }

    fn parent(&self) -> Option<TrackedNode> {
        match &*self.inner.location.borrow() {
            Location::Root { .. } => None,
            Location::Intermediate { parent, .. } => {
                parent.upgrade().map(|inner| TrackedNode { inner })
            }
        }
    }

    /// Returns the child with the given name, creating it if necessary.
    /// The second value is `true` when the child was newly created.
    ///
    /// This is the single authority for node identity reuse; nothing else
    /// constructs intermediate nodes.
    pub(crate) fn get_or_create_child(&self, name: &OsStr) -> (TrackedNode, bool) {
        if let Some(existing) = self.inner.children.borrow().get(name) {
            return (existing.clone(), false);
        }

        let child = TrackedNode {
            inner: Rc::new(NodeInner {
                location: RefCell::new(Location::Intermediate {
                    parent: Rc::downgrade(&self.inner),
                    name: name.to_os_string(),
                }),
                children: RefCell::new(LinkedHashMap::new()),
            }),
        };
        self.inner
            .children
            .borrow_mut()
            .insert(name.to_os_string(), child.clone());

        (child, true)
    }

    pub(crate) fn child_named(&self, name: &OsStr) -> Option<TrackedNode> {
        self.inner.children.borrow().get(name).cloned()
    }

    /// Snapshot of the current children, so callers can mutate the set while
    /// iterating (reconciliation detaches as it goes).
    pub(crate) fn tracked_children(&self) -> Vec<TrackedNode> {
        self.inner.children.borrow().values().cloned().collect()
    }

    /// Attaches a currently-detached node under `self` as `new_name`,
    /// preserving the node's identity.
    ///
    /// Panics if `node` is a root or still attached somewhere; reattaching a
    /// live node is a programming error, not a recoverable condition.
    pub(crate) fn reparent_detached_child(&self, node: &TrackedNode, new_name: &OsStr) {
        assert!(!node.is_root(), "a tree root cannot be reparented");
        assert!(
            node.parent().is_none(),
            "refusing to reparent a node that is still attached"
        );
        debug_assert!(
            self.child_named(new_name).is_none(),
            "reparent target name is already taken"
        );

        debug!("Reattaching node as {:?}", new_name);
        *node.inner.location.borrow_mut() = Location::Intermediate {
            parent: Rc::downgrade(&self.inner),
            name: new_name.to_os_string(),
        };
        self.inner
            .children
            .borrow_mut()
            .insert(new_name.to_os_string(), node.clone());
    }

    /// Detaches the node from its parent, keeping its name and identity.
    ///
    /// From here on the node (and everything below it) no longer resolves;
    /// there is no way back except `reparent_detached_child`. Panics on a
    /// root, which by invariant is never detached.
    pub(crate) fn detach_self(&self) {
        let (parent, name) = match &*self.inner.location.borrow() {
            Location::Root { .. } => panic!("a tree root cannot be detached"),
            Location::Intermediate { parent, name } => (parent.upgrade(), name.clone()),
        };

        if let Some(parent) = parent {
            let mut children = parent.children.borrow_mut();
            let is_current_occupant = children
                .get(&name)
                .is_some_and(|child| Rc::ptr_eq(&child.inner, &self.inner));
            if is_current_occupant {
                children.remove(&name);
            }
        }

        debug!("Detached node {:?}", name);
        *self.inner.location.borrow_mut() = Location::Intermediate {
            parent: Weak::new(),
            name,
        };
    }
}

#[derive(Debug, Snafu)]
pub enum ResolveError {
    #[snafu(display("Node is no longer reachable from a tree root"))]
    DetachedError,
}
