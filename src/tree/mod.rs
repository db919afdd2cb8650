//! The identity-tracking tree.
//!
//! A [`TrackedNode`] stands for "this entry" rather than "this path": the
//! handle stays valid while the entry is moved or renamed through the store,
//! and resolving it always reflects the current location.

mod node;

pub use node::{ResolveError, TrackedNode};
