//! The orchestrator that owns an identity tree and keeps it honest.

mod observer;
mod tracking_store;

pub use observer::TrackingObserver;
pub use tracking_store::{StoreCreationError, TrackingError, TrackingStore};
