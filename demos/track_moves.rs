//! Walkthrough: a handle keeps resolving across a rename and a move.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use tracing::info;

use tether::{
    DirectoryAttributes, OsFileStore, TrackedNode, TrackingObserver, TrackingStore,
};

struct LoggingObserver;

impl TrackingObserver for LoggingObserver {
    fn started_tracking(&self, node: &TrackedNode) {
        info!("now tracking {:?}", node.last_component());
    }

    fn will_move(&self, _node: &TrackedNode, from: &Path, to: &Path) {
        info!("moved {} -> {}", from.display(), to.display());
    }

    fn will_remove(&self, node: &TrackedNode) {
        info!("removed {:?}", node.last_component());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let workspace = tempfile::TempDir::new()?;
    let document = workspace.path().join("draft.txt");
    fs::write(&document, b"hello")?;

    let store = TrackingStore::new(workspace.path(), OsFileStore)?;
    let observer: Rc<dyn TrackingObserver> = Rc::new(LoggingObserver);
    store.add_observer(&observer);

    let handle = store
        .resolve(&document)?
        .expect("the draft exists, so it must resolve");
    info!("handle resolves to {:?}", handle.resolve_path()?);

    // Rename in place: same handle, new path.
    store.move_item(&handle, &workspace.path().join("final.txt"))?;
    info!("after rename: {:?}", handle.resolve_path()?);

    // Move into a freshly created directory.
    store.create_directory(
        &workspace.path().join("archive"),
        false,
        &DirectoryAttributes::default(),
    )?;
    store.move_item(&handle, &workspace.path().join("archive/final.txt"))?;
    info!("after move: {:?}", handle.resolve_path()?);

    // Removal detaches the handle for good.
    store.remove_item(&handle)?;
    info!("after removal, resolution fails: {:?}", handle.resolve_path());

    Ok(())
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .compact()
        .init();
}
