use std::sync::Arc;

use tokio::sync::Mutex;

use crate::editor::export::ExportSink;
use crate::editor::session::EditorSession;
use crate::editor::versions::SnapshotStore;
use crate::persistence::KeyValueStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The editor core is single-threaded; each lock is held for the whole of a
/// request's core work and its persistence write, so requests apply in order.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<EditorSession>>,
    pub versions: Arc<Mutex<SnapshotStore>>,
    /// Backing store for the live document and the saved versions.
    pub store: Arc<dyn KeyValueStore>,
    /// Where published exports go. `None` when no object storage is configured.
    pub exporter: Option<Arc<dyn ExportSink>>,
}
