// Resume editing core: live document, change notification, undo/redo history,
// saved versions, and the export/report views built on top of them.
// Everything below handlers is synchronous; the HTTP layer owns all locking.

pub mod completeness;
pub mod document;
pub mod export;
pub mod handlers;
pub mod history;
pub mod notifier;
pub mod session;
pub mod versions;
