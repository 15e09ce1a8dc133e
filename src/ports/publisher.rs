//! State-change notification port (trait).
//! Defines the capability the tracker needs from the embedding
//! application's event plumbing: deliver "this repository changed".

use std::path::Path;

/// Port for publishing a repository-state-changed notification.
///
/// `publish` carries only the repository's root identity, not the snapshot:
/// subscribers re-query current state through the tracker's accessors, so a
/// racing later update can never hand them a stale copy. Delivery completes
/// before `publish` returns.
pub trait StatusPublisher: Send + Sync {
    fn publish(&self, root: &Path);
}
