//! Repository metadata reader port (trait).
//! Defines the interface for producing snapshots without coupling to any
//! on-disk format.

use crate::domain::RepoInfo;
use crate::error::TrackerError;

/// Port for reading working-copy metadata into a snapshot.
/// Implementations may parse an on-disk metadata directory or be test fakes.
pub trait RepoReader: Send {
    /// Read all observable facts in one pass and return them as a snapshot.
    ///
    /// Legitimately-absent facts (no commits yet, no bookmarks, ...) come
    /// back as empty/optional values; only an unreadable metadata directory
    /// is an error.
    fn read(&mut self) -> Result<RepoInfo, TrackerError>;

    /// Cheap check: has the metadata plausibly changed on disk since this
    /// reader's last full `read()`?
    ///
    /// Returns `true` before the first read. This is a per-call signal; the
    /// lifetime freshness latch lives in the tracker.
    fn is_fresh(&self) -> bool;
}
