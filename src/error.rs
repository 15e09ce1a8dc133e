//! Error taxonomy for tracker operations.
//!
//! Only `update()` can fail; the read accessors never do. A disposed
//! tracker is not an error condition - `update()` on one is a silent no-op.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// The metadata directory is missing, unreadable, or corrupt. Fatal to
    /// the `update()` call that hit it; the cached snapshot is untouched.
    #[error("repository metadata unreadable at {path}: {source}")]
    MetadataUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The open-branch query failed. Non-fatal: callers keep the previous
    /// open-branch set and carry on.
    #[error("branch enumeration failed: {0}")]
    EnumerationFailed(String),
}

impl TrackerError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TrackerError::MetadataUnreadable {
            path: path.into(),
            source,
        }
    }
}
