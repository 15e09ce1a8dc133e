//! Open-branch enumeration port (trait).
//! The one deliberately expensive operation in the system: implementations
//! may shell out to the VCS binary.

use crate::error::TrackerError;
use std::collections::HashSet;
use std::path::Path;

/// Port for enumerating currently-open branch names.
///
/// Only ever invoked from the update path, never from accessors; results
/// are cached by the tracker until the next detected state change.
pub trait BranchesEnumerator: Send + Sync {
    /// Enumerate the open branches of the repository at `root`.
    fn collect_open_branches(&self, root: &Path) -> Result<HashSet<String>, TrackerError>;
}
