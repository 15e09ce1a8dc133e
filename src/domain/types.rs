//! Pure data types for the repository state domain.
//! No I/O - snapshots are plain values compared structurally.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Mercurial's implicit branch name for repositories that never branched.
pub const DEFAULT_BRANCH: &str = "default";

/// Working-copy lifecycle state. Mutually exclusive: a working copy is in
/// at most one multi-step operation at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoState {
    #[default]
    Normal,
    Merging,
    Rebasing,
    Grafting,
}

impl fmt::Display for RepoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepoState::Normal => "normal",
            RepoState::Merging => "merging",
            RepoState::Rebasing => "rebasing",
            RepoState::Grafting => "grafting",
        };
        f.write_str(s)
    }
}

/// A bookmark or tag entry as it appears on disk: a name paired with the
/// revision it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRevision {
    pub name: String,
    pub revision: String,
}

impl NamedRevision {
    pub fn new(name: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revision: revision.into(),
        }
    }
}

/// Immutable snapshot of everything the tracker observes about a working
/// copy in one metadata read.
///
/// Equality over *all* fields drives change notification: if two snapshots
/// compare equal, nothing is republished. Any field added here participates
/// in that comparison automatically through the derive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    /// Active branch name. Never absent; a repo with no `.hg/branch` file
    /// is on [`DEFAULT_BRANCH`].
    pub current_branch: String,
    /// Working-directory parent revision, hex. `None` until the first commit.
    pub current_revision: Option<String>,
    pub state: RepoState,
    /// Branch name to the set of its head revisions. A Mercurial branch may
    /// have multiple heads.
    pub branches: HashMap<String, HashSet<String>>,
    /// Bookmarks in on-disk order.
    pub bookmarks: Vec<NamedRevision>,
    pub current_bookmark: Option<String>,
    /// Shared tags in on-disk order.
    pub tags: Vec<NamedRevision>,
    /// Tags local to this clone, never pushed.
    pub local_tags: Vec<NamedRevision>,
}

impl Default for RepoInfo {
    fn default() -> Self {
        Self {
            current_branch: DEFAULT_BRANCH.to_string(),
            current_revision: None,
            state: RepoState::Normal,
            branches: HashMap::new(),
            bookmarks: Vec::new(),
            current_bookmark: None,
            tags: Vec::new(),
            local_tags: Vec::new(),
        }
    }
}

impl fmt::Display for RepoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} [{}]",
            self.current_branch,
            self.current_revision.as_deref().unwrap_or("no commits"),
            self.state
        )
    }
}
