//! State cache and change detection for one working copy.
//!
//! The tracker holds the last snapshot read from disk and republishes only
//! when a new read actually differs. Unconditional republishing would make
//! dependent views (history panels and the like) refresh and flicker on
//! every poll even when nothing changed; the structural-equality gate is
//! the correctness property here, not an optimization.

use crate::adapters::{HgBranchesCommand, HgMetadataReader};
use crate::domain::{NamedRevision, RepoInfo, RepoState, DEFAULT_BRANCH};
use crate::error::TrackerError;
use crate::ports::{BranchesEnumerator, RepoReader, StatusPublisher};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Tracks the state of a single Mercurial working copy.
///
/// One background thread (watcher or timer) drives [`update`](Self::update);
/// any number of threads read the accessors concurrently. The cached
/// snapshot is an immutable [`RepoInfo`] behind an `Arc`, swapped whole, so
/// readers can never observe a partially-updated snapshot.
pub struct HgRepoTracker {
    root: PathBuf,
    hg_dir: PathBuf,
    reader: Mutex<Box<dyn RepoReader>>,
    enumerator: Box<dyn BranchesEnumerator>,
    publisher: Arc<dyn StatusPublisher>,
    /// `None` until the first successful `update()` establishes a baseline.
    info: RwLock<Option<Arc<RepoInfo>>>,
    open_branches: RwLock<Arc<HashSet<String>>>,
    /// Serializes the whole update path: at most one `update()` in flight.
    update_guard: Mutex<()>,
    /// Lifetime latch: clears the first time a read finds the metadata
    /// changed underneath us, and never sets again.
    fresh: AtomicBool,
    /// Terminal: once set, `update()` is a guaranteed no-op.
    disposed: AtomicBool,
}

impl HgRepoTracker {
    /// Build a tracker from explicit port implementations.
    pub fn new(
        root: impl Into<PathBuf>,
        reader: impl RepoReader + 'static,
        enumerator: impl BranchesEnumerator + 'static,
        publisher: Arc<dyn StatusPublisher>,
    ) -> Self {
        let root = root.into();
        let hg_dir = root.join(".hg");
        Self {
            root,
            hg_dir,
            reader: Mutex::new(Box::new(reader)),
            enumerator: Box::new(enumerator),
            publisher,
            info: RwLock::new(None),
            open_branches: RwLock::new(Arc::new(HashSet::new())),
            update_guard: Mutex::new(()),
            fresh: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
        }
    }

    /// Build a tracker over the on-disk adapters: the `.hg` metadata reader
    /// and the `hg branches` enumerator.
    pub fn open(root: impl Into<PathBuf>, publisher: Arc<dyn StatusPublisher>) -> Self {
        let root = root.into();
        let reader = HgMetadataReader::new(&root);
        Self::new(root, reader, HgBranchesCommand, publisher)
    }

    /// Re-read the working copy and, if its state differs from the cached
    /// snapshot, swap the cache, re-enumerate open branches, and publish a
    /// single notification. Returns whether a change was published.
    ///
    /// The first call after construction establishes the baseline: it
    /// populates the cache but publishes nothing (there is no prior state
    /// to have changed from). A [`TrackerError::MetadataUnreadable`] leaves
    /// the cache untouched and publishes nothing; a failed enumeration is
    /// logged, keeps the previous open-branch set, and does not suppress
    /// the snapshot-level notification.
    pub fn update(&self) -> Result<bool, TrackerError> {
        if self.disposed.load(Ordering::Acquire) {
            return Ok(false);
        }
        let _flight = self
            .update_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Disposal may have raced in while we waited for the guard.
        if self.disposed.load(Ordering::Acquire) {
            return Ok(false);
        }

        let new_info = {
            let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
            if !reader.is_fresh() {
                self.fresh.store(false, Ordering::Release);
            }
            reader.read()?
        };

        let baseline = self
            .info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if baseline.as_deref() == Some(&new_info) {
            return Ok(false);
        }

        tracing::debug!(root = %self.root.display(), info = %new_info, "snapshot changed");
        *self.info.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(new_info));

        // Expensive step, possibly an external process. Runs under the
        // update guard only, never under a lock the accessors read through.
        match self.enumerator.collect_open_branches(&self.root) {
            Ok(open) => {
                *self
                    .open_branches
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Arc::new(open);
            }
            Err(e) => {
                tracing::warn!(
                    root = %self.root.display(),
                    "open-branch enumeration failed, keeping previous set: {e}"
                );
            }
        }

        if baseline.is_none() {
            return Ok(false);
        }
        self.publisher.publish(&self.root);
        Ok(true)
    }

    /// Mark the owning context torn down. Terminal and idempotent: every
    /// later `update()` returns without reading, mutating, or publishing.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    // ─── Read surface ───
    //
    // Non-blocking reads of the last cached values; arbitrarily stale
    // relative to disk until the next `update()`. Before the first update
    // they return the documented empty/default values.

    /// The cached snapshot, if a baseline has been established.
    pub fn info(&self) -> Option<Arc<RepoInfo>> {
        self.info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_branch(&self) -> String {
        self.info()
            .map(|i| i.current_branch.clone())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
    }

    pub fn current_revision(&self) -> Option<String> {
        self.info().and_then(|i| i.current_revision.clone())
    }

    pub fn state(&self) -> RepoState {
        self.info().map(|i| i.state).unwrap_or_default()
    }

    pub fn branches(&self) -> HashMap<String, HashSet<String>> {
        self.info().map(|i| i.branches.clone()).unwrap_or_default()
    }

    pub fn bookmarks(&self) -> Vec<NamedRevision> {
        self.info().map(|i| i.bookmarks.clone()).unwrap_or_default()
    }

    pub fn current_bookmark(&self) -> Option<String> {
        self.info().and_then(|i| i.current_bookmark.clone())
    }

    pub fn tags(&self) -> Vec<NamedRevision> {
        self.info().map(|i| i.tags.clone()).unwrap_or_default()
    }

    pub fn local_tags(&self) -> Vec<NamedRevision> {
        self.info().map(|i| i.local_tags.clone()).unwrap_or_default()
    }

    /// Open branches as of the last state change; not part of snapshot
    /// equality, so staleness here is cosmetic.
    pub fn open_branches(&self) -> Arc<HashSet<String>> {
        self.open_branches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether every read so far found the metadata unchanged since the
    /// previous one. Degrades once, never recovers for this tracker's
    /// lifetime; purely a hint for callers deciding whether to trust
    /// cached enumeration results.
    pub fn is_fresh(&self) -> bool {
        self.fresh.load(Ordering::Acquire)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn hg_dir(&self) -> &Path {
        &self.hg_dir
    }
}

impl fmt::Display for HgRepoTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.info() {
            Some(info) => write!(f, "HgRepoTracker {}: {}", self.root.display(), info),
            None => write!(f, "HgRepoTracker {}: <no baseline>", self.root.display()),
        }
    }
}
