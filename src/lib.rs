//! hgstate - Mercurial working-copy state tracker.
//!
//! Reads on-disk repository metadata into an immutable snapshot, caches the
//! last known snapshot, and notifies subscribers only when the snapshot
//! actually changes. Re-parsing is cheap; what this crate avoids is
//! re-*broadcasting*: consumers (history views, status bars) only hear
//! about real changes, never identical re-reads.
//!
//! Typical wiring:
//!
//! ```no_run
//! use hgstate::{HgRepoTracker, MetadataWatcher, StatusBus};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let bus = Arc::new(StatusBus::new());
//! bus.subscribe(|root| {
//!     println!("repository changed: {}", root.display());
//!     Ok(())
//! });
//!
//! let tracker = Arc::new(HgRepoTracker::open("/path/to/repo", bus));
//! tracker.update()?; // establish the baseline, publishes nothing
//!
//! let _watcher = MetadataWatcher::new(Arc::clone(&tracker))?;
//! // ... accessors stay valid from any thread:
//! let branch = tracker.current_branch();
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod bus;
pub mod domain;
pub mod error;
pub mod ports;
pub mod tracker;

pub use adapters::{HgBranchesCommand, HgMetadataReader, MetadataWatcher};
pub use bus::StatusBus;
pub use domain::{NamedRevision, RepoInfo, RepoState, DEFAULT_BRANCH};
pub use error::TrackerError;
pub use ports::{BranchesEnumerator, RepoReader, StatusPublisher};
pub use tracker::HgRepoTracker;
