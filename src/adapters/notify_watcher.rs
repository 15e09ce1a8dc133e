//! Notify-backed trigger that drives the tracker from filesystem events.
//!
//! Watches the `.hg` directory (and the work-root `.hgtags` file) and calls
//! `update()` on the tracker whenever metadata changes. The tracker's own
//! equality gate absorbs event storms: a burst of writes that settles on
//! the same state publishes once.

use crate::tracker::HgRepoTracker;
use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct MetadataWatcher {
    // Held to keep the OS watches alive; dropping stops the trigger.
    _watcher: RecommendedWatcher,
}

impl MetadataWatcher {
    /// Start watching the tracker's metadata on disk.
    pub fn new(tracker: Arc<HgRepoTracker>) -> Result<Self> {
        let hg_dir = tracker.hg_dir().to_path_buf();
        let root = tracker.root().to_path_buf();

        let config = Config::default().with_poll_interval(Duration::from_secs(1));

        let callback_hg_dir = hg_dir.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("metadata watch error: {e}");
                        return;
                    }
                };

                use notify::EventKind::*;
                if !matches!(event.kind, Create(_) | Modify(_) | Remove(_)) {
                    return;
                }
                if !event
                    .paths
                    .iter()
                    .any(|p| is_metadata_path(p, &callback_hg_dir))
                {
                    return;
                }
                if tracker.is_disposed() {
                    return;
                }
                if let Err(e) = tracker.update() {
                    tracing::warn!(root = %tracker.root().display(), "update failed: {e}");
                }
            },
            config,
        )
        .context("failed to create metadata watcher")?;

        watcher
            .watch(&hg_dir, RecursiveMode::Recursive)
            .context("failed to watch .hg directory")?;
        // Non-recursive on the root: only `.hgtags` there is metadata.
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .context("failed to watch repository root")?;

        Ok(Self { _watcher: watcher })
    }
}

fn is_metadata_path(path: &Path, hg_dir: &Path) -> bool {
    path.starts_with(hg_dir) || path.file_name().is_some_and(|n| n == ".hgtags")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn metadata_paths_are_hg_dir_and_hgtags() {
        let hg_dir = PathBuf::from("/repo/.hg");
        assert!(is_metadata_path(Path::new("/repo/.hg/branch"), &hg_dir));
        assert!(is_metadata_path(Path::new("/repo/.hgtags"), &hg_dir));
        assert!(!is_metadata_path(Path::new("/repo/src/main.rs"), &hg_dir));
    }
}
