//! Synchronous subscriber registry implementing the StatusPublisher port.
//!
//! The embedding application usually owns the real event plumbing; this is
//! the in-crate implementation for applications without one, and for tests.

use crate::ports::StatusPublisher;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

type Subscriber = Box<dyn Fn(&Path) -> anyhow::Result<()> + Send + Sync>;

/// Delivers each notification to every registered subscriber, in
/// registration order, before `publish` returns. A failing subscriber is
/// logged and does not stop delivery to the rest.
#[derive(Default)]
pub struct StatusBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl StatusBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked with the repository root on every
    /// detected state change.
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&Path) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(subscriber));
    }
}

impl StatusPublisher for StatusBus {
    fn publish(&self, root: &Path) {
        let subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (idx, subscriber) in subscribers.iter().enumerate() {
            if let Err(e) = subscriber(root) {
                tracing::warn!(
                    subscriber = idx,
                    root = %root.display(),
                    "state-change subscriber failed: {e:#}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn publishes_to_all_subscribers() {
        let bus = StatusBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            bus.subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        bus.publish(Path::new("/repo"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failing_subscriber_does_not_block_others() {
        let bus = StatusBus::new();
        bus.subscribe(|_| Err(anyhow!("boom")));
        let seen: Arc<Mutex<Vec<PathBuf>>> = Arc::default();
        {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |root| {
                seen.lock().unwrap().push(root.to_path_buf());
                Ok(())
            });
        }
        bus.publish(Path::new("/repo"));
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[PathBuf::from("/repo")]
        );
    }
}
