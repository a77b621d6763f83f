//! Directory watchers that are started on demand and never stopped.
//!
//! Each watcher owns an OS watch handle (inotify on Linux, FSEvents on macOS,
//! ReadDirectoryChangesW on Windows). The registry keeps every watcher, so the
//! handles accumulate for the life of the process.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use leakscope_core::error::{LeakscopeError, Result};

#[derive(Default)]
pub struct WatchRegistry {
    watchers: Mutex<Vec<RecommendedWatcher>>,
    seq: AtomicU64,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching `dir` (non-recursive) and keep the watcher forever.
    pub fn watch(&self, dir: &Path) -> Result<u64> {
        let id = self.seq.fetch_add(1, Ordering::Relaxed) + 1;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => tracing::trace!(watcher = id, kind = ?event.kind, paths = event.paths.len(), "watched directory changed"),
            Err(e) => tracing::warn!(watcher = id, error = %e, "watch event failed"),
        })
        .map_err(|e| LeakscopeError::Internal(format!("watcher create failed: {e}")))?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| LeakscopeError::Internal(format!("watch {} failed: {e}", dir.display())))?;

        self.watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(watcher);
        Ok(id)
    }

    /// Watchers retained so far.
    pub fn active(&self) -> usize {
        self.watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
