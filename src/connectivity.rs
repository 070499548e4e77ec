//! Connectivity snapshot capability.
//!
//! The oracle exists to pick UI messaging ("retry" vs. "queued for delivery"),
//! never to gate correctness; the value is a best-effort point-in-time
//! snapshot and callers must not assume it is monotonic or instantaneous.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

pub trait ConnectivityOracle: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Fixed answer, for composition roots that do not watch the network (and for
/// tests).
#[derive(Debug, Clone, Copy)]
pub struct StaticOracle(pub bool);

impl ConnectivityOracle for StaticOracle {
    fn is_online(&self) -> bool {
        self.0
    }
}

/// Continuously-updated oracle backed by a background probe task.
///
/// The composition root owns the lifecycle: `start` spawns the watcher,
/// `stop` tears it down (also run on drop). Until the first probe completes
/// the watcher reports online, so a cold start never misclassifies the very
/// first operation as offline.
pub struct NetworkWatcher {
    online: Arc<AtomicBool>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl NetworkWatcher {
    pub fn new() -> Self {
        Self {
            online: Arc::new(AtomicBool::new(true)),
            task: std::sync::Mutex::new(None),
        }
    }

    /// Spawn the watcher loop. `probe` is polled every `interval`; its result
    /// becomes the next snapshot. Calling `start` twice replaces the previous
    /// watcher.
    pub fn start<P, F>(&self, probe: P, interval: Duration)
    where
        P: Fn() -> F + Send + 'static,
        F: Future<Output = bool> + Send,
    {
        let online = Arc::clone(&self.online);
        let handle = tokio::spawn(async move {
            loop {
                let up = probe().await;
                if online.swap(up, Ordering::Relaxed) != up {
                    debug!(online = up, "connectivity changed");
                }
                tokio::time::sleep(interval).await;
            }
        });
        let mut slot = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Stop the watcher. The last observed snapshot stays in place.
    pub fn stop(&self) {
        let mut slot = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl Default for NetworkWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityOracle for NetworkWatcher {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}

impl Drop for NetworkWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
