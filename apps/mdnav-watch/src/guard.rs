use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const DEFAULT_HOLD: Duration = Duration::from_millis(500);

/// Paths the service is currently writing, so the change events caused by
/// its own writes are not processed again.
///
/// Each entry carries a release deadline. Clones share the same map.
#[derive(Clone, Debug)]
pub struct WriteGuard {
    held: Arc<Mutex<HashMap<PathBuf, Instant>>>,
    hold_for: Duration,
}

impl Default for WriteGuard {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD)
    }
}

impl WriteGuard {
    pub fn new(hold_for: Duration) -> Self {
        Self {
            held: Arc::new(Mutex::new(HashMap::new())),
            hold_for,
        }
    }

    pub fn hold(&self, path: &Path) {
        let deadline = Instant::now() + self.hold_for;
        self.lock().insert(path.to_path_buf(), deadline);
    }

    pub fn release(&self, path: &Path) {
        self.lock().remove(path);
    }

    pub fn is_held(&self, path: &Path) -> bool {
        let now = Instant::now();
        let mut held = self.lock();
        held.retain(|_, deadline| *deadline > now);
        held.contains_key(path)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Instant>> {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
