//! Per-path mutual exclusion
//!
//! Serializes read-modify-write sequences on the same file within one
//! process. Entries are created on demand and dropped once nobody holds them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry of locks keyed by absolute file path
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `path`
    ///
    /// The registry entry is released even if `f` panics.
    pub fn with_lock<T>(&self, path: &Path, f: impl FnOnce() -> T) -> T {
        let entry = Registration {
            locks: self,
            path,
            lock: Some(self.entry(path)),
        };
        let _guard = entry
            .lock
            .as_ref()
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner));
        f()
    }

    /// Number of paths currently tracked
    pub fn tracked(&self) -> usize {
        self.registry().len()
    }

    fn entry(&self, path: &Path) -> Arc<Mutex<()>> {
        self.registry()
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }

    fn release(&self, path: &Path) {
        let mut registry = self.registry();
        if registry
            .get(path)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            registry.remove(path);
        }
    }

    // The map holds no invariants a panicking holder could break
    fn registry(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds one reference to a path lock and releases it on drop
struct Registration<'a> {
    locks: &'a PathLocks,
    path: &'a Path,
    lock: Option<Arc<Mutex<()>>>,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.lock.take();
        self.locks.release(self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_entries_are_released() {
        let locks = PathLocks::new();
        let value = locks.with_lock(Path::new("/data/a.txt"), || 7);
        assert_eq!(value, 7);
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn test_same_path_is_serialized() {
        let locks = Arc::new(PathLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    locks.with_lock(Path::new("/data/shared.txt"), || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn test_entry_released_after_panic() {
        let locks = PathLocks::new();
        let path = Path::new("/data/panics.txt");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            locks.with_lock(path, || panic!("boom"))
        }));
        assert!(result.is_err());
        assert_eq!(locks.tracked(), 0);

        // The path is still usable afterwards
        assert_eq!(locks.with_lock(path, || 1), 1);
    }
}
