//! Load-once cache for decoded fonts and images.
//!
//! Each key owns a cell that is empty while its first load runs, then holds
//! the loaded value or the failure message. Requests that arrive during a
//! load block on the same cell and receive its outcome, so a source is
//! read and decoded at most once however many elements or threads ask
//! for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use log::debug;

use crate::error::{FolioError, Result};

type Cell<T> = Arc<OnceLock<std::result::Result<Arc<T>, String>>>;

/// Where a key's load stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug)]
pub struct AssetCache<T> {
    entries: Mutex<HashMap<String, Cell<T>>>,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, key: &str) -> Cell<T> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.entry(key.to_string()).or_default().clone()
    }

    /// The cached value for `key`, running `load` if no request has started
    /// one yet. A failed load stays failed; it is not retried.
    pub fn get_or_load<F>(&self, key: &str, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let cell = self.cell(key);
        let outcome = cell.get_or_init(|| {
            debug!("loading asset {}", abbreviate(key));
            load().map(Arc::new).map_err(|e| e.to_string())
        });
        match outcome {
            Ok(value) => Ok(Arc::clone(value)),
            Err(reason) => Err(FolioError::MissingResource(format!(
                "{}: {}",
                abbreviate(key),
                reason
            ))),
        }
    }

    /// `None` for keys never requested.
    pub fn state(&self, key: &str) -> Option<AssetState> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).map(|cell| match cell.get() {
            None => AssetState::Pending,
            Some(Ok(_)) => AssetState::Ready,
            Some(Err(reason)) => AssetState::Failed(reason.clone()),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Data URIs and base64 sources make poor log lines.
fn abbreviate(key: &str) -> String {
    const MAX: usize = 64;
    if key.len() <= MAX {
        return key.to_string();
    }
    let mut end = MAX;
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &key[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_loads_once_per_key() {
        let cache = AssetCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value = cache
                .get_or_load("a", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1u8, 2, 3])
                })
                .unwrap();
            assert_eq!(*value, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state("a"), Some(AssetState::Ready));
        assert_eq!(cache.state("b"), None);
    }

    #[test]
    fn test_concurrent_requests_share_one_load() {
        let cache: AssetCache<u32> = AssetCache::new();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(8);
        let results: Vec<Arc<u32>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache
                            .get_or_load("font", || {
                                calls.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(20));
                                Ok(42)
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|v| **v == 42));
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_failure_is_remembered() {
        let cache: AssetCache<u32> = AssetCache::new();
        let first = cache.get_or_load("bad", || Err(FolioError::Image("corrupt".to_string())));
        assert!(matches!(first, Err(FolioError::MissingResource(ref m)) if m.contains("corrupt")));
        let second = cache.get_or_load("bad", || Ok(1));
        assert!(second.is_err());
        assert_eq!(
            cache.state("bad"),
            Some(AssetState::Failed("image error: corrupt".to_string()))
        );
    }

    #[test]
    fn test_long_keys_are_abbreviated() {
        let key = "x".repeat(100);
        assert_eq!(abbreviate(&key).len(), 67);
        assert_eq!(abbreviate("short"), "short");
    }
}
