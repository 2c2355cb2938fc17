//! Process-wide cache of fetched archive files.
//!
//! Handles are `Arc`-shared `Bytes`, so LRU eviction only drops the cache's
//! reference: a live read keeps its handle valid. Concurrent requests for
//! the same key collapse onto a single fetch through an in-flight table; a
//! cancelled leader publishes nothing and the waiters retry, so partial
//! downloads never reach the cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use lru::LruCache;
use meteo_common::{ReadError, ReadResult};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Statistics about the file cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub memory_bytes: u64,
}

impl CacheStats {
    /// Cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Outcome published to in-flight waiters.
#[derive(Debug, Clone)]
enum FetchState {
    Pending,
    NotFound,
    Data(Arc<Bytes>),
    Failed { message: String, timeout: bool },
}

struct CacheInner {
    lru: LruCache<String, Arc<Bytes>>,
    current_bytes: usize,
}

/// Byte-accounted LRU cache with single-flight fetches.
pub struct FileCache {
    limit_bytes: usize,
    inner: Mutex<CacheInner>,
    in_flight: Mutex<HashMap<String, watch::Receiver<FetchState>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl FileCache {
    /// Create a cache bounded to `limit_bytes` of file payloads.
    pub fn new(limit_bytes: usize) -> Self {
        // The entry-count bound is a backstop; eviction is byte-driven.
        let max_entries = NonZeroUsize::new((limit_bytes / 4096).max(64)).unwrap();
        Self {
            limit_bytes,
            inner: Mutex::new(CacheInner {
                lru: LruCache::new(max_entries),
                current_bytes: 0,
            }),
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up `key`, fetching it at most once across all concurrent
    /// callers. `Ok(None)` means the file does not exist.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> ReadResult<Option<Arc<Bytes>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ReadResult<Option<Bytes>>>,
    {
        enum Lead {
            Leader(watch::Sender<FetchState>),
            Follower(watch::Receiver<FetchState>),
        }

        loop {
            if let Some(cached) = self.get(key) {
                return Ok(Some(cached));
            }

            // Join an in-flight fetch when one exists, otherwise become the
            // leader for this key. The lock is fully released before this
            // block's value is used, so the guard never lives across an
            // await point.
            let lead = {
                let mut in_flight = self.in_flight.lock().unwrap();
                if let Some(rx) = in_flight.get(key) {
                    Lead::Follower(rx.clone())
                } else {
                    let (tx, rx) = watch::channel(FetchState::Pending);
                    in_flight.insert(key.to_string(), rx);
                    Lead::Leader(tx)
                }
            };

            match lead {
                Lead::Leader(tx) => return self.lead_fetch(key, tx, fetch).await,
                Lead::Follower(mut rx) => loop {
                    if rx.changed().await.is_err() {
                        // Leader was cancelled without publishing; retry.
                        break;
                    }
                    let state = rx.borrow().clone();
                    match state {
                        FetchState::Pending => continue,
                        FetchState::NotFound => return Ok(None),
                        FetchState::Data(data) => return Ok(Some(data)),
                        FetchState::Failed { message, timeout } => {
                            return Err(if timeout {
                                ReadError::Timeout { path: message }
                            } else {
                                ReadError::Storage(message)
                            });
                        }
                    }
                },
            }
        }
    }

    async fn lead_fetch<F, Fut>(
        &self,
        key: &str,
        tx: watch::Sender<FetchState>,
        fetch: F,
    ) -> ReadResult<Option<Arc<Bytes>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ReadResult<Option<Bytes>>>,
    {
        // Dropping this future mid-fetch must clear the in-flight slot so
        // waiters can retry; publishing happens only on completion.
        let _guard = InFlightGuard { cache: self, key };
        self.misses.fetch_add(1, Ordering::Relaxed);

        match fetch().await {
            Ok(Some(bytes)) => {
                let data = Arc::new(bytes);
                self.insert(key, data.clone());
                let _ = tx.send(FetchState::Data(data.clone()));
                Ok(Some(data))
            }
            Ok(None) => {
                let _ = tx.send(FetchState::NotFound);
                Ok(None)
            }
            Err(e) => {
                let state = match &e {
                    ReadError::Timeout { path } => FetchState::Failed {
                        message: path.clone(),
                        timeout: true,
                    },
                    other => FetchState::Failed {
                        message: other.to_string(),
                        timeout: false,
                    },
                };
                let _ = tx.send(state);
                Err(e)
            }
        }
    }

    fn get(&self, key: &str) -> Option<Arc<Bytes>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.lru.get(key) {
            Some(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data.clone())
            }
            None => None,
        }
    }

    fn insert(&self, key: &str, data: Arc<Bytes>) {
        let size = data.len();
        if size > self.limit_bytes {
            debug!(key, size, "file exceeds cache budget, not caching");
            return;
        }
        let mut inner = self.inner.lock().unwrap();
        while (inner.current_bytes + size > self.limit_bytes
            || inner.lru.len() >= inner.lru.cap().get())
            && !inner.lru.is_empty()
        {
            if let Some((_, evicted)) = inner.lru.pop_lru() {
                inner.current_bytes = inner.current_bytes.saturating_sub(evicted.len());
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        match inner.lru.put(key.to_string(), data) {
            Some(previous) => {
                inner.current_bytes = inner.current_bytes.saturating_sub(previous.len()) + size;
            }
            None => inner.current_bytes += size,
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.lru.clear();
        inner.current_bytes = 0;
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: inner.lru.len(),
            memory_bytes: inner.current_bytes as u64,
        }
    }
}

struct InFlightGuard<'a> {
    cache: &'a FileCache,
    key: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.cache.in_flight.lock().unwrap().remove(self.key);
    }
}
