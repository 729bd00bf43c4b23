//! In-memory TTL cache.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::error::Result;
use crate::sweeper::Sweeper;

type Store<K, V> = RwLock<HashMap<K, Entry<V>>>;

/// Thread-safe key-value cache with per-entry expiration.
///
/// Every entry lives for the cache-wide TTL. Expired entries are
/// invisible to reads immediately, and are physically removed by
/// [`delete`](Self::delete), [`clear`](Self::clear),
/// [`purge_expired`](Self::purge_expired) or the background sweep.
///
/// # Thread Safety
///
/// Reads share a single `RwLock`; writes and sweeps take it exclusively.
/// Wrap the cache in an `Arc` to share it between threads.
///
/// # Lifecycle
///
/// When both the TTL and the sweep interval are non-zero, construction
/// spawns a sweep thread. Dropping the cache stops and joins it.
///
/// The sweeping constructors need `Send + Sync + 'static` keys and values
/// because the store is shared with that thread. [`lazy`](Self::lazy)
/// has no such bounds and never sweeps.
pub struct TtlCache<K, V> {
    store: Arc<Store<K, V>>,
    ttl: Duration,
    sweep_interval: Duration,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a cache whose entries live for `ttl`.
    ///
    /// A non-zero `sweep_interval` (with a non-zero `ttl`) starts a
    /// background sweep on that cadence. If the sweep thread cannot be
    /// spawned the cache falls back to lazy expiration.
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        let mut cache = Self::unswept(ttl, sweep_interval);
        if cache.sweep_enabled() {
            if let Err(err) = cache.start_sweeper() {
                warn!(error = %err, "Could not spawn sweep thread, using lazy expiration only");
            }
        }
        cache
    }

    /// Creates a cache from a [`CacheConfig`].
    pub fn with_config(config: CacheConfig) -> Self {
        Self::new(config.ttl(), config.sweep_interval())
    }

    /// Like [`with_config`](Self::with_config), but fails if the sweep
    /// thread cannot be spawned.
    pub fn try_with_config(config: CacheConfig) -> Result<Self> {
        let mut cache = Self::unswept(config.ttl(), config.sweep_interval());
        if cache.sweep_enabled() {
            cache.start_sweeper()?;
        }
        Ok(cache)
    }

    fn start_sweeper(&mut self) -> io::Result<()> {
        let store = Arc::downgrade(&self.store);
        let sweeper = Sweeper::spawn(self.sweep_interval, move || {
            let store = store.upgrade()?;
            Some(sweep(&store))
        })?;
        *self.sweeper.get_mut() = Some(sweeper);
        Ok(())
    }
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    /// Creates a cache with lazy expiration only.
    ///
    /// No sweep thread is started, so any key and value types work.
    /// Expired entries are removed by [`purge_expired`](Self::purge_expired),
    /// [`delete`](Self::delete) or [`clear`](Self::clear).
    pub fn lazy(ttl: Duration) -> Self {
        Self::unswept(ttl, Duration::ZERO)
    }

    fn unswept(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            sweep_interval,
            sweeper: Mutex::new(None),
        }
    }

    fn sweep_enabled(&self) -> bool {
        !self.ttl.is_zero() && !self.sweep_interval.is_zero()
    }

    /// Inserts or overwrites `key`, resetting its expiration.
    pub fn set(&self, key: K, value: V) {
        let entry = Entry::new(value, Instant::now(), self.ttl);
        self.store.write().insert(key, entry);
    }

    /// Gets a live value by key.
    ///
    /// Returns `None` if the key is absent or expired. Expired entries are
    /// left in place for the sweep.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let now = Instant::now();
        let store = self.store.read();
        store
            .get(key)
            .filter(|e| !e.is_expired_at(now))
            .map(|e| e.value.clone())
    }

    /// Returns true if `key` holds a live entry.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.store
            .read()
            .get(key)
            .is_some_and(|e| !e.is_expired_at(now))
    }

    /// Removes `key` if present.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.write().remove(key);
    }

    /// Removes every entry, expired or not.
    pub fn clear(&self) {
        // The old map is dropped after the write guard is released.
        let dropped = std::mem::take(&mut *self.store.write());
        trace!(dropped = dropped.len(), "Cleared cache");
    }

    /// Removes all expired entries now and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        sweep(&self.store)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let store = self.store.read();
        let expired = store.values().filter(|e| e.is_expired_at(now)).count();
        CacheStats {
            total_entries: store.len(),
            expired_entries: expired,
            live_entries: store.len().saturating_sub(expired),
        }
    }

    /// TTL applied to every entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Whether a background sweep thread is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().as_ref().is_some_and(Sweeper::is_running)
    }

    /// Stops and joins the background sweep thread, if any.
    ///
    /// The cache stays usable with lazy expiration only.
    pub fn stop_sweeper(&self) {
        let sweeper = self.sweeper.lock().take();
        drop(sweeper);
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}

impl<K: Eq + Hash, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("sweep_interval", &self.sweep_interval)
            .field("len", &self.len())
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}

/// Removes expired entries under the write lock.
fn sweep<K: Eq + Hash, V>(store: &Store<K, V>) -> usize {
    let now = Instant::now();
    let mut entries = store.write();
    let before = entries.len();
    entries.retain(|_, e| !e.is_expired_at(now));
    let removed = before - entries.len();
    if removed > 0 {
        debug!(removed, remaining = entries.len(), "Swept expired entries");
    }
    removed
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries physically stored
    pub total_entries: usize,
    /// Stored entries past their deadline
    pub expired_entries: usize,
    /// Stored entries still visible to reads
    pub live_entries: usize,
}
