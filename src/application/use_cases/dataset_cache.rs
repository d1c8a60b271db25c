use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::domain::error::{AppError, Result};
use crate::domain::load_result::LoadResult;

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

#[cfg(any(test, feature = "test-util"))]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = *now + ChronoDuration::seconds(secs);
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cache entry for one descriptor set
#[derive(Clone)]
struct CacheEntry {
    results: Vec<LoadResult>,
    expires_at: DateTime<Utc>,
}

type Slot = Arc<AsyncMutex<Option<CacheEntry>>>;

#[derive(Default)]
struct CacheState {
    slots: HashMap<String, Slot>,
    /// Populated fingerprints, oldest first
    populated: Vec<String>,
}

/// TTL cache of loaded batches, keyed by fingerprint.
///
/// Each fingerprint has its own async lock. The first caller populates while
/// holding it; concurrent callers for the same fingerprint wait and then read
/// what was stored. They never load the same fingerprint side by side.
pub struct DatasetCache {
    state: Mutex<CacheState>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl DatasetCache {
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            clock,
            max_entries: max_entries.max(1),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Stable, order-sensitive key over anything serializable (the resolved descriptor list).
    pub fn fingerprint<T: Serialize + ?Sized>(parts: &T) -> Result<String> {
        let bytes = serde_json::to_vec(parts)
            .map_err(|e| AppError::Internal(format!("Failed to fingerprint sources: {}", e)))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Return the cached batch for `fingerprint`, or run `load` and cache its
    /// output when every result in it succeeded.
    pub async fn get_or_load<F, Fut>(
        &self,
        fingerprint: &str,
        ttl_secs: u64,
        load: F,
    ) -> Vec<LoadResult>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<LoadResult>>,
    {
        let slot = self.slot(fingerprint);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.expires_at > self.clock.now() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = %fingerprint, "Dataset cache hit");
                return cached.results.clone();
            }
            debug!(fingerprint = %fingerprint, "Dataset cache entry expired");
            *entry = None;
            self.forget(fingerprint);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let results = load().await;

        if results.iter().all(LoadResult::is_loaded) {
            let expires_at = expiry_after(self.clock.now(), ttl_secs);
            *entry = Some(CacheEntry {
                results: results.clone(),
                expires_at,
            });
            drop(entry);
            self.mark_populated(fingerprint);
            info!(
                fingerprint = %fingerprint,
                datasets = results.len(),
                expires_at = %expires_at,
                "Dataset cache populated"
            );
        } else {
            drop(entry);
            self.release_idle_slot(fingerprint, &slot);
            debug!(fingerprint = %fingerprint, "Batch had failures, not cached");
        }

        results
    }

    /// Drop one entry. Waits for an in-flight populate of the same fingerprint.
    pub async fn invalidate(&self, fingerprint: &str) -> bool {
        let slot = {
            let state = self.lock_state();
            state.slots.get(fingerprint).cloned()
        };
        let Some(slot) = slot else {
            return false;
        };

        let existed = slot.lock().await.take().is_some();
        self.forget(fingerprint);
        self.release_idle_slot(fingerprint, &slot);
        existed
    }

    /// Drop every entry and reset statistics.
    pub async fn clear(&self) {
        let slots: Vec<Slot> = {
            let state = self.lock_state();
            state.slots.values().cloned().collect()
        };
        for slot in slots {
            slot.lock().await.take();
        }

        let mut state = self.lock_state();
        state.populated.clear();
        state.slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Remove expired entries and idle empty slots. Returns how many entries expired.
    pub async fn purge_expired(&self) -> usize {
        let slots: Vec<(String, Slot)> = {
            let state = self.lock_state();
            state
                .slots
                .iter()
                .map(|(key, slot)| (key.clone(), Arc::clone(slot)))
                .collect()
        };

        let now = self.clock.now();
        let mut purged = 0;
        for (fingerprint, slot) in &slots {
            let mut entry = slot.lock().await;
            if entry.as_ref().is_some_and(|e| e.expires_at <= now) {
                *entry = None;
                purged += 1;
                self.forget(fingerprint);
            }
        }
        drop(slots);

        let mut state = self.lock_state();
        state.slots.retain(|_, slot| {
            Arc::strong_count(slot) > 1
                || slot.try_lock().map(|entry| entry.is_some()).unwrap_or(true)
        });
        purged
    }

    pub fn len(&self) -> usize {
        self.lock_state().populated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> DatasetCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total_requests = hits + misses;
        let hit_rate = if total_requests > 0 {
            hits as f32 / total_requests as f32
        } else {
            0.0
        };

        let (entries, slots) = {
            let state = self.lock_state();
            (state.populated.len(), state.slots.len())
        };

        DatasetCacheStats {
            entries,
            slots,
            max_entries: self.max_entries,
            hits,
            misses,
            hit_rate,
        }
    }

    fn slot(&self, fingerprint: &str) -> Slot {
        let mut state = self.lock_state();
        state
            .slots
            .entry(fingerprint.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(None)))
            .clone()
    }

    fn mark_populated(&self, fingerprint: &str) {
        let mut state = self.lock_state();
        state.populated.retain(|key| key != fingerprint);
        state.populated.push(fingerprint.to_string());

        while state.populated.len() > self.max_entries {
            let oldest = state.populated.remove(0);
            state.slots.remove(&oldest);
            debug!(fingerprint = %oldest, "Evicted oldest dataset cache entry");
        }
    }

    /// Remove an empty slot once only the map and `slot` still reference it.
    /// Waiters hold their own clone, so the last one out removes it.
    fn release_idle_slot(&self, fingerprint: &str, slot: &Slot) {
        let mut state = self.lock_state();
        let idle = state.slots.get(fingerprint).is_some_and(|current| {
            Arc::ptr_eq(current, slot)
                && Arc::strong_count(current) <= 2
                && current.try_lock().map(|entry| entry.is_none()).unwrap_or(false)
        });
        if idle {
            state.slots.remove(fingerprint);
        }
    }

    fn forget(&self, fingerprint: &str) {
        self.lock_state().populated.retain(|key| key != fingerprint);
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn expiry_after(now: DateTime<Utc>, ttl_secs: u64) -> DateTime<Utc> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(ChronoDuration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetCacheStats {
    pub entries: usize,
    /// Fingerprints with a lock slot, populated or in flight
    pub slots: usize,
    pub max_entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f32,
}
