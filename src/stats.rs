use std::sync::atomic::{AtomicU64, Ordering};

/// Cache wide eviction counters.
///
/// The counters are cumulative for the lifetime of the process (or until
/// `Database::reset()`), and are only ever incremented by the eviction
/// path. Readers should treat them as monotonic between resets.
pub struct CacheStats {
    /// Clean pages evicted without reconciliation.
    cache_evict_unmodified: AtomicU64,

    /// Pages that went through the dirty commit path.
    cache_evict_modified: AtomicU64,

    /// Passes of the hazard retry loop (only taken in wait mode).
    rec_hazard: AtomicU64,
}

impl CacheStats {
    pub(crate) fn new() -> Self {
        Self {
            cache_evict_unmodified: AtomicU64::new(0),
            cache_evict_modified: AtomicU64::new(0),
            rec_hazard: AtomicU64::new(0),
        }
    }

    pub(crate) fn incr_evict_unmodified(&self) {
        self.cache_evict_unmodified.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_evict_modified(&self) {
        self.cache_evict_modified.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_rec_hazard(&self) {
        self.rec_hazard.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evict_unmodified(&self) -> u64 {
        self.cache_evict_unmodified.load(Ordering::Relaxed)
    }

    pub fn evict_modified(&self) -> u64 {
        self.cache_evict_modified.load(Ordering::Relaxed)
    }

    pub fn rec_hazard(&self) -> u64 {
        self.rec_hazard.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.cache_evict_unmodified.store(0, Ordering::Relaxed);
        self.cache_evict_modified.store(0, Ordering::Relaxed);
        self.rec_hazard.store(0, Ordering::Relaxed);
    }
}
