use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use once_cell::sync::OnceCell;

use crate::{
    btree::page::PageID,
    hazard::{HazardTable, MAX_SESSIONS},
    stats::CacheStats,
};

static DB: OnceCell<Database> = OnceCell::new();

/// We collect all global variables here.
///
/// These variables cannot be initialized as static variables, because
/// their initialization functions rely on non-const fn. They are also
/// deliberately not wrapped in any kind of lock: everything inside is
/// atomic and is used from concurrent contexts where acquiring an
/// exclusive lock is not an option.
pub struct Database {
    hazard_table: HazardTable,
    stats: CacheStats,

    // cache wide read generation; pages stamp it when they enter
    // memory and when an eviction attempt puts them back
    read_gen: AtomicU64,

    // page ids start at 1, 0 is the empty hazard slot sentinel
    next_page_id: AtomicU64,

    next_session_id: AtomicUsize,
}

impl Database {
    fn new() -> Self {
        Self {
            hazard_table: HazardTable::new(),
            stats: CacheStats::new(),
            read_gen: AtomicU64::new(0),
            next_page_id: AtomicU64::new(1),
            next_session_id: AtomicUsize::new(0),
        }
    }

    pub fn global() -> &'static Database {
        DB.get_or_init(Database::new)
    }

    pub fn hazard_table() -> &'static HazardTable {
        &Self::global().hazard_table
    }

    pub fn stats() -> &'static CacheStats {
        &Self::global().stats
    }

    /// Bump and return the cache wide read generation.
    pub fn cache_read_gen() -> u64 {
        Self::global().read_gen.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn new_page_id() -> PageID {
        Self::global().next_page_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn new_session_id() -> usize {
        let id = Self::global().next_session_id.fetch_add(1, Ordering::Relaxed);
        if id >= MAX_SESSIONS {
            panic!("session capacity exhausted, max: {}", MAX_SESSIONS);
        }
        id
    }

    /// Reset the memory status of the database, used for tests mostly.
    ///
    /// Counters are zeroed and leftover hazard references dropped.
    /// Session and page id allocation stays monotonic so live sessions
    /// keep their slot groups.
    pub fn reset() {
        let db = Self::global();
        db.hazard_table.clear_all();
        db.stats.reset();
    }
}
