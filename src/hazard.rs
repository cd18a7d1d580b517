use std::sync::atomic::{AtomicU64, Ordering};

use crate::{btree::page::PageID, error::SmallError, types::SmallResult};

/// Upper bound on concurrently open sessions.
pub const MAX_SESSIONS: usize = 32;

/// Hazard slots reserved for each session.
pub const HAZARD_SLOTS_PER_SESSION: usize = 8;

/// An empty slot. Page ids start at 1, so 0 is free to act as the
/// sentinel.
const EMPTY_SLOT: u64 = 0;

/// The process wide hazard slot array, one group of slots per session.
///
/// A non-empty slot names a page some reader currently relies on not
/// being freed. Slots are single-writer (only the owning session stores
/// into its group) and multi-reader (the eviction path scans all of
/// them).
///
/// Ordering contract, the heart of the eviction protocol:
///
/// - A reader stores the page id into its slot *before* re-checking the
///   state of the `PageRef` it descended through.
/// - The eviction path stores `Locked` into the `PageRef` state *before*
///   scanning the slots.
///
/// Both stores and both loads are `SeqCst`, which makes the pair behave
/// like Dekker style mutual exclusion on (state, slot): if the reader
/// missed our `Locked` store it has already published its slot and the
/// scan will find it; if the scan missed the slot, the reader is
/// guaranteed to observe `Locked` on its re-check and back off. Either
/// way no page is freed while a hazard names it.
pub struct HazardTable {
    slots: Vec<AtomicU64>,
}

impl HazardTable {
    pub(crate) fn new() -> Self {
        let mut slots = Vec::with_capacity(MAX_SESSIONS * HAZARD_SLOTS_PER_SESSION);
        for _ in 0..MAX_SESSIONS * HAZARD_SLOTS_PER_SESSION {
            slots.push(AtomicU64::new(EMPTY_SLOT));
        }
        Self { slots }
    }

    fn session_slots(&self, session_id: usize) -> &[AtomicU64] {
        let start = session_id * HAZARD_SLOTS_PER_SESSION;
        &self.slots[start..start + HAZARD_SLOTS_PER_SESSION]
    }

    /// Publish a hazard reference on behalf of a reader session.
    ///
    /// The caller must re-validate the state of the `PageRef` it came
    /// through *after* this returns, and retract the hazard if the state
    /// is no longer `InMemory`.
    pub fn publish(&self, session_id: usize, pid: PageID) -> SmallResult {
        for slot in self.session_slots(session_id) {
            if slot.load(Ordering::SeqCst) == EMPTY_SLOT {
                slot.store(pid, Ordering::SeqCst);
                return Ok(());
            }
        }

        let err_msg = format!("no free hazard slot, session: {}, pid: {}", session_id, pid);
        Err(SmallError::new(&err_msg))
    }

    /// Retract a previously published hazard reference.
    pub fn clear(&self, session_id: usize, pid: PageID) {
        for slot in self.session_slots(session_id) {
            if slot.load(Ordering::SeqCst) == pid {
                slot.store(EMPTY_SLOT, Ordering::SeqCst);
            }
        }
    }

    /// Drop every hazard the session still holds.
    pub(crate) fn clear_session(&self, session_id: usize) {
        for slot in self.session_slots(session_id) {
            slot.store(EMPTY_SLOT, Ordering::SeqCst);
        }
    }

    /// Build a compacted, sorted copy of all non-empty slots into the
    /// caller's scratch buffer.
    ///
    /// Stale reads are tolerated: a hazard that appears after the scan
    /// cannot name a page this session is about to free, because its
    /// owner observed our `Locked` state first (see the ordering
    /// contract above).
    pub(crate) fn snapshot_into(&self, scratch: &mut Vec<PageID>) {
        scratch.clear();
        for slot in &self.slots {
            let pid = slot.load(Ordering::SeqCst);
            if pid != EMPTY_SLOT {
                scratch.push(pid);
            }
        }
        scratch.sort_unstable();
    }

    pub(crate) fn clear_all(&self) {
        for slot in &self.slots {
            slot.store(EMPTY_SLOT, Ordering::SeqCst);
        }
    }
}
