use std::sync::Arc;

use crossbeam::utils::Backoff;
use log::debug;

use crate::{
    btree::{
        evict::EvictError,
        page_ref::{PageRef, RefState},
    },
    database::Database,
    session::Session,
};

/// The refs latched by one eviction attempt, in acquisition order
/// (parent first, then the subtree in key order depth first). The last
/// element is the high-water ref: the deepest latch taken before a
/// review failed.
pub(crate) struct LockedRefs {
    refs: Vec<Arc<PageRef>>,
}

impl LockedRefs {
    pub(crate) fn new() -> Self {
        Self { refs: Vec::new() }
    }

    pub(crate) fn push(&mut self, r: Arc<PageRef>) {
        self.refs.push(r);
    }

    /// Release every latch this attempt took, child before parent (the
    /// exact reverse of acquisition). Touching a ref we did not latch
    /// is impossible by construction: only latched refs were recorded.
    pub(crate) fn release_all(&mut self) {
        for r in self.refs.drain(..).rev() {
            if let Err(observed) = r.cas_state(RefState::Locked, RefState::InMemory) {
                panic!(
                    "latched ref not in locked state on unwind, observed: {:?}",
                    observed
                );
            }
        }
    }
}

/// Transition a ref from `InMemory` to `Locked` and make sure no other
/// session still holds a hazard reference on the child.
///
/// The `Locked` store happens before the hazard scan; a reader that
/// missed it has already published its slot and the scan will see it
/// (see the ordering contract on `HazardTable`). With `wait` the call
/// spins (yielding) until the last hazard holder retreats; without it
/// the latch is rolled back and `Busy` returned.
pub(crate) fn acquire_exclusive(
    session: &mut Session,
    ref_rc: &Arc<PageRef>,
    wait: bool,
) -> Result<(), EvictError> {
    if let Err(observed) = ref_rc.cas_state(RefState::InMemory, RefState::Locked) {
        debug!("exclusive request on a ref not in memory, observed: {:?}", observed);
        return Err(EvictError::Busy);
    }

    let pid = match ref_rc.page_pid() {
        Some(pid) => pid,
        None => panic!("in-memory ref owns no page"),
    };

    let backoff = Backoff::new();
    loop {
        session.refresh_hazard_snapshot();
        if !session.snapshot_contains(pid) {
            return Ok(());
        }

        if !wait {
            debug!("hazard holder blocks eviction, pid: {}", pid);
            ref_rc.set_state(RefState::InMemory);
            return Err(EvictError::Busy);
        }

        Database::stats().incr_rec_hazard();
        backoff.snooze();
    }
}
