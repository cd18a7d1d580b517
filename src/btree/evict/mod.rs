//! The eviction transaction: take a candidate page picked by the
//! eviction policy out of memory, reconciling it first if it is dirty,
//! and swing the parent reference so concurrent readers see either the
//! old in-memory page or the new on-disk address.

mod commit;
mod exclusive;
mod reap;
mod review;

use bitflags::bitflags;
use log::debug;

use crate::{
    btree::{
        evict::{
            commit::DirtyCommit,
            exclusive::{acquire_exclusive, LockedRefs},
            reap::{discard_page, reap_folded_children},
            review::review_subtree,
        },
        page::{Page, ReconOutcome},
        page_ref::RefState,
        tree::BTree,
    },
    database::Database,
    error::SmallError,
    session::Session,
    types::Pod,
    utils::HandyRwLock,
};

bitflags! {
    /// Flags accepted by `BTree::evict_page`.
    pub struct EvictFlags: u32 {
        /// The caller holds a tree wide latch; skip all hazard and
        /// latch work.
        const SINGLE_THREADED = 0b0001;

        /// Spin until exclusive access is obtained instead of
        /// returning busy.
        const WAIT = 0b0010;
    }
}

#[derive(Debug)]
pub enum EvictError {
    /// Expected and recoverable: a hazard holder, a child held by
    /// another actor, or a subtree that cannot legally leave memory.
    /// Every latch taken by the call has been released and the tree is
    /// unchanged; the eviction policy is free to pick again.
    Busy,

    /// A real failure from the reconciler or the tracked-object
    /// discard.
    Fatal(SmallError),
}

impl From<SmallError> for EvictError {
    fn from(e: SmallError) -> Self {
        EvictError::Fatal(e)
    }
}

/// eviction-related methods
impl BTree {
    /// Evict a page from memory.
    ///
    /// Returns `Ok` when the page was evicted, and also for the two
    /// intentional keep cases: a merge-split page (never evicted on
    /// its own) and a non-root page that reconciled empty (folded into
    /// the parent later). `Busy` means some other actor is in the way;
    /// nothing changed.
    pub fn evict_page(
        &self,
        session: &mut Session,
        page_rc: &Pod<Page>,
        flags: EvictFlags,
    ) -> Result<(), EvictError> {
        let mut flags = flags;
        let pid = page_rc.rl().pid();
        debug!("evict start, pid: {}, flags: {:?}", pid, flags);

        let parent_ref = match page_rc.rl().parent_ref() {
            Some(r) => r,
            None => {
                return Err(EvictError::Fatal(SmallError::new(&format!(
                    "page has no parent ref, pid: {}",
                    pid
                ))));
            }
        };

        // A merge-split page is never evicted on its own; it goes when
        // its parent goes. Put the ref back and make the page look
        // recently used so the policy stops picking it.
        let outcome = page_rc.rl().outcome();
        if let Some(ReconOutcome::SplitMerge) = outcome {
            debug!("merge-split page, eviction skipped, pid: {}", pid);
            page_rc.wl().refresh_read_gen();
            let _ = parent_ref.cas_state(RefState::Locked, RefState::InMemory);
            return Ok(());
        }

        // a forced eviction must not give up on contention
        {
            let mut page = page_rc.wl();
            if page.force_evict() {
                flags |= EvictFlags::WAIT;
                page.clear_force_evict();
            }
        }

        let single_threaded = flags.contains(EvictFlags::SINGLE_THREADED);
        let wait = flags.contains(EvictFlags::WAIT);

        let mut locked = LockedRefs::new();

        // latch the page's own ref first; nothing to unwind if this
        // fails
        if !single_threaded {
            acquire_exclusive(session, &parent_ref, wait)?;
            locked.push(parent_ref.clone());
        }

        // an internal page can only leave memory together with its
        // foldable in-memory subtree; leaves skip the review
        if page_rc.rl().is_internal() {
            if let Err(e) = review_subtree(session, page_rc, flags, &mut locked) {
                locked.release_all();
                return Err(e);
            }
        }

        if page_rc.rl().is_modified() {
            if let Err(e) = self.reconciler().reconcile(session, page_rc) {
                locked.release_all();
                return Err(EvictError::Fatal(e));
            }
        }

        let has_outcome = page_rc.rl().outcome().is_some();
        if !has_outcome {
            // the page was never reconciled to anything: a plain clean
            // eviction, the previous on-disk address stays valid
            parent_ref.publish_on_disk();
            Database::stats().incr_evict_unmodified();
        } else {
            let commit =
                match self.parent_dirty_update(session, page_rc, &parent_ref, &mut locked) {
                    Ok(commit) => commit,
                    Err(e) => {
                        locked.release_all();
                        return Err(EvictError::Fatal(e));
                    }
                };
            Database::stats().incr_evict_modified();

            if let DirtyCommit::Kept = commit {
                debug!("page reconciled empty, kept for folding, pid: {}", pid);
                return Ok(());
            }
        }

        // the commit is visible; reap the folded descendants, then the
        // page itself
        if page_rc.rl().is_internal() {
            reap_folded_children(self.reconciler(), page_rc).map_err(EvictError::Fatal)?;
        }
        discard_page(self.reconciler(), page_rc).map_err(EvictError::Fatal)?;

        debug!("evict done, pid: {}", pid);
        Ok(())
    }
}
