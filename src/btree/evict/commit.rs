use std::sync::Arc;

use log::debug;

use crate::{
    btree::{
        evict::{exclusive::LockedRefs, reap::discard_page},
        page::{DiskAddr, Page, ReconOutcome},
        page_ref::PageRef,
        tree::BTree,
    },
    error::SmallError,
    session::Session,
    types::Pod,
    utils::HandyRwLock,
};

/// What the dirty commit did with the page.
pub(crate) enum DirtyCommit {
    /// The parent ref was republished; the page leaves memory.
    Evicted,

    /// Reconciled empty below the root: nothing to write and nothing
    /// to point the parent at. The page stays in memory and is folded
    /// when its own parent is evicted.
    Kept,
}

/// commit-related methods
impl BTree {
    /// Swing the parent ref according to the reconciliation outcome.
    ///
    /// Every ref field is written before the state transition; the
    /// state store is the release point concurrent observers
    /// synchronize with, so they see either the old in-memory page or
    /// the complete on-disk address, never a torn intermediate.
    pub(crate) fn parent_dirty_update(
        &self,
        session: &mut Session,
        page_rc: &Pod<Page>,
        parent_ref: &Arc<PageRef>,
        locked: &mut LockedRefs,
    ) -> Result<DirtyCommit, SmallError> {
        let outcome = match page_rc.rl().outcome() {
            Some(outcome) => outcome,
            None => return Err(SmallError::new("dirty commit on a page without an outcome")),
        };
        let is_root = self.is_root_ref(parent_ref);

        match outcome {
            ReconOutcome::Replace(addr) => {
                parent_ref.publish_replace(addr);
                Ok(DirtyCommit::Evicted)
            }

            ReconOutcome::Split(split_rc) => {
                if is_root {
                    let addr = self.root_split(session, split_rc)?;
                    parent_ref.publish_replace(addr);
                } else {
                    // the split page takes over this ref; it carries
                    // the merge-split mark and disappears into the
                    // parent on the parent's own eviction
                    split_rc.wl().set_parent(parent_ref);
                    parent_ref.publish_in_memory(split_rc);
                }
                Ok(DirtyCommit::Evicted)
            }

            ReconOutcome::Empty => {
                if is_root {
                    // the tree is now empty
                    self.set_root_addr(None);
                    parent_ref.set_addr(None);
                    parent_ref.publish_on_disk();
                    Ok(DirtyCommit::Evicted)
                } else {
                    locked.release_all();
                    Ok(DirtyCommit::Kept)
                }
            }

            ReconOutcome::SplitMerge => {
                Err(SmallError::new("merge-split page reached the commit path"))
            }
        }
    }

    /// A root-level split page has no parent to defer to: reconcile it
    /// on the spot, repeating while reconciliation keeps splitting.
    ///
    /// Each round either finishes with a replacement or hands back a
    /// split page one level flatter than the previous one, so the loop
    /// is bounded by the tree height at entry.
    fn root_split(
        &self,
        session: &mut Session,
        page_rc: Pod<Page>,
    ) -> Result<DiskAddr, SmallError> {
        let mut page_rc = page_rc;
        loop {
            debug!("root split iteration, pid: {}", page_rc.rl().pid());

            {
                let mut page = page_rc.wl();
                page.set_modified();
                page.clear_outcome();
            }
            self.reconciler().reconcile(session, &page_rc)?;

            // take the outcome out of the lock before dispatching; the
            // discard below re-locks the page
            let outcome = page_rc.rl().outcome();
            match outcome {
                Some(ReconOutcome::Replace(addr)) => {
                    self.set_root_addr(Some(addr));
                    discard_page(self.reconciler(), &page_rc)?;
                    return Ok(addr);
                }

                Some(ReconOutcome::Split(next_rc)) => {
                    discard_page(self.reconciler(), &page_rc)?;
                    page_rc = next_rc;
                }

                other => {
                    let err_msg = format!(
                        "root reconciliation produced {:?}, expected replace or split",
                        other
                    );
                    return Err(SmallError::new(&err_msg));
                }
            }
        }
    }
}
