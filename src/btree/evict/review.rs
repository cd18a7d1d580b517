use log::debug;

use crate::{
    btree::{
        evict::{
            exclusive::{acquire_exclusive, LockedRefs},
            EvictError, EvictFlags,
        },
        page::{Page, ReconOutcome},
        page_ref::RefState,
    },
    session::Session,
    types::Pod,
    utils::HandyRwLock,
};

/// One level of the descent. Keeping the walk on an explicit stack
/// bounds stack usage on arbitrarily deep trees and keeps the latch
/// record (`LockedRefs`) the single source of truth for unwinding.
struct Frame {
    page: Pod<Page>,
    next_child: usize,
}

/// Walk the in-memory children of an internal page, latch each one
/// exclusively and decide whether the whole subtree can be folded into
/// the page being evicted.
///
/// Children on disk are skipped. A child held by another actor
/// (`Reading`, or `Locked` by a latch we did not take) rejects the
/// review, as does any child that is not foldable: only empty pages,
/// split pages and merge-split pages can disappear into their parent,
/// and the first two only when clean, since the parent cannot know a
/// dirty child's eventual on-disk shape.
///
/// Latches go into `locked` in acquisition order, parent before child
/// in key order; on rejection the caller unwinds them in reverse.
pub(crate) fn review_subtree(
    session: &mut Session,
    page_rc: &Pod<Page>,
    flags: EvictFlags,
    locked: &mut LockedRefs,
) -> Result<(), EvictError> {
    let single_threaded = flags.contains(EvictFlags::SINGLE_THREADED);
    let wait = flags.contains(EvictFlags::WAIT);

    let mut stack = vec![Frame {
        page: page_rc.clone(),
        next_child: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let parent_rc = frame.page.clone();
        let index = frame.next_child;
        frame.next_child += 1;

        let child_ref = match parent_rc.rl().child_refs().get(index) {
            Some(r) => r.clone(),
            None => {
                // every child of this page reviewed
                stack.pop();
                continue;
            }
        };

        match child_ref.state() {
            RefState::OnDisk => continue,
            RefState::Reading | RefState::Locked => {
                debug!(
                    "subtree review rejected, child held elsewhere, state: {:?}",
                    child_ref.state()
                );
                return Err(EvictError::Busy);
            }
            RefState::InMemory => {}
        }

        let child_rc = match child_ref.page() {
            Some(pod) => pod,
            None => panic!("in-memory ref owns no page"),
        };

        // a normal in-memory child can never be folded
        if !foldable(&child_rc) {
            debug!(
                "subtree review rejected, child not foldable, pid: {}",
                child_rc.rl().pid()
            );
            return Err(EvictError::Busy);
        }

        if !single_threaded {
            acquire_exclusive(session, &child_ref, wait)?;
            locked.push(child_ref.clone());
        }

        // re-test under the latch: the child may have changed between
        // the first look and the exclusive acquisition
        {
            let child = child_rc.rl();
            match child.outcome() {
                // foldable whether clean or dirty
                Some(ReconOutcome::SplitMerge) => {}

                Some(ReconOutcome::Split(_)) | Some(ReconOutcome::Empty) => {
                    if child.is_modified() {
                        debug!(
                            "subtree review rejected, dirty split/empty child, pid: {}",
                            child.pid()
                        );
                        return Err(EvictError::Busy);
                    }
                }

                Some(ReconOutcome::Replace(_)) | None => {
                    debug!(
                        "subtree review rejected, child not foldable, pid: {}",
                        child.pid()
                    );
                    return Err(EvictError::Busy);
                }
            }
        }

        if child_rc.rl().is_internal() {
            stack.push(Frame {
                page: child_rc,
                next_child: 0,
            });
        }
    }

    Ok(())
}

fn foldable(child_rc: &Pod<Page>) -> bool {
    match child_rc.rl().outcome() {
        Some(ReconOutcome::Empty)
        | Some(ReconOutcome::Split(_))
        | Some(ReconOutcome::SplitMerge) => true,
        Some(ReconOutcome::Replace(_)) | None => false,
    }
}
