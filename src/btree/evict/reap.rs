use log::{debug, warn};

use crate::{
    btree::{page::Page, page_ref::RefState, recon::Reconciler},
    types::{Pod, SmallResult},
    utils::HandyRwLock,
};

/// After a successful commit, discard every in-memory child that was
/// folded into the written image, descendants before their parent.
///
/// The walk collects pages parent-first and discards the collected
/// list back to front, which puts every page after all of its
/// descendants.
pub(crate) fn reap_folded_children(recon: &dyn Reconciler, page_rc: &Pod<Page>) -> SmallResult {
    let mut collected: Vec<Pod<Page>> = Vec::new();

    let mut walk: Vec<Pod<Page>> = vec![page_rc.clone()];
    while let Some(parent_rc) = walk.pop() {
        let children: Vec<Pod<Page>> = parent_rc
            .rl()
            .child_refs()
            .iter()
            .filter(|r| r.state() != RefState::OnDisk)
            .filter_map(|r| r.page())
            .collect();

        for child_rc in children {
            if child_rc.rl().is_internal() {
                walk.push(child_rc.clone());
            }
            collected.push(child_rc);
        }
    }

    for child_rc in collected.iter().rev() {
        discard_page(recon, child_rc)?;
    }

    Ok(())
}

/// Discard one page: resolve its tracked objects if it was ever
/// modified, then hand its memory back.
pub(crate) fn discard_page(recon: &dyn Reconciler, page_rc: &Pod<Page>) -> SmallResult {
    let (pid, tracked) = {
        let page = page_rc.rl();
        (page.pid(), page.has_modify_record())
    };

    if tracked {
        if let Err(e) = recon.tracked_objects_discard(page_rc, true) {
            // the parent ref has already been committed; there is no
            // way to roll this back
            warn!(
                "tracked object discard failed on an evicted page, pid: {}, err: {}",
                pid, e
            );
            return Err(e);
        }
    }

    page_out(page_rc);
    Ok(())
}

/// Return the page's memory to the allocator. Dropping the owned child
/// refs releases the subtree; the page itself is freed when the last
/// handle goes away.
fn page_out(page_rc: &Pod<Page>) {
    let mut page = page_rc.wl();
    debug!("page out, pid: {}", page.pid());
    page.clear_children();
}
