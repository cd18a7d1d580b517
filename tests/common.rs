#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use small_evict::{
    link_child,
    types::{Pod, SmallResult},
    utils::{self, HandyRwLock},
    BTree, Database, DiskAddr, Page, PageCategory, PageID, PageRef, ReconOutcome, Reconciler,
    Session, SmallError,
};

/// # Conduct the initialization
///
/// - Setting up log configurations.
/// - Reset the eviction counters and drop leftover hazard references.
pub fn setup() {
    utils::init_log();
    Database::reset();
}

/// A reconciler driven by a script of pre-built outcomes, installed
/// one per call. It also records every page the eviction path hands to
/// the tracked-object discard, in order, which makes discard ordering
/// observable to tests.
pub struct ScriptedReconciler {
    scripts: Mutex<VecDeque<ReconOutcome>>,
    reconcile_calls: AtomicUsize,
    discarded: Mutex<Vec<PageID>>,
}

impl ScriptedReconciler {
    pub fn new(scripts: Vec<ReconOutcome>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            reconcile_calls: AtomicUsize::new(0),
            discarded: Mutex::new(Vec::new()),
        })
    }

    /// A reconciler that must never be called.
    pub fn refusing() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn reconcile_calls(&self) -> usize {
        self.reconcile_calls.load(Ordering::SeqCst)
    }

    pub fn discarded(&self) -> Vec<PageID> {
        self.discarded.lock().unwrap().clone()
    }
}

impl Reconciler for ScriptedReconciler {
    fn reconcile(&self, _session: &mut Session, page: &Pod<Page>) -> SmallResult {
        self.reconcile_calls.fetch_add(1, Ordering::SeqCst);

        let outcome = match self.scripts.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => {
                return Err(SmallError::new(&format!(
                    "unexpected reconciliation, pid: {}",
                    page.rl().pid()
                )));
            }
        };

        page.wl().set_outcome(outcome);
        Ok(())
    }

    fn tracked_objects_discard(&self, page: &Pod<Page>, _is_final: bool) -> SmallResult {
        self.discarded.lock().unwrap().push(page.rl().pid());
        Ok(())
    }
}

/// An internal root with `leaves` in-memory leaf children. Returns the
/// tree, the root page, and the (page, owning ref) pair for every
/// leaf.
pub fn tree_with_leaves(
    recon: Arc<dyn Reconciler>,
    leaves: usize,
) -> (BTree, Pod<Page>, Vec<(Pod<Page>, Arc<PageRef>)>) {
    let tree = BTree::new(recon);

    let root = Page::new_pod(PageCategory::RowInternal);
    tree.set_root_page(root.clone());

    let mut children = Vec::new();
    for _ in 0..leaves {
        let leaf = Page::new_pod(PageCategory::RowLeaf);
        let leaf_ref = link_child(&root, leaf.clone());
        children.push((leaf, leaf_ref));
    }

    (tree, root, children)
}

/// An internal page referencing `children` pages already on disk, the
/// shape reconciliation gives a freshly built split page.
pub fn page_with_disk_children(children: usize) -> Pod<Page> {
    let page = Page::new_pod(PageCategory::RowInternal);
    for i in 0..children {
        let child_ref = PageRef::new_on_disk(DiskAddr {
            addr: 1000 + i as u64,
            size: 512,
        });
        page.wl().add_child(child_ref);
    }
    page
}

/// A freshly split merge page: internal, clean, marked to be folded
/// into its parent.
pub fn new_merge_split_page(children: usize) -> Pod<Page> {
    let page = page_with_disk_children(children);
    page.wl().set_outcome(ReconOutcome::SplitMerge);
    page
}
