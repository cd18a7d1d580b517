mod common;

use small_evict::{
    link_child, utils::HandyRwLock, DiskAddr, EvictError, EvictFlags, Page, PageCategory,
    ReconOutcome, RefState, Session,
};

use crate::common::{new_merge_split_page, setup, ScriptedReconciler};

// A normal in-memory child can never be folded into its parent, so the
// review rejects the subtree and every ref keeps its state.
#[test]
fn test_reject_normal_in_memory_child() {
    setup();

    let recon = ScriptedReconciler::refusing();
    let tree = small_evict::BTree::new(recon.clone());

    let root = Page::new_pod(PageCategory::RowInternal);
    tree.set_root_page(root.clone());

    let target = Page::new_pod(PageCategory::RowInternal);
    let target_ref = link_child(&root, target.clone());

    let child = Page::new_pod(PageCategory::RowLeaf);
    let child_ref = link_child(&target, child.clone());

    let mut session = Session::new();
    let result = tree.evict_page(&mut session, &target, EvictFlags::empty());

    assert!(matches!(result, Err(EvictError::Busy)));
    assert_eq!(target_ref.state(), RefState::InMemory);
    assert_eq!(child_ref.state(), RefState::InMemory);
    assert_eq!(recon.reconcile_calls(), 0);
}

// A dirty child that reconciled empty earlier cannot be folded either:
// the parent does not know its on-disk shape yet.
#[test]
fn test_reject_dirty_empty_child() {
    setup();

    let recon = ScriptedReconciler::refusing();
    let tree = small_evict::BTree::new(recon.clone());

    let root = Page::new_pod(PageCategory::RowInternal);
    tree.set_root_page(root.clone());

    let target = Page::new_pod(PageCategory::RowInternal);
    let target_ref = link_child(&root, target.clone());

    let child = Page::new_pod(PageCategory::RowLeaf);
    let child_ref = link_child(&target, child.clone());
    {
        let mut c = child.wl();
        c.set_outcome(ReconOutcome::Empty);
        c.set_modified();
    }
    target.wl().set_modified();

    let mut session = Session::new();
    let result = tree.evict_page(&mut session, &target, EvictFlags::empty());

    assert!(matches!(result, Err(EvictError::Busy)));
    assert_eq!(target_ref.state(), RefState::InMemory);
    assert_eq!(child_ref.state(), RefState::InMemory);

    // the reconciler was never reached
    assert_eq!(recon.reconcile_calls(), 0);
}

// A child held by another actor rejects the review immediately, and
// the unwinder leaves the foreign latch alone.
#[test]
fn test_reject_child_locked_elsewhere() {
    setup();

    let recon = ScriptedReconciler::refusing();
    let tree = small_evict::BTree::new(recon.clone());

    let root = Page::new_pod(PageCategory::RowInternal);
    tree.set_root_page(root.clone());

    let target = Page::new_pod(PageCategory::RowInternal);
    let target_ref = link_child(&root, target.clone());

    let child = new_merge_split_page(1);
    let child_ref = link_child(&target, child.clone());
    child_ref.set_state(RefState::Locked);

    let mut session = Session::new();
    let result = tree.evict_page(&mut session, &target, EvictFlags::empty());

    assert!(matches!(result, Err(EvictError::Busy)));
    assert_eq!(target_ref.state(), RefState::InMemory);
    // the foreign latch was not touched
    assert_eq!(child_ref.state(), RefState::Locked);
}

// Same for a child the read path is still instantiating.
#[test]
fn test_reject_reading_child() {
    setup();

    let recon = ScriptedReconciler::refusing();
    let tree = small_evict::BTree::new(recon.clone());

    let root = Page::new_pod(PageCategory::RowInternal);
    tree.set_root_page(root.clone());

    let target = Page::new_pod(PageCategory::RowInternal);
    let target_ref = link_child(&root, target.clone());

    let child = Page::new_pod(PageCategory::RowLeaf);
    let child_ref = link_child(&target, child.clone());
    child_ref.set_state(RefState::Reading);

    let mut session = Session::new();
    let result = tree.evict_page(&mut session, &target, EvictFlags::empty());

    assert!(matches!(result, Err(EvictError::Busy)));
    assert_eq!(target_ref.state(), RefState::InMemory);
    assert_eq!(child_ref.state(), RefState::Reading);
}

// A clean child that reconciled empty is foldable: the subtree passes
// review and the child is discarded with the commit.
#[test]
fn test_accept_clean_empty_child() {
    setup();

    let new_addr = DiskAddr {
        addr: 300,
        size: 4096,
    };
    let recon = ScriptedReconciler::new(vec![ReconOutcome::Replace(new_addr)]);
    let tree = small_evict::BTree::new(recon.clone());

    let root = Page::new_pod(PageCategory::RowInternal);
    tree.set_root_page(root.clone());

    let target = Page::new_pod(PageCategory::RowInternal);
    let target_ref = link_child(&root, target.clone());

    let child = Page::new_pod(PageCategory::RowLeaf);
    link_child(&target, child.clone());
    child.wl().set_outcome(ReconOutcome::Empty);

    let target_pid = target.rl().pid();
    let child_pid = child.rl().pid();

    target.wl().set_modified();

    let mut session = Session::new();
    tree.evict_page(&mut session, &target, EvictFlags::empty())
        .unwrap();

    assert_eq!(target_ref.state(), RefState::OnDisk);
    assert_eq!(target_ref.addr(), Some(new_addr));
    assert_eq!(recon.discarded(), vec![child_pid, target_pid]);
}

// The review descends through nested merge split pages; the deepest
// descendants are discarded first.
#[test]
fn test_nested_merge_split_subtree() {
    setup();

    let new_addr = DiskAddr {
        addr: 400,
        size: 8192,
    };
    let recon = ScriptedReconciler::new(vec![ReconOutcome::Replace(new_addr)]);
    let tree = small_evict::BTree::new(recon.clone());

    let root = Page::new_pod(PageCategory::RowInternal);
    tree.set_root_page(root.clone());

    let target = Page::new_pod(PageCategory::RowInternal);
    let target_ref = link_child(&root, target.clone());

    // target -> mid (merge split) -> deep (merge split)
    let mid = Page::new_pod(PageCategory::RowInternal);
    link_child(&target, mid.clone());
    let deep = new_merge_split_page(1);
    link_child(&mid, deep.clone());
    mid.wl().set_outcome(ReconOutcome::SplitMerge);

    target.wl().set_modified();

    let mut session = Session::new();
    tree.evict_page(&mut session, &target, EvictFlags::empty())
        .unwrap();

    assert_eq!(target_ref.state(), RefState::OnDisk);

    let discarded = recon.discarded();
    assert_eq!(discarded.len(), 3);
    let deep_pos = discarded.iter().position(|p| *p == deep.rl().pid()).unwrap();
    let mid_pos = discarded.iter().position(|p| *p == mid.rl().pid()).unwrap();
    let target_pos = discarded
        .iter()
        .position(|p| *p == target.rl().pid())
        .unwrap();
    assert!(deep_pos < mid_pos);
    assert!(mid_pos < target_pos);
}

// With the tree wide latch held the review runs without latching, and
// the commit still lands.
#[test]
fn test_single_threaded_eviction() {
    setup();

    let new_addr = DiskAddr {
        addr: 500,
        size: 4096,
    };
    let recon = ScriptedReconciler::new(vec![ReconOutcome::Replace(new_addr)]);
    let tree = small_evict::BTree::new(recon.clone());

    let root = Page::new_pod(PageCategory::RowInternal);
    tree.set_root_page(root.clone());

    let target = Page::new_pod(PageCategory::RowInternal);
    let target_ref = link_child(&root, target.clone());
    link_child(&target, new_merge_split_page(1));

    target.wl().set_modified();

    let mut session = Session::new();
    tree.evict_page(&mut session, &target, EvictFlags::SINGLE_THREADED)
        .unwrap();

    assert_eq!(target_ref.state(), RefState::OnDisk);
    assert_eq!(target_ref.addr(), Some(new_addr));
}
