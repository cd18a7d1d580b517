use std::sync::{Arc, RwLock};

use crate::{
    btree::{
        page::{DiskAddr, Page},
        page_ref::{PageRef, RefState},
        recon::Reconciler,
    },
    types::Pod,
    utils::HandyRwLock,
};

/// An open B-tree: the distinguished root reference plus the persisted
/// root address. Everything below the root hangs off `PageRef` cells.
pub struct BTree {
    /// The root page's reference cell. The root has no real parent;
    /// this cell plays that role so the eviction path can treat the
    /// root like any other page.
    root_ref: Arc<PageRef>,

    /// Where the root lives on disk. `None` is the invalid sentinel
    /// (an empty tree).
    root_addr: RwLock<Option<DiskAddr>>,

    reconciler: Arc<dyn Reconciler>,
}

impl BTree {
    pub fn new(reconciler: Arc<dyn Reconciler>) -> Self {
        Self {
            root_ref: PageRef::new_empty(),
            root_addr: RwLock::new(None),
            reconciler,
        }
    }

    pub fn root_ref(&self) -> &Arc<PageRef> {
        &self.root_ref
    }

    pub fn is_root_ref(&self, r: &Arc<PageRef>) -> bool {
        Arc::ptr_eq(&self.root_ref, r)
    }

    pub fn root_addr(&self) -> Option<DiskAddr> {
        *self.root_addr.rl()
    }

    pub(crate) fn set_root_addr(&self, addr: Option<DiskAddr>) {
        *self.root_addr.wl() = addr;
    }

    pub(crate) fn reconciler(&self) -> &dyn Reconciler {
        self.reconciler.as_ref()
    }

    /// Install an in-memory page as the tree root.
    pub fn set_root_page(&self, page: Pod<Page>) {
        page.wl().set_parent(&self.root_ref);
        self.root_ref.set_page(Some(page));
        self.root_ref.set_state(RefState::InMemory);
    }
}

/// Hang an in-memory child page off a parent: builds the owning
/// reference cell, wires the child's parent back-link, and appends the
/// cell to the parent's child list.
pub fn link_child(parent: &Pod<Page>, child: Pod<Page>) -> Arc<PageRef> {
    let child_ref = PageRef::new_in_memory(child.clone());
    child.wl().set_parent(&child_ref);
    parent.wl().add_child(child_ref.clone());
    child_ref
}
