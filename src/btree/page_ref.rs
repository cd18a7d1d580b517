use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, RwLock,
};

use crate::{
    btree::page::{DiskAddr, Page, PageID},
    types::Pod,
    utils::HandyRwLock,
};

/// The state of a reference cell, stored in an atomic word.
///
/// The state word is the single linearization point for observers: all
/// other ref fields are written before the state transition (release)
/// and read after it (acquire). The `InMemory -> Locked` transition
/// additionally pairs with hazard slot publication, see the ordering
/// contract on `HazardTable`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefState {
    /// The child lives on disk at `addr`.
    OnDisk = 0,

    /// The read path is instantiating the child.
    Reading = 1,

    /// The child is in memory and available to readers.
    InMemory = 2,

    /// One session holds the child exclusively for eviction.
    Locked = 3,
}

impl RefState {
    fn from_u32(value: u32) -> RefState {
        match value {
            0 => RefState::OnDisk,
            1 => RefState::Reading,
            2 => RefState::InMemory,
            3 => RefState::Locked,
            _ => panic!("invalid ref state: {}", value),
        }
    }
}

/// The edge from a parent page to a child: the only owner of the
/// in-memory child page, plus the child's on-disk address.
pub struct PageRef {
    state: AtomicU32,

    addr: RwLock<Option<DiskAddr>>,

    page: RwLock<Option<Pod<Page>>>,
}

impl PageRef {
    /// A ref whose child is on disk.
    pub fn new_on_disk(addr: DiskAddr) -> Arc<PageRef> {
        Arc::new(PageRef {
            state: AtomicU32::new(RefState::OnDisk as u32),
            addr: RwLock::new(Some(addr)),
            page: RwLock::new(None),
        })
    }

    /// A ref owning an in-memory child. The caller is responsible for
    /// wiring the child's parent back-link (see `link_child`).
    pub fn new_in_memory(page: Pod<Page>) -> Arc<PageRef> {
        Arc::new(PageRef {
            state: AtomicU32::new(RefState::InMemory as u32),
            addr: RwLock::new(None),
            page: RwLock::new(Some(page)),
        })
    }

    /// The root ref of an empty tree: nothing on disk, nothing in
    /// memory.
    pub(crate) fn new_empty() -> Arc<PageRef> {
        Arc::new(PageRef {
            state: AtomicU32::new(RefState::OnDisk as u32),
            addr: RwLock::new(None),
            page: RwLock::new(None),
        })
    }

    pub fn state(&self) -> RefState {
        RefState::from_u32(self.state.load(Ordering::SeqCst))
    }

    /// Raw state store. Outside the eviction path this belongs to the
    /// read path (the OnDisk -> Reading -> InMemory lifecycle).
    pub fn set_state(&self, state: RefState) {
        self.state.store(state as u32, Ordering::SeqCst);
    }

    /// Single winner state transition. Returns the observed state on
    /// failure.
    pub(crate) fn cas_state(&self, from: RefState, to: RefState) -> Result<(), RefState> {
        match self.state.compare_exchange(
            from as u32,
            to as u32,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => Ok(()),
            Err(observed) => Err(RefState::from_u32(observed)),
        }
    }

    pub fn addr(&self) -> Option<DiskAddr> {
        *self.addr.rl()
    }

    /// Read path API: record where the child lives on disk.
    pub fn set_addr(&self, addr: Option<DiskAddr>) {
        *self.addr.wl() = addr;
    }

    pub fn page(&self) -> Option<Pod<Page>> {
        self.page.rl().clone()
    }

    /// Read path API: install (or drop) the in-memory child.
    pub fn set_page(&self, page: Option<Pod<Page>>) {
        *self.page.wl() = page;
    }

    pub fn page_pid(&self) -> Option<PageID> {
        self.page.rl().as_ref().map(|pod| pod.rl().pid())
    }

    /// Commit a clean eviction: the child leaves memory, its previous
    /// on-disk address stays valid. The page is dropped before the
    /// state store so observers of `OnDisk` never see a stale child.
    pub(crate) fn publish_on_disk(&self) {
        self.set_page(None);
        self.set_state(RefState::OnDisk);
    }

    /// Commit a replace eviction: the child was rewritten at `addr`.
    pub(crate) fn publish_replace(&self, addr: DiskAddr) {
        self.set_addr(Some(addr));
        self.set_page(None);
        self.set_state(RefState::OnDisk);
    }

    /// Commit a split: the ref now owns the freshly built split page
    /// and stays in memory.
    pub(crate) fn publish_in_memory(&self, page: Pod<Page>) {
        self.set_page(Some(page));
        self.set_state(RefState::InMemory);
    }
}
