use std::sync::{Arc, RwLock, Weak};

use crate::{
    btree::page_ref::PageRef,
    database::Database,
    types::Pod,
};

/// Stable page identity, allocated from a process wide counter.
///
/// Hazard slots and hazard snapshots compare page ids, never pointers,
/// so identity survives any amount of `Arc` cloning. Id 0 is never
/// issued; it is the empty hazard slot sentinel.
pub type PageID = u64;

/// An on-disk location. `Option<DiskAddr>` is used wherever the
/// invalid address sentinel is needed (an empty tree root, a ref that
/// was never written).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskAddr {
    pub addr: u64,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCategory {
    ColumnInternal,
    ColumnLeaf,
    RowInternal,
    RowLeaf,
}

impl PageCategory {
    pub fn is_internal(&self) -> bool {
        match self {
            PageCategory::ColumnInternal | PageCategory::RowInternal => true,
            PageCategory::ColumnLeaf | PageCategory::RowLeaf => false,
        }
    }
}

/// What the most recent reconciliation turned a page into.
///
/// At most one outcome is attached to a page at a time; a page that was
/// never reconciled has none.
#[derive(Clone)]
pub enum ReconOutcome {
    /// Reconciled to a single on-disk page.
    Replace(DiskAddr),

    /// Reconciled into multiple on-disk pages, referenced by a freshly
    /// built internal page (the "split page").
    Split(Pod<Page>),

    /// Reconciled to nothing, every entry was deleted.
    Empty,

    /// An internal page produced by a prior split. It is never written
    /// on its own; it only exists to be folded into its parent when the
    /// parent is evicted.
    SplitMerge,
}

impl std::fmt::Debug for ReconOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ReconOutcome::Replace(addr) => write!(f, "Replace({:?})", addr),
            ReconOutcome::Split(_) => write!(f, "Split"),
            ReconOutcome::Empty => write!(f, "Empty"),
            ReconOutcome::SplitMerge => write!(f, "SplitMerge"),
        }
    }
}

/// The modification record. Installed the first time a page is dirtied
/// and kept for the rest of the page's life; reconciliation stores its
/// outcome here.
#[derive(Debug, Default)]
pub struct PageModify {
    outcome: Option<ReconOutcome>,
}

/// An in-memory B-tree page.
///
/// A page is owned by exactly one `PageRef` (the edge from its parent);
/// the `parent` field is a weak back-link to that ref and never implies
/// ownership.
pub struct Page {
    pid: PageID,
    category: PageCategory,

    parent: Option<Weak<PageRef>>,

    /// Child reference cells, in key order. Only internal pages have
    /// children.
    children: Vec<Arc<PageRef>>,

    /// The dirty bit. Separate from the modification record: a page
    /// that was reconciled is clean again until the next update, but
    /// keeps its record.
    modified: bool,

    modify: Option<PageModify>,

    read_gen: u64,

    force_evict: bool,
}

impl Page {
    pub fn new(category: PageCategory) -> Self {
        Self {
            pid: Database::new_page_id(),
            category,
            parent: None,
            children: Vec::new(),
            modified: false,
            modify: None,
            read_gen: Database::cache_read_gen(),
            force_evict: false,
        }
    }

    pub fn new_pod(category: PageCategory) -> Pod<Page> {
        Arc::new(RwLock::new(Self::new(category)))
    }

    pub fn pid(&self) -> PageID {
        self.pid
    }

    pub fn category(&self) -> PageCategory {
        self.category
    }

    pub fn is_internal(&self) -> bool {
        self.category.is_internal()
    }

    pub fn set_parent(&mut self, parent_ref: &Arc<PageRef>) {
        self.parent = Some(Arc::downgrade(parent_ref));
    }

    /// The reference cell in the parent that owns this page.
    pub fn parent_ref(&self) -> Option<Arc<PageRef>> {
        self.parent.as_ref().and_then(|weak| weak.upgrade())
    }

    pub fn add_child(&mut self, child_ref: Arc<PageRef>) {
        if !self.is_internal() {
            panic!("add_child on a leaf page, pid: {}", self.pid);
        }
        self.children.push(child_ref);
    }

    pub fn child_refs(&self) -> &[Arc<PageRef>] {
        &self.children
    }

    pub(crate) fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Toggle the dirty bit and install the modification record if the
    /// page never had one.
    pub fn set_modified(&mut self) {
        self.modified = true;
        if self.modify.is_none() {
            self.modify = Some(PageModify::default());
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn has_modify_record(&self) -> bool {
        self.modify.is_some()
    }

    /// Install a reconciliation outcome. A successful reconciliation
    /// leaves the page clean; it stays clean until the next update.
    pub fn set_outcome(&mut self, outcome: ReconOutcome) {
        self.modified = false;
        match self.modify {
            Some(ref mut modify) => modify.outcome = Some(outcome),
            None => {
                self.modify = Some(PageModify {
                    outcome: Some(outcome),
                });
            }
        }
    }

    pub fn clear_outcome(&mut self) {
        if let Some(ref mut modify) = self.modify {
            modify.outcome = None;
        }
    }

    pub fn outcome(&self) -> Option<ReconOutcome> {
        self.modify.as_ref().and_then(|m| m.outcome.clone())
    }

    pub fn read_gen(&self) -> u64 {
        self.read_gen
    }

    pub(crate) fn refresh_read_gen(&mut self) {
        self.read_gen = Database::cache_read_gen();
    }

    /// Mark the page for forced eviction; the next eviction attempt
    /// will wait for exclusive access instead of giving up.
    pub fn set_force_evict(&mut self) {
        self.force_evict = true;
    }

    pub(crate) fn force_evict(&self) -> bool {
        self.force_evict
    }

    pub(crate) fn clear_force_evict(&mut self) {
        self.force_evict = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_bit_vs_modify_record() {
        let mut page = Page::new(PageCategory::RowLeaf);
        assert!(!page.is_modified());
        assert!(page.outcome().is_none());

        page.set_modified();
        assert!(page.is_modified());
        assert!(page.has_modify_record());

        // reconciliation leaves the page clean but keeps the record
        page.set_outcome(ReconOutcome::Empty);
        assert!(!page.is_modified());
        assert!(page.has_modify_record());
        assert!(matches!(page.outcome(), Some(ReconOutcome::Empty)));

        page.set_modified();
        assert!(page.is_modified());
        assert!(matches!(page.outcome(), Some(ReconOutcome::Empty)));
    }

    #[test]
    fn test_page_ids_are_unique() {
        let a = Page::new(PageCategory::RowLeaf);
        let b = Page::new(PageCategory::RowLeaf);
        assert_ne!(a.pid(), b.pid());
        assert_ne!(a.pid(), 0);
    }
}
