use crate::{
    btree::page::Page,
    session::Session,
    types::{Pod, SmallResult},
};

/// The writer side of the storage engine, consumed by the eviction
/// path. Byte layout and disk allocation live behind this trait.
pub trait Reconciler: Send + Sync {
    /// Turn an in-memory page into its on-disk form, folding any
    /// merge-split descendants into the written image.
    ///
    /// Contract: on success the page is left clean and carries exactly
    /// one reconciliation outcome - `Replace` with the new address,
    /// `Split` owning a freshly built internal page, or `Empty`. On
    /// failure the page is untouched.
    fn reconcile(&self, session: &mut Session, page: &Pod<Page>) -> SmallResult;

    /// Resolve deferred frees tracked against a modified page, called
    /// when the page is discarded. `is_final` is false only for
    /// intermediate discards during a multi-step reconciliation.
    fn tracked_objects_discard(&self, page: &Pod<Page>, is_final: bool) -> SmallResult {
        let _ = (page, is_final);
        Ok(())
    }
}
