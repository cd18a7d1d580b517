use crate::{btree::page::PageID, database::Database, types::SmallResult};

/// A single threaded execution context.
///
/// Each session owns a group of slots in the process wide hazard table
/// and a reusable scratch buffer for hazard snapshots, so the eviction
/// path allocates nothing per call.
pub struct Session {
    id: usize,

    // sorted copy of the hazard table, rebuilt by every exclusive
    // acquisition
    hazard_scratch: Vec<PageID>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Database::new_session_id(),
            hazard_scratch: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Publish a hazard reference for a page this session is reading.
    ///
    /// Reader protocol: publish first, then re-check the `PageRef`
    /// state; retract the hazard if the state is no longer `InMemory`.
    pub fn hazard_publish(&self, pid: PageID) -> SmallResult {
        Database::hazard_table().publish(self.id, pid)
    }

    /// Retract a hazard reference this session published earlier.
    pub fn hazard_clear(&self, pid: PageID) {
        Database::hazard_table().clear(self.id, pid);
    }

    /// Rebuild the session local snapshot of the hazard table.
    pub(crate) fn refresh_hazard_snapshot(&mut self) {
        Database::hazard_table().snapshot_into(&mut self.hazard_scratch);
    }

    /// Membership query against the snapshot built by the last call to
    /// `refresh_hazard_snapshot`.
    pub(crate) fn snapshot_contains(&self, pid: PageID) -> bool {
        self.hazard_scratch.binary_search(&pid).is_ok()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        Database::hazard_table().clear_session(self.id);
    }
}
