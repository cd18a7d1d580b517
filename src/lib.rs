pub mod btree;
pub mod database;
pub mod error;
pub mod hazard;
pub mod session;
pub mod stats;
pub mod types;
pub mod utils;

mod log;

pub use btree::evict::{EvictError, EvictFlags};
pub use btree::page::{DiskAddr, Page, PageCategory, PageID, ReconOutcome};
pub use btree::page_ref::{PageRef, RefState};
pub use btree::recon::Reconciler;
pub use btree::tree::{link_child, BTree};
pub use database::Database;
pub use error::SmallError;
pub use session::Session;
