pub mod evict;
pub mod page;
pub mod page_ref;
pub mod recon;
pub mod tree;
