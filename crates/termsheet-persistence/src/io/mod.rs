//! File I/O for draft persistence.
//!
//! This module handles:
//! - Saving drafts with atomic writes
//! - Loading drafts with format, version and checksum validation
//! - Checksums over serialized snapshots

mod hash;
mod load;
mod save;

pub use hash::snapshot_checksum;
pub use load::load_draft;
pub use save::save_draft;
