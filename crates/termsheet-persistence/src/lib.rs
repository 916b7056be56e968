//! Draft persistence for the term sheet form.
//!
//! The form engine only ever hands a persistence collaborator a complete
//! [`FieldSnapshot`](termsheet_model::FieldSnapshot) and asks for one back.
//! This crate defines that contract and ships two implementations:
//!
//! - [`MemoryStore`] keeps the last saved snapshot in memory
//! - [`JsonDraftStore`] writes a checksummed JSON draft file
//!
//! # Draft File Format
//!
//! ```text
//! {
//!   "format": "termsheet-draft",
//!   "schema_version": 1,
//!   "saved_at": "2026-03-02T09:30:00Z",
//!   "checksum": "<sha-256 of the serialized values>",
//!   "values": { "투자대상": "주식회사 가나다", ... }
//! }
//! ```
//!
//! Writes go through a temp file and rename so a crash never leaves a
//! half-written draft behind.
//!
//! # Architecture
//!
//! - `store.rs` - The `FormPersistence` contract and the in-memory store
//! - `draft.rs` - Draft envelope and the JSON file store
//! - `io/` - Atomic save, validated load, checksums
//! - `autosave/` - Auto-save settings and dirty tracking

mod autosave;
mod draft;
mod error;
mod io;
mod store;

pub use autosave::{AutoSaveConfig, DirtyTracker};
pub use draft::{CURRENT_SCHEMA_VERSION, DRAFT_FORMAT, DraftFile, JsonDraftStore};
pub use error::{PersistenceError, Result};
pub use io::{load_draft, save_draft, snapshot_checksum};
pub use store::{FormPersistence, MemoryStore};
