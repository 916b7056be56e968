//! The persistence contract seen by the form engine.

use std::cell::RefCell;
use std::rc::Rc;

use termsheet_model::FieldSnapshot;

use crate::error::Result;

/// Snapshot-in, snapshot-out storage for form drafts.
///
/// Implementations decide where a draft lives. The engine never inspects
/// the stored form beyond the snapshot it gets back.
pub trait FormPersistence {
    fn save(&mut self, snapshot: &FieldSnapshot) -> Result<()>;

    /// Most recently saved draft, or `None` when nothing has been saved.
    fn load(&mut self) -> Result<Option<FieldSnapshot>>;
}

/// In-memory draft storage.
///
/// Clones share the same slot, so a host can keep a handle for inspection
/// after giving the store to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    saved: Option<FieldSnapshot>,
    save_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a draft, as if saved in an earlier session.
    pub fn with_draft(snapshot: FieldSnapshot) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().saved = Some(snapshot);
        store
    }

    pub fn saved(&self) -> Option<FieldSnapshot> {
        self.inner.borrow().saved.clone()
    }

    /// Number of successful saves through any clone.
    pub fn save_count(&self) -> usize {
        self.inner.borrow().save_count
    }
}

impl FormPersistence for MemoryStore {
    fn save(&mut self, snapshot: &FieldSnapshot) -> Result<()> {
        let mut slot = self.inner.borrow_mut();
        slot.saved = Some(snapshot.clone());
        slot.save_count += 1;
        tracing::debug!(fields = snapshot.len(), "Saved draft to memory");
        Ok(())
    }

    fn load(&mut self) -> Result<Option<FieldSnapshot>> {
        Ok(self.inner.borrow().saved.clone())
    }
}
