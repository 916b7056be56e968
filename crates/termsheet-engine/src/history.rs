//! Bounded log of edits, kept for diagnostics.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use termsheet_model::{FieldKey, FieldValue};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub field: FieldKey,
    pub value: FieldValue,
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
    /// Whether the edit passed immediate validation.
    pub success: bool,
}

/// Append-only ring buffer of the most recent edits.
#[derive(Debug, Clone)]
pub struct ChangeHistory {
    capacity: usize,
    session_id: Uuid,
    records: VecDeque<ChangeRecord>,
}

impl ChangeHistory {
    pub fn new(capacity: usize) -> Self {
        Self::with_session(capacity, Uuid::new_v4())
    }

    pub fn with_session(capacity: usize, session_id: Uuid) -> Self {
        Self {
            capacity,
            session_id,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(
        &mut self,
        field: FieldKey,
        value: FieldValue,
        timestamp: DateTime<Utc>,
        success: bool,
    ) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(ChangeRecord {
            field,
            value,
            timestamp,
            session_id: self.session_id,
            success,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first.
    pub fn all(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter()
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ChangeRecord> {
        self.records.iter().filter(move |r| r.field.as_str() == field)
    }

    pub fn by_success(&self, success: bool) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(move |r| r.success == success)
    }
}
