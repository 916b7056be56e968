//! Typed publish/subscribe for form events.
//!
//! Each subscriber gets its own unbounded crossbeam channel. Publishing
//! never blocks; subscribers that dropped their receiver are pruned on the
//! next publish.

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, unbounded};
use termsheet_model::{CurrencyUnit, FieldKey, FieldValue};

/// Where a field value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    User,
    Calculation,
    /// Loaded through `populate_form`.
    Populate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    FieldChanged {
        field: FieldKey,
        value: FieldValue,
        source: ChangeSource,
    },
    VisibilityChanged {
        field: FieldKey,
        visible: bool,
    },
    LabelChanged {
        field: FieldKey,
        label: String,
    },
    UnitChanged {
        unit: CurrencyUnit,
    },
    FormStateChanged {
        is_dirty: bool,
        is_valid: bool,
        completion_rate: f64,
    },
    ValidationCompleted {
        is_valid: bool,
        total_fields: usize,
        invalid_fields: usize,
    },
    DraftSaved {
        saved_at: DateTime<Utc>,
        fields: usize,
    },
    /// User-facing message, such as a refused document or a failed save.
    Notice {
        level: NoticeLevel,
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<FormEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<FormEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: FormEvent) {
        match self.subscribers.as_slice() {
            [] => {}
            [only] => {
                if only.send(event).is_err() {
                    self.subscribers.clear();
                }
            }
            _ => self
                .subscribers
                .retain(|subscriber| subscriber.send(event.clone()).is_ok()),
        }
    }

    pub fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.publish(FormEvent::Notice {
            level,
            message: message.into(),
        });
    }
}
