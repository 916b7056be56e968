//! Form state tracking.
//!
//! Holds the derived state hosts render: dirtiness, per-field validity,
//! the aggregate validation errors and the completion rate. None of it is
//! authoritative; [`FormStateTracker::rebuild`] recreates it from the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use termsheet_model::{FieldKey, FieldValue};

use crate::store::{FieldEntry, FieldStore};
use crate::validate::{FieldValidation, ValidationSummary};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldState {
    pub value: FieldValue,
    /// Result of the last immediate validation of this field.
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    pub is_dirty: bool,
    /// True iff `validation_errors` is empty.
    pub is_valid: bool,
    pub last_modified: Option<DateTime<Utc>>,
    /// Percentage of visible fields holding a value.
    pub completion_rate: f64,
    pub field_states: BTreeMap<FieldKey, FieldState>,
    /// Errors from the last whole-form validation pass.
    pub validation_errors: BTreeMap<FieldKey, Vec<String>>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            is_dirty: false,
            is_valid: true,
            last_modified: None,
            completion_rate: 0.0,
            field_states: BTreeMap::new(),
            validation_errors: BTreeMap::new(),
        }
    }
}

/// Percentage of `visible` fields that hold a non-blank value.
///
/// Zero when nothing is visible.
pub fn completion_rate(store: &FieldStore, visible: &[FieldKey]) -> f64 {
    if visible.is_empty() {
        return 0.0;
    }
    let filled = visible
        .iter()
        .filter(|key| store.field(key.as_str()).is_some_and(FieldEntry::is_filled))
        .count();
    (filled as f64 * 100.0) / visible.len() as f64
}

#[derive(Debug, Clone, Default)]
pub struct FormStateTracker {
    state: FormState,
}

impl FormStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty
    }

    /// Record a user edit and its immediate validation result.
    pub fn record_edit(
        &mut self,
        key: &FieldKey,
        value: &FieldValue,
        validation: &FieldValidation,
        now: DateTime<Utc>,
    ) {
        self.state.is_dirty = true;
        self.state.last_modified = Some(now);
        let field = self.state.field_states.entry(key.clone()).or_default();
        field.value = value.clone();
        field.is_valid = validation.is_valid;
        field.errors.clone_from(&validation.errors);
        field.last_modified = Some(now);
    }

    /// Record a value written by the engine (calculation or populate).
    pub fn record_value(&mut self, key: &FieldKey, value: &FieldValue, validation: &FieldValidation) {
        let field = self.state.field_states.entry(key.clone()).or_default();
        field.value = value.clone();
        field.is_valid = validation.is_valid;
        field.errors.clone_from(&validation.errors);
    }

    /// Adopt the errors of a whole-form pass. Returns true when validity
    /// flipped.
    pub fn apply_validation(&mut self, summary: &ValidationSummary) -> bool {
        let was_valid = self.state.is_valid;
        self.state.validation_errors = summary.error_map();
        self.state.is_valid = self.state.validation_errors.is_empty();
        was_valid != self.state.is_valid
    }

    pub fn set_completion_rate(&mut self, rate: f64) {
        self.state.completion_rate = rate;
    }

    pub fn mark_clean(&mut self) {
        self.state.is_dirty = false;
    }

    /// Back to a freshly initialized form.
    pub fn clear(&mut self) {
        self.state = FormState::default();
    }

    /// Rebuild per-field state from the store. Dirtiness and timestamps are
    /// kept; validation errors wait for the next whole-form pass.
    pub fn rebuild<F>(&mut self, store: &FieldStore, visible: &[FieldKey], validate: F)
    where
        F: Fn(&FieldEntry) -> FieldValidation,
    {
        let previous = std::mem::take(&mut self.state.field_states);
        for entry in store.fields() {
            let validation = validate(entry);
            let last_modified = previous.get(entry.key()).and_then(|f| f.last_modified);
            self.state.field_states.insert(
                entry.key().clone(),
                FieldState {
                    value: entry.value.clone(),
                    is_valid: validation.is_valid,
                    errors: validation.errors,
                    last_modified,
                },
            );
        }
        self.state.completion_rate = completion_rate(store, visible);
    }
}

/// Visible-field list served from cache for a short time.
///
/// Any visibility change must call [`invalidate`](Self::invalidate).
#[derive(Debug, Clone)]
pub struct VisibleFieldsCache {
    ttl: Duration,
    cached: Option<(DateTime<Utc>, Vec<FieldKey>)>,
}

impl VisibleFieldsCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, cached: None }
    }

    pub fn get(&mut self, store: &FieldStore, now: DateTime<Utc>) -> Vec<FieldKey> {
        if let Some((computed_at, keys)) = &self.cached
            && now - *computed_at < self.ttl
        {
            return keys.clone();
        }
        let keys = store.visible_keys();
        self.cached = Some((now, keys.clone()));
        keys
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }
}
