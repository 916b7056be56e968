//! Dirty state tracking for auto-save.

use chrono::{DateTime, Duration, Utc};

use super::AutoSaveConfig;

/// Tracks unsaved edits to the form.
///
/// Timestamps come from the caller so hosts and tests can drive time
/// through the same clock the rest of the engine uses.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty: bool,

    last_change: Option<DateTime<Utc>>,

    /// Reset when a save completes.
    first_unsaved_change: Option<DateTime<Utc>>,

    saving: bool,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn last_change(&self) -> Option<DateTime<Utc>> {
        self.last_change
    }

    /// Record an edit made at `now`.
    pub fn mark_dirty(&mut self, now: DateTime<Utc>) {
        self.dirty = true;
        self.last_change = Some(now);
        if self.first_unsaved_change.is_none() {
            self.first_unsaved_change = Some(now);
        }
    }

    pub fn start_save(&mut self) {
        self.saving = true;
    }

    pub fn save_complete(&mut self) {
        self.dirty = false;
        self.saving = false;
        self.first_unsaved_change = None;
    }

    /// Keeps the tracker dirty so the next due time retries the save.
    pub fn save_failed(&mut self) {
        self.saving = false;
    }

    /// Forget all unsaved state, as after the form is cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn ms_since_last_change(&self, now: DateTime<Utc>) -> Option<u64> {
        self.last_change.map(|t| elapsed_ms(t, now))
    }

    pub fn ms_since_first_unsaved(&self, now: DateTime<Utc>) -> Option<u64> {
        self.first_unsaved_change.map(|t| elapsed_ms(t, now))
    }

    /// Check if auto-save should run at `now`.
    pub fn should_auto_save(&self, config: &AutoSaveConfig, now: DateTime<Utc>) -> bool {
        if !self.dirty || self.saving || !config.enabled {
            return false;
        }

        match (
            self.ms_since_last_change(now),
            self.ms_since_first_unsaved(now),
        ) {
            (Some(since_last), Some(since_first)) => config.should_save(since_last, since_first),
            _ => false,
        }
    }

    /// Earliest time at which [`should_auto_save`](Self::should_auto_save)
    /// becomes true, assuming no further edits.
    pub fn next_due(&self, config: &AutoSaveConfig) -> Option<DateTime<Utc>> {
        if !self.dirty || !config.enabled {
            return None;
        }
        let debounce = self.last_change? + millis(config.debounce_ms);
        let cap = self.first_unsaved_change? + millis(config.max_delay_ms);
        Some(debounce.min(cap))
    }
}

fn elapsed_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - since).num_milliseconds()).unwrap_or(0)
}

fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}
