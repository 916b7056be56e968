//! Deferred work with one pending slot per concern.
//!
//! Scheduling a task that is already pending replaces its due time, so a
//! burst of edits inside the debounce window collapses into a single run.
//! The completion-rate recompute is not time based: it waits for the next
//! rendering frame and at most one request is outstanding.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Whole-form validation pass.
    Validation,
    AutoSave,
}

impl Task {
    pub const ALL: [Self; 2] = [Self::Validation, Self::AutoSave];

    fn slot(self) -> usize {
        match self {
            Self::Validation => 0,
            Self::AutoSave => 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    slots: [Option<DateTime<Utc>>; 2],
    frame_requested: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` at `due`, replacing any pending run.
    ///
    /// Returns true when a pending run was cancelled.
    pub fn schedule(&mut self, task: Task, due: DateTime<Utc>) -> bool {
        let replaced = self.slots[task.slot()].replace(due).is_some();
        if replaced {
            tracing::trace!(?task, %due, "Rescheduled pending task");
        }
        replaced
    }

    pub fn cancel(&mut self, task: Task) -> bool {
        self.slots[task.slot()].take().is_some()
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None; 2];
        self.frame_requested = false;
    }

    pub fn due_at(&self, task: Task) -> Option<DateTime<Utc>> {
        self.slots[task.slot()]
    }

    pub fn is_pending(&self, task: Task) -> bool {
        self.due_at(task).is_some()
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<Task> {
        let task = Task::ALL
            .into_iter()
            .filter_map(|task| self.due_at(task).map(|due| (due, task)))
            .filter(|(due, _)| *due <= now)
            .min_by_key(|(due, _)| *due)
            .map(|(_, task)| task)?;
        self.slots[task.slot()] = None;
        Some(task)
    }

    pub fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// Consume the pending frame request, if any.
    pub fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }
}
