//! The form controller: one context object owning every engine component.
//!
//! Hosts create a controller per form instance, attach a view and a
//! persistence store, and feed it edits. Time-based work (debounced
//! validation, auto-save) runs when the host calls [`FormController::tick`];
//! completion-rate updates run on [`FormController::on_frame`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;
use termsheet_model::{CurrencyUnit, FieldKey, FieldSnapshot, FieldValue, FormSchema};
use termsheet_persistence::{DirtyTracker, FormPersistence};
use uuid::Uuid;

use crate::bus::{ChangeSource, EventBus, FormEvent, NoticeLevel};
use crate::calc::{CalcOutcome, CalculationEngine};
use crate::clock::Clock;
use crate::collab::{DocumentGenerator, FieldHandle, FieldView, GeneratedDocument};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result, StoreError};
use crate::history::ChangeHistory;
use crate::redact::{redact_value, set_log_values};
use crate::scheduler::{Scheduler, Task};
use crate::state::{FormState, FormStateTracker, VisibleFieldsCache, completion_rate};
use crate::store::FieldStore;
use crate::validate::{FieldValidation, ValidationEngine, ValidationSummary};
use crate::visibility::{Trigger, VisibilityEvaluator, VisibilityOutcome};

/// Everything one user edit caused.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub field: FieldKey,
    /// Immediate validation of the edited field.
    pub validation: FieldValidation,
    pub calculations: Vec<CalcOutcome>,
    pub visibility: VisibilityOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub applied: usize,
    /// Keys in the snapshot that the form does not declare.
    pub unknown: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Generated(GeneratedDocument),
    /// The form is not valid; `errors` lists what blocks generation.
    Refused { errors: Vec<String> },
    Failed { message: String },
}

struct ViewBinding {
    view: Box<dyn FieldView>,
    handles: HashMap<FieldKey, FieldHandle>,
    keys: HashMap<FieldHandle, FieldKey>,
}

impl ViewBinding {
    fn handle(&self, key: &str) -> Option<FieldHandle> {
        self.handles.get(key).copied()
    }

    fn set_value(&mut self, key: &str, value: &FieldValue) {
        if let Some(handle) = self.handle(key) {
            self.view.set_value(handle, value);
        }
    }

    fn set_visible(&mut self, key: &str, visible: bool) {
        if let Some(handle) = self.handle(key) {
            self.view.set_visible(handle, visible);
        }
    }

    fn set_label(&mut self, key: &str, label: &str) {
        if let Some(handle) = self.handle(key) {
            self.view.set_label(handle, label);
        }
    }
}

pub struct FormController {
    schema: FormSchema,
    config: EngineConfig,
    clock: Box<dyn Clock>,
    store: FieldStore,
    calc: CalculationEngine,
    visibility: VisibilityEvaluator,
    validator: ValidationEngine,
    tracker: FormStateTracker,
    history: ChangeHistory,
    scheduler: Scheduler,
    autosave: DirtyTracker,
    bus: EventBus,
    visible_cache: VisibleFieldsCache,
    view: Option<ViewBinding>,
    persistence: Option<Box<dyn FormPersistence>>,
    last_validation: Option<ValidationSummary>,
    validation_runs: u64,
    /// Form state changed since the last `FormStateChanged` was published.
    state_changed: bool,
}

impl FormController {
    pub fn new(schema: FormSchema, config: EngineConfig, clock: impl Clock + 'static) -> Result<Self> {
        for issue in schema.lint() {
            tracing::warn!("Form schema: {issue}");
        }
        if config.log_values {
            set_log_values(true);
        }

        let store = FieldStore::from_schema(&schema)?;
        let calc = CalculationEngine::new(&schema, CurrencyUnit::default());
        let visibility = VisibilityEvaluator::new(&schema);
        let history = ChangeHistory::new(config.history_capacity);
        let visible_cache = VisibleFieldsCache::new(config.visible_cache_ttl());

        let mut controller = Self {
            schema,
            config,
            clock: Box::new(clock),
            store,
            calc,
            visibility,
            validator: ValidationEngine::new(),
            tracker: FormStateTracker::new(),
            history,
            scheduler: Scheduler::new(),
            autosave: DirtyTracker::new(),
            bus: EventBus::new(),
            visible_cache,
            view: None,
            persistence: None,
            last_validation: None,
            validation_runs: 0,
            state_changed: false,
        };
        controller.visibility.evaluate(&mut controller.store, Trigger::Init);
        controller.rebuild_field_states();
        controller.scheduler.request_frame();

        tracing::info!(
            fields = controller.store.len(),
            session = %controller.history.session_id(),
            "Initialized form {}",
            controller.schema.title
        );
        Ok(controller)
    }

    /// Controller for the built-in term sheet.
    pub fn term_sheet(config: EngineConfig, clock: impl Clock + 'static) -> Result<Self> {
        Self::new(FormSchema::term_sheet()?, config, clock)
    }

    /// Create a widget for every field and bring it up to date.
    #[must_use]
    pub fn with_view(mut self, view: impl FieldView + 'static) -> Self {
        let mut binding = ViewBinding {
            view: Box::new(view),
            handles: HashMap::new(),
            keys: HashMap::new(),
        };
        for entry in self.store.fields() {
            let handle = binding.view.create_field(&entry.schema);
            binding.handles.insert(entry.key().clone(), handle);
            binding.keys.insert(handle, entry.key().clone());
        }
        self.view = Some(binding);
        self.sync_view();
        self
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: impl FormPersistence + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn state(&self) -> &FormState {
        self.tracker.state()
    }

    pub fn history(&self) -> &ChangeHistory {
        &self.history
    }

    pub fn session_id(&self) -> Uuid {
        self.history.session_id()
    }

    pub fn unit(&self) -> CurrencyUnit {
        self.calc.unit()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn last_validation(&self) -> Option<&ValidationSummary> {
        self.last_validation.as_ref()
    }

    /// Number of whole-form validation passes run so far.
    pub fn validation_runs(&self) -> u64 {
        self.validation_runs
    }

    pub fn pending(&self, task: Task) -> Option<DateTime<Utc>> {
        self.scheduler.due_at(task)
    }

    pub fn subscribe(&mut self) -> Receiver<FormEvent> {
        self.bus.subscribe()
    }

    /// Visible fields in layout order, served from the short-lived cache.
    pub fn visible_fields(&mut self) -> Vec<FieldKey> {
        let now = self.clock.now();
        self.visible_cache.get(&self.store, now)
    }

    pub fn get_all_field_values(&self) -> FieldSnapshot {
        self.store.get_all_values()
    }

    // ------------------------------------------------------------------
    // Edit cycle
    // ------------------------------------------------------------------

    /// Apply a user edit: store, calculate, evaluate visibility, track
    /// state, then defer whole-form validation and auto-save.
    pub fn on_change(&mut self, key: &str, value: impl Into<FieldValue>) -> Result<EditOutcome> {
        let value = value.into();
        let schema = match self.store.field(key) {
            Some(entry) if entry.schema.is_readonly() => {
                return Err(EngineError::ReadOnlyField(key.to_string()));
            }
            Some(entry) => entry.schema.clone(),
            None => return Err(StoreError::UnknownField(key.to_string()).into()),
        };
        let field = schema.key.clone();
        let _span = tracing::debug_span!("edit", field = %field).entered();
        let now = self.clock.now();

        self.store.set(key, value.clone())?;
        tracing::debug!(value = redact_value(&value.as_text()), "Field changed");
        self.bus.publish(FormEvent::FieldChanged {
            field: field.clone(),
            value: value.clone(),
            source: ChangeSource::User,
        });

        let calculations = self.run_calculations(Some(key));
        let visibility = self.run_visibility(Trigger::Edit {
            field: key,
            value: &value,
        });

        let validation = self.validator.validate_field(&schema, &value);
        self.tracker.record_edit(&field, &value, &validation, now);
        self.history
            .record(field.clone(), value, now, validation.is_valid);
        self.autosave.mark_dirty(now);
        self.schedule_after_change(now);

        Ok(EditOutcome {
            field,
            validation,
            calculations,
            visibility,
        })
    }

    /// Entry point for edits made in a view widget.
    pub fn on_view_change(
        &mut self,
        handle: FieldHandle,
        value: impl Into<FieldValue>,
    ) -> Result<EditOutcome> {
        let key = self
            .view
            .as_ref()
            .and_then(|binding| binding.keys.get(&handle))
            .cloned()
            .ok_or(EngineError::UnknownHandle(handle))?;
        self.on_change(key.as_str(), value)
    }

    /// Load a complete snapshot, such as a restored draft or an imported
    /// spreadsheet. Calculated fields are accepted as given and then
    /// recalculated; unknown keys are skipped and reported.
    pub fn populate_form(&mut self, snapshot: &FieldSnapshot) -> PopulateReport {
        let mut report = PopulateReport::default();
        for (key, value) in snapshot.iter() {
            if self.store.set(key.as_str(), value.clone()).is_err() {
                tracing::warn!(field = %key, "Ignored value for undeclared field");
                report.unknown.push(key.to_string());
                continue;
            }
            report.applied += 1;
            if let Some(binding) = self.view.as_mut() {
                binding.set_value(key.as_str(), value);
            }
            self.bus.publish(FormEvent::FieldChanged {
                field: key.clone(),
                value: value.clone(),
                source: ChangeSource::Populate,
            });
        }

        self.run_calculations(None);
        self.run_visibility(Trigger::Init);
        self.rebuild_field_states();

        let now = self.clock.now();
        self.scheduler
            .schedule(Task::Validation, now + self.config.validation_debounce());
        self.scheduler.request_frame();

        tracing::info!(
            applied = report.applied,
            unknown = report.unknown.len(),
            "Populated form"
        );
        report
    }

    /// Switch the currency unit and recalculate everything that depends
    /// on it.
    pub fn change_unit(&mut self, unit: CurrencyUnit) -> Vec<CalcOutcome> {
        if unit == self.calc.unit() {
            return Vec::new();
        }
        tracing::info!(from = %self.calc.unit(), to = %unit, "Changed currency unit");
        self.calc.set_unit(unit);
        self.bus.publish(FormEvent::UnitChanged { unit });

        let outcomes = self.run_calculations(None);
        let now = self.clock.now();
        self.scheduler
            .schedule(Task::Validation, now + self.config.validation_debounce());
        self.scheduler.request_frame();
        outcomes
    }

    // ------------------------------------------------------------------
    // Deferred work
    // ------------------------------------------------------------------

    /// Run every task that is due at the current time, earliest first.
    pub fn tick(&mut self) -> Vec<Task> {
        let now = self.clock.now();
        let mut ran = Vec::new();
        while let Some(task) = self.scheduler.pop_due(now) {
            match task {
                Task::Validation => {
                    self.run_validation();
                }
                Task::AutoSave => self.run_autosave(now),
            }
            ran.push(task);
        }
        self.flush_state();
        ran
    }

    /// Recompute the completion rate if a frame was requested since the
    /// last one. Returns the new rate.
    ///
    /// State changes made by a `tick` while a frame is pending are published
    /// here together with the rate, so one cycle yields one
    /// `FormStateChanged`.
    pub fn on_frame(&mut self) -> Option<f64> {
        if !self.scheduler.take_frame() {
            return None;
        }
        let visible = self.visible_fields();
        let rate = completion_rate(&self.store, &visible);
        self.tracker.set_completion_rate(rate);
        self.publish_state();
        Some(rate)
    }

    /// Run whole-form validation now, cancelling any pending pass.
    pub fn flush_validation(&mut self) -> ValidationSummary {
        self.scheduler.cancel(Task::Validation);
        let summary = self.run_validation();
        self.flush_state();
        summary
    }

    fn run_validation(&mut self) -> ValidationSummary {
        let visible = self.visible_fields();
        let summary = self.validator.validate_form(&self.store, &visible);
        self.validation_runs += 1;
        if self.tracker.apply_validation(&summary) {
            tracing::info!(is_valid = summary.is_valid(), "Form validity changed");
        }
        self.bus.publish(FormEvent::ValidationCompleted {
            is_valid: self.tracker.is_valid(),
            total_fields: summary.total_fields,
            invalid_fields: summary.invalid_fields,
        });
        self.state_changed = true;
        self.last_validation = Some(summary.clone());
        summary
    }

    fn run_autosave(&mut self, now: DateTime<Utc>) {
        let config = &self.config.autosave;
        let Some(persistence) = self.persistence.as_mut() else {
            return;
        };
        if !self.autosave.should_auto_save(config, now) {
            if let Some(due) = self.autosave.next_due(config)
                && due > now
            {
                self.scheduler.schedule(Task::AutoSave, due);
            }
            return;
        }
        if !self.store.has_any_value() {
            tracing::debug!("Skipped auto-save: form is empty");
            self.autosave.save_complete();
            self.tracker.mark_clean();
            self.state_changed = true;
            return;
        }

        self.autosave.start_save();
        let snapshot = self.store.get_all_values();
        match persistence.save(&snapshot) {
            Ok(()) => {
                self.autosave.save_complete();
                self.tracker.mark_clean();
                self.state_changed = true;
                tracing::info!(fields = snapshot.len(), "Auto-saved draft");
                self.bus.publish(FormEvent::DraftSaved {
                    saved_at: now,
                    fields: snapshot.len(),
                });
            }
            Err(e) => {
                // Stays dirty; the next edit schedules another attempt.
                self.autosave.save_failed();
                tracing::warn!("Auto-save failed: {e}");
                self.bus.notice(NoticeLevel::Warning, e.user_message());
            }
        }
    }

    /// Save the draft immediately, bypassing the debounce.
    pub fn save_now(&mut self) -> Result<()> {
        let Some(persistence) = self.persistence.as_mut() else {
            return Ok(());
        };
        let snapshot = self.store.get_all_values();
        self.autosave.start_save();
        if let Err(e) = persistence.save(&snapshot) {
            self.autosave.save_failed();
            return Err(e.into());
        }
        self.autosave.save_complete();
        self.tracker.mark_clean();
        self.scheduler.cancel(Task::AutoSave);
        let now = self.clock.now();
        self.bus.publish(FormEvent::DraftSaved {
            saved_at: now,
            fields: snapshot.len(),
        });
        self.publish_state();
        Ok(())
    }

    /// Load the saved draft, if any, into the form.
    pub fn restore_draft(&mut self) -> Result<Option<PopulateReport>> {
        let Some(persistence) = self.persistence.as_mut() else {
            return Ok(None);
        };
        match persistence.load()? {
            Some(snapshot) => Ok(Some(self.populate_form(&snapshot))),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Documents and resets
    // ------------------------------------------------------------------

    /// Validate the form and hand it to `generator` if it is valid.
    pub fn generate_document(&mut self, generator: &mut dyn DocumentGenerator) -> DocumentOutcome {
        let summary = self.flush_validation();
        if !self.tracker.is_valid() {
            tracing::info!(
                errors = summary.errors.len(),
                "Refused document generation"
            );
            self.bus.notice(
                NoticeLevel::Warning,
                format!(
                    "입력 내용을 확인해 주세요. 오류 {}건이 있어 문서를 만들 수 없습니다.",
                    summary.errors.len()
                ),
            );
            return DocumentOutcome::Refused {
                errors: summary.errors,
            };
        }

        match generator.generate(&self.store.get_all_values(), &summary) {
            Ok(document) => {
                tracing::info!(file = %document.file_name, "Generated document");
                DocumentOutcome::Generated(document)
            }
            Err(e) => {
                tracing::warn!("Document generation failed: {e}");
                let message = e.to_string();
                self.bus.notice(NoticeLevel::Error, message.clone());
                DocumentOutcome::Failed { message }
            }
        }
    }

    /// Recreate every piece of derived state from the stored values.
    pub fn rebuild_derived_state(&mut self) {
        self.visible_cache.invalidate();
        self.run_visibility(Trigger::Init);
        self.rebuild_field_states();
        self.flush_validation();
    }

    /// Reset values to their defaults and start over with a clean state.
    /// The change history is kept for the lifetime of the form.
    pub fn clear(&mut self) {
        self.store.reset_to_defaults();
        self.scheduler.cancel_all();
        self.autosave.reset();
        self.tracker.clear();
        self.visible_cache.invalidate();
        self.last_validation = None;
        self.visibility.evaluate(&mut self.store, Trigger::Init);
        self.rebuild_field_states();
        self.sync_view();
        self.scheduler.request_frame();
        self.state_changed = true;
        tracing::info!("Cleared form");
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn run_calculations(&mut self, changed: Option<&str>) -> Vec<CalcOutcome> {
        let outcomes = self.calc.run(&mut self.store, changed);
        for outcome in &outcomes {
            let CalcOutcome::Written { rule, .. } = outcome else {
                continue;
            };
            let Some(entry) = self.store.field(rule.target()) else {
                continue;
            };
            let key = entry.key().clone();
            let value = entry.value.clone();
            let validation = self.validator.validate_field(&entry.schema, &value);
            self.tracker.record_value(&key, &value, &validation);
            if let Some(binding) = self.view.as_mut() {
                binding.set_value(key.as_str(), &value);
            }
            self.bus.publish(FormEvent::FieldChanged {
                field: key,
                value,
                source: ChangeSource::Calculation,
            });
        }
        outcomes
    }

    fn run_visibility(&mut self, trigger: Trigger<'_>) -> VisibilityOutcome {
        let outcome = self.visibility.evaluate(&mut self.store, trigger);
        if !outcome.visibility.is_empty() {
            self.visible_cache.invalidate();
        }
        for change in &outcome.visibility {
            if let Some(binding) = self.view.as_mut() {
                binding.set_visible(change.field.as_str(), change.visible);
            }
            self.bus.publish(FormEvent::VisibilityChanged {
                field: change.field.clone(),
                visible: change.visible,
            });
        }
        for change in &outcome.labels {
            if let Some(binding) = self.view.as_mut() {
                binding.set_label(change.field.as_str(), &change.label);
            }
            self.bus.publish(FormEvent::LabelChanged {
                field: change.field.clone(),
                label: change.label.clone(),
            });
        }
        outcome
    }

    fn schedule_after_change(&mut self, now: DateTime<Utc>) {
        self.scheduler
            .schedule(Task::Validation, now + self.config.validation_debounce());
        if self.persistence.is_some()
            && let Some(due) = self.autosave.next_due(&self.config.autosave)
        {
            self.scheduler.schedule(Task::AutoSave, due);
        }
        self.scheduler.request_frame();
    }

    fn rebuild_field_states(&mut self) {
        let visible = self.store.visible_keys();
        let validator = self.validator;
        self.tracker.rebuild(&self.store, &visible, |entry| {
            validator.validate_field(&entry.schema, &entry.value)
        });
    }

    fn sync_view(&mut self) {
        let Some(binding) = self.view.as_mut() else {
            return;
        };
        for entry in self.store.fields() {
            let Some(handle) = binding.handle(entry.key().as_str()) else {
                continue;
            };
            binding.view.set_value(handle, &entry.value);
            binding.view.set_visible(handle, entry.visible);
            binding.view.set_label(handle, &entry.label);
        }
    }

    /// Publish pending state changes unless a frame will publish them.
    fn flush_state(&mut self) {
        if self.state_changed && !self.scheduler.frame_requested() {
            self.publish_state();
        }
    }

    fn publish_state(&mut self) {
        self.state_changed = false;
        let state = self.tracker.state();
        self.bus.publish(FormEvent::FormStateChanged {
            is_dirty: state.is_dirty,
            is_valid: state.is_valid,
            completion_rate: state.completion_rate,
        });
    }
}
