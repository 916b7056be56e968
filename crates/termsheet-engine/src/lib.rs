//! Field-state engine for the investment term sheet form.
//!
//! The engine keeps three derived views of the form consistent with the
//! values the user types: which calculated fields can be filled in, which
//! fields are relevant, and whether the form is complete and valid.
//!
//! # Architecture
//!
//! Every edit runs one cycle over a single snapshot of the field store:
//!
//! ```text
//! FieldStore::set -> CalculationEngine -> VisibilityEvaluator -> FormStateTracker
//!                                                               |
//!                                       Scheduler (debounced validation, auto-save)
//! ```
//!
//! [`FormController`] owns all components and is the only entry point for
//! hosts. Time only moves through the injected [`Clock`], so tests drive
//! debounce windows with a [`ManualClock`].

pub mod bus;
pub mod calc;
pub mod clock;
pub mod collab;
pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod redact;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod validate;
pub mod visibility;

pub use bus::{ChangeSource, EventBus, FormEvent, NoticeLevel};
pub use calc::{CalcOutcome, CalculationEngine, CalculationRule};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collab::{
    DocumentGenerator, FieldHandle, FieldView, GeneratedDocument, HeadlessView, TextDocument, Widget,
};
pub use config::{EngineConfig, load_config};
pub use controller::{DocumentOutcome, EditOutcome, FormController, PopulateReport};
pub use error::{EngineError, Result, StoreError};
pub use history::{ChangeHistory, ChangeRecord};
pub use redact::{REDACTED_VALUE, log_values_enabled, redact_value, set_log_values};
pub use scheduler::{Scheduler, Task};
pub use state::{FieldState, FormState, FormStateTracker, VisibleFieldsCache, completion_rate};
pub use store::{FieldEntry, FieldStore};
pub use validate::{FieldValidation, Issue, Severity, ValidationEngine, ValidationSummary};
pub use visibility::{LabelChange, Trigger, VisibilityChange, VisibilityEvaluator, VisibilityOutcome};
