//! Edit scripts: a scripted user session replayed against a virtual clock.
//!
//! ```toml
//! [config]
//! validation_debounce_ms = 500
//!
//! [[step]]
//! action = "edit"
//! field = "투자금액"
//! value = "10"
//!
//! [[step]]
//! action = "wait"
//! ms = 500
//! ```

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use termsheet_engine::{
    ChangeSource, Clock, DocumentOutcome, EngineConfig, FormController, FormEvent, FormState,
    GeneratedDocument, ManualClock, NoticeLevel, TextDocument, ValidationSummary,
};
use termsheet_model::{CurrencyUnit, FieldKey, FieldSnapshot, FieldValue, FormSchema};
use termsheet_persistence::MemoryStore;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Edit { field: String, value: FieldValue },
    /// Let virtual time pass, running whatever falls due.
    Wait { ms: u64 },
    Unit { unit: CurrencyUnit },
    Generate,
    Clear,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edit { field, value } => write!(f, "edit {field} = {value}"),
            Self::Wait { ms } => write!(f, "wait {ms}ms"),
            Self::Unit { unit } => write!(f, "unit {unit}"),
            Self::Generate => f.write_str("generate"),
            Self::Clear => f.write_str("clear"),
        }
    }
}

impl ReplayScript {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("parse edit script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read edit script {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug, Clone)]
pub struct StepReport {
    /// `None` for the final flush after the last step.
    pub step: Option<Step>,
    pub elapsed_ms: i64,
    pub events: Vec<FormEvent>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub values: FieldSnapshot,
    /// Visible fields after the last step, in layout order.
    pub visible: Vec<FieldKey>,
    pub state: FormState,
    pub validation: ValidationSummary,
    pub document: Option<GeneratedDocument>,
    pub drafts_saved: usize,
}

/// Run `script` on a fresh form. Edits the engine rejects are reported on
/// their step and do not stop the replay.
pub fn replay(schema: FormSchema, script: &ReplayScript) -> Result<ReplayReport> {
    let clock = ManualClock::default();
    let start = clock.now();
    let drafts = MemoryStore::new();
    let title = schema.title.clone();
    let mut form = FormController::new(schema, script.config.clone(), clock.clone())
        .context("initialize form")?
        .with_persistence(drafts.clone());
    let events = form.subscribe();

    let mut steps = Vec::new();
    let mut document = None;
    for step in &script.steps {
        let _span = tracing::debug_span!("step", step = %step).entered();
        let mut error = None;
        match step {
            Step::Edit { field, value } => {
                if let Err(e) = form.on_change(field, value.clone()) {
                    error = Some(e.to_string());
                }
            }
            Step::Wait { ms } => {
                clock.advance_ms(i64::try_from(*ms).unwrap_or(i64::MAX));
            }
            Step::Unit { unit } => {
                form.change_unit(*unit);
            }
            Step::Generate => match form.generate_document(&mut TextDocument::new(title.as_str())) {
                DocumentOutcome::Generated(generated) => document = Some(generated),
                DocumentOutcome::Refused { errors } => {
                    error = Some(format!("refused with {} errors", errors.len()));
                }
                DocumentOutcome::Failed { message } => error = Some(message),
            },
            Step::Clear => form.clear(),
        }
        form.tick();
        form.on_frame();
        steps.push(StepReport {
            step: Some(step.clone()),
            elapsed_ms: (clock.now() - start).num_milliseconds(),
            events: events.try_iter().collect(),
            error,
        });
    }

    let validation = form.flush_validation();
    form.on_frame();
    steps.push(StepReport {
        step: None,
        elapsed_ms: (clock.now() - start).num_milliseconds(),
        events: events.try_iter().collect(),
        error: None,
    });

    Ok(ReplayReport {
        steps,
        values: form.get_all_field_values(),
        visible: form.visible_fields(),
        state: form.state().clone(),
        validation,
        document,
        drafts_saved: drafts.save_count(),
    })
}

/// One line per event.
pub fn describe(event: &FormEvent) -> String {
    match event {
        FormEvent::FieldChanged {
            field,
            value,
            source,
        } => {
            let source = match source {
                ChangeSource::User => "user",
                ChangeSource::Calculation => "calculation",
                ChangeSource::Populate => "populate",
            };
            format!("{field} = {value} ({source})")
        }
        FormEvent::VisibilityChanged { field, visible } => {
            format!("{field} {}", if *visible { "shown" } else { "hidden" })
        }
        FormEvent::LabelChanged { field, label } => format!("{field} labeled {label}"),
        FormEvent::UnitChanged { unit } => format!("unit is now {unit}"),
        FormEvent::FormStateChanged {
            is_dirty,
            is_valid,
            completion_rate,
        } => format!(
            "state: {}, {}, {completion_rate:.1}% complete",
            if *is_dirty { "dirty" } else { "clean" },
            if *is_valid { "valid" } else { "invalid" },
        ),
        FormEvent::ValidationCompleted {
            total_fields,
            invalid_fields,
            ..
        } => format!("validation: {invalid_fields} of {total_fields} fields invalid"),
        FormEvent::DraftSaved { fields, .. } => format!("draft saved ({fields} fields)"),
        FormEvent::Notice { level, message } => {
            let level = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            };
            format!("{level}: {message}")
        }
    }
}

/// Plain-text transcript of a replay.
pub fn render_transcript(report: &ReplayReport) -> String {
    let mut lines = Vec::new();
    for (index, step) in report.steps.iter().enumerate() {
        match &step.step {
            Some(s) => lines.push(format!("[{}] +{}ms {s}", index + 1, step.elapsed_ms)),
            None => lines.push(format!("[end] +{}ms", step.elapsed_ms)),
        }
        if let Some(error) = &step.error {
            lines.push(format!("    error: {error}"));
        }
        for event in &step.events {
            lines.push(format!("    {}", describe(event)));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action() {
        let script = ReplayScript::from_toml_str(
            r#"
            [config]
            validation_debounce_ms = 200

            [[step]]
            action = "edit"
            field = "투자금액"
            value = 10

            [[step]]
            action = "wait"
            ms = 200

            [[step]]
            action = "unit"
            unit = "million_won"

            [[step]]
            action = "generate"

            [[step]]
            action = "clear"
            "#,
        )
        .unwrap();

        assert_eq!(script.config.validation_debounce_ms, 200);
        assert_eq!(
            script.steps,
            vec![
                Step::Edit {
                    field: "투자금액".into(),
                    value: FieldValue::Number(10.0),
                },
                Step::Wait { ms: 200 },
                Step::Unit {
                    unit: CurrencyUnit::MillionWon,
                },
                Step::Generate,
                Step::Clear,
            ]
        );
        assert_eq!(script.steps[0].to_string(), "edit 투자금액 = 10");
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = ReplayScript::from_toml_str("[[step]]\naction = \"undo\"\n").unwrap_err();
        assert!(err.to_string().contains("edit script"));
    }

    #[test]
    fn empty_script_still_validates() {
        let report = replay(FormSchema::term_sheet().unwrap(), &ReplayScript::default()).unwrap();
        assert_eq!(report.steps.len(), 1);
        assert!(!report.validation.is_valid());
        assert_eq!(report.drafts_saved, 0);
    }
}
