use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use termsheet_engine::{EngineConfig, FormController, ManualClock, load_config};
use termsheet_model::{FieldSnapshot, FormSchema};
use termsheet_persistence::{PersistenceError, load_draft};

use crate::cli::{CheckArgs, FormArgs, ReplayArgs, SchemaArgs};
use crate::summary::{print_check, print_lint, print_replay, print_schema};
use termsheet_cli::script::{ReplayScript, render_transcript, replay};

/// Returns false when the schema has lint findings.
pub fn run_schema(args: &SchemaArgs) -> Result<bool> {
    let schema = load_schema(&args.form)?;
    print_schema(&schema);
    let issues = schema.lint();
    print_lint(&issues);
    Ok(issues.is_empty())
}

/// Returns false when the values do not pass validation.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    let _span = info_span!("check", path = %args.values.display()).entered();
    let schema = load_schema(&args.form)?;
    let config = load_engine_config(&args.form);
    let values = read_values(&args.values)?;

    let mut form = FormController::new(schema, config, ManualClock::default())
        .context("initialize form")?;
    let report = form.populate_form(&values);
    let summary = form.flush_validation();
    let completion = form.on_frame().unwrap_or(form.state().completion_rate);
    info!(
        applied = report.applied,
        valid = summary.is_valid(),
        "Checked values"
    );

    print_check(&form, &report, &summary, completion);
    Ok(summary.is_valid())
}

/// Returns false when a step failed or the final state is invalid.
pub fn run_replay(args: &ReplayArgs) -> Result<bool> {
    let _span = info_span!("replay", script = %args.script.display()).entered();
    let schema = load_schema(&args.form)?;
    let mut script = ReplayScript::load(&args.script)?;
    if args.form.config.is_some() {
        script.config = load_engine_config(&args.form);
    }

    let report = replay(schema.clone(), &script)?;
    println!("{}", render_transcript(&report));
    println!();
    print_replay(&schema, &report);

    if let (Some(path), Some(document)) = (&args.document_out, &report.document) {
        std::fs::write(path, &document.content)
            .with_context(|| format!("write document {}", path.display()))?;
        println!("Document: {}", path.display());
    }

    let failed_steps = report.steps.iter().any(|s| s.error.is_some());
    Ok(!failed_steps && report.state.is_valid)
}

fn load_schema(args: &FormArgs) -> Result<FormSchema> {
    match &args.schema {
        Some(path) => {
            FormSchema::load(path).with_context(|| format!("load schema {}", path.display()))
        }
        None => FormSchema::term_sheet().context("load built-in schema"),
    }
}

fn load_engine_config(args: &FormArgs) -> EngineConfig {
    args.config
        .as_deref()
        .map(load_config)
        .unwrap_or_default()
}

/// Values from a draft file, or from a plain JSON object of field values.
fn read_values(path: &Path) -> Result<FieldSnapshot> {
    match load_draft(path) {
        Ok(draft) => Ok(draft.values),
        Err(PersistenceError::InvalidFormat { .. }) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("parse field values in {}", path.display()))
        }
        Err(e) => {
            let mut message = e.user_message();
            if let Some(suggestion) = e.suggestion() {
                message.push_str(&format!(" {suggestion}"));
            }
            Err(anyhow::Error::new(e).context(message))
        }
    }
}
