//! Field and form validation.
//!
//! Immediate validation checks one field as it is edited: required and
//! numeric format. The debounced whole-form pass repeats that for every
//! visible field and adds range, option, date and cross-field checks.
//! Problems are reported as [`Issue`]s, never raised as errors.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use termsheet_model::{FieldKey, FieldSchema, FieldType, FieldValue, keys};

use crate::store::FieldStore;

/// Ownership above this share is flagged for review.
const MAJORITY_OWNERSHIP: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// Blocks document generation.
    Error,
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// Validation issue; each variant carries only what its message needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Issue {
    RequiredEmpty { field: FieldKey },
    NotANumber { field: FieldKey, value: String },
    BelowMinimum { field: FieldKey, min: f64 },
    AboveMaximum { field: FieldKey, max: f64 },
    NotAnOption { field: FieldKey, value: String },
    InvalidDate { field: FieldKey, value: String },
    /// Investment amount is larger than the post-money valuation.
    AmountExceedsValuation { field: FieldKey },
    MajorityOwnership { field: FieldKey, ownership: f64 },
}

impl Issue {
    pub fn field(&self) -> &FieldKey {
        match self {
            Issue::RequiredEmpty { field }
            | Issue::NotANumber { field, .. }
            | Issue::BelowMinimum { field, .. }
            | Issue::AboveMaximum { field, .. }
            | Issue::NotAnOption { field, .. }
            | Issue::InvalidDate { field, .. }
            | Issue::AmountExceedsValuation { field }
            | Issue::MajorityOwnership { field, .. } => field,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Issue::MajorityOwnership { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Issue::RequiredEmpty { .. } => "필수 입력 항목입니다".to_string(),
            Issue::NotANumber { .. } => "숫자를 입력하세요".to_string(),
            Issue::BelowMinimum { min, .. } => {
                format!("{} 이상이어야 합니다", FieldValue::Number(*min))
            }
            Issue::AboveMaximum { max, .. } => {
                format!("{} 이하여야 합니다", FieldValue::Number(*max))
            }
            Issue::NotAnOption { value, .. } => format!("선택할 수 없는 값입니다: {value}"),
            Issue::InvalidDate { .. } => "날짜 형식이 올바르지 않습니다 (YYYY-MM-DD)".to_string(),
            Issue::AmountExceedsValuation { .. } => {
                "투자금액이 투자후 기업가치를 초과합니다".to_string()
            }
            Issue::MajorityOwnership { ownership, .. } => {
                format!("지분율 {ownership:.2}%가 과반을 넘습니다")
            }
        }
    }
}

/// Result of validating one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub issues: Vec<Issue>,
}

impl FieldValidation {
    fn from_issues(issues: Vec<Issue>) -> Self {
        let mut result = Self {
            is_valid: true,
            ..Self::default()
        };
        for issue in issues {
            result.push(issue);
        }
        result
    }

    fn push(&mut self, issue: Issue) {
        match issue.severity() {
            Severity::Error => {
                self.is_valid = false;
                self.errors.push(issue.message());
            }
            Severity::Warning => self.warnings.push(issue.message()),
        }
        self.issues.push(issue);
    }
}

/// Aggregate result of a whole-form pass over the visible fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub total_fields: usize,
    pub valid_fields: usize,
    pub invalid_fields: usize,
    /// `label: message` for every error, in layout order.
    pub errors: Vec<String>,
    /// `label: message` for every warning, in layout order.
    pub warnings: Vec<String>,
    pub fields: Vec<(FieldKey, FieldValidation)>,
}

impl ValidationSummary {
    pub fn is_valid(&self) -> bool {
        self.invalid_fields == 0
    }

    pub fn field(&self, key: &str) -> Option<&FieldValidation> {
        self.fields
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Errors keyed by field, for fields that have any.
    pub fn error_map(&self) -> BTreeMap<FieldKey, Vec<String>> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.errors.is_empty())
            .map(|(k, v)| (k.clone(), v.errors.clone()))
            .collect()
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.fields.iter().flat_map(|(_, v)| v.issues.iter())
    }
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} fields valid",
            self.valid_fields, self.total_fields
        )?;
        for error in &self.errors {
            write!(f, "\nerror   {error}")?;
        }
        for warning in &self.warnings {
            write!(f, "\nwarning {warning}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Immediate check of one field: required and numeric format.
    pub fn validate_field(&self, schema: &FieldSchema, value: &FieldValue) -> FieldValidation {
        FieldValidation::from_issues(immediate_issues(schema, value))
    }

    /// Whole-form pass over `visible` fields.
    pub fn validate_form(&self, store: &FieldStore, visible: &[FieldKey]) -> ValidationSummary {
        let mut summary = ValidationSummary::default();

        for key in visible {
            let Some(entry) = store.field(key.as_str()) else {
                continue;
            };
            let mut issues = immediate_issues(&entry.schema, &entry.value);
            if issues.is_empty() {
                issues.extend(detail_issues(&entry.schema, &entry.value));
            }
            issues.extend(cross_field_issues(store, visible, key));

            let result = FieldValidation::from_issues(issues);
            summary.total_fields += 1;
            if result.is_valid {
                summary.valid_fields += 1;
            } else {
                summary.invalid_fields += 1;
            }
            for error in &result.errors {
                summary.errors.push(format!("{}: {error}", entry.label));
            }
            for warning in &result.warnings {
                summary.warnings.push(format!("{}: {warning}", entry.label));
            }
            summary.fields.push((key.clone(), result));
        }

        tracing::debug!(
            total = summary.total_fields,
            invalid = summary.invalid_fields,
            warnings = summary.warnings.len(),
            "Validated form"
        );
        summary
    }
}

fn immediate_issues(schema: &FieldSchema, value: &FieldValue) -> Vec<Issue> {
    let field = || schema.key.clone();
    if value.is_blank() {
        if schema.required {
            return vec![Issue::RequiredEmpty { field: field() }];
        }
        return Vec::new();
    }
    if schema.is_numeric() && value.as_number().is_none() {
        return vec![Issue::NotANumber {
            field: field(),
            value: value.as_text().into_owned(),
        }];
    }
    Vec::new()
}

/// Range, option and date checks for a non-blank, well-formed value.
fn detail_issues(schema: &FieldSchema, value: &FieldValue) -> Vec<Issue> {
    let mut issues = Vec::new();
    if value.is_blank() {
        return issues;
    }
    let field = || schema.key.clone();

    if let Some(number) = value.as_number().filter(|_| schema.is_numeric()) {
        if let Some(min) = schema.min
            && number < min
        {
            issues.push(Issue::BelowMinimum {
                field: field(),
                min,
            });
        }
        if let Some(max) = schema.max
            && number > max
        {
            issues.push(Issue::AboveMaximum {
                field: field(),
                max,
            });
        }
    }

    match schema.field_type {
        FieldType::Select if !schema.options.is_empty() => {
            let text = value.as_text();
            if !schema.options.iter().any(|o| o.as_str() == text) {
                issues.push(Issue::NotAnOption {
                    field: field(),
                    value: text.into_owned(),
                });
            }
        }
        FieldType::Date => {
            let text = value.as_text();
            if NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_err() {
                issues.push(Issue::InvalidDate {
                    field: field(),
                    value: text.into_owned(),
                });
            }
        }
        _ => {}
    }

    issues
}

/// Checks that relate `key` to other visible fields.
fn cross_field_issues(store: &FieldStore, visible: &[FieldKey], key: &FieldKey) -> Vec<Issue> {
    let number = |name: &str| {
        visible
            .iter()
            .any(|k| k.as_str() == name)
            .then(|| store.get(name).and_then(FieldValue::as_number))
            .flatten()
    };

    match key.as_str() {
        keys::INVESTMENT_AMOUNT => match (
            number(keys::INVESTMENT_AMOUNT),
            number(keys::POST_MONEY_VALUATION),
        ) {
            (Some(amount), Some(post)) if amount > post => {
                vec![Issue::AmountExceedsValuation { field: key.clone() }]
            }
            _ => Vec::new(),
        },
        keys::OWNERSHIP => match number(keys::OWNERSHIP) {
            Some(ownership) if ownership > MAJORITY_OWNERSHIP => vec![Issue::MajorityOwnership {
                field: key.clone(),
                ownership,
            }],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
