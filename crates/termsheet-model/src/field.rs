use serde::{Deserialize, Serialize};

use crate::enums::{DisplayFormat, FieldType};
use crate::ids::FieldKey;
use crate::rule::RuleId;
use crate::value::FieldValue;

/// Declared schema of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub key: FieldKey,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default)]
    pub default: FieldValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub options: Vec<String>,
    pub unit: Option<String>,
    pub placeholder: Option<String>,
    pub help: Option<String>,
    /// Rule that computes this field. Calculated fields are read-only.
    pub formula: Option<RuleId>,
    /// Marked calculated in the schema; normally implied by `formula`.
    #[serde(default)]
    pub calculated: bool,
    pub display: Option<DisplayFormat>,
    /// Id of the section the field belongs to.
    #[serde(default)]
    pub section: String,
}

impl FieldSchema {
    pub fn new(key: FieldKey, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key,
            label: label.into(),
            field_type,
            required: false,
            default: FieldValue::Empty,
            min: None,
            max: None,
            options: Vec::new(),
            unit: None,
            placeholder: None,
            help: None,
            formula: None,
            calculated: false,
            display: None,
            section: String::new(),
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_formula(mut self, rule: RuleId) -> Self {
        self.formula = Some(rule);
        self.calculated = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = value;
        self
    }

    pub fn is_calculated(&self) -> bool {
        self.calculated || self.formula.is_some()
    }

    /// Calculated fields are never edited by the user.
    pub fn is_readonly(&self) -> bool {
        self.is_calculated()
    }

    pub fn is_numeric(&self) -> bool {
        self.field_type.is_numeric()
    }

    /// Format used when the engine writes a calculated value.
    pub fn display_format(&self) -> DisplayFormat {
        self.display.unwrap_or(match self.field_type {
            FieldType::Percent => DisplayFormat::Percent,
            _ => DisplayFormat::Grouped,
        })
    }
}
