//! Raw field values and number formatting.
//!
//! Values arrive from input widgets as text, from persisted snapshots as
//! JSON scalars, and from the calculation engine as formatted text. Numeric
//! interpretation is always done through [`parse_number`] so grouping
//! separators written by the engine round-trip back into calculations.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::DisplayFormat;

/// Current raw value of a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Never set (serialized as `null`).
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Blank means unset or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    /// Numeric interpretation of the value, if it is a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Empty => None,
            FieldValue::Number(n) => n.is_finite().then_some(*n),
            FieldValue::Text(text) => parse_number(text),
        }
    }

    /// Text form of the value as a widget would display it.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Empty => Cow::Borrowed(""),
            FieldValue::Text(text) => Cow::Borrowed(text.as_str()),
            FieldValue::Number(n) => Cow::Owned(format_plain(*n)),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Parse user-entered numeric text.
///
/// Accepts thousands separators and a trailing percent sign. Returns `None`
/// for blank, malformed, or non-finite input.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    // f64::from_str also accepts "inf" and "NaN"; neither is a valid input.
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a calculated number for storage in a field.
pub fn format_number(value: f64, format: DisplayFormat) -> String {
    match format {
        // `+ 0.0` folds -0 into 0.
        DisplayFormat::Integer => format!("{:.0}", value.round() + 0.0),
        DisplayFormat::Percent => format!("{value:.2}"),
        DisplayFormat::Grouped => format_grouped(value),
    }
}

/// Thousands-grouped number with at most two decimals (`1,234.5`).
///
/// Works on the decimal text, so values beyond the integer range keep
/// every digit.
pub fn format_grouped(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    if value < 0.0 && (whole != "0" || !fraction.is_empty()) {
        grouped.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction.is_empty() {
        grouped
    } else {
        format!("{grouped}.{fraction}")
    }
}

fn format_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
