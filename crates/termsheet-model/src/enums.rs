//! Type-safe enumerations for field metadata.
//!
//! These enums provide compile-time type safety for concepts that appear
//! as strings in the schema file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line free text.
    Text,
    /// Multi-line free text.
    Textarea,
    /// Plain number (share counts, prices).
    Number,
    /// Monetary amount in the active currency unit.
    Currency,
    /// Percentage (0-100).
    Percent,
    /// One value out of a declared option list.
    Select,
    /// Calendar date (`YYYY-MM-DD`).
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Percent => "percent",
            FieldType::Select => "select",
            FieldType::Date => "date",
        }
    }

    /// Returns true if values of this type must parse as a finite number.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Number | FieldType::Currency | FieldType::Percent
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "textarea" => Ok(FieldType::Textarea),
            "number" => Ok(FieldType::Number),
            "currency" => Ok(FieldType::Currency),
            "percent" => Ok(FieldType::Percent),
            "select" => Ok(FieldType::Select),
            "date" => Ok(FieldType::Date),
            _ => Err(format!("Unknown field type: {s}")),
        }
    }
}

/// How a calculated number is rendered back into the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFormat {
    /// Rounded integer without separators (`200000`).
    Integer,
    /// Two fixed decimals (`10.00`).
    Percent,
    /// Thousands separators with up to two decimals (`200,000`, `1,234.5`).
    Grouped,
}

/// Currency base unit used for monetary inputs.
///
/// Amounts are typed in the active unit; calculations that need raw won
/// multiply by [`CurrencyUnit::multiplier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyUnit {
    /// 억원 (10^8 won). Default unit of the term sheet.
    #[default]
    HundredMillionWon,
    /// 백만원 (10^6 won).
    MillionWon,
    /// 천원 (10^3 won).
    ThousandWon,
    /// 원.
    Won,
}

impl CurrencyUnit {
    pub const ALL: [Self; 4] = [
        Self::HundredMillionWon,
        Self::MillionWon,
        Self::ThousandWon,
        Self::Won,
    ];

    /// Number of won in one unit.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::HundredMillionWon => 100_000_000.0,
            Self::MillionWon => 1_000_000.0,
            Self::ThousandWon => 1_000.0,
            Self::Won => 1.0,
        }
    }

    /// Display label as shown next to amount inputs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::HundredMillionWon => "억원",
            Self::MillionWon => "백만원",
            Self::ThousandWon => "천원",
            Self::Won => "원",
        }
    }
}

impl fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CurrencyUnit {
    type Err = String;

    /// Accepts either the Korean label or the snake_case identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "억원" | "hundred_million_won" => Ok(Self::HundredMillionWon),
            "백만원" | "million_won" => Ok(Self::MillionWon),
            "천원" | "thousand_won" => Ok(Self::ThousandWon),
            "원" | "won" => Ok(Self::Won),
            _ => Err(format!("Unknown currency unit: {s}")),
        }
    }
}
