//! Conditional visibility and label rules.

use serde::{Deserialize, Serialize};

use crate::ids::FieldKey;
use crate::value::{FieldValue, parse_number};

/// Comparison value as written in the schema file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    List(Vec<String>),
    Number(f64),
    Text(String),
}

/// Predicate over a condition field's value, carrying its comparison operand.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionOperator {
    Equals(FieldValue),
    NotEquals(FieldValue),
    GreaterThan(f64),
    LessThan(f64),
    NotEmpty,
    Empty,
    Contains(String),
    InList(Vec<String>),
    NotInList(Vec<String>),
    /// Operator name not recognised, or its comparison value unusable.
    ///
    /// Evaluates to `true` so the target field stays visible; schema linting
    /// reports every occurrence.
    Misconfigured { operator: String, reason: String },
}

impl ConditionOperator {
    /// Build an operator from its schema name and comparison value.
    pub fn parse(name: &str, value: Option<&ConditionValue>) -> Self {
        let name = name.trim();
        match name {
            "equals" => Self::Equals(value.map(to_field_value).unwrap_or_default()),
            "not_equals" => Self::NotEquals(value.map(to_field_value).unwrap_or_default()),
            "greater_than" | "less_than" => match value.and_then(to_number) {
                Some(n) if name == "greater_than" => Self::GreaterThan(n),
                Some(n) => Self::LessThan(n),
                None => Self::misconfigured(name, "comparison value is not a number"),
            },
            "not_empty" => Self::NotEmpty,
            "empty" => Self::Empty,
            "contains" => match value {
                Some(ConditionValue::Text(text)) => Self::Contains(text.clone()),
                Some(ConditionValue::Number(n)) => {
                    Self::Contains(FieldValue::Number(*n).as_text().into_owned())
                }
                _ => Self::misconfigured(name, "comparison value must be a single string"),
            },
            "in_list" | "not_in_list" => match value.map(to_list) {
                Some(list) if name == "in_list" => Self::InList(list),
                Some(list) => Self::NotInList(list),
                None => Self::misconfigured(name, "comparison list is missing"),
            },
            _ => Self::misconfigured(name, "unknown operator"),
        }
    }

    fn misconfigured(operator: &str, reason: &str) -> Self {
        Self::Misconfigured {
            operator: operator.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Equals(_) => "equals",
            Self::NotEquals(_) => "not_equals",
            Self::GreaterThan(_) => "greater_than",
            Self::LessThan(_) => "less_than",
            Self::NotEmpty => "not_empty",
            Self::Empty => "empty",
            Self::Contains(_) => "contains",
            Self::InList(_) => "in_list",
            Self::NotInList(_) => "not_in_list",
            Self::Misconfigured { operator, .. } => operator,
        }
    }

    pub fn is_misconfigured(&self) -> bool {
        matches!(self, Self::Misconfigured { .. })
    }

    /// Evaluate the predicate against the condition field's current value.
    pub fn evaluate(&self, value: &FieldValue) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::NotEquals(expected) => value != expected,
            Self::GreaterThan(limit) => value.as_number().is_some_and(|n| n > *limit),
            Self::LessThan(limit) => value.as_number().is_some_and(|n| n < *limit),
            Self::NotEmpty => !value.is_blank(),
            Self::Empty => value.is_blank(),
            Self::Contains(needle) => value.as_text().contains(needle.as_str()),
            Self::InList(list) => {
                let text = value.as_text();
                list.iter().any(|item| item.as_str() == text)
            }
            Self::NotInList(list) => {
                let text = value.as_text();
                !list.iter().any(|item| item.as_str() == text)
            }
            Self::Misconfigured { .. } => true,
        }
    }
}

fn to_field_value(value: &ConditionValue) -> FieldValue {
    match value {
        ConditionValue::Text(text) => FieldValue::Text(text.clone()),
        ConditionValue::Number(n) => FieldValue::Number(*n),
        ConditionValue::List(items) => FieldValue::Text(items.join(",")),
    }
}

fn to_number(value: &ConditionValue) -> Option<f64> {
    match value {
        ConditionValue::Number(n) => n.is_finite().then_some(*n),
        ConditionValue::Text(text) => parse_number(text),
        ConditionValue::List(_) => None,
    }
}

fn to_list(value: &ConditionValue) -> Vec<String> {
    match value {
        ConditionValue::List(items) => items.iter().map(|s| s.trim().to_string()).collect(),
        ConditionValue::Text(text) => text.split(',').map(|s| s.trim().to_string()).collect(),
        ConditionValue::Number(n) => vec![FieldValue::Number(*n).as_text().into_owned()],
    }
}

/// Shows or hides `target` depending on another field's value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRule {
    pub target: FieldKey,
    /// Field whose value is tested. `None` means "the field being edited".
    pub condition_field: Option<FieldKey>,
    pub operator: ConditionOperator,
}

/// Replaces the display label of `target` while the condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRule {
    pub target: FieldKey,
    pub condition_field: FieldKey,
    pub operator: ConditionOperator,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> FieldValue {
        FieldValue::text(value)
    }

    #[test]
    fn equality_is_strict() {
        let op = ConditionOperator::parse("equals", Some(&ConditionValue::Text("1".into())));
        assert!(op.evaluate(&text("1")));
        assert!(!op.evaluate(&text(" 1")));
        assert!(!op.evaluate(&FieldValue::Number(1.0)));
    }

    #[test]
    fn numeric_comparisons_fail_on_non_numbers() {
        let op = ConditionOperator::parse("greater_than", Some(&ConditionValue::Number(50.0)));
        assert!(op.evaluate(&text("50.5")));
        assert!(!op.evaluate(&text("50")));
        assert!(!op.evaluate(&text("많음")));
        assert!(!op.evaluate(&FieldValue::Empty));

        let op = ConditionOperator::parse("less_than", Some(&ConditionValue::Text("1,000".into())));
        assert!(op.evaluate(&text("999")));
    }

    #[test]
    fn emptiness_trims() {
        let not_empty = ConditionOperator::parse("not_empty", None);
        let empty = ConditionOperator::parse("empty", None);
        assert!(!not_empty.evaluate(&text("  ")));
        assert!(empty.evaluate(&text("  ")));
        assert!(empty.evaluate(&FieldValue::Empty));
    }

    #[test]
    fn list_membership_accepts_comma_text() {
        let op = ConditionOperator::parse(
            "in_list",
            Some(&ConditionValue::Text("상환전환우선주, 전환사채".into())),
        );
        assert_eq!(
            op,
            ConditionOperator::InList(vec!["상환전환우선주".into(), "전환사채".into()])
        );
        assert!(op.evaluate(&text("전환사채")));
        assert!(!op.evaluate(&text("보통주")));

        let op = ConditionOperator::parse(
            "not_in_list",
            Some(&ConditionValue::List(vec!["보통주".into()])),
        );
        assert!(op.evaluate(&FieldValue::Empty));
        assert!(!op.evaluate(&text("보통주")));
    }

    #[test]
    fn contains_is_substring() {
        let op = ConditionOperator::parse("contains", Some(&ConditionValue::Text("우선주".into())));
        assert!(op.evaluate(&text("상환전환우선주")));
        assert!(!op.evaluate(&text("보통주")));
    }

    #[test]
    fn unknown_operator_keeps_field_visible() {
        let op = ConditionOperator::parse("matches_regex", Some(&ConditionValue::Text("x".into())));
        assert!(op.is_misconfigured());
        assert_eq!(op.name(), "matches_regex");
        assert!(op.evaluate(&text("anything")));
        assert!(op.evaluate(&FieldValue::Empty));
    }

    #[test]
    fn bad_comparison_value_is_misconfigured() {
        let op = ConditionOperator::parse("greater_than", Some(&ConditionValue::Text("many".into())));
        assert!(op.is_misconfigured());
        let op = ConditionOperator::parse("in_list", None);
        assert!(op.is_misconfigured());
    }
}
