//! Form schema loading and linting.
//!
//! The schema is static configuration loaded once: an ordered list of
//! sections, each with ordered field declarations. Conditional and label
//! rules are declared inline on the field they affect.
//!
//! ```toml
//! title = "투자계약 조건"
//!
//! [[sections]]
//! id = "terms"
//! title = "투자 조건"
//!
//! [[sections.fields]]
//! key = "지분율"
//! type = "percent"
//! formula = "ownership"
//! relabel = { condition_field = "투자유형", operator = "equals", value = "전환사채", label = "전환시지분율" }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::condition::{ConditionOperator, ConditionValue, ConditionalRule, LabelRule};
use crate::enums::{DisplayFormat, FieldType};
use crate::error::{ModelError, Result};
use crate::field::FieldSchema;
use crate::ids::FieldKey;
use crate::rule::RuleId;
use crate::value::FieldValue;

const TERM_SHEET_TOML: &str = include_str!("../data/term_sheet.toml");

/// A titled group of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldSchema>,
}

/// Complete, validated form declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSchema {
    pub title: String,
    pub sections: Vec<Section>,
    pub conditionals: Vec<ConditionalRule>,
    pub label_rules: Vec<LabelRule>,
}

impl FormSchema {
    /// The built-in investment term sheet.
    pub fn term_sheet() -> Result<Self> {
        Self::from_toml_str(TERM_SHEET_TOML)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SchemaFile = toml::from_str(content)?;
        file.into_schema()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let schema = Self::from_toml_str(&content)?;
        tracing::info!(
            fields = schema.field_count(),
            "Loaded form schema from {}",
            path.display()
        );
        Ok(schema)
    }

    /// All fields in layout order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields().find(|f| f.key.as_str() == key)
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }

    /// Rules referenced by calculated fields, in layout order.
    pub fn formulas(&self) -> Vec<RuleId> {
        self.fields().filter_map(|f| f.formula).collect()
    }

    /// Report configuration defects that would otherwise degrade silently
    /// at runtime (always-visible fields, skipped calculations).
    pub fn lint(&self) -> Vec<SchemaIssue> {
        let declared: HashSet<&str> = self.fields().map(|f| f.key.as_str()).collect();
        let mut issues = Vec::new();

        for field in self.fields() {
            if field.calculated && field.formula.is_none() {
                issues.push(SchemaIssue::CalculatedWithoutFormula {
                    field: field.key.to_string(),
                });
            }
            let Some(rule) = field.formula else {
                continue;
            };
            if rule.target() != field.key.as_str() {
                issues.push(SchemaIssue::RuleTargetMismatch {
                    field: field.key.to_string(),
                    rule,
                });
            }
            if rule.dependencies().iter().any(|d| *d == field.key.as_str()) {
                issues.push(SchemaIssue::SelfDependency { rule });
            }
            for dependency in rule.dependencies() {
                if !declared.contains(dependency) {
                    issues.push(SchemaIssue::UndeclaredDependency {
                        rule,
                        dependency: (*dependency).to_string(),
                    });
                }
            }
        }

        let conditions = self
            .conditionals
            .iter()
            .map(|r| (&r.target, r.condition_field.as_ref(), &r.operator));
        let labels = self
            .label_rules
            .iter()
            .map(|r| (&r.target, Some(&r.condition_field), &r.operator));

        for (target, condition_field, operator) in conditions.chain(labels) {
            if let ConditionOperator::Misconfigured { operator, reason } = operator {
                issues.push(SchemaIssue::MisconfiguredCondition {
                    field: target.to_string(),
                    operator: operator.clone(),
                    reason: reason.clone(),
                });
            }
            if let Some(condition_field) = condition_field
                && !declared.contains(condition_field.as_str())
            {
                issues.push(SchemaIssue::UndeclaredConditionField {
                    field: target.to_string(),
                    condition_field: condition_field.to_string(),
                });
            }
        }

        issues
    }
}

/// Configuration defect found by [`FormSchema::lint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    CalculatedWithoutFormula { field: String },
    RuleTargetMismatch { field: String, rule: RuleId },
    SelfDependency { rule: RuleId },
    UndeclaredDependency { rule: RuleId, dependency: String },
    MisconfiguredCondition { field: String, operator: String, reason: String },
    UndeclaredConditionField { field: String, condition_field: String },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CalculatedWithoutFormula { field } => {
                write!(f, "{field}: marked calculated but has no formula")
            }
            Self::RuleTargetMismatch { field, rule } => {
                write!(f, "{field}: formula {rule} writes {} instead", rule.target())
            }
            Self::SelfDependency { rule } => write!(f, "{rule}: reads its own target"),
            Self::UndeclaredDependency { rule, dependency } => {
                write!(f, "{rule}: dependency {dependency} is not declared")
            }
            Self::MisconfiguredCondition {
                field,
                operator,
                reason,
            } => write!(f, "{field}: condition operator {operator:?} ({reason})"),
            Self::UndeclaredConditionField {
                field,
                condition_field,
            } => write!(f, "{field}: condition field {condition_field} is not declared"),
        }
    }
}

// ============================================================================
// File format
// ============================================================================

#[derive(Debug, Deserialize)]
struct SchemaFile {
    title: String,
    #[serde(default)]
    sections: Vec<SectionDecl>,
}

#[derive(Debug, Deserialize)]
struct SectionDecl {
    id: String,
    title: String,
    #[serde(default)]
    fields: Vec<FieldDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDecl {
    key: String,
    label: Option<String>,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    required: bool,
    default: Option<FieldValue>,
    min: Option<f64>,
    max: Option<f64>,
    unit: Option<String>,
    #[serde(default)]
    options: Vec<String>,
    placeholder: Option<String>,
    help: Option<String>,
    #[serde(default)]
    calculated: bool,
    formula: Option<RuleId>,
    display: Option<DisplayFormat>,
    #[serde(default)]
    conditional: bool,
    condition_field: Option<String>,
    condition_operator: Option<String>,
    condition_value: Option<ConditionValue>,
    relabel: Option<RelabelDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RelabelDecl {
    condition_field: String,
    #[serde(default = "default_operator")]
    operator: String,
    value: Option<ConditionValue>,
    label: String,
}

fn default_operator() -> String {
    "equals".to_string()
}

impl SchemaFile {
    fn into_schema(self) -> Result<FormSchema> {
        let mut seen = HashSet::new();
        let mut sections = Vec::with_capacity(self.sections.len());
        let mut conditionals = Vec::new();
        let mut label_rules = Vec::new();

        for section in self.sections {
            let mut fields = Vec::with_capacity(section.fields.len());
            for decl in section.fields {
                let key = FieldKey::new(decl.key)?;
                if !seen.insert(key.clone()) {
                    return Err(ModelError::DuplicateField(key.to_string()));
                }

                if decl.conditional {
                    let operator_name = decl.condition_operator.unwrap_or_else(|| {
                        if decl.condition_value.is_some() {
                            "equals".to_string()
                        } else {
                            "not_empty".to_string()
                        }
                    });
                    conditionals.push(ConditionalRule {
                        target: key.clone(),
                        condition_field: decl.condition_field.map(FieldKey::new).transpose()?,
                        operator: ConditionOperator::parse(
                            &operator_name,
                            decl.condition_value.as_ref(),
                        ),
                    });
                }

                if let Some(relabel) = decl.relabel {
                    label_rules.push(LabelRule {
                        target: key.clone(),
                        condition_field: FieldKey::new(relabel.condition_field)?,
                        operator: ConditionOperator::parse(
                            &relabel.operator,
                            relabel.value.as_ref(),
                        ),
                        label: relabel.label,
                    });
                }

                let label = decl.label.unwrap_or_else(|| key.to_string());
                fields.push(FieldSchema {
                    key,
                    label,
                    field_type: decl.field_type,
                    required: decl.required,
                    default: decl.default.unwrap_or_default(),
                    min: decl.min,
                    max: decl.max,
                    options: decl.options,
                    unit: decl.unit,
                    placeholder: decl.placeholder,
                    help: decl.help,
                    calculated: decl.calculated || decl.formula.is_some(),
                    formula: decl.formula,
                    display: decl.display,
                    section: section.id.clone(),
                });
            }
            sections.push(Section {
                id: section.id,
                title: section.title,
                fields,
            });
        }

        Ok(FormSchema {
            title: self.title,
            sections,
            conditionals,
            label_rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_are_rejected() {
        let toml = r#"
title = "t"
[[sections]]
id = "a"
title = "A"
[[sections.fields]]
key = "투자대상"
type = "text"
[[sections.fields]]
key = "투자대상"
type = "text"
"#;
        assert!(matches!(
            FormSchema::from_toml_str(toml),
            Err(ModelError::DuplicateField(_))
        ));
    }

    #[test]
    fn unknown_formula_fails_to_load() {
        let toml = r#"
title = "t"
[[sections]]
id = "a"
title = "A"
[[sections.fields]]
key = "지분율"
type = "percent"
formula = "ownershp"
"#;
        assert!(matches!(
            FormSchema::from_toml_str(toml),
            Err(ModelError::SchemaParse(_))
        ));
    }

    #[test]
    fn conditional_operator_defaults() {
        let toml = r#"
title = "t"
[[sections]]
id = "a"
title = "A"
[[sections.fields]]
key = "투자유형"
type = "select"
options = ["보통주", "전환사채"]
[[sections.fields]]
key = "상환이자"
type = "percent"
conditional = true
condition_field = "투자유형"
condition_value = "전환사채"
[[sections.fields]]
key = "비고"
type = "text"
conditional = true
condition_field = "투자유형"
"#;
        let schema = FormSchema::from_toml_str(toml).unwrap();
        assert_eq!(schema.conditionals.len(), 2);
        assert_eq!(
            schema.conditionals[0].operator,
            ConditionOperator::Equals(FieldValue::text("전환사채"))
        );
        assert_eq!(schema.conditionals[1].operator, ConditionOperator::NotEmpty);
        assert!(schema.lint().is_empty());
    }

    #[test]
    fn lint_reports_configuration_defects() {
        let toml = r#"
title = "t"
[[sections]]
id = "a"
title = "A"
[[sections.fields]]
key = "지분율"
type = "percent"
formula = "ownership"
[[sections.fields]]
key = "메모"
type = "text"
calculated = true
[[sections.fields]]
key = "상환이자"
type = "percent"
conditional = true
condition_field = "투자유형"
condition_operator = "looks_like"
condition_value = "전환사채"
"#;
        let schema = FormSchema::from_toml_str(toml).unwrap();
        let issues = schema.lint();
        assert!(issues.contains(&SchemaIssue::CalculatedWithoutFormula {
            field: "메모".to_string()
        }));
        assert!(issues.contains(&SchemaIssue::UndeclaredDependency {
            rule: RuleId::Ownership,
            dependency: "투자금액".to_string(),
        }));
        assert!(issues.contains(&SchemaIssue::UndeclaredConditionField {
            field: "상환이자".to_string(),
            condition_field: "투자유형".to_string(),
        }));
        assert!(issues.iter().any(|i| matches!(
            i,
            SchemaIssue::MisconfiguredCondition { operator, .. } if operator == "looks_like"
        )));
    }
}
