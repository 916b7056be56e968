//! Conditional visibility and label evaluation.
//!
//! Hiding a field never touches its value: hidden fields keep whatever was
//! typed into them and reappear with it when the condition flips back.

use termsheet_model::{ConditionalRule, FieldKey, FieldValue, FormSchema, LabelRule};

use crate::store::FieldStore;

/// What started an evaluation pass.
#[derive(Debug, Clone, Copy)]
pub enum Trigger<'a> {
    /// Evaluate every rule against the store.
    Init,
    /// `field` was just set to `value`.
    Edit {
        field: &'a str,
        value: &'a FieldValue,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityChange {
    pub field: FieldKey,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelChange {
    pub field: FieldKey,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityOutcome {
    pub visibility: Vec<VisibilityChange>,
    pub labels: Vec<LabelChange>,
}

impl VisibilityOutcome {
    pub fn is_empty(&self) -> bool {
        self.visibility.is_empty() && self.labels.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityEvaluator {
    conditionals: Vec<ConditionalRule>,
    label_rules: Vec<LabelRule>,
}

impl VisibilityEvaluator {
    pub fn new(schema: &FormSchema) -> Self {
        Self {
            conditionals: schema.conditionals.clone(),
            label_rules: schema.label_rules.clone(),
        }
    }

    pub fn conditionals(&self) -> &[ConditionalRule] {
        &self.conditionals
    }

    pub fn label_rules(&self) -> &[LabelRule] {
        &self.label_rules
    }

    /// Apply every rule the trigger concerns and report what changed.
    pub fn evaluate(&self, store: &mut FieldStore, trigger: Trigger<'_>) -> VisibilityOutcome {
        let mut outcome = VisibilityOutcome::default();

        for rule in &self.conditionals {
            let condition_field = match (rule.condition_field.as_ref(), trigger) {
                (Some(field), _) => field.as_str(),
                (None, Trigger::Edit { field, .. }) => field,
                // Nothing to read before the first edit.
                (None, Trigger::Init) => continue,
            };
            let Some(value) = condition_value(store, trigger, condition_field) else {
                continue;
            };
            let visible = rule.operator.evaluate(&value);
            if let Ok(true) = store.set_visible(rule.target.as_str(), visible) {
                tracing::debug!(field = %rule.target, visible, "Visibility changed");
                outcome.visibility.push(VisibilityChange {
                    field: rule.target.clone(),
                    visible,
                });
            }
        }

        let mut handled: Vec<&FieldKey> = Vec::new();
        for rule in &self.label_rules {
            if handled.contains(&&rule.target) {
                continue;
            }
            let concerned = self
                .label_rules
                .iter()
                .filter(|r| r.target == rule.target)
                .any(|r| match trigger {
                    Trigger::Init => true,
                    Trigger::Edit { field, .. } => r.condition_field.as_str() == field,
                });
            handled.push(&rule.target);
            if !concerned {
                continue;
            }
            if let Some(change) = self.apply_labels(store, trigger, &rule.target) {
                outcome.labels.push(change);
            }
        }

        outcome
    }

    /// The first label rule for `target` whose condition holds wins;
    /// with none holding the declared label is restored.
    fn apply_labels(
        &self,
        store: &mut FieldStore,
        trigger: Trigger<'_>,
        target: &FieldKey,
    ) -> Option<LabelChange> {
        let current: &FieldStore = store;
        let declared = current.field(target.as_str())?.schema.label.clone();
        let label = self
            .label_rules
            .iter()
            .filter(|r| &r.target == target)
            .find(|r| {
                condition_value(current, trigger, r.condition_field.as_str())
                    .is_some_and(|value| r.operator.evaluate(&value))
            })
            .map_or(declared, |r| r.label.clone());

        match store.set_display_label(target.as_str(), &label) {
            Ok(true) => {
                tracing::debug!(field = %target, label = %label, "Label changed");
                Some(LabelChange {
                    field: target.clone(),
                    label,
                })
            }
            _ => None,
        }
    }
}

/// Value of the condition field: the edited value itself when it is the
/// field being edited, otherwise whatever the store holds.
fn condition_value(store: &FieldStore, trigger: Trigger<'_>, field: &str) -> Option<FieldValue> {
    match trigger {
        Trigger::Edit {
            field: edited,
            value,
        } if edited == field => Some(value.clone()),
        _ => store.get(field).cloned(),
    }
}
