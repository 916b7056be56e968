//! Calculation engine.
//!
//! Rules are looked up by [`RuleId`]; the declaration (target and
//! dependencies) belongs to the id, the compute function to the registered
//! [`CalculationRule`]. A pass evaluates every rule against one snapshot
//! taken before any rule runs, so a rule never sees another rule's output
//! from the same pass. Chained rules converge on the following edit.

use std::fmt;

use termsheet_model::{
    CurrencyUnit, DisplayFormat, FieldSnapshot, FieldValue, FormSchema, RuleId, format_number,
};

use crate::redact::redact_value;
use crate::store::FieldStore;

type ComputeFn = Box<dyn Fn(&FieldSnapshot) -> Option<f64>>;

/// A registered rule: its typed id and current compute function.
pub struct CalculationRule {
    id: RuleId,
    format: DisplayFormat,
    compute: ComputeFn,
}

impl CalculationRule {
    /// Built-in compute function for `id` under the given currency unit.
    pub fn builtin(id: RuleId, format: DisplayFormat, unit: CurrencyUnit) -> Self {
        Self {
            id,
            format,
            compute: builtin_compute(id, unit),
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn target(&self) -> &'static str {
        self.id.target()
    }

    pub fn dependencies(&self) -> &'static [&'static str] {
        self.id.dependencies()
    }

    pub fn format(&self) -> DisplayFormat {
        self.format
    }

    pub fn evaluate(&self, snapshot: &FieldSnapshot) -> Option<f64> {
        (self.compute)(snapshot)
    }
}

impl fmt::Debug for CalculationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculationRule")
            .field("id", &self.id)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn builtin_compute(id: RuleId, unit: CurrencyUnit) -> ComputeFn {
    use termsheet_model::keys;

    match id {
        RuleId::PreMoneyValuation => Box::new(|s: &FieldSnapshot| {
            Some(s.number(keys::POST_MONEY_VALUATION)? - s.number(keys::INVESTMENT_AMOUNT)?)
        }),
        RuleId::Ownership => Box::new(|s: &FieldSnapshot| {
            let amount = s.number(keys::INVESTMENT_AMOUNT)?;
            let post = nonzero(s.number(keys::POST_MONEY_VALUATION)?)?;
            Some(amount / post * 100.0)
        }),
        RuleId::SharesAcquired => {
            let multiplier = unit.multiplier();
            Box::new(move |s: &FieldSnapshot| {
                let amount = s.number(keys::INVESTMENT_AMOUNT)?;
                let price = nonzero(s.number(keys::PRICE_PER_SHARE)?)?;
                Some((amount * multiplier / price).floor())
            })
        }
        RuleId::TotalSharesAfter => Box::new(|s: &FieldSnapshot| {
            let shares = s.number(keys::SHARES_ACQUIRED)?;
            let ownership = nonzero(s.number(keys::OWNERSHIP)?)?;
            Some((shares / ownership * 100.0).floor())
        }),
    }
}

fn nonzero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

/// What happened to one rule during a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcOutcome {
    /// Target written with the formatted result.
    Written { rule: RuleId, value: String },
    /// The edited field is this rule's target.
    SkippedTarget { rule: RuleId },
    MissingDependency { rule: RuleId, field: &'static str },
    UnparsableInput { rule: RuleId, field: &'static str },
    /// Division by zero or another undefined result.
    Undefined { rule: RuleId },
    NonFinite { rule: RuleId },
    /// The target field is not registered in the store.
    MissingTarget { rule: RuleId },
}

impl CalcOutcome {
    pub fn rule(&self) -> RuleId {
        match self {
            Self::Written { rule, .. }
            | Self::SkippedTarget { rule }
            | Self::MissingDependency { rule, .. }
            | Self::UnparsableInput { rule, .. }
            | Self::Undefined { rule }
            | Self::NonFinite { rule }
            | Self::MissingTarget { rule } => *rule,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Registry of calculation rules for one form.
#[derive(Debug)]
pub struct CalculationEngine {
    rules: Vec<CalculationRule>,
    unit: CurrencyUnit,
}

impl CalculationEngine {
    /// Register the built-in rule for every calculated field of `schema`,
    /// in layout order.
    pub fn new(schema: &FormSchema, unit: CurrencyUnit) -> Self {
        let rules = schema
            .fields()
            .filter_map(|field| {
                field
                    .formula
                    .map(|id| CalculationRule::builtin(id, field.display_format(), unit))
            })
            .collect();
        Self { rules, unit }
    }

    pub fn unit(&self) -> CurrencyUnit {
        self.unit
    }

    pub fn rules(&self) -> impl Iterator<Item = &CalculationRule> {
        self.rules.iter()
    }

    pub fn rule(&self, id: RuleId) -> Option<&CalculationRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Replace the compute function of a registered rule.
    ///
    /// The target, dependencies and display format stay as declared.
    /// Returns false when no rule with that id is registered.
    pub fn redefine<F>(&mut self, id: RuleId, compute: F) -> bool
    where
        F: Fn(&FieldSnapshot) -> Option<f64> + 'static,
    {
        match self.rules.iter_mut().find(|rule| rule.id == id) {
            Some(rule) => {
                rule.compute = Box::new(compute);
                true
            }
            None => false,
        }
    }

    /// Switch the currency unit, redefining the rules that depend on it.
    pub fn set_unit(&mut self, unit: CurrencyUnit) {
        self.unit = unit;
        for rule in self.rules.iter_mut().filter(|r| r.id.is_unit_sensitive()) {
            rule.compute = builtin_compute(rule.id, unit);
            tracing::debug!(rule = %rule.id, unit = %unit, "Redefined rule for new unit");
        }
    }

    /// Run every rule whose target is not `changed` against one snapshot of
    /// the store and write the finite results back.
    pub fn run(&self, store: &mut FieldStore, changed: Option<&str>) -> Vec<CalcOutcome> {
        let snapshot = store.get_all_values();
        self.rules
            .iter()
            .map(|rule| self.apply(rule, &snapshot, store, changed))
            .collect()
    }

    fn apply(
        &self,
        rule: &CalculationRule,
        snapshot: &FieldSnapshot,
        store: &mut FieldStore,
        changed: Option<&str>,
    ) -> CalcOutcome {
        let id = rule.id;
        if changed == Some(rule.target()) {
            return CalcOutcome::SkippedTarget { rule: id };
        }

        for &field in rule.dependencies() {
            match snapshot.get(field) {
                Some(value) if !value.is_blank() => {
                    if value.as_number().is_none() {
                        tracing::debug!(
                            rule = %id,
                            field,
                            value = redact_value(&value.as_text()),
                            "Skipped calculation: input is not a number"
                        );
                        return CalcOutcome::UnparsableInput { rule: id, field };
                    }
                }
                _ => return CalcOutcome::MissingDependency { rule: id, field },
            }
        }

        let Some(result) = rule.evaluate(snapshot) else {
            tracing::debug!(rule = %id, "Skipped calculation: result undefined");
            return CalcOutcome::Undefined { rule: id };
        };
        if !result.is_finite() {
            tracing::debug!(rule = %id, "Skipped calculation: result not finite");
            return CalcOutcome::NonFinite { rule: id };
        }

        let formatted = format_number(result, rule.format);
        match store.set(rule.target(), FieldValue::Text(formatted.clone())) {
            Ok(_) => CalcOutcome::Written {
                rule: id,
                value: formatted,
            },
            Err(e) => {
                tracing::warn!(rule = %id, "Skipped calculation: {e}");
                CalcOutcome::MissingTarget { rule: id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termsheet_model::keys;

    fn engine_and_store() -> (CalculationEngine, FieldStore) {
        let schema = FormSchema::term_sheet().unwrap();
        let store = FieldStore::from_schema(&schema).unwrap();
        (CalculationEngine::new(&schema, CurrencyUnit::default()), store)
    }

    fn written(outcomes: &[CalcOutcome], rule: RuleId) -> Option<&str> {
        outcomes.iter().find_map(|o| match o {
            CalcOutcome::Written { rule: r, value } if *r == rule => Some(value.as_str()),
            _ => None,
        })
    }

    #[test]
    fn ownership_is_formatted_as_percent() {
        let (engine, mut store) = engine_and_store();
        store.set(keys::INVESTMENT_AMOUNT, "10".into()).unwrap();
        store.set(keys::POST_MONEY_VALUATION, "100".into()).unwrap();

        let outcomes = engine.run(&mut store, Some(keys::POST_MONEY_VALUATION));
        assert_eq!(written(&outcomes, RuleId::Ownership), Some("10.00"));
        assert_eq!(written(&outcomes, RuleId::PreMoneyValuation), Some("90"));
        assert_eq!(store.get(keys::OWNERSHIP), Some(&FieldValue::text("10.00")));
    }

    #[test]
    fn division_by_zero_discards_the_write() {
        let (engine, mut store) = engine_and_store();
        store.set(keys::INVESTMENT_AMOUNT, "10".into()).unwrap();
        store.set(keys::POST_MONEY_VALUATION, "0".into()).unwrap();
        store.set(keys::OWNERSHIP, "12.50".into()).unwrap();

        let outcomes = engine.run(&mut store, None);
        assert!(outcomes.contains(&CalcOutcome::Undefined {
            rule: RuleId::Ownership
        }));
        assert_eq!(store.get(keys::OWNERSHIP), Some(&FieldValue::text("12.50")));
    }

    #[test]
    fn blank_and_unparsable_dependencies_skip() {
        let (engine, mut store) = engine_and_store();
        store.set(keys::INVESTMENT_AMOUNT, "  ".into()).unwrap();
        store.set(keys::PRICE_PER_SHARE, "오천".into()).unwrap();

        let outcomes = engine.run(&mut store, None);
        assert!(outcomes.contains(&CalcOutcome::MissingDependency {
            rule: RuleId::SharesAcquired,
            field: keys::INVESTMENT_AMOUNT,
        }));

        store.set(keys::INVESTMENT_AMOUNT, "10".into()).unwrap();
        let outcomes = engine.run(&mut store, None);
        assert!(outcomes.contains(&CalcOutcome::UnparsableInput {
            rule: RuleId::SharesAcquired,
            field: keys::PRICE_PER_SHARE,
        }));
        assert_eq!(store.get(keys::SHARES_ACQUIRED), Some(&FieldValue::Empty));
    }

    #[test]
    fn unit_change_redefines_shares_rule() {
        let (mut engine, mut store) = engine_and_store();
        store.set(keys::INVESTMENT_AMOUNT, "10".into()).unwrap();
        store.set(keys::PRICE_PER_SHARE, "5,000".into()).unwrap();

        let outcomes = engine.run(&mut store, None);
        assert_eq!(written(&outcomes, RuleId::SharesAcquired), Some("200,000"));

        engine.set_unit(CurrencyUnit::MillionWon);
        let outcomes = engine.run(&mut store, None);
        assert_eq!(written(&outcomes, RuleId::SharesAcquired), Some("2,000"));
        let rule = engine.rule(RuleId::SharesAcquired).unwrap();
        assert_eq!(rule.target(), keys::SHARES_ACQUIRED);
    }

    #[test]
    fn redefine_keeps_declaration() {
        let (mut engine, mut store) = engine_and_store();
        assert!(engine.redefine(RuleId::PreMoneyValuation, |_| Some(42.0)));
        store.set(keys::INVESTMENT_AMOUNT, "1".into()).unwrap();
        store.set(keys::POST_MONEY_VALUATION, "2".into()).unwrap();

        let outcomes = engine.run(&mut store, None);
        assert_eq!(written(&outcomes, RuleId::PreMoneyValuation), Some("42"));
        assert_eq!(
            engine.rule(RuleId::PreMoneyValuation).unwrap().dependencies(),
            RuleId::PreMoneyValuation.dependencies()
        );
    }

    #[test]
    fn rules_follow_layout_order() {
        let (engine, _) = engine_and_store();
        let targets: Vec<_> = engine.rules().map(CalculationRule::target).collect();
        assert_eq!(
            targets,
            vec![
                keys::PRE_MONEY_VALUATION,
                keys::SHARES_ACQUIRED,
                keys::OWNERSHIP,
                keys::TOTAL_SHARES_AFTER,
            ]
        );
        assert!(
            engine
                .rules()
                .all(|rule| !rule.dependencies().contains(&rule.target()))
        );
    }
}
