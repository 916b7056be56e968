//! Edit-cycle behaviour of the form controller.

use termsheet_engine::{
    ChangeSource, Clock, DocumentOutcome, EngineConfig, EngineError, FieldHandle, FormController,
    FormEvent, HeadlessView, Issue, ManualClock, NoticeLevel, StoreError, Task, TextDocument,
};
use termsheet_model::{CurrencyUnit, FieldKey, FieldSnapshot, FieldValue, keys};

fn form() -> (FormController, ManualClock) {
    let clock = ManualClock::default();
    let form = FormController::term_sheet(EngineConfig::default(), clock.clone()).unwrap();
    (form, clock)
}

fn value(form: &FormController, key: &str) -> FieldValue {
    form.store().get(key).cloned().unwrap_or_default()
}

fn text(value: &str) -> FieldValue {
    FieldValue::text(value)
}

fn fill_required(form: &mut FormController) {
    for (key, value) in [
        (keys::INVESTMENT_TARGET, "주식회사 가나다"),
        (keys::REPRESENTATIVE, "홍길동"),
        (keys::INVESTOR, "한빛벤처스"),
        (keys::CONTRACT_DATE, "2026-10-17"),
        (keys::INVESTMENT_TYPE, keys::COMMON_STOCK),
        (keys::INVESTMENT_AMOUNT, "10"),
        (keys::POST_MONEY_VALUATION, "100"),
        (keys::PRICE_PER_SHARE, "5000"),
    ] {
        form.on_change(key, value).unwrap();
    }
}

#[test]
fn ownership_from_amount_and_valuation() {
    let (mut form, _) = form();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    assert_eq!(value(&form, keys::OWNERSHIP), FieldValue::Empty);

    let outcome = form.on_change(keys::POST_MONEY_VALUATION, "100").unwrap();
    assert_eq!(value(&form, keys::OWNERSHIP), text("10.00"));
    assert_eq!(value(&form, keys::PRE_MONEY_VALUATION), text("90"));
    assert!(outcome.validation.is_valid);
    assert_eq!(outcome.calculations.iter().filter(|c| c.is_written()).count(), 2);
}

#[test]
fn shares_from_amount_and_price() {
    let (mut form, _) = form();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    form.on_change(keys::PRICE_PER_SHARE, "5,000").unwrap();
    assert_eq!(value(&form, keys::SHARES_ACQUIRED), text("200,000"));
}

#[test]
fn chained_field_fills_on_the_following_edit() {
    let (mut form, _) = form();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    form.on_change(keys::POST_MONEY_VALUATION, "100").unwrap();
    form.on_change(keys::PRICE_PER_SHARE, "5000").unwrap();

    // Every rule reads the same snapshot, taken before this edit's writes.
    assert_eq!(value(&form, keys::SHARES_ACQUIRED), text("200,000"));
    assert_eq!(value(&form, keys::TOTAL_SHARES_AFTER), FieldValue::Empty);

    form.on_change(keys::SPECIAL_TERMS, "없음").unwrap();
    assert_eq!(value(&form, keys::TOTAL_SHARES_AFTER), text("2,000,000"));

    // Further edits converge on the same values.
    form.on_change(keys::SPECIAL_TERMS, "해당 없음").unwrap();
    assert_eq!(value(&form, keys::TOTAL_SHARES_AFTER), text("2,000,000"));
    assert_eq!(value(&form, keys::OWNERSHIP), text("10.00"));
}

#[test]
fn zero_valuation_keeps_previous_result() {
    let (mut form, _) = form();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    form.on_change(keys::POST_MONEY_VALUATION, "100").unwrap();
    form.on_change(keys::POST_MONEY_VALUATION, "0").unwrap();
    assert_eq!(value(&form, keys::OWNERSHIP), text("10.00"));
}

#[test]
fn investment_type_drives_visibility_and_labels() {
    let (mut form, _) = form();
    assert!(!form.store().is_visible(keys::REDEMPTION_INTEREST));
    assert!(!form.store().is_visible(keys::RESIDUAL_INTEREST));
    assert!(form.store().is_visible(keys::DIVIDEND_RATE));

    form.on_change(keys::INVESTMENT_TYPE, keys::COMMON_STOCK).unwrap();
    assert!(!form.store().is_visible(keys::REDEMPTION_INTEREST));
    assert!(!form.store().is_visible(keys::RESIDUAL_INTEREST));
    assert!(form.store().is_visible(keys::DIVIDEND_RATE));

    let outcome = form
        .on_change(keys::INVESTMENT_TYPE, keys::CONVERTIBLE_BOND)
        .unwrap();
    assert!(form.store().is_visible(keys::REDEMPTION_INTEREST));
    assert!(!form.store().is_visible(keys::RESIDUAL_INTEREST));
    assert!(!form.store().is_visible(keys::DIVIDEND_RATE));
    assert_eq!(form.store().field(keys::SHARES_ACQUIRED).unwrap().label, "전환주식수");
    assert_eq!(form.store().field(keys::OWNERSHIP).unwrap().label, "전환시지분율");
    assert_eq!(outcome.visibility.labels.len(), 2);

    form.on_change(keys::INVESTMENT_TYPE, keys::COMMON_STOCK).unwrap();
    assert_eq!(form.store().field(keys::SHARES_ACQUIRED).unwrap().label, "인수주식수");
    assert_eq!(form.store().field(keys::OWNERSHIP).unwrap().label, "지분율");
}

#[test]
fn hiding_a_field_keeps_its_value() {
    let (mut form, _) = form();
    form.on_change(
        keys::INVESTMENT_TYPE,
        keys::REDEEMABLE_CONVERTIBLE_PREFERRED,
    )
    .unwrap();
    form.on_change(keys::RESIDUAL_INTEREST, "5").unwrap();
    form.on_change(keys::INVESTMENT_TYPE, keys::COMMON_STOCK).unwrap();

    assert!(!form.store().is_visible(keys::RESIDUAL_INTEREST));
    assert_eq!(
        form.get_all_field_values().get(keys::RESIDUAL_INTEREST),
        Some(&text("5"))
    );
    assert!(
        !form
            .visible_fields()
            .iter()
            .any(|k| k.as_str() == keys::RESIDUAL_INTEREST)
    );
}

#[test]
fn validity_flips_on_the_next_debounced_pass() {
    let (mut form, clock) = form();
    assert!(form.state().is_valid);

    form.on_change(keys::INVESTMENT_TARGET, "").unwrap();
    clock.advance_ms(500);
    assert_eq!(form.tick(), vec![Task::Validation]);
    assert!(!form.state().is_valid);
    assert!(form.state().validation_errors.contains_key(keys::INVESTMENT_TARGET));

    fill_required(&mut form);
    assert!(!form.state().is_valid);
    assert_eq!(form.pending(Task::Validation), Some(clock.now() + chrono::Duration::milliseconds(500)));

    clock.advance_ms(499);
    assert!(form.tick().is_empty());
    clock.advance_ms(1);
    form.tick();
    assert!(form.state().is_valid);
    assert!(form.state().validation_errors.is_empty());
}

#[test]
fn rapid_edits_collapse_into_one_validation() {
    let (mut form, clock) = form();
    form.on_change(keys::POST_MONEY_VALUATION, "100").unwrap();
    let events = form.subscribe();
    // Only the last amount exceeds the valuation.
    for amount in ["1", "10", "50", "100", "1000"] {
        form.on_change(keys::INVESTMENT_AMOUNT, amount).unwrap();
        clock.advance_ms(100);
        form.tick();
    }
    clock.advance_ms(500);
    form.tick();

    let completed = events
        .try_iter()
        .filter(|e| matches!(e, FormEvent::ValidationCompleted { .. }))
        .count();
    assert_eq!(completed, 1);
    assert_eq!(form.validation_runs(), 1);

    let amount = form
        .last_validation()
        .and_then(|summary| summary.field(keys::INVESTMENT_AMOUNT))
        .unwrap();
    assert!(!amount.is_valid);
    assert!(
        amount
            .issues
            .iter()
            .any(|i| matches!(i, Issue::AmountExceedsValuation { .. }))
    );
}

#[test]
fn one_state_notification_per_cycle() {
    let (mut form, clock) = form();
    form.on_frame();
    let events = form.subscribe();

    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    clock.advance_ms(500);
    assert_eq!(form.tick(), vec![Task::Validation]);
    assert_eq!(form.on_frame(), Some(100.0 / 14.0));

    let states: Vec<_> = events
        .try_iter()
        .filter_map(|e| match e {
            FormEvent::FormStateChanged {
                is_dirty, is_valid, ..
            } => Some((is_dirty, is_valid)),
            _ => None,
        })
        .collect();
    assert_eq!(states, vec![(true, false)]);

    // Without a pending frame the validation pass publishes on its own.
    form.on_change(keys::INVESTMENT_AMOUNT, "20").unwrap();
    form.on_frame();
    clock.advance_ms(500);
    form.tick();
    let published = events
        .try_iter()
        .filter(|e| matches!(e, FormEvent::FormStateChanged { .. }))
        .count();
    assert_eq!(published, 2);
}

#[test]
fn huge_share_counts_keep_every_digit() {
    let (mut form, _) = form();
    form.on_change(keys::INVESTMENT_AMOUNT, "100000000000").unwrap();
    form.on_change(keys::PRICE_PER_SHARE, "1").unwrap();
    assert_eq!(
        value(&form, keys::SHARES_ACQUIRED),
        text("10,000,000,000,000,000,000")
    );
}

#[test]
fn edits_publish_field_changes_in_order() {
    let (mut form, _) = form();
    let events = form.subscribe();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    form.on_change(keys::POST_MONEY_VALUATION, "100").unwrap();

    let sources: Vec<_> = events
        .try_iter()
        .filter_map(|e| match e {
            FormEvent::FieldChanged { field, source, .. } => Some((field.to_string(), source)),
            _ => None,
        })
        .collect();
    assert_eq!(
        sources,
        vec![
            (keys::INVESTMENT_AMOUNT.to_string(), ChangeSource::User),
            (keys::POST_MONEY_VALUATION.to_string(), ChangeSource::User),
            (keys::PRE_MONEY_VALUATION.to_string(), ChangeSource::Calculation),
            (keys::OWNERSHIP.to_string(), ChangeSource::Calculation),
        ]
    );
}

#[test]
fn calculated_and_unknown_fields_reject_edits() {
    let (mut form, _) = form();
    assert!(matches!(
        form.on_change(keys::OWNERSHIP, "50"),
        Err(EngineError::ReadOnlyField(key)) if key == keys::OWNERSHIP
    ));
    assert!(matches!(
        form.on_change("없는필드", "1"),
        Err(EngineError::Store(StoreError::UnknownField(_)))
    ));
    assert!(form.history().is_empty());
    assert!(!form.state().is_dirty);
}

#[test]
fn history_records_immediate_validity() {
    let (mut form, _) = form();
    form.on_change(keys::INVESTMENT_AMOUNT, "abc").unwrap();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();

    let records: Vec<_> = form.history().for_field(keys::INVESTMENT_AMOUNT).collect();
    assert_eq!(records.len(), 2);
    assert!(!records[0].success);
    assert!(records[1].success);
    assert!(records.iter().all(|r| r.session_id == form.session_id()));
    assert!(form.state().is_dirty);
}

#[test]
fn unit_change_recalculates_shares() {
    let (mut form, _) = form();
    let events = form.subscribe();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    form.on_change(keys::PRICE_PER_SHARE, "5000").unwrap();
    assert_eq!(value(&form, keys::SHARES_ACQUIRED), text("200,000"));

    form.change_unit(CurrencyUnit::MillionWon);
    assert_eq!(form.unit(), CurrencyUnit::MillionWon);
    assert_eq!(value(&form, keys::SHARES_ACQUIRED), text("2,000"));
    assert!(events.try_iter().any(|e| matches!(
        e,
        FormEvent::UnitChanged {
            unit: CurrencyUnit::MillionWon
        }
    )));

    assert!(form.change_unit(CurrencyUnit::MillionWon).is_empty());
}

#[test]
fn completion_rate_updates_once_per_frame() {
    let (mut form, _) = form();
    // Initial frame.
    assert_eq!(form.on_frame(), Some(0.0));
    assert_eq!(form.on_frame(), None);

    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    form.on_change(keys::POST_MONEY_VALUATION, "100").unwrap();
    let rate = form.on_frame().unwrap();
    // 투자금액, 투자후가치, 투자전가치, 지분율 out of 14 visible fields.
    assert!((rate - 400.0 / 14.0).abs() < 1e-9);
    assert_eq!(form.state().completion_rate, rate);
    assert_eq!(form.on_frame(), None);
}

#[test]
fn view_mirrors_the_store() {
    let view = HeadlessView::new();
    let (form, _) = form();
    let mut form = form.with_view(view.clone());
    assert_eq!(view.len(), form.store().len());
    assert!(!view.widget(keys::REDEMPTION_INTEREST).unwrap().visible);
    assert!(view.widget(keys::OWNERSHIP).unwrap().readonly);

    let handle = view.handle(keys::INVESTMENT_TYPE).unwrap();
    form.on_view_change(handle, keys::CONVERTIBLE_BOND).unwrap();
    assert!(view.widget(keys::REDEMPTION_INTEREST).unwrap().visible);
    assert_eq!(view.widget(keys::SHARES_ACQUIRED).unwrap().label, "전환주식수");

    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    form.on_change(keys::POST_MONEY_VALUATION, "100").unwrap();
    assert_eq!(view.widget(keys::OWNERSHIP).unwrap().value, text("10.00"));

    assert!(matches!(
        form.on_view_change(FieldHandle(999), "1"),
        Err(EngineError::UnknownHandle(FieldHandle(999)))
    ));
}

#[test]
fn populate_accepts_calculated_values_and_skips_unknown_keys() {
    let (mut form, clock) = form();
    let snapshot: FieldSnapshot = [
        (keys::INVESTMENT_TYPE, text(keys::CONVERTIBLE_BOND)),
        (keys::INVESTMENT_AMOUNT, FieldValue::Number(10.0)),
        (keys::POST_MONEY_VALUATION, text("100")),
        (keys::TOTAL_SHARES_AFTER, text("1,234")),
        ("없는필드", text("x")),
    ]
    .into_iter()
    .map(|(k, v)| (FieldKey::new(k).unwrap(), v))
    .collect();

    let report = form.populate_form(&snapshot);
    assert_eq!(report.applied, 4);
    assert_eq!(report.unknown, vec!["없는필드".to_string()]);
    assert_eq!(value(&form, keys::OWNERSHIP), text("10.00"));
    // Inputs for this rule are missing, so the loaded value stays.
    assert_eq!(value(&form, keys::TOTAL_SHARES_AFTER), text("1,234"));
    assert!(form.store().is_visible(keys::REDEMPTION_INTEREST));
    assert_eq!(form.store().field(keys::OWNERSHIP).unwrap().label, "전환시지분율");
    assert!(!form.state().is_dirty);
    assert!(form.history().is_empty());
    assert_eq!(
        form.pending(Task::Validation),
        Some(clock.now() + chrono::Duration::milliseconds(500))
    );
}

#[test]
fn document_is_refused_while_invalid() {
    let (mut form, _) = form();
    let events = form.subscribe();
    let mut generator = TextDocument::new("투자계약 조건");

    match form.generate_document(&mut generator) {
        DocumentOutcome::Refused { errors } => {
            assert!(errors.iter().any(|e| e.starts_with("투자대상:")));
        }
        other => panic!("expected refusal, got {other:?}"),
    }
    assert!(events.try_iter().any(|e| matches!(
        e,
        FormEvent::Notice {
            level: NoticeLevel::Warning,
            ..
        }
    )));

    fill_required(&mut form);
    let DocumentOutcome::Generated(document) = form.generate_document(&mut generator) else {
        panic!("expected a document");
    };
    let content = String::from_utf8(document.content).unwrap();
    assert_eq!(document.file_name, "투자계약 조건.txt");
    assert!(content.starts_with("투자계약 조건\n"));
    assert!(content.contains("투자대상: 주식회사 가나다\n"));
    assert!(content.contains("지분율: 10.00\n"));
    assert!(form.pending(Task::Validation).is_none());
}

#[test]
fn clear_restores_defaults_and_keeps_history() {
    let view = HeadlessView::new();
    let (form, _) = form();
    let mut form = form.with_view(view.clone());
    form.on_change(keys::INVESTMENT_TYPE, keys::CONVERTIBLE_BOND).unwrap();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();

    form.clear();
    assert!(!form.store().has_any_value());
    assert!(!form.state().is_dirty);
    assert!(form.state().is_valid);
    assert!(!form.store().is_visible(keys::REDEMPTION_INTEREST));
    assert_eq!(form.store().field(keys::SHARES_ACQUIRED).unwrap().label, "인수주식수");
    assert_eq!(view.widget(keys::INVESTMENT_AMOUNT).unwrap().value, FieldValue::Empty);
    assert!(!view.widget(keys::REDEMPTION_INTEREST).unwrap().visible);
    assert_eq!(form.history().len(), 2);
    assert!(form.pending(Task::Validation).is_none());
}

#[test]
fn rebuild_recomputes_validity_from_values() {
    let (mut form, _) = form();
    fill_required(&mut form);
    form.rebuild_derived_state();
    assert!(form.state().is_valid);
    assert_eq!(form.validation_runs(), 1);
    assert_eq!(
        form.last_validation().map(|s| s.total_fields),
        Some(form.store().visible_keys().len())
    );
}
