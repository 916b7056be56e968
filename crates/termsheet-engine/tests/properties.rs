//! Property tests over arbitrary edit sequences.

use proptest::prelude::*;
use termsheet_engine::{EngineConfig, FieldEntry, FormController, ManualClock};
use termsheet_model::keys;

const EDITABLE: [&str; 8] = [
    keys::INVESTMENT_TYPE,
    keys::INVESTMENT_AMOUNT,
    keys::POST_MONEY_VALUATION,
    keys::PRICE_PER_SHARE,
    keys::REDEMPTION_INTEREST,
    keys::DIVIDEND_RATE,
    keys::INVESTOR,
    keys::SPECIAL_TERMS,
];

fn edit() -> impl Strategy<Value = (usize, String)> {
    (
        0..EDITABLE.len(),
        prop_oneof![
            Just(String::new()),
            Just(keys::COMMON_STOCK.to_string()),
            Just(keys::CONVERTIBLE_BOND.to_string()),
            (0u32..1_000_000).prop_map(|n| n.to_string()),
            "[가-힣a-z ]{0,8}",
        ],
    )
}

fn run(edits: &[(usize, String)]) -> FormController {
    let clock = ManualClock::default();
    let mut form = FormController::term_sheet(EngineConfig::default(), clock.clone()).unwrap();
    for (index, value) in edits {
        form.on_change(EDITABLE[*index], value.as_str()).unwrap();
        clock.advance_ms(200);
        form.tick();
    }
    form
}

proptest! {
    #[test]
    fn completion_rate_stays_in_bounds(edits in prop::collection::vec(edit(), 0..30)) {
        let mut form = run(&edits);
        let rate = form.on_frame().unwrap();
        prop_assert!((0.0..=100.0).contains(&rate));

        let visible = form.visible_fields();
        let all_filled = !visible.is_empty()
            && visible
                .iter()
                .all(|k| form.store().field(k.as_str()).is_some_and(FieldEntry::is_filled));
        prop_assert_eq!(rate == 100.0, all_filled);
    }

    #[test]
    fn same_edits_give_same_values(edits in prop::collection::vec(edit(), 0..30)) {
        let first = run(&edits);
        let second = run(&edits);
        prop_assert_eq!(first.get_all_field_values(), second.get_all_field_values());
        prop_assert_eq!(first.store().visible_keys(), second.store().visible_keys());
    }

    #[test]
    fn hidden_fields_are_never_validated(edits in prop::collection::vec(edit(), 0..30)) {
        let mut form = run(&edits);
        let summary = form.flush_validation();
        let visible = form.store().visible_keys();
        prop_assert_eq!(summary.total_fields, visible.len());
        for (key, _) in &summary.fields {
            prop_assert!(visible.contains(key));
        }
    }
}
