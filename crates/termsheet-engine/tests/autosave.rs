//! Draft auto-save driven through the controller's scheduler.

use chrono::Duration;
use termsheet_engine::{Clock, EngineConfig, FormController, FormEvent, ManualClock, NoticeLevel, Task};
use termsheet_model::{FieldSnapshot, FieldValue, keys};
use termsheet_persistence::{FormPersistence, JsonDraftStore, MemoryStore, PersistenceError};

fn form_with(store: impl FormPersistence + 'static) -> (FormController, ManualClock) {
    let clock = ManualClock::default();
    let form = FormController::term_sheet(EngineConfig::default(), clock.clone())
        .unwrap()
        .with_persistence(store);
    (form, clock)
}

struct UnavailableStore;

impl FormPersistence for UnavailableStore {
    fn save(&mut self, _values: &FieldSnapshot) -> termsheet_persistence::Result<()> {
        Err(PersistenceError::Unavailable {
            reason: "disk full".into(),
        })
    }

    fn load(&mut self) -> termsheet_persistence::Result<Option<FieldSnapshot>> {
        Ok(None)
    }
}

#[test]
fn saves_after_the_quiet_period() {
    let store = MemoryStore::new();
    let (mut form, clock) = form_with(store.clone());
    let events = form.subscribe();

    form.on_change(keys::INVESTMENT_TARGET, "주식회사 가나다").unwrap();
    assert_eq!(form.pending(Task::AutoSave), Some(clock.now() + Duration::seconds(30)));

    clock.advance(Duration::seconds(29));
    form.tick();
    assert_eq!(store.save_count(), 0);

    clock.advance(Duration::seconds(1));
    assert!(form.tick().contains(&Task::AutoSave));
    assert_eq!(store.save_count(), 1);
    assert_eq!(
        store.saved().unwrap().get(keys::INVESTMENT_TARGET),
        Some(&FieldValue::text("주식회사 가나다"))
    );
    assert!(events
        .try_iter()
        .any(|e| matches!(e, FormEvent::DraftSaved { fields: 16, .. })));
    assert!(form.pending(Task::AutoSave).is_none());
}

#[test]
fn saving_clears_the_dirty_flag() {
    let store = MemoryStore::new();
    let (mut form, clock) = form_with(store.clone());
    let events = form.subscribe();

    form.on_change(keys::INVESTMENT_TARGET, "주식회사 가나다").unwrap();
    form.on_frame();
    assert!(form.state().is_dirty);
    clock.advance(Duration::seconds(30));
    form.tick();
    assert_eq!(store.save_count(), 1);
    assert!(!form.state().is_dirty);
    let last_state = events.try_iter().filter_map(|e| match e {
        FormEvent::FormStateChanged { is_dirty, .. } => Some(is_dirty),
        _ => None,
    });
    assert_eq!(last_state.last(), Some(false));

    form.on_change(keys::INVESTOR, "한빛벤처스").unwrap();
    assert!(form.state().is_dirty);
    form.save_now().unwrap();
    assert_eq!(store.save_count(), 2);
    assert!(!form.state().is_dirty);
    assert!(form.pending(Task::AutoSave).is_none());
}

#[test]
fn continuous_typing_saves_at_the_max_delay() {
    let store = MemoryStore::new();
    let (mut form, clock) = form_with(store.clone());

    let mut saved_at = None;
    for step in 0..10 {
        form.on_change(keys::SPECIAL_TERMS, format!("조항 {step}"))
            .unwrap();
        clock.advance(Duration::seconds(20));
        form.tick();
        if saved_at.is_none() && store.save_count() > 0 {
            saved_at = Some(clock.now());
        }
    }

    // Edits every 20 s never leave a 30 s gap; the 120 s cap forces a save.
    assert_eq!(
        saved_at,
        Some(chrono::DateTime::UNIX_EPOCH + Duration::seconds(120))
    );
}

#[test]
fn empty_form_is_not_saved() {
    let store = MemoryStore::new();
    let (mut form, clock) = form_with(store.clone());

    form.on_change(keys::INVESTMENT_TARGET, "  ").unwrap();
    clock.advance(Duration::seconds(30));
    form.tick();

    assert_eq!(store.save_count(), 0);
    assert!(form.pending(Task::AutoSave).is_none());
    assert!(!form.state().is_dirty);
}

#[test]
fn failed_save_notifies_and_waits_for_the_next_edit() {
    let (mut form, clock) = form_with(UnavailableStore);
    let events = form.subscribe();

    form.on_change(keys::INVESTMENT_TARGET, "주식회사 가나다").unwrap();
    clock.advance(Duration::seconds(30));
    form.tick();

    let notice = events.try_iter().find_map(|e| match e {
        FormEvent::Notice { level, message } => Some((level, message)),
        _ => None,
    });
    assert_eq!(
        notice,
        Some((
            NoticeLevel::Warning,
            "Draft storage is unavailable: disk full".to_string()
        ))
    );
    assert!(form.pending(Task::AutoSave).is_none());
    assert!(form.state().is_dirty);

    form.on_change(keys::INVESTOR, "한빛벤처스").unwrap();
    assert!(form.pending(Task::AutoSave).is_some());
}

#[test]
fn disabled_autosave_schedules_nothing() {
    let clock = ManualClock::default();
    let config = EngineConfig::from_toml_str("[autosave]\nenabled = false\n").unwrap();
    let store = MemoryStore::new();
    let mut form = FormController::term_sheet(config, clock.clone())
        .unwrap()
        .with_persistence(store.clone());

    form.on_change(keys::INVESTMENT_TARGET, "주식회사 가나다").unwrap();
    clock.advance(Duration::minutes(5));
    form.tick();
    assert!(form.pending(Task::AutoSave).is_none());
    assert_eq!(store.save_count(), 0);
}

#[test]
fn draft_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drafts").join("term_sheet.json");

    let (mut form, _) = form_with(JsonDraftStore::new(&path));
    form.on_change(keys::INVESTMENT_TYPE, keys::CONVERTIBLE_BOND).unwrap();
    form.on_change(keys::INVESTMENT_AMOUNT, "10").unwrap();
    form.on_change(keys::POST_MONEY_VALUATION, "100").unwrap();
    form.save_now().unwrap();
    assert!(path.exists());

    let (mut restored, _) = form_with(JsonDraftStore::new(&path));
    let report = restored.restore_draft().unwrap().unwrap();
    assert_eq!(report.applied, 16);
    assert!(report.unknown.is_empty());
    assert_eq!(restored.get_all_field_values(), form.get_all_field_values());
    assert!(restored.store().is_visible(keys::REDEMPTION_INTEREST));
}

#[test]
fn restore_without_a_draft_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let (mut form, _) = form_with(JsonDraftStore::new(dir.path().join("missing.json")));
    assert!(form.restore_draft().unwrap().is_none());
}
