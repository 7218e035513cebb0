//! Cross-context behaviour
//!
//! Exercises several tabs attached to one origin: global visibility, local
//! isolation, change events and their delivery rules.

use crosstab::{
    ChangeEvent, InitOutcome, ResetOptions, Scope, SharedStore, SharedStoreEffects, StoreConfig,
    StoreError,
};
use crosstab_effects::Origin;
use crosstab_testkit::{init_test_tracing, EventLog, TabSet};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn config() -> StoreConfig {
    StoreConfig::new("editor")
        .with_global("count", 0)
        .with_global("version", "1.1.4")
        .with_local("panel", json!({"open": false}))
}

#[test]
fn test_global_write_is_visible_and_signalled() {
    init_test_tracing();
    let tabs = TabSet::new(2, &config()).unwrap();
    let (a, b) = (tabs.tab(0), tabs.tab(1));

    let log = EventLog::new();
    b.listen_to("count", log.listener()).unwrap();

    a.set("count", json!(7), Scope::Global).unwrap();

    // The value is readable immediately, the event arrives when b pumps.
    assert_eq!(b.get("count", Scope::Global).unwrap(), Some(json!(7)));
    assert!(log.is_empty());

    assert_eq!(b.process_pending(), 1);
    let event = log.last().unwrap();
    assert_eq!(event.name(), "editor.count");
    assert_eq!(event.key(), Some("count"));
    assert_eq!(event.from(), Some(&json!(0)));
    assert_eq!(event.to(), Some(&json!(7)));
    assert_eq!(event.data(), Some(&json!(7)));
    assert_eq!(event.origin(), a.context_id());
    assert_eq!(event.page(), "https://app.test/tab-0");
}

#[test]
fn test_writer_does_not_hear_itself() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let a = tabs.tab(0);

    let log = EventLog::new();
    a.listen_to("count", log.listener()).unwrap();
    a.set("count", json!(1), Scope::Global).unwrap();

    assert_eq!(a.process_pending(), 0);
    assert!(log.is_empty());
}

#[test]
fn test_local_variables_stay_local() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let (a, b) = (tabs.tab(0), tabs.tab(1));

    let log = EventLog::new();
    b.listen_to("secret", log.listener()).unwrap();

    a.set("secret", json!("a-only"), Scope::Local).unwrap();
    tabs.pump_all();

    assert_eq!(a.get_local("secret").unwrap(), Some(json!("a-only")));
    assert_eq!(b.get_local("secret").unwrap(), None);
    assert_eq!(b.get("secret", Scope::Global).unwrap(), None);
    assert!(log.is_empty());
    let observer = tabs.origin().attach("observer");
    assert!(!observer.keys().unwrap().contains(&"secret".to_string()));
}

#[test]
fn test_every_other_tab_is_notified_in_order() {
    let tabs = TabSet::new(3, &config()).unwrap();
    let logs: Vec<EventLog> = (1..3)
        .map(|i| {
            let log = EventLog::new();
            tabs.tab(i).listen_to("count", log.listener()).unwrap();
            log
        })
        .collect();

    for n in 1..=3 {
        tabs.tab(0).set("count", json!(n), Scope::Global).unwrap();
    }
    tabs.pump_all();

    for log in &logs {
        let seen: Vec<_> = log.events().iter().map(|e| e.to().cloned()).collect();
        assert_eq!(seen, vec![Some(json!(1)), Some(json!(2)), Some(json!(3))]);
    }
}

#[test]
fn test_delete_signals_missing_new_value() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let log = EventLog::new();
    tabs.tab(1).listen_to("version", log.listener()).unwrap();

    tabs.tab(0).delete("version").unwrap();
    tabs.pump_all();

    let event = log.last().unwrap();
    assert_eq!(event.from(), Some(&json!("1.1.4")));
    assert_eq!(event.to(), None);
}

#[test]
fn test_init_is_idempotent_across_configs() {
    let tabs = TabSet::uninitialized(1);
    let tab = tabs.tab(0);

    assert_eq!(tab.init(config()).unwrap(), InitOutcome::Seeded);
    let other = StoreConfig::new("other")
        .with_global("count", 99)
        .with_local("panel", json!(null));
    assert_eq!(tab.init(other).unwrap(), InitOutcome::AlreadyInitialized);

    assert_eq!(tab.app_name(), Some("editor"));
    assert_eq!(tab.get("count", Scope::Global).unwrap(), Some(json!(0)));
    assert_eq!(tab.get_local("panel").unwrap(), Some(json!({"open": false})));
    assert_eq!(tabs.origin().subscriber_count(), 1);
}

#[test]
fn test_later_tab_keeps_existing_globals() {
    let mut tabs = TabSet::new(1, &config()).unwrap();
    tabs.tab(0).set("count", json!(12), Scope::Global).unwrap();

    let late = tabs.open_tab();
    assert_eq!(late.init(config()).unwrap(), InitOutcome::AlreadySeeded);
    assert_eq!(late.get("count", Scope::Global).unwrap(), Some(json!(12)));
    assert_eq!(late.get_local("panel").unwrap(), Some(json!({"open": false})));
}

#[test]
fn test_events_before_init_are_not_received() {
    let tabs = TabSet::uninitialized(2);
    let (a, b) = (tabs.tab(0), tabs.tab(1));
    a.init(config()).unwrap();

    a.set("count", json!(1), Scope::Global).unwrap();
    b.init(config()).unwrap();

    let log = EventLog::new();
    b.listen_to("count", log.listener()).unwrap();
    assert_eq!(b.process_pending(), 0);

    a.set("count", json!(2), Scope::Global).unwrap();
    assert_eq!(b.process_pending(), 1);
    assert_eq!(log.last().unwrap().from(), Some(&json!(1)));
}

#[test]
fn test_listener_panic_does_not_stop_delivery() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let b = tabs.tab(1);

    let log = EventLog::new();
    b.listen_to("count", |_event| panic!("listener bug")).unwrap();
    b.listen_to("count", log.listener()).unwrap();

    tabs.tab(0).set("count", json!(1), Scope::Global).unwrap();
    tabs.tab(0).set("count", json!(2), Scope::Global).unwrap();

    assert_eq!(b.process_pending(), 2);
    assert_eq!(log.len(), 2);
}

#[test]
fn test_cancel_stops_later_listeners_only() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let (a, b) = (tabs.tab(0), tabs.tab(1));

    let log = EventLog::new();
    b.listen_to("count", |event| event.cancel()).unwrap();
    b.listen_to("count", log.listener()).unwrap();

    a.set("count", json!(3), Scope::Global).unwrap();
    b.process_pending();

    assert!(log.is_empty());
    assert_eq!(b.get("count", Scope::Global).unwrap(), Some(json!(3)));
}

#[test]
fn test_duplicate_listeners_and_unlisten() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let b = tabs.tab(1);

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = {
        let hits = hits.clone();
        move |_event: &mut ChangeEvent| {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    };
    let first = b.listen_to("count", counter.clone()).unwrap();
    b.listen_to("count", counter).unwrap();
    assert_eq!(b.listener_count("count"), 2);

    tabs.tab(0).set("count", json!(1), Scope::Global).unwrap();
    b.process_pending();
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    assert!(b.unlisten(first));
    tabs.tab(0).set("count", json!(2), Scope::Global).unwrap();
    b.process_pending();
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_malformed_raw_write_reaches_listeners_as_missing() {
    let tabs = TabSet::new(1, &config()).unwrap();
    let b = tabs.tab(0);
    let log = EventLog::new();
    b.listen_to("count", log.listener()).unwrap();

    let raw = tabs.origin().attach("legacy");
    raw.raw_set("count", "not json".to_string()).unwrap();

    assert_eq!(b.process_pending(), 1);
    let event = log.last().unwrap();
    assert_eq!(event.from(), Some(&json!(0)));
    assert_eq!(event.to(), None);
    assert!(matches!(
        b.get("count", Scope::Global),
        Err(StoreError::Decode { .. })
    ));
}

#[test]
fn test_reset_wipe_clears_other_tabs_view() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let (a, b) = (tabs.tab(0), tabs.tab(1));

    let cleared = EventLog::new();
    b.listen_to_clear(cleared.listener()).unwrap();

    a.set("extra", json!([1, 2]), Scope::Global).unwrap();
    a.set_local("scratch", json!("x")).unwrap();
    a.reset(ResetOptions::wipe_all()).unwrap();
    tabs.pump_all();

    assert_eq!(a.get("extra", Scope::Global).unwrap(), None);
    assert_eq!(b.get("extra", Scope::Global).unwrap(), None);
    assert_eq!(a.get_local("scratch").unwrap(), None);
    assert_eq!(a.get_local("panel").unwrap(), Some(json!({"open": false})));
    assert_eq!(b.get("count", Scope::Global).unwrap(), Some(json!(0)));

    let event = cleared.last().unwrap();
    assert_eq!(event.name(), "editor.*");
    assert_eq!(event.key(), None);
}

#[test]
fn test_star_key_and_clear_listeners_stay_apart() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let (a, b) = (tabs.tab(0), tabs.tab(1));

    let cleared = EventLog::new();
    let star = EventLog::new();
    b.listen_to_clear(cleared.listener()).unwrap();
    b.listen_to("*", star.listener()).unwrap();

    a.set("*", json!(1), Scope::Global).unwrap();
    tabs.pump_all();
    assert!(cleared.is_empty());
    assert_eq!(star.last().unwrap().key(), Some("*"));

    a.reset(ResetOptions {
        wipe: true,
        ..ResetOptions::default()
    })
    .unwrap();
    tabs.pump_all();
    assert_eq!(cleared.len(), 1);
    assert_eq!(cleared.last().unwrap().key(), None);
    assert_eq!(star.len(), 1);
}

#[test]
fn test_persisted_globals_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("origin.json");

    {
        let tab = SharedStore::new(Origin::open(&path).unwrap().attach("first-run"));
        tab.init(config()).unwrap();
        tab.set("count", json!(41), Scope::Global).unwrap();
        tab.set_local("panel", json!("gone after restart")).unwrap();
    }

    let tab = SharedStore::new(Origin::open(&path).unwrap().attach("second-run"));
    assert_eq!(tab.init(config()).unwrap(), InitOutcome::AlreadySeeded);
    assert_eq!(tab.get("count", Scope::Global).unwrap(), Some(json!(41)));
    assert_eq!(tab.get_local("panel").unwrap(), Some(json!({"open": false})));
}

#[tokio::test]
async fn test_async_pump_delivers_next_signal() {
    let tabs = TabSet::new(2, &config()).unwrap();
    let log = EventLog::new();
    tabs.tab(1).listen_to("count", log.listener()).unwrap();

    tabs.tab(0).set("count", json!(5), Scope::Global).unwrap();
    let report = tabs.tab(1).process_next().await.unwrap().unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(log.last().unwrap().to(), Some(&json!(5)));
}
