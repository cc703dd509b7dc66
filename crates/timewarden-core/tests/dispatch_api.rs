//! Message-surface tests: the request/response contract UI collaborators
//! depend on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use timewarden_core::alarms::AlarmName;
use timewarden_core::browser::BrowserHandles;
use timewarden_core::clock::{Clock, ManualClock};
use timewarden_core::config::{GlobalSettings, HostnameConfig};
use timewarden_core::engine::Engine;
use timewarden_core::simulation::FakeBrowser;
use timewarden_core::storage::{MemoryKv, Storage};
use timewarden_core::{Request, Response};

fn start_time() -> DateTime<Utc> {
    "2026-08-02T09:00:00Z".parse().unwrap()
}

fn setup() -> (Arc<ManualClock>, Arc<FakeBrowser>, Storage, Engine) {
    let clock = ManualClock::at(start_time());
    let browser = FakeBrowser::new();
    let storage = Storage::new(MemoryKv::new());
    let engine = Engine::new(
        clock.clone(),
        storage.clone(),
        BrowserHandles::from_host(browser.clone()),
        "ext://warden",
    );
    (clock, browser, storage, engine)
}

fn seeded() -> (Arc<ManualClock>, Arc<FakeBrowser>, Storage, Engine) {
    let (clock, browser, storage, mut engine) = setup();
    storage
        .save_configs(&[HostnameConfig::new("a.test", 3600, 0)])
        .unwrap();
    storage.save_settings(&GlobalSettings::default()).unwrap();
    browser.add_tab(1, "https://a.test/", 10, true);
    browser.set_focused_window(Some(10));
    engine.initialize();
    (clock, browser, storage, engine)
}

#[test]
fn settings_roundtrip_through_the_surface() {
    let (_clock, _browser, _storage, mut engine) = seeded();

    let mut settings = GlobalSettings::default();
    settings.reset_time = "06:30".into();
    settings.grace_period_seconds = 15;
    let response = engine.handle_request(Request::SaveSettings {
        settings: settings.clone(),
    });
    assert!(matches!(response, Response::Ack { ok: true }));

    match engine.handle_request(Request::GetSettings) {
        Response::Settings(loaded) => assert_eq!(loaded, settings),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn invalid_settings_come_back_as_a_typed_error() {
    let (_clock, _browser, _storage, mut engine) = seeded();

    let mut settings = GlobalSettings::default();
    settings.reset_time = "25:99".into();
    match engine.handle_request(Request::SaveSettings { settings }) {
        Response::Error { error, request_type } => {
            assert!(error.contains("25:99"));
            assert_eq!(request_type, "SaveSettings");
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn save_config_normalizes_the_hostname() {
    let (_clock, _browser, _storage, mut engine) = setup();
    engine.initialize();

    let config = HostnameConfig::new("  News.Site.test  ", 600, 0);
    let response = engine.handle_request(Request::SaveHostnameConfig { config });
    assert!(matches!(response, Response::Ack { ok: true }));

    match engine.handle_request(Request::GetHostnameConfigs) {
        Response::Configs(configs) => {
            assert_eq!(configs.len(), 1);
            assert_eq!(configs[0].hostname, "news.site.test");
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn save_config_rejects_out_of_range_limits() {
    let (_clock, _browser, _storage, mut engine) = setup();
    engine.initialize();

    let config = HostnameConfig::new("a.test", 100_000, 0);
    match engine.handle_request(Request::SaveHostnameConfig { config }) {
        Response::Error { request_type, .. } => {
            assert_eq!(request_type, "SaveHostnameConfig")
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn newly_saved_hostname_starts_tracking_open_tabs() {
    let (_clock, browser, _storage, mut engine) = setup();
    browser.add_tab(1, "https://b.test/", 10, true);
    browser.set_focused_window(Some(10));
    engine.initialize();

    assert!(engine.status("b.test").is_none());
    engine.handle_request(Request::SaveHostnameConfig {
        config: HostnameConfig::new("b.test", 600, 0),
    });

    let status = engine.status("b.test").unwrap();
    assert!(status.tracking);
    assert!(browser.alarm(&AlarmName::reset("b.test")).is_some());
    assert!(browser.alarm(&AlarmName::limit("b.test")).is_some());
}

#[test]
fn remove_hostname_stops_tracking_and_clears_alarms() {
    let (clock, browser, storage, mut engine) = seeded();
    assert!(engine.status("a.test").unwrap().tracking);

    clock.advance_secs(25);
    let response = engine.handle_request(Request::RemoveHostname {
        hostname: "a.test".into(),
    });
    assert!(matches!(response, Response::Ack { ok: true }));

    assert!(engine.status("a.test").is_none());
    assert!(browser.alarm(&AlarmName::reset("a.test")).is_none());
    assert!(browser.alarm(&AlarmName::limit("a.test")).is_none());
    // Accrued time up to the removal stays recorded under the old config's
    // period only if the config still existed at stop time; removal loses
    // the in-flight stretch by design (the config is gone).
    assert!(storage.load_configs().is_empty());
}

#[test]
fn status_includes_live_elapsed_without_writing() {
    let (clock, _browser, storage, mut engine) = seeded();
    clock.advance_secs(40);

    match engine.handle_request(Request::GetStatus { hostname: "a.test".into() }) {
        Response::Status(status) => {
            assert!(status.tracking);
            assert_eq!(status.time_spent_seconds, 40);
            assert_eq!(status.time_remaining_seconds, 3560);
        }
        other => panic!("unexpected response: {other:?}"),
    }
    // The live view did not touch storage.
    let stored = storage.load_usage_log();
    let usage = stored
        .usage("2026-08-02".parse().unwrap(), "a.test")
        .unwrap();
    assert_eq!(usage.time_spent_seconds, 0);
}

#[test]
fn all_status_covers_enabled_hostnames_only() {
    let (_clock, _browser, storage, mut engine) = seeded();
    let mut disabled = HostnameConfig::new("z.test", 600, 0);
    disabled.enabled = false;
    let mut configs = storage.load_configs();
    configs.push(disabled);
    storage.save_configs(&configs).unwrap();

    match engine.handle_request(Request::GetAllStatus) {
        Response::AllStatus(statuses) => {
            assert_eq!(statuses.len(), 1);
            assert_eq!(statuses[0].hostname, "a.test");
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn unknown_hostname_maps_to_internal_error() {
    let (_clock, _browser, _storage, mut engine) = seeded();
    match engine.handle_request(Request::GetStatus { hostname: "nope.test".into() }) {
        Response::Error { error, request_type } => {
            assert_eq!(error, "internal");
            assert_eq!(request_type, "GetStatus");
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn error_response_wire_shape() {
    let (_clock, _browser, _storage, mut engine) = seeded();
    let response = engine.handle_request(Request::GetStatus { hostname: "nope.test".into() });
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["error"], "internal");
    assert_eq!(json["type"], "GetStatus");
}

#[test]
fn dashboard_folds_live_elapsed_into_the_current_period() {
    let (clock, _browser, _storage, mut engine) = seeded();
    clock.advance_secs(90);

    match engine.handle_request(Request::GetDashboardData { days: None }) {
        Response::Dashboard(data) => {
            assert_eq!(data.configs.len(), 1);
            let today = &data.usage_log[data.usage_log.len() - 1];
            let usage = today.hostname("a.test").unwrap();
            assert_eq!(usage.time_spent_seconds, 90);
            let open = usage.sessions.last().unwrap();
            assert_eq!(open.duration_seconds, 90);
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn toggle_pause_through_the_surface() {
    let (_clock, _browser, _storage, mut engine) = setup();
    engine.initialize();
    let mut config = HostnameConfig::new("p.test", 600, 0);
    config.pause_allowance_seconds = 60;
    engine.handle_request(Request::SaveHostnameConfig { config });

    match engine.handle_request(Request::TogglePause { hostname: "p.test".into() }) {
        Response::PauseToggle(toggle) => {
            assert!(toggle.success);
            assert!(toggle.is_paused);
            assert_eq!(toggle.pause_remaining_seconds, 60);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    // A hostname without any allowance fails the toggle.
    engine.handle_request(Request::SaveHostnameConfig {
        config: HostnameConfig::new("q.test", 600, 0),
    });
    match engine.handle_request(Request::TogglePause { hostname: "q.test".into() }) {
        Response::PauseToggle(toggle) => assert!(!toggle.success),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn blocked_status_summarizes_the_period() {
    let (clock, browser, _storage, mut engine) = seeded();
    // Overwrite with a tiny limit and no grace so the block lands fast.
    let mut settings = GlobalSettings::default();
    settings.grace_period_seconds = 0;
    settings.notification_rules = Vec::new();
    engine.handle_request(Request::SaveSettings { settings });
    engine.handle_request(Request::SaveHostnameConfig {
        config: HostnameConfig::new("tiny.test", 5, 0),
    });
    browser.add_tab(2, "https://tiny.test/", 10, false);
    engine.on_tab_updated(2, Some("https://tiny.test/"), None);
    browser.set_active_tab(10, 2);
    engine.on_tab_activated(2, 10);

    clock.advance_secs(5);
    for name in browser.due_alarms(clock.now_ms()) {
        engine.on_alarm_fired(&name);
    }

    match engine.handle_request(Request::GetBlockedStatus { hostname: "tiny.test".into() }) {
        Response::BlockedStatus(blocked) => {
            assert_eq!(blocked.hostname, "tiny.test");
            assert_eq!(blocked.time_spent_seconds, 5);
            assert_eq!(blocked.limit_seconds, 5);
            assert_eq!(blocked.visit_count, 1);
            assert_eq!(blocked.session_count, 1);
            assert_eq!(blocked.longest_session_seconds, 5);
            assert!(blocked.blocked_at.is_some());
        }
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn first_run_freezes_default_rule_ids() {
    let (_clock, _browser, storage, mut engine) = setup();
    engine.initialize();

    // Initialization persisted the defaults, so repeated loads agree on
    // the minted rule ids.
    let first = storage.load_settings();
    let second = storage.load_settings();
    assert_eq!(first, second);
    assert_eq!(first.notification_rules.len(), 2);
}
