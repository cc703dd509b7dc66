//! The tracking engine.
//!
//! A wall-clock state machine that decides, per tracked hostname, whether
//! time is accruing, and records the result through the storage protocol.
//! The engine does not poll: the host pushes tab/window/idle events and
//! alarm fires into the `on_*` entry points.
//!
//! ## Serialization
//!
//! Every mutating operation runs through a single FIFO queue. Operations
//! enqueued while one is running (a reset handler requesting a re-evaluate,
//! say) execute after the current one completes, never inside it. Each
//! operation owns its storage read-modify-write end to end, which is the
//! engine's whole concurrency story: there is exactly one logical worker.
//! A failing operation is logged and dropped; the queue keeps draining.
//!
//! ## Periodic flush
//!
//! The `badge-refresh` alarm doubles as the flush heartbeat: every fire
//! updates the badge, and if enough time has passed it also folds live
//! elapsed time into storage and rebases the accrual baseline, so abrupt
//! termination loses at most one flush interval.

mod block;
mod pause;
mod reset;
mod startup;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::alarms::{AlarmName, BADGE_REFRESH};
use crate::badge::BadgeState;
use crate::browser::{AlarmSchedule, BrowserHandles, IdleState, TabId, WindowId};
use crate::clock::Clock;
use crate::config::{GlobalSettings, HostnameConfig, NotificationRule, RuleTrigger};
use crate::error::Result;
use crate::observer::{AttentionObserver, Reason, SignalOutcome};
use crate::period;
use crate::storage::Storage;
use crate::usage::{DailyUsage, HostnameUsage, UsageLog};

pub use pause::PauseToggle;

/// Minimum spacing between periodic flushes, slightly under the 30 s
/// badge cadence so a countdown-paced badge refresh still flushes.
const FLUSH_SPACING_MS: i64 = 25_000;

/// Runtime-only pause bookkeeping for one hostname.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PauseEntry {
    pub paused_at_ms: i64,
    pub previous_paused_seconds: u64,
    pub allowance_seconds: u32,
}

/// A queued engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op {
    Reevaluate,
    Visit { hostname: String },
    SuspendPersist,
    LimitReached { hostname: String },
    NotifyRule { hostname: String, rule_id: String },
    PeriodReset { hostname: String },
    GraceEnd { hostname: String },
    PauseEnd { hostname: String },
    BadgeRefresh,
}

/// Live per-hostname view for UI surfaces. Read-only: computing a status
/// never writes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub hostname: String,
    pub enabled: bool,
    pub date: NaiveDate,
    pub time_spent_seconds: u64,
    pub limit_seconds: u32,
    pub time_remaining_seconds: u64,
    pub visit_count: u64,
    pub paused_seconds: u64,
    pub tracking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    pub is_paused: bool,
    pub pause_remaining_seconds: u64,
    pub in_grace: bool,
    pub grace_remaining_seconds: u64,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_at: Option<i64>,
    pub reset_time: String,
}

pub struct Engine {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) storage: Storage,
    pub(crate) browser: BrowserHandles,
    pub(crate) observer: AttentionObserver,
    pub(crate) paused: HashMap<String, PauseEntry>,
    pub(crate) grace_ends_at: HashMap<String, i64>,
    pub(crate) extension_root: String,
    queue: VecDeque<Op>,
    draining: bool,
    last_flush_ms: i64,
    badge_countdown_mode: bool,
    pub(crate) initialized: bool,
}

impl Engine {
    pub fn new(
        clock: Arc<dyn Clock>,
        storage: Storage,
        browser: BrowserHandles,
        extension_root: impl Into<String>,
    ) -> Self {
        Self {
            clock,
            storage,
            browser,
            observer: AttentionObserver::new(),
            paused: HashMap::new(),
            grace_ends_at: HashMap::new(),
            extension_root: extension_root.into(),
            queue: VecDeque::new(),
            draining: false,
            last_flush_ms: 0,
            badge_countdown_mode: false,
            initialized: false,
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // ── Host entry points ────────────────────────────────────────────

    pub fn on_tab_activated(&mut self, tab_id: TabId, window_id: WindowId) {
        let outcome = self.observer.tab_activated(tab_id, window_id);
        self.process_outcome(outcome);
    }

    /// A tab changed: URL and/or audible flag. URL changes run through
    /// navigation interception first, so a blocked hostname never gets a
    /// chance to register.
    pub fn on_tab_updated(&mut self, tab_id: TabId, url: Option<&str>, audible: Option<bool>) {
        let mut effective_url = url.map(str::to_string);
        if let Some(target) = url {
            if let Some(redirected) = self.intercept_navigation(tab_id, target) {
                effective_url = Some(redirected);
            }
        }
        let outcome = self
            .observer
            .tab_updated(tab_id, effective_url.as_deref(), audible);
        self.process_outcome(outcome);
    }

    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        let outcome = self.observer.tab_removed(tab_id);
        self.process_outcome(outcome);
    }

    /// Window focus moved; `None` means no window of ours holds focus.
    pub fn on_window_focus_changed(&mut self, focused: Option<WindowId>) {
        let active_tab = focused.and_then(|window_id| self.active_tab_of_window(window_id));
        let outcome = self.observer.window_focus_changed(focused, active_tab);
        self.process_outcome(outcome);
    }

    pub fn on_idle_state_changed(&mut self, state: IdleState) {
        let outcome = self.observer.idle_state_changed(state);
        self.process_outcome(outcome);
    }

    /// Route a host alarm fire to its handler by name.
    pub fn on_alarm_fired(&mut self, name: &str) {
        if name == startup::INIT_RETRY {
            self.initialize();
            return;
        }
        let Some(parsed) = AlarmName::parse(name) else {
            debug!(name, "ignoring unknown alarm");
            return;
        };
        let op = match parsed {
            AlarmName::Reset { hostname } => Op::PeriodReset { hostname },
            AlarmName::Limit { hostname } => Op::LimitReached { hostname },
            AlarmName::NotifyRule { rule_id, hostname } => {
                Op::NotifyRule { hostname, rule_id }
            }
            AlarmName::GraceEnd { hostname } => Op::GraceEnd { hostname },
            AlarmName::PauseEnd { hostname } => Op::PauseEnd { hostname },
            AlarmName::BadgeRefresh => Op::BadgeRefresh,
        };
        self.submit(op);
    }

    /// Imminent host suspend: persist everything now.
    pub fn on_suspend(&mut self) {
        self.submit(Op::SuspendPersist);
    }

    fn active_tab_of_window(&self, window_id: WindowId) -> Option<TabId> {
        match self.browser.tabs.list() {
            Ok(tabs) => tabs
                .iter()
                .find(|t| t.window_id == window_id && t.active)
                .map(|t| t.id),
            Err(err) => {
                warn!(%err, "tab scan failed while resolving focus");
                None
            }
        }
    }

    pub(crate) fn process_outcome(&mut self, outcome: SignalOutcome) {
        for hostname in outcome.visits {
            self.submit(Op::Visit { hostname });
        }
        if outcome.state_changed {
            self.submit(Op::Reevaluate);
        }
    }

    // ── The serial queue ─────────────────────────────────────────────

    pub(crate) fn submit(&mut self, op: Op) {
        self.queue.push_back(op);
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(op) = self.queue.pop_front() {
            debug!(?op, "running engine op");
            if let Err(err) = self.run_op(op) {
                warn!(%err, "engine operation failed; continuing");
            }
        }
        self.draining = false;
    }

    fn run_op(&mut self, op: Op) -> Result<()> {
        match op {
            Op::Reevaluate => self.reevaluate(),
            Op::Visit { hostname } => self.record_visit(&hostname),
            Op::SuspendPersist => self.persist_for_suspend(),
            Op::LimitReached { hostname } => self.handle_limit_reached(&hostname),
            Op::NotifyRule { hostname, rule_id } => {
                self.handle_notify_rule(&hostname, &rule_id)
            }
            Op::PeriodReset { hostname } => self.handle_period_reset(&hostname),
            Op::GraceEnd { hostname } => self.handle_grace_end(&hostname),
            Op::PauseEnd { hostname } => self.handle_pause_end(&hostname),
            Op::BadgeRefresh => self.handle_badge_refresh(),
        }
    }

    // ── Re-evaluate pass ─────────────────────────────────────────────

    fn reevaluate(&mut self) -> Result<()> {
        for hostname in self.observer.hostnames() {
            let paused = self.paused.contains_key(&hostname);
            let decision = self.observer.should_track(&hostname, paused);
            let current = self
                .observer
                .tracking_state(&hostname)
                .and_then(|t| t.started_at_ms.map(|_| t.reason));
            match (decision, current) {
                (Some(reason), None) => self.start_tracking(&hostname, reason)?,
                (None, Some(_)) => self.stop_tracking(&hostname)?,
                (Some(reason), Some(previous)) if previous != Some(reason) => {
                    // Reason flips (focused tab goes background but keeps
                    // playing audio) are bookkeeping only: no storage write.
                    self.observer.set_reason(&hostname, reason);
                }
                _ => {}
            }
        }
        self.observer.prune();
        self.refresh_badge();
        Ok(())
    }

    // ── Start / stop ─────────────────────────────────────────────────

    fn start_tracking(&mut self, hostname: &str, reason: Reason) -> Result<()> {
        let configs = self.storage.load_configs();
        let Some(config) = find_enabled(&configs, hostname).cloned() else {
            return Ok(());
        };
        if self.grace_ends_at.contains_key(hostname) {
            return Ok(());
        }

        let settings = self.storage.load_settings();
        let now = self.now();
        let now_ms = self.now_ms();
        let date = period::period_date(&config, &settings, now);
        let (limit, reset) = period::snapshot_values(&config, &settings, now);

        let usage = self.storage.with_usage_log(|log| {
            let usage = log
                .ensure_day(date)
                .ensure_hostname(hostname, limit, reset.clone());
            if usage.blocked {
                return None;
            }
            usage.start_session(now_ms);
            Some(usage.clone())
        })?;
        let Some(usage) = usage else {
            return Ok(());
        };

        self.observer.begin_tracking(hostname, now_ms, reason);
        debug!(hostname, ?reason, "tracking started");
        self.schedule_tracking_alarms(&config, &settings, &usage);
        Ok(())
    }

    fn stop_tracking(&mut self, hostname: &str) -> Result<()> {
        let Some(started_at) = self.observer.end_tracking(hostname) else {
            return Ok(());
        };
        let now_ms = self.now_ms();
        let elapsed = elapsed_seconds(started_at, now_ms);

        let configs = self.storage.load_configs();
        let settings = self.storage.load_settings();
        if let Some(config) = configs.iter().find(|c| c.hostname == hostname) {
            let date = period::period_date(config, &settings, self.now());
            self.storage.with_usage_log(|log| {
                if let Some(usage) = log.usage_mut(date, hostname) {
                    usage.time_spent_seconds += elapsed;
                    usage.close_open_session(now_ms, elapsed);
                }
            })?;
        }
        debug!(hostname, elapsed, "tracking stopped");
        self.clear_tracking_alarms(hostname);
        Ok(())
    }

    // ── Visits ───────────────────────────────────────────────────────

    fn record_visit(&mut self, hostname: &str) -> Result<()> {
        let configs = self.storage.load_configs();
        let Some(config) = find_enabled(&configs, hostname).cloned() else {
            return Ok(());
        };
        let settings = self.storage.load_settings();
        let now = self.now();
        let date = period::period_date(&config, &settings, now);
        let (limit, reset) = period::snapshot_values(&config, &settings, now);
        self.storage.with_usage_log(|log| {
            let usage = log
                .ensure_day(date)
                .ensure_hostname(hostname, limit, reset.clone());
            usage.visit_count += 1;
        })?;
        Ok(())
    }

    // ── Flush / suspend ──────────────────────────────────────────────

    /// Fold live elapsed time into storage and rebase the accrual
    /// baseline. Safe against double-counting: the next stop or flush
    /// measures from the new baseline.
    fn flush_tracked(&mut self) -> Result<()> {
        let tracked = self.observer.tracked_now();
        if tracked.is_empty() {
            return Ok(());
        }
        let configs = self.storage.load_configs();
        let settings = self.storage.load_settings();
        let now = self.now();
        let now_ms = self.now_ms();

        self.storage.with_usage_log(|log| {
            for (hostname, started_at) in &tracked {
                let Some(config) = configs.iter().find(|c| &c.hostname == hostname) else {
                    continue;
                };
                let elapsed = elapsed_seconds(*started_at, now_ms);
                if elapsed == 0 {
                    continue;
                }
                let date = period::period_date(config, &settings, now);
                if let Some(usage) = log.usage_mut(date, hostname) {
                    usage.time_spent_seconds += elapsed;
                    usage.accrue_open_session(elapsed);
                }
            }
        })?;
        for (hostname, started_at) in tracked {
            let elapsed = elapsed_seconds(started_at, now_ms);
            if elapsed > 0 {
                // Advance by whole seconds only, keeping the sub-second
                // remainder in the baseline.
                self.observer
                    .rebase_tracking(&hostname, started_at + (elapsed as i64) * 1000);
            }
        }
        self.last_flush_ms = now_ms;
        Ok(())
    }

    /// Suspend-time safety net: like a flush, but the open sessions get an
    /// end time; the process is exiting anyway.
    fn persist_for_suspend(&mut self) -> Result<()> {
        let tracked = self.observer.tracked_now();
        if tracked.is_empty() {
            return Ok(());
        }
        let configs = self.storage.load_configs();
        let settings = self.storage.load_settings();
        let now = self.now();
        let now_ms = self.now_ms();

        self.storage.with_usage_log(|log| {
            for (hostname, started_at) in &tracked {
                let Some(config) = configs.iter().find(|c| &c.hostname == hostname) else {
                    continue;
                };
                let elapsed = elapsed_seconds(*started_at, now_ms);
                let date = period::period_date(config, &settings, now);
                if let Some(usage) = log.usage_mut(date, hostname) {
                    usage.time_spent_seconds += elapsed;
                    usage.close_open_session(now_ms, elapsed);
                }
            }
        })?;
        Ok(())
    }

    // ── Alarm scheduling ─────────────────────────────────────────────

    fn schedule_tracking_alarms(
        &self,
        config: &HostnameConfig,
        settings: &GlobalSettings,
        usage: &HostnameUsage,
    ) {
        let now_ms = self.now_ms();
        for rule in config.effective_rules(settings).iter().filter(|r| r.enabled) {
            if usage.notification_fired(&rule.id) {
                continue;
            }
            let threshold = rule.trigger.threshold_seconds(usage.limit_seconds);
            if usage.time_spent_seconds < threshold {
                let when_ms =
                    now_ms + ((threshold - usage.time_spent_seconds) as i64) * 1000;
                self.create_alarm(
                    &AlarmName::notify_rule(&rule.id, &config.hostname),
                    AlarmSchedule::At { when_ms },
                );
            }
        }

        let remaining = u64::from(usage.limit_seconds).saturating_sub(usage.time_spent_seconds);
        let when_ms = now_ms + (remaining as i64) * 1000;
        self.create_alarm(
            &AlarmName::limit(&config.hostname),
            AlarmSchedule::At { when_ms },
        );
    }

    /// Clear this hostname's warning and limit alarms. Best-effort: a
    /// racing fire is tolerated because handlers mark-then-act.
    pub(crate) fn clear_tracking_alarms(&self, hostname: &str) {
        let all = match self.browser.alarms.get_all() {
            Ok(all) => all,
            Err(err) => {
                warn!(%err, "alarm enumeration failed");
                return;
            }
        };
        for info in all {
            let matches = AlarmName::parse(&info.name)
                .map(|parsed| parsed.is_tracking_alarm_for(hostname))
                .unwrap_or(false);
            if matches {
                self.clear_alarm(&info.name);
            }
        }
    }

    pub(crate) fn create_alarm(&self, name: &str, schedule: AlarmSchedule) {
        if let Err(err) = self.browser.alarms.create(name, schedule) {
            warn!(name, %err, "alarm create failed");
        }
    }

    pub(crate) fn clear_alarm(&self, name: &str) {
        if let Err(err) = self.browser.alarms.clear(name) {
            warn!(name, %err, "alarm clear failed");
        }
    }

    // ── Notification rules ───────────────────────────────────────────

    fn handle_notify_rule(&mut self, hostname: &str, rule_id: &str) -> Result<()> {
        let configs = self.storage.load_configs();
        let Some(config) = find_enabled(&configs, hostname).cloned() else {
            return Ok(());
        };
        let settings = self.storage.load_settings();
        let Some(rule) = config
            .effective_rules(&settings)
            .iter()
            .find(|r| r.id == rule_id)
            .cloned()
        else {
            return Ok(());
        };

        let now = self.now();
        let date = period::period_date(&config, &settings, now);
        let (limit, reset) = period::snapshot_values(&config, &settings, now);
        // Mark before acting so a duplicate fire is a no-op.
        let already_fired = self.storage.with_usage_log(|log| {
            let usage = log
                .ensure_day(date)
                .ensure_hostname(hostname, limit, reset.clone());
            if usage.notification_fired(rule_id) {
                true
            } else {
                usage.notifications.insert(rule_id.to_string(), true);
                false
            }
        })?;
        if already_fired || !settings.notifications_enabled {
            return Ok(());
        }

        let (title, message) = rule_notification_text(&rule, hostname);
        self.dispatch_notification(&format!("warn-{rule_id}-{hostname}"), &title, &message);
        Ok(())
    }

    /// Best-effort notification with `{hostname}` already substituted.
    pub(crate) fn dispatch_notification(&self, id: &str, title: &str, message: &str) {
        if let Err(err) = self.browser.notifications.create(id, title, message) {
            warn!(id, %err, "notification dispatch failed");
        }
    }

    // ── Status queries ───────────────────────────────────────────────

    /// Live status for one hostname. Read-only.
    pub fn status(&self, hostname: &str) -> Option<Status> {
        let configs = self.storage.load_configs();
        let config = configs.iter().find(|c| c.hostname == hostname)?;
        let settings = self.storage.load_settings();
        let log = self.storage.load_usage_log();
        Some(self.status_of(config, &settings, &log))
    }

    /// Live status for every enabled hostname. Read-only.
    pub fn all_status(&self) -> Vec<Status> {
        let configs = self.storage.load_configs();
        let settings = self.storage.load_settings();
        let log = self.storage.load_usage_log();
        configs
            .iter()
            .filter(|c| c.enabled)
            .map(|c| self.status_of(c, &settings, &log))
            .collect()
    }

    pub(crate) fn status_of(
        &self,
        config: &HostnameConfig,
        settings: &GlobalSettings,
        log: &UsageLog,
    ) -> Status {
        let now = self.now();
        let now_ms = self.now_ms();
        let hostname = config.hostname.as_str();
        let date = period::period_date(config, settings, now);
        let usage = log.usage(date, hostname);

        let (frozen_limit, frozen_reset) = match usage {
            Some(u) => (u.limit_seconds, u.reset_time.clone()),
            None => period::snapshot_values(config, settings, now),
        };

        let live_elapsed = self
            .observer
            .started_at(hostname)
            .map(|started| elapsed_seconds(started, now_ms))
            .unwrap_or(0);
        let time_spent =
            usage.map(|u| u.time_spent_seconds).unwrap_or(0) + live_elapsed;

        let tracking = self.observer.started_at(hostname).is_some();
        let reason = self
            .observer
            .tracking_state(hostname)
            .and_then(|t| t.reason);

        let stored_paused = usage.map(|u| u.paused_seconds).unwrap_or(0);
        let (is_paused, paused_seconds, pause_remaining) = match self.paused.get(hostname) {
            Some(entry) => {
                let live_pause = elapsed_seconds(entry.paused_at_ms, now_ms);
                let total = (entry.previous_paused_seconds + live_pause)
                    .min(u64::from(entry.allowance_seconds));
                (
                    true,
                    total,
                    u64::from(entry.allowance_seconds).saturating_sub(total),
                )
            }
            None => (
                false,
                stored_paused,
                u64::from(config.pause_allowance_seconds).saturating_sub(stored_paused),
            ),
        };

        let grace_remaining = self
            .grace_ends_at
            .get(hostname)
            .map(|ends| (ends.saturating_sub(now_ms)).max(0) as u64 / 1000)
            .unwrap_or(0);

        Status {
            hostname: hostname.to_string(),
            enabled: config.enabled,
            date,
            time_spent_seconds: time_spent,
            limit_seconds: frozen_limit,
            time_remaining_seconds: u64::from(frozen_limit).saturating_sub(time_spent),
            visit_count: usage.map(|u| u.visit_count).unwrap_or(0),
            paused_seconds,
            tracking,
            reason,
            is_paused,
            pause_remaining_seconds: pause_remaining,
            in_grace: self.grace_ends_at.contains_key(hostname),
            grace_remaining_seconds: grace_remaining,
            blocked: usage.map(|u| u.blocked).unwrap_or(false),
            blocked_at: usage.and_then(|u| u.blocked_at),
            reset_time: frozen_reset,
        }
    }

    /// The usage log with live elapsed folded into current-period entries,
    /// trimmed to the newest `days`. Read-only.
    pub fn dashboard_log(&self, days: usize) -> Vec<DailyUsage> {
        let configs = self.storage.load_configs();
        let settings = self.storage.load_settings();
        let mut log = self.storage.load_usage_log();
        let now = self.now();
        let now_ms = self.now_ms();

        for (hostname, started_at) in self.observer.tracked_now() {
            let Some(config) = configs.iter().find(|c| c.hostname == hostname) else {
                continue;
            };
            let elapsed = elapsed_seconds(started_at, now_ms);
            if elapsed == 0 {
                continue;
            }
            let date = period::period_date(config, &settings, now);
            if let Some(usage) = log.usage_mut(date, &hostname) {
                usage.time_spent_seconds += elapsed;
                usage.accrue_open_session(elapsed);
            }
        }
        log.tail(days).to_vec()
    }

    // ── Badge ────────────────────────────────────────────────────────

    fn handle_badge_refresh(&mut self) -> Result<()> {
        if self.now_ms() - self.last_flush_ms >= FLUSH_SPACING_MS {
            self.flush_tracked()?;
        }
        self.refresh_badge();
        Ok(())
    }

    /// Recompute and push the badge for the active tab, then arm the
    /// refresh cadence: a 1 s one-shot while a countdown is showing,
    /// otherwise the periodic 30 s alarm. Creating under the same name
    /// replaces any prior timer.
    pub(crate) fn refresh_badge(&mut self) {
        let state = self.badge_state();
        if let Err(err) = self.browser.badge.set_text(&state.text()) {
            warn!(%err, "badge text update failed");
        }
        if let Err(err) = self.browser.badge.set_background_color(state.color()) {
            warn!(%err, "badge color update failed");
        }

        let countdown = state.is_countdown();
        if countdown {
            self.create_alarm(
                BADGE_REFRESH,
                AlarmSchedule::At { when_ms: self.now_ms() + 1000 },
            );
        } else if self.badge_countdown_mode {
            self.create_alarm(BADGE_REFRESH, AlarmSchedule::Every { period_minutes: 0.5 });
        }
        self.badge_countdown_mode = countdown;
    }

    fn badge_state(&self) -> BadgeState {
        let Some(hostname) = self.observer.active_hostname().map(str::to_string) else {
            return BadgeState::Clear;
        };
        let Some(status) = self.status(&hostname) else {
            return BadgeState::Clear;
        };
        if status.blocked {
            BadgeState::Blocked
        } else if status.in_grace {
            BadgeState::Grace {
                remaining_seconds: status.grace_remaining_seconds,
            }
        } else if status.is_paused {
            BadgeState::Paused {
                remaining_seconds: status.pause_remaining_seconds,
            }
        } else {
            BadgeState::Tracking {
                remaining_seconds: status.time_remaining_seconds,
                limit_seconds: status.limit_seconds,
            }
        }
    }
}

/// Whole elapsed seconds between two millisecond instants, floored at 0.
pub(crate) fn elapsed_seconds(started_at_ms: i64, now_ms: i64) -> u64 {
    (now_ms.saturating_sub(started_at_ms).max(0) / 1000) as u64
}

pub(crate) fn find_enabled<'a>(
    configs: &'a [HostnameConfig],
    hostname: &str,
) -> Option<&'a HostnameConfig> {
    configs
        .iter()
        .find(|c| c.hostname == hostname && c.enabled)
}

fn rule_notification_text(rule: &NotificationRule, hostname: &str) -> (String, String) {
    let title = rule
        .title
        .clone()
        .unwrap_or_else(|| "Time warning for {hostname}".to_string());
    let message = rule.message.clone().unwrap_or_else(|| match rule.trigger {
        RuleTrigger::Percentage { percentage_used } => {
            format!("You have used {percentage_used}% of today's budget for {{hostname}}.")
        }
        RuleTrigger::Time {
            time_remaining_seconds,
        } => format!(
            "{} left for {{hostname}} today.",
            crate::badge::format_compact(u64::from(time_remaining_seconds))
        ),
    });
    (
        title.replace("{hostname}", hostname),
        message.replace("{hostname}", hostname),
    )
}
