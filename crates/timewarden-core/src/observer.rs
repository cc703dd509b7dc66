//! The attention observer.
//!
//! Keeps the in-memory picture of what the user could currently be
//! consuming: which tabs show which tracked hostname, which of them are
//! audible, which window is focused, which tab is active, and whether the
//! system is idle. Every mutation that could change an ON/OFF decision
//! reports `state_changed` so the engine can run a re-evaluate pass.
//!
//! The observer holds no durable state and never touches storage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::browser::{IdleState, TabId, TabInfo, WindowId};
use crate::domain;

/// Why a hostname is being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
    Focused,
    Audible,
}

/// Per-tab attention attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabAttention {
    pub audible: bool,
}

/// Runtime tracking state for one hostname.
#[derive(Debug, Clone, Default)]
pub struct ActiveTracking {
    /// Set while tracking is ON; the accrual baseline.
    pub started_at_ms: Option<i64>,
    pub reason: Option<Reason>,
    pub tabs: HashMap<TabId, TabAttention>,
}

/// What a mutation produced: whether the engine must re-evaluate, and any
/// visit signals for hostnames that were newly navigated to.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SignalOutcome {
    pub state_changed: bool,
    pub visits: Vec<String>,
}

impl SignalOutcome {
    fn changed() -> Self {
        Self {
            state_changed: true,
            visits: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AttentionObserver {
    tracking: HashMap<String, ActiveTracking>,
    tab_hosts: HashMap<TabId, String>,
    focused_window: Option<WindowId>,
    active_tab: Option<TabId>,
    system_idle: bool,
    enabled_hostnames: Vec<String>,
}

impl AttentionObserver {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_system_idle(&self) -> bool {
        self.system_idle
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.active_tab
    }

    /// The configured hostname shown by the currently active tab, if any.
    pub fn active_hostname(&self) -> Option<&str> {
        self.active_tab
            .and_then(|id| self.tab_hosts.get(&id))
            .map(String::as_str)
    }

    pub fn hostname_of_tab(&self, tab_id: TabId) -> Option<&str> {
        self.tab_hosts.get(&tab_id).map(String::as_str)
    }

    pub fn tabs_of(&self, hostname: &str) -> Vec<TabId> {
        self.tracking
            .get(hostname)
            .map(|t| t.tabs.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Hostnames with any runtime presence (open tabs or active tracking).
    pub fn hostnames(&self) -> Vec<String> {
        self.tracking.keys().cloned().collect()
    }

    pub fn tracking_state(&self, hostname: &str) -> Option<&ActiveTracking> {
        self.tracking.get(hostname)
    }

    pub fn started_at(&self, hostname: &str) -> Option<i64> {
        self.tracking.get(hostname).and_then(|t| t.started_at_ms)
    }

    /// Hostnames currently accruing time.
    pub fn tracked_now(&self) -> Vec<(String, i64)> {
        self.tracking
            .iter()
            .filter_map(|(h, t)| t.started_at_ms.map(|ms| (h.clone(), ms)))
            .collect()
    }

    /// The attention decision for a hostname. Pause state lives in the
    /// engine and is passed in.
    pub fn should_track(&self, hostname: &str, paused: bool) -> Option<Reason> {
        if self.system_idle || paused {
            return None;
        }
        let tracking = self.tracking.get(hostname)?;
        if tracking.tabs.is_empty() {
            return None;
        }
        if self.focused_window.is_some() {
            if let Some(active) = self.active_tab {
                if tracking.tabs.contains_key(&active) {
                    return Some(Reason::Focused);
                }
            }
        }
        if tracking.tabs.values().any(|t| t.audible) {
            return Some(Reason::Audible);
        }
        None
    }

    // ── Engine-owned accrual baseline ────────────────────────────────

    pub fn begin_tracking(&mut self, hostname: &str, now_ms: i64, reason: Reason) {
        let entry = self.tracking.entry(hostname.to_string()).or_default();
        entry.started_at_ms = Some(now_ms);
        entry.reason = Some(reason);
    }

    /// Clear the accrual baseline, returning the start it had.
    pub fn end_tracking(&mut self, hostname: &str) -> Option<i64> {
        let entry = self.tracking.get_mut(hostname)?;
        let started = entry.started_at_ms.take();
        entry.reason = None;
        started
    }

    pub fn set_reason(&mut self, hostname: &str, reason: Reason) {
        if let Some(entry) = self.tracking.get_mut(hostname) {
            entry.reason = Some(reason);
        }
    }

    /// Move the accrual baseline forward after a partial flush.
    pub fn rebase_tracking(&mut self, hostname: &str, started_at_ms: i64) {
        if let Some(entry) = self.tracking.get_mut(hostname) {
            if entry.started_at_ms.is_some() {
                entry.started_at_ms = Some(started_at_ms);
            }
        }
    }

    /// Drop hostnames with no tabs and no active tracking.
    pub fn prune(&mut self) {
        self.tracking
            .retain(|_, t| !t.tabs.is_empty() || t.started_at_ms.is_some());
    }

    // ── Configuration cache ──────────────────────────────────────────

    pub fn set_enabled_hostnames(&mut self, hostnames: Vec<String>) {
        self.enabled_hostnames = hostnames;
    }

    fn match_enabled(&self, url: &str) -> Option<String> {
        domain::match_url(url, self.enabled_hostnames.iter().map(String::as_str))
            .map(str::to_string)
    }

    // ── Browser signals ──────────────────────────────────────────────

    pub fn tab_activated(&mut self, tab_id: TabId, _window_id: WindowId) -> SignalOutcome {
        if self.active_tab == Some(tab_id) {
            return SignalOutcome::default();
        }
        self.active_tab = Some(tab_id);
        SignalOutcome::changed()
    }

    /// URL and/or audible change on a tab. A hostname change emits a visit
    /// for the new hostname.
    pub fn tab_updated(
        &mut self,
        tab_id: TabId,
        url: Option<&str>,
        audible: Option<bool>,
    ) -> SignalOutcome {
        let mut outcome = SignalOutcome::default();

        if let Some(url) = url {
            let new_host = self.match_enabled(url);
            let old_host = self.tab_hosts.get(&tab_id).cloned();
            if new_host != old_host {
                let audible_now = old_host
                    .as_deref()
                    .and_then(|h| self.tracking.get(h))
                    .and_then(|t| t.tabs.get(&tab_id))
                    .map(|t| t.audible)
                    .unwrap_or(false);
                self.unregister_tab(tab_id);
                if let Some(host) = new_host {
                    self.register_tab(tab_id, &host, audible_now);
                    outcome.visits.push(host);
                }
                outcome.state_changed = true;
            }
        }

        if let Some(audible) = audible {
            if let Some(host) = self.tab_hosts.get(&tab_id).cloned() {
                if let Some(tab) = self
                    .tracking
                    .get_mut(&host)
                    .and_then(|t| t.tabs.get_mut(&tab_id))
                {
                    if tab.audible != audible {
                        tab.audible = audible;
                        outcome.state_changed = true;
                    }
                }
            }
        }

        outcome
    }

    pub fn tab_removed(&mut self, tab_id: TabId) -> SignalOutcome {
        let was_tracked = self.tab_hosts.contains_key(&tab_id);
        self.unregister_tab(tab_id);
        if self.active_tab == Some(tab_id) {
            self.active_tab = None;
        }
        if was_tracked {
            SignalOutcome::changed()
        } else {
            SignalOutcome::default()
        }
    }

    /// Window focus moved. `active_tab_in_window` is the active tab of the
    /// newly focused window, resolved by the caller from the tab store;
    /// `None` focus means no window of ours is focused.
    pub fn window_focus_changed(
        &mut self,
        focused: Option<WindowId>,
        active_tab_in_window: Option<TabId>,
    ) -> SignalOutcome {
        self.focused_window = focused;
        self.active_tab = match focused {
            Some(_) => active_tab_in_window,
            None => None,
        };
        SignalOutcome::changed()
    }

    pub fn idle_state_changed(&mut self, state: IdleState) -> SignalOutcome {
        let idle = state.is_idle();
        if self.system_idle == idle {
            return SignalOutcome::default();
        }
        self.system_idle = idle;
        SignalOutcome::changed()
    }

    /// Startup recovery: rebuild the whole picture from a tab scan.
    ///
    /// Emits one visit per unique hostname with open tabs, not per tab.
    pub fn recover(
        &mut self,
        tabs: &[TabInfo],
        focused_window: Option<WindowId>,
        idle: IdleState,
    ) -> SignalOutcome {
        self.tracking.clear();
        self.tab_hosts.clear();
        self.focused_window = focused_window;
        self.system_idle = idle.is_idle();
        self.active_tab = None;

        let mut outcome = SignalOutcome::changed();
        for tab in tabs {
            if let Some(host) = self.match_enabled(&tab.url) {
                self.register_tab(tab.id, &host, tab.audible);
                if !outcome.visits.contains(&host) {
                    outcome.visits.push(host);
                }
            }
            if tab.active && focused_window == Some(tab.window_id) {
                self.active_tab = Some(tab.id);
            }
        }
        outcome
    }

    /// Rebuild the tab registry against the current enabled-hostname
    /// cache, preserving accrual baselines and focus/idle state. Used
    /// after configuration changes; emits no visits.
    pub fn rescan(&mut self, tabs: &[TabInfo]) {
        self.tab_hosts.clear();
        for tracking in self.tracking.values_mut() {
            tracking.tabs.clear();
        }
        for tab in tabs {
            if let Some(host) = self.match_enabled(&tab.url) {
                self.register_tab(tab.id, &host, tab.audible);
            }
        }
    }

    // ── Internal registry ────────────────────────────────────────────

    fn register_tab(&mut self, tab_id: TabId, hostname: &str, audible: bool) {
        self.tab_hosts.insert(tab_id, hostname.to_string());
        self.tracking
            .entry(hostname.to_string())
            .or_default()
            .tabs
            .insert(tab_id, TabAttention { audible });
    }

    fn unregister_tab(&mut self, tab_id: TabId) {
        if let Some(host) = self.tab_hosts.remove(&tab_id) {
            if let Some(tracking) = self.tracking.get_mut(&host) {
                tracking.tabs.remove(&tab_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer_with(hostnames: &[&str]) -> AttentionObserver {
        let mut obs = AttentionObserver::new();
        obs.set_enabled_hostnames(hostnames.iter().map(|s| s.to_string()).collect());
        obs
    }

    fn open_tab(obs: &mut AttentionObserver, id: TabId, url: &str) -> SignalOutcome {
        obs.tab_updated(id, Some(url), None)
    }

    #[test]
    fn navigation_to_tracked_hostname_emits_visit() {
        let mut obs = observer_with(&["a.test"]);
        let outcome = open_tab(&mut obs, 1, "https://a.test/page");
        assert_eq!(outcome.visits, vec!["a.test".to_string()]);
        assert!(outcome.state_changed);
        assert_eq!(obs.hostname_of_tab(1), Some("a.test"));
    }

    #[test]
    fn same_hostname_navigation_is_not_a_visit() {
        let mut obs = observer_with(&["a.test"]);
        open_tab(&mut obs, 1, "https://a.test/one");
        let outcome = open_tab(&mut obs, 1, "https://a.test/two");
        assert!(outcome.visits.is_empty());
        assert!(!outcome.state_changed);
    }

    #[test]
    fn hostname_change_moves_registration() {
        let mut obs = observer_with(&["a.test", "b.test"]);
        open_tab(&mut obs, 1, "https://a.test/");
        let outcome = open_tab(&mut obs, 1, "https://b.test/");
        assert_eq!(outcome.visits, vec!["b.test".to_string()]);
        assert!(obs.tabs_of("a.test").is_empty());
        assert_eq!(obs.tabs_of("b.test"), vec![1]);
    }

    #[test]
    fn audible_flag_survives_same_host_and_moves_with_navigation() {
        let mut obs = observer_with(&["a.test", "b.test"]);
        open_tab(&mut obs, 1, "https://a.test/");
        obs.tab_updated(1, None, Some(true));
        // Navigating within the hostname keeps the flag.
        open_tab(&mut obs, 1, "https://a.test/two");
        assert!(obs.tracking_state("a.test").unwrap().tabs[&1].audible);
        // Navigating away carries the flag to the new hostname.
        open_tab(&mut obs, 1, "https://b.test/");
        assert!(obs.tracking_state("b.test").unwrap().tabs[&1].audible);
    }

    #[test]
    fn decision_prefers_focused_over_audible() {
        let mut obs = observer_with(&["a.test"]);
        open_tab(&mut obs, 1, "https://a.test/");
        obs.tab_updated(1, None, Some(true));
        obs.window_focus_changed(Some(10), Some(1));
        assert_eq!(obs.should_track("a.test", false), Some(Reason::Focused));

        // Focus elsewhere: audio keeps it on.
        obs.window_focus_changed(Some(10), Some(99));
        assert_eq!(obs.should_track("a.test", false), Some(Reason::Audible));

        // Mute: off.
        obs.tab_updated(1, None, Some(false));
        assert_eq!(obs.should_track("a.test", false), None);
    }

    #[test]
    fn no_focused_window_means_no_focused_reason() {
        let mut obs = observer_with(&["a.test"]);
        open_tab(&mut obs, 1, "https://a.test/");
        obs.window_focus_changed(None, None);
        assert_eq!(obs.should_track("a.test", false), None);
    }

    #[test]
    fn idle_and_pause_suppress_tracking() {
        let mut obs = observer_with(&["a.test"]);
        open_tab(&mut obs, 1, "https://a.test/");
        obs.window_focus_changed(Some(10), Some(1));
        assert!(obs.should_track("a.test", false).is_some());
        assert_eq!(obs.should_track("a.test", true), None);

        obs.idle_state_changed(IdleState::Locked);
        assert_eq!(obs.should_track("a.test", false), None);
        obs.idle_state_changed(IdleState::Active);
        assert!(obs.should_track("a.test", false).is_some());
    }

    #[test]
    fn recovery_emits_one_visit_per_unique_hostname() {
        let mut obs = observer_with(&["a.test", "b.test"]);
        let tabs = vec![
            TabInfo { id: 1, url: "https://a.test/x".into(), audible: false, active: true, window_id: 10 },
            TabInfo { id: 2, url: "https://a.test/y".into(), audible: false, active: false, window_id: 10 },
            TabInfo { id: 3, url: "https://www.b.test/".into(), audible: true, active: false, window_id: 11 },
            TabInfo { id: 4, url: "https://other.test/".into(), audible: false, active: false, window_id: 10 },
        ];
        let outcome = obs.recover(&tabs, Some(10), IdleState::Active);
        assert_eq!(
            outcome.visits,
            vec!["a.test".to_string(), "b.test".to_string()]
        );
        assert_eq!(obs.active_tab(), Some(1));
        assert_eq!(obs.tabs_of("a.test").len(), 2);
        // www. variant registered under the configured hostname.
        assert_eq!(obs.tabs_of("b.test"), vec![3]);
    }

    #[test]
    fn prune_drops_empty_entries() {
        let mut obs = observer_with(&["a.test"]);
        open_tab(&mut obs, 1, "https://a.test/");
        obs.tab_removed(1);
        assert_eq!(obs.hostnames(), vec!["a.test".to_string()]);
        obs.prune();
        assert!(obs.hostnames().is_empty());
    }

    #[test]
    fn prune_keeps_active_tracking_without_tabs() {
        let mut obs = observer_with(&["a.test"]);
        open_tab(&mut obs, 1, "https://a.test/");
        obs.begin_tracking("a.test", 1_000, Reason::Focused);
        obs.tab_removed(1);
        obs.prune();
        assert_eq!(obs.hostnames(), vec!["a.test".to_string()]);
    }
}
