//! Limit, grace and block lifecycle.
//!
//! Reaching the limit stops tracking and starts a grace countdown; the
//! grace-end alarm writes the durable block and redirects open tabs.
//! `grace_ends_at` is runtime-only by design: if the process dies
//! mid-grace, the persisted grace-end alarm still fires (or already has),
//! so the hostname degrades to "blocked on next navigation" rather than
//! gaining free time.

use tracing::{debug, warn};

use crate::alarms::AlarmName;
use crate::browser::{blocked_page_url, AlarmSchedule, TabId};
use crate::domain;
use crate::error::Result;
use crate::period;

use super::{find_enabled, Engine};

impl Engine {
    /// The limit alarm fired: stop accrual and open the grace window (or
    /// block immediately when no grace is configured).
    pub(crate) fn handle_limit_reached(&mut self, hostname: &str) -> Result<()> {
        self.stop_tracking(hostname)?;

        let configs = self.storage.load_configs();
        let Some(config) = find_enabled(&configs, hostname) else {
            return Ok(());
        };
        let settings = self.storage.load_settings();
        let date = period::period_date(config, &settings, self.now());
        // A duplicate fire after the block landed is a no-op.
        let already_blocked = self
            .storage
            .load_usage_log()
            .usage(date, hostname)
            .map(|u| u.blocked)
            .unwrap_or(false);
        if already_blocked || self.grace_ends_at.contains_key(hostname) {
            return Ok(());
        }
        // After a restart the grace map is empty but the grace-end alarm
        // may still be armed in the host's store; re-arming it here would
        // extend the countdown.
        if self.grace_alarm_armed(hostname) {
            return Ok(());
        }

        if settings.grace_period_seconds == 0 {
            return self.block_hostname(hostname);
        }

        let ends_at = self.now_ms() + i64::from(settings.grace_period_seconds) * 1000;
        self.grace_ends_at.insert(hostname.to_string(), ends_at);
        self.create_alarm(
            &AlarmName::grace_end(hostname),
            AlarmSchedule::At { when_ms: ends_at },
        );
        debug!(hostname, grace_seconds = settings.grace_period_seconds, "grace started");

        if settings.notifications_enabled {
            self.dispatch_notification(
                &format!("limit-{hostname}"),
                &format!("Time's up for {hostname}"),
                &format!(
                    "Daily budget reached. {hostname} will be blocked in {} seconds.",
                    settings.grace_period_seconds
                ),
            );
        }
        self.refresh_badge();
        Ok(())
    }

    fn grace_alarm_armed(&self, hostname: &str) -> bool {
        let name = AlarmName::grace_end(hostname);
        match self.browser.alarms.get_all() {
            Ok(all) => all.iter().any(|info| info.name == name),
            Err(err) => {
                warn!(%err, "alarm enumeration failed");
                false
            }
        }
    }

    /// The grace-end alarm fired: block for the rest of the period.
    pub(crate) fn handle_grace_end(&mut self, hostname: &str) -> Result<()> {
        self.grace_ends_at.remove(hostname);
        self.block_hostname(hostname)
    }

    fn block_hostname(&mut self, hostname: &str) -> Result<()> {
        let configs = self.storage.load_configs();
        let Some(config) = configs.iter().find(|c| c.hostname == hostname).cloned() else {
            return Ok(());
        };
        let settings = self.storage.load_settings();
        let now = self.now();
        let now_ms = self.now_ms();
        let date = period::period_date(&config, &settings, now);
        let (limit, reset) = period::snapshot_values(&config, &settings, now);

        self.storage.with_usage_log(|log| {
            let usage = log
                .ensure_day(date)
                .ensure_hostname(hostname, limit, reset.clone());
            if !usage.blocked {
                usage.blocked = true;
                usage.blocked_at = Some(now_ms);
            }
        })?;
        debug!(hostname, "hostname blocked for the period");

        let blocked_url = blocked_page_url(&self.extension_root, hostname);
        for tab_id in self.observer.tabs_of(hostname) {
            self.redirect_tab(tab_id, &blocked_url);
        }
        self.refresh_badge();
        Ok(())
    }

    /// Navigation interception: a URL heading to a blocked hostname is
    /// rewritten to the blocked page. Returns the redirect target when one
    /// happened. Non-http(s) URLs (including our own pages) never match.
    pub(crate) fn intercept_navigation(&mut self, tab_id: TabId, url: &str) -> Option<String> {
        let configs = self.storage.load_configs();
        let enabled = configs
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.hostname.as_str());
        let hostname = domain::match_url(url, enabled)?.to_string();

        if self.grace_ends_at.contains_key(&hostname) {
            return None;
        }
        let config = configs.iter().find(|c| c.hostname == hostname)?;
        let settings = self.storage.load_settings();
        let date = period::period_date(config, &settings, self.now());
        let blocked = self
            .storage
            .load_usage_log()
            .usage(date, &hostname)
            .map(|u| u.blocked)
            .unwrap_or(false);
        if !blocked {
            return None;
        }

        let blocked_url = blocked_page_url(&self.extension_root, &hostname);
        self.redirect_tab(tab_id, &blocked_url);
        Some(blocked_url)
    }

    /// Startup enforcement: every open tab on a blocked hostname is
    /// redirected immediately.
    pub(crate) fn enforce_blocks(&mut self) {
        let tabs = match self.browser.tabs.list() {
            Ok(tabs) => tabs,
            Err(err) => {
                warn!(%err, "tab scan failed during block enforcement");
                return;
            }
        };
        for tab in tabs {
            let url = tab.url.clone();
            self.intercept_navigation(tab.id, &url);
        }
    }

    fn redirect_tab(&self, tab_id: TabId, url: &str) {
        if let Err(err) = self.browser.navigation.redirect(tab_id, url) {
            // The user sees the underlying page; the next navigation
            // attempt re-runs the check.
            warn!(tab_id, %err, "tab redirect failed");
        }
    }
}
