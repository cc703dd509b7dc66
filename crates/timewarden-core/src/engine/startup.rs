//! Lifecycle: initialization, recovery and the retry alarm.

use tracing::{info, warn};

use crate::alarms::BADGE_REFRESH;
use crate::browser::AlarmSchedule;
use crate::error::{CoreError, Result};

use super::Engine;

/// Lifecycle alarm: re-runs initialization 5 s after a failed attempt.
pub(crate) const INIT_RETRY: &str = "init-retry";

/// Idle detection granularity in seconds.
const IDLE_DETECTION_SECONDS: u32 = 15;

impl Engine {
    /// Bring the engine up: load configuration, rebuild the attention
    /// picture from a tab scan, re-arm reset alarms, enforce existing
    /// blocks and start the periodic badge/flush cadence.
    ///
    /// Never leaves the process uninitialized: on failure the attempt is
    /// logged and a single retry alarm is armed 5 s out.
    pub fn initialize(&mut self) {
        match self.try_initialize() {
            Ok(()) => {
                self.initialized = true;
                info!("engine initialized");
            }
            Err(err) => {
                warn!(%err, "initialization failed; retrying in 5s");
                self.create_alarm(
                    INIT_RETRY,
                    AlarmSchedule::At {
                        when_ms: self.now_ms() + 5_000,
                    },
                );
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn try_initialize(&mut self) -> Result<()> {
        // Write the settings straight back: on a fresh install this
        // persists the defaults, freezing the minted ids of the default
        // notification rules so later loads agree with armed alarms.
        let settings = self.storage.load_settings();
        self.storage.save_settings(&settings)?;

        let configs = self.storage.load_configs();
        self.observer.set_enabled_hostnames(
            configs
                .iter()
                .filter(|c| c.enabled)
                .map(|c| c.hostname.clone())
                .collect(),
        );
        self.browser.idle.set_detection_interval(IDLE_DETECTION_SECONDS);

        let tabs = self
            .browser
            .tabs
            .list()
            .map_err(|e| CoreError::capability("tabs", e))?;
        let focused = self
            .browser
            .windows
            .focused_window()
            .map_err(|e| CoreError::capability("windows", e))?;
        let idle = self
            .browser
            .idle
            .query_state()
            .map_err(|e| CoreError::capability("idle", e))?;

        // Startup recovery: one visit per unique hostname with open tabs.
        let outcome = self.observer.recover(&tabs, focused, idle);

        self.reschedule_all_resets();
        self.create_alarm(BADGE_REFRESH, AlarmSchedule::Every { period_minutes: 0.5 });
        self.enforce_blocks();
        self.process_outcome(outcome);
        Ok(())
    }

    /// Refresh the observer's enabled-hostname cache and tab registry
    /// after a configuration change, preserving in-flight accrual; the
    /// following re-evaluate stops anything that lost its tabs.
    pub(crate) fn refresh_hostname_cache(&mut self) {
        let configs = self.storage.load_configs();
        self.observer.set_enabled_hostnames(
            configs
                .iter()
                .filter(|c| c.enabled)
                .map(|c| c.hostname.clone())
                .collect(),
        );
        match self.browser.tabs.list() {
            Ok(tabs) => self.observer.rescan(&tabs),
            Err(err) => warn!(%err, "tab rescan failed after config change"),
        }
    }
}
