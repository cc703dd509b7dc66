//! Pause allowance bookkeeping.
//!
//! Pause state is runtime-only: the persisted `pausedSeconds` counter and
//! the host-persisted pause-end alarm are the durable pieces. A restart
//! mid-pause therefore resumes as "not paused", and the stale pause-end
//! alarm fires into a no-op.

use serde::Serialize;
use tracing::debug;

use crate::alarms::AlarmName;
use crate::browser::AlarmSchedule;
use crate::error::Result;
use crate::period;

use super::{elapsed_seconds, find_enabled, Engine, Op, PauseEntry};

/// Result of a pause toggle, shaped for the message surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseToggle {
    pub success: bool,
    pub is_paused: bool,
    pub pause_remaining_seconds: u64,
}

impl Engine {
    /// Toggle pause for a hostname. Fails (without toggling) when the
    /// hostname is unknown, disabled, blocked for the period, or out of
    /// allowance.
    pub fn toggle_pause(&mut self, hostname: &str) -> PauseToggle {
        let failed = PauseToggle {
            success: false,
            is_paused: self.paused.contains_key(hostname),
            pause_remaining_seconds: 0,
        };

        let configs = self.storage.load_configs();
        let Some(config) = find_enabled(&configs, hostname).cloned() else {
            return failed;
        };
        let settings = self.storage.load_settings();
        let now = self.now();
        let now_ms = self.now_ms();
        let date = period::period_date(&config, &settings, now);
        let log = self.storage.load_usage_log();
        let usage = log.usage(date, hostname);

        if usage.map(|u| u.blocked).unwrap_or(false) {
            return failed;
        }

        if self.paused.contains_key(hostname) {
            let remaining = match self.resume(hostname) {
                Ok(remaining) => remaining,
                Err(_) => return failed,
            };
            return PauseToggle {
                success: true,
                is_paused: false,
                pause_remaining_seconds: remaining,
            };
        }

        let spent = usage.map(|u| u.paused_seconds).unwrap_or(0);
        let allowance = config.pause_allowance_seconds;
        let remaining = u64::from(allowance).saturating_sub(spent);
        if remaining == 0 {
            return failed;
        }

        if let Err(err) = self.stop_tracking_for_pause(hostname) {
            debug!(hostname, %err, "stop before pause failed");
            return failed;
        }
        self.paused.insert(
            hostname.to_string(),
            PauseEntry {
                paused_at_ms: now_ms,
                previous_paused_seconds: spent,
                allowance_seconds: allowance,
            },
        );
        self.create_alarm(
            &AlarmName::pause_end(hostname),
            AlarmSchedule::At {
                when_ms: now_ms + (remaining as i64) * 1000,
            },
        );
        debug!(hostname, remaining, "paused");
        self.refresh_badge();
        PauseToggle {
            success: true,
            is_paused: true,
            pause_remaining_seconds: remaining,
        }
    }

    /// The pause-end alarm fired (or a stale one did after a restart;
    /// then the map lookup misses and nothing happens).
    pub(crate) fn handle_pause_end(&mut self, hostname: &str) -> Result<()> {
        if self.paused.contains_key(hostname) {
            self.resume(hostname)?;
        }
        Ok(())
    }

    /// End the pause: bank elapsed pause time, clear the alarm, let the
    /// re-evaluate pass restart tracking if attention warrants it.
    fn resume(&mut self, hostname: &str) -> Result<u64> {
        let Some(entry) = self.paused.remove(hostname) else {
            return Ok(0);
        };
        let now_ms = self.now_ms();
        let live_pause = elapsed_seconds(entry.paused_at_ms, now_ms);
        let total = (entry.previous_paused_seconds + live_pause)
            .min(u64::from(entry.allowance_seconds));

        let configs = self.storage.load_configs();
        if let Some(config) = configs.iter().find(|c| c.hostname == hostname).cloned() {
            let settings = self.storage.load_settings();
            let now = self.now();
            let date = period::period_date(&config, &settings, now);
            let (limit, reset) = period::snapshot_values(&config, &settings, now);
            self.storage.with_usage_log(|log| {
                let usage = log
                    .ensure_day(date)
                    .ensure_hostname(hostname, limit, reset.clone());
                usage.paused_seconds = total.max(usage.paused_seconds);
            })?;
        }

        self.clear_alarm(&AlarmName::pause_end(hostname));
        debug!(hostname, banked = total, "resumed");
        self.submit(Op::Reevaluate);
        Ok(u64::from(entry.allowance_seconds).saturating_sub(total))
    }

    /// Stop accrual ahead of a pause without waiting for a re-evaluate.
    fn stop_tracking_for_pause(&mut self, hostname: &str) -> Result<()> {
        if self.observer.started_at(hostname).is_some() {
            self.stop_tracking(hostname)?;
        }
        Ok(())
    }
}
