//! Period rollover.
//!
//! Each enabled hostname keeps one reset alarm armed at its next effective
//! reset moment. The handler attributes any in-flight accrual to the
//! period that just ended. The period is looked up one second before the
//! boundary, because the boundary instant itself already belongs to the
//! new period. It then reschedules and lets a re-evaluate pass lazily start
//! a fresh period if tabs are still open.

use chrono::Duration;
use tracing::debug;

use crate::alarms::AlarmName;
use crate::browser::AlarmSchedule;
use crate::config::{GlobalSettings, HostnameConfig};
use crate::error::Result;
use crate::period;

use super::{elapsed_seconds, Engine, Op};

impl Engine {
    pub(crate) fn handle_period_reset(&mut self, hostname: &str) -> Result<()> {
        let configs = self.storage.load_configs();
        let Some(config) = configs.iter().find(|c| c.hostname == hostname).cloned() else {
            // Removed since the alarm was armed; nothing to roll over.
            return Ok(());
        };
        let settings = self.storage.load_settings();
        let now = self.now();
        let now_ms = self.now_ms();

        if let Some(started_at) = self.observer.end_tracking(hostname) {
            let elapsed = elapsed_seconds(started_at, now_ms);
            let previous_ref = now - Duration::seconds(1);
            let date = period::period_date(&config, &settings, previous_ref);
            let (limit, reset) = period::snapshot_values(&config, &settings, previous_ref);
            self.storage.with_usage_log(|log| {
                let usage = log
                    .ensure_day(date)
                    .ensure_hostname(hostname, limit, reset.clone());
                usage.time_spent_seconds += elapsed;
                usage.close_open_session(now_ms, elapsed);
            })?;
            self.clear_tracking_alarms(hostname);
            debug!(hostname, elapsed, %date, "rolled accrual into the closing period");
        }

        // Grace belongs to the period that just ended; the fresh period
        // starts unblocked with a clean countdown slate.
        if self.grace_ends_at.remove(hostname).is_some() {
            self.clear_alarm(&AlarmName::grace_end(hostname));
        }

        if config.enabled {
            self.schedule_reset(&config, &settings);
        }
        self.submit(Op::Reevaluate);
        Ok(())
    }

    /// Arm (or re-arm) the hostname's next reset alarm.
    pub(crate) fn schedule_reset(&self, config: &HostnameConfig, settings: &GlobalSettings) {
        let next = period::next_reset_at(config, settings, self.now());
        self.create_alarm(
            &AlarmName::reset(&config.hostname),
            AlarmSchedule::At {
                when_ms: next.timestamp_millis(),
            },
        );
    }

    /// Recompute every enabled hostname's reset alarm. Run at startup
    /// (missed resets re-arm here; the period-date function already
    /// assigns new accrual to the new period) and after settings changes.
    pub(crate) fn reschedule_all_resets(&self) {
        let configs = self.storage.load_configs();
        let settings = self.storage.load_settings();
        for config in configs.iter().filter(|c| c.enabled) {
            self.schedule_reset(config, &settings);
        }
    }
}
