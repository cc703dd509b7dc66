//! Recorded usage: sessions, per-period accounting and the rolling log.
//!
//! A `HostnameUsage` is created lazily on the first visit of a period and
//! freezes the limit/reset values that were effective at that moment;
//! editing the configuration mid-period never rewrites an existing period.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The usage log keeps the most recent 30 periods.
pub const USAGE_LOG_CAP: usize = 30;

/// One stretch of tracked attention. `end_time == None` means the session
/// is still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unix milliseconds.
    pub start_time: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub duration_seconds: u64,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Per-hostname accounting for a single period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostnameUsage {
    pub hostname: String,
    #[serde(default)]
    pub time_spent_seconds: u64,
    #[serde(default)]
    pub visit_count: u64,
    #[serde(default)]
    pub paused_seconds: u64,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_at: Option<i64>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    /// Frozen at period creation; never rewritten.
    pub limit_seconds: u32,
    /// Frozen at period creation; never rewritten.
    pub reset_time: String,
    /// Rule id → fired.
    #[serde(default)]
    pub notifications: HashMap<String, bool>,
}

impl HostnameUsage {
    pub fn new(hostname: impl Into<String>, limit_seconds: u32, reset_time: String) -> Self {
        Self {
            hostname: hostname.into(),
            time_spent_seconds: 0,
            visit_count: 0,
            paused_seconds: 0,
            blocked: false,
            blocked_at: None,
            sessions: Vec::new(),
            limit_seconds,
            reset_time,
            notifications: HashMap::new(),
        }
    }

    /// The open session, if any. The engine maintains at most one.
    pub fn open_session(&self) -> Option<&Session> {
        self.sessions.last().filter(|s| s.is_open())
    }

    pub fn open_session_mut(&mut self) -> Option<&mut Session> {
        self.sessions.last_mut().filter(|s| s.is_open())
    }

    /// Append a new open session starting now.
    ///
    /// Any session still open is closed first so the one-open-session
    /// invariant holds even after a missed stop.
    pub fn start_session(&mut self, now_ms: i64) {
        if let Some(open) = self.open_session_mut() {
            open.end_time = Some(now_ms);
        }
        self.sessions.push(Session {
            start_time: now_ms,
            end_time: None,
            duration_seconds: 0,
        });
    }

    /// Add elapsed seconds to the open session without closing it.
    pub fn accrue_open_session(&mut self, elapsed_seconds: u64) {
        if let Some(open) = self.open_session_mut() {
            open.duration_seconds += elapsed_seconds;
        }
    }

    /// Close the open session, adding the final elapsed stretch.
    ///
    /// Duration accumulates additively so a close after partial flushes
    /// never double-counts.
    pub fn close_open_session(&mut self, now_ms: i64, elapsed_seconds: u64) {
        if let Some(open) = self.open_session_mut() {
            open.end_time = Some(now_ms);
            open.duration_seconds += elapsed_seconds;
        }
    }

    /// Whether a rule already fired this period.
    pub fn notification_fired(&self, rule_id: &str) -> bool {
        self.notifications.get(rule_id).copied().unwrap_or(false)
    }

    pub fn longest_session_seconds(&self) -> u64 {
        self.sessions
            .iter()
            .map(|s| s.duration_seconds)
            .max()
            .unwrap_or(0)
    }
}

/// All hostname usage for one period date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    /// The period-start date ("YYYY-MM-DD") as computed at creation.
    pub date: NaiveDate,
    #[serde(default)]
    pub hostnames: Vec<HostnameUsage>,
}

impl DailyUsage {
    pub fn hostname(&self, hostname: &str) -> Option<&HostnameUsage> {
        self.hostnames.iter().find(|h| h.hostname == hostname)
    }

    pub fn hostname_mut(&mut self, hostname: &str) -> Option<&mut HostnameUsage> {
        self.hostnames.iter_mut().find(|h| h.hostname == hostname)
    }

    /// Get or lazily create the usage entry for a hostname, freezing the
    /// given limit/reset snapshot if it is created now.
    pub fn ensure_hostname(
        &mut self,
        hostname: &str,
        limit_seconds: u32,
        reset_time: String,
    ) -> &mut HostnameUsage {
        if let Some(idx) = self.hostnames.iter().position(|h| h.hostname == hostname) {
            return &mut self.hostnames[idx];
        }
        self.hostnames
            .push(HostnameUsage::new(hostname, limit_seconds, reset_time));
        let last = self.hostnames.len() - 1;
        &mut self.hostnames[last]
    }
}

/// Rolling per-period log, date ascending, capped at [`USAGE_LOG_CAP`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageLog(pub Vec<DailyUsage>);

impl UsageLog {
    pub fn day(&self, date: NaiveDate) -> Option<&DailyUsage> {
        self.0.iter().find(|d| d.date == date)
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DailyUsage> {
        self.0.iter_mut().find(|d| d.date == date)
    }

    /// Get or insert the entry for a date, keeping the log sorted and
    /// evicting the oldest entries beyond the cap.
    pub fn ensure_day(&mut self, date: NaiveDate) -> &mut DailyUsage {
        if let Some(idx) = self.0.iter().position(|d| d.date == date) {
            return &mut self.0[idx];
        }
        self.0.push(DailyUsage {
            date,
            hostnames: Vec::new(),
        });
        self.0.sort_by_key(|d| d.date);
        while self.0.len() > USAGE_LOG_CAP {
            self.0.remove(0);
        }
        // The new entry can only have been evicted if it predated every
        // retained one; re-insert lookups must not dangle, so find it or
        // fall back to the oldest survivor.
        let idx = self
            .0
            .iter()
            .position(|d| d.date == date)
            .unwrap_or(0);
        &mut self.0[idx]
    }

    pub fn usage(&self, date: NaiveDate, hostname: &str) -> Option<&HostnameUsage> {
        self.day(date).and_then(|d| d.hostname(hostname))
    }

    pub fn usage_mut(&mut self, date: NaiveDate, hostname: &str) -> Option<&mut HostnameUsage> {
        self.day_mut(date).and_then(|d| d.hostname_mut(hostname))
    }

    /// The most recent `days` entries, newest last.
    pub fn tail(&self, days: usize) -> &[DailyUsage] {
        let start = self.0.len().saturating_sub(days);
        &self.0[start..]
    }
}
