//! Period accounting: effective limit/reset resolution and period-date math.
//!
//! A period runs from a hostname's effective reset moment to the next one.
//! All functions here are pure over (config, settings, now): the same
//! inputs always yield the same period date, which is what lets the engine
//! re-derive period membership at any instant instead of persisting it.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};

use crate::config::{GlobalSettings, HostnameConfig};

/// Parse a strict "HH:MM" string.
///
/// Rejects anything that isn't exactly two zero-padded fields, so stored
/// values stay canonical.
pub fn parse_reset_time(s: &str) -> Option<NaiveTime> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    if !s[..2].chars().all(|c| c.is_ascii_digit())
        || !s[3..].chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let hour: u32 = s[..2].parse().ok()?;
    let minute: u32 = s[3..].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Weekday index in the stored convention: 0=Sun..6=Sat.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Effective limit for a weekday: day override, else the daily default.
pub fn effective_limit_seconds(config: &HostnameConfig, weekday: u8) -> u32 {
    config
        .day_overrides
        .get(&weekday)
        .and_then(|o| o.limit_seconds)
        .unwrap_or(config.daily_limit_seconds)
}

/// Effective reset time for a weekday: day override, else the hostname's
/// reset time, else the global one. May be an invalid string if stored
/// data predates validation; callers fall back per the period rules.
pub fn effective_reset_time(
    config: &HostnameConfig,
    settings: &GlobalSettings,
    weekday: u8,
) -> String {
    config
        .day_overrides
        .get(&weekday)
        .and_then(|o| o.reset_time.clone())
        .or_else(|| config.reset_time.clone())
        .unwrap_or_else(|| settings.reset_time.clone())
}

/// The period date a wall-clock instant belongs to.
///
/// Before today's reset moment we are still in the period that began
/// yesterday; the boundary instant itself belongs to the new period. An
/// unparseable reset string falls back to today's calendar date.
pub fn period_date(
    config: &HostnameConfig,
    settings: &GlobalSettings,
    now: DateTime<Utc>,
) -> NaiveDate {
    let today = now.date_naive();
    let reset = effective_reset_time(config, settings, weekday_index(today));
    let Some(reset_time) = parse_reset_time(&reset) else {
        return today;
    };
    let reset_moment = today.and_time(reset_time).and_utc();
    if now < reset_moment {
        today.pred_opt().unwrap_or(today)
    } else {
        today
    }
}

/// The next reset moment for a hostname at or after `now`.
///
/// If today's reset has not happened yet that is the next one; otherwise
/// tomorrow's weekday decides. Invalid reset strings schedule at midnight.
pub fn next_reset_at(
    config: &HostnameConfig,
    settings: &GlobalSettings,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let today = now.date_naive();
    let today_reset = parse_reset_time(&effective_reset_time(
        config,
        settings,
        weekday_index(today),
    ))
    .unwrap_or(NaiveTime::MIN);
    let today_moment = today.and_time(today_reset).and_utc();
    if now < today_moment {
        return today_moment;
    }

    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let tomorrow_reset = parse_reset_time(&effective_reset_time(
        config,
        settings,
        weekday_index(tomorrow),
    ))
    .unwrap_or(NaiveTime::MIN);
    tomorrow.and_time(tomorrow_reset).and_utc()
}

/// The limit/reset pair frozen onto a period usage at creation: today's
/// effective values.
pub fn snapshot_values(
    config: &HostnameConfig,
    settings: &GlobalSettings,
    now: DateTime<Utc>,
) -> (u32, String) {
    let weekday = weekday_index(now.date_naive());
    (
        effective_limit_seconds(config, weekday),
        effective_reset_time(config, settings, weekday),
    )
}
