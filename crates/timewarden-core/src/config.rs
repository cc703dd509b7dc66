//! Durable configuration: per-site budgets, notification rules and global
//! settings.
//!
//! These shapes serialize field-for-field to the persisted document, so the
//! serde names are part of the storage contract. Every field that can be
//! absent in an older document carries `#[serde(default)]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain;
use crate::error::ValidationError;

/// Daily limits are bounded to one day.
pub const MAX_DAILY_LIMIT_SECONDS: u32 = 86_400;
/// Pause allowance is bounded to one hour per period.
pub const MAX_PAUSE_ALLOWANCE_SECONDS: u32 = 3_600;

/// Per-weekday override of the limit and/or reset time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<String>,
}

/// What makes a notification rule fire.
///
/// Exactly one threshold kind per rule; the threshold in consumed seconds is
/// derived from the period's frozen limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleTrigger {
    #[serde(rename_all = "camelCase")]
    Percentage { percentage_used: u32 },
    #[serde(rename_all = "camelCase")]
    Time { time_remaining_seconds: u32 },
}

impl RuleTrigger {
    /// Consumed-seconds threshold at which the rule fires, given the
    /// period's limit.
    pub fn threshold_seconds(&self, limit_seconds: u32) -> u64 {
        match self {
            RuleTrigger::Percentage { percentage_used } => {
                u64::from(limit_seconds) * u64::from(*percentage_used) / 100
            }
            RuleTrigger::Time {
                time_remaining_seconds,
            } => u64::from(limit_seconds.saturating_sub(*time_remaining_seconds)),
        }
    }
}

/// A warning-notification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRule {
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub trigger: RuleTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NotificationRule {
    /// New enabled rule firing at a percentage of the limit.
    pub fn at_percentage(percentage_used: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            enabled: true,
            trigger: RuleTrigger::Percentage { percentage_used },
            title: None,
            message: None,
        }
    }

    /// New enabled rule firing with a fixed remaining time.
    pub fn at_time_remaining(time_remaining_seconds: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            enabled: true,
            trigger: RuleTrigger::Time {
                time_remaining_seconds,
            },
            title: None,
            message: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "notificationRules.id",
                message: "rule id must not be empty".into(),
            });
        }
        match self.trigger {
            RuleTrigger::Percentage { percentage_used } => {
                if percentage_used == 0 || percentage_used > 100 {
                    return Err(ValidationError::OutOfRange {
                        field: "percentageUsed",
                        value: i64::from(percentage_used),
                        min: 1,
                        max: 100,
                    });
                }
            }
            RuleTrigger::Time {
                time_remaining_seconds,
            } => {
                if time_remaining_seconds == 0
                    || time_remaining_seconds > MAX_DAILY_LIMIT_SECONDS
                {
                    return Err(ValidationError::OutOfRange {
                        field: "timeRemainingSeconds",
                        value: i64::from(time_remaining_seconds),
                        min: 1,
                        max: i64::from(MAX_DAILY_LIMIT_SECONDS),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Configuration for one tracked hostname.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostnameConfig {
    pub hostname: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub daily_limit_seconds: u32,
    #[serde(default)]
    pub pause_allowance_seconds: u32,
    /// "HH:MM", or None to inherit the global reset time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<String>,
    /// Weekday (0=Sun..6=Sat) to override.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub day_overrides: HashMap<u8, DayOverride>,
    /// Unix milliseconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_rules: Vec<NotificationRule>,
    #[serde(default = "default_true")]
    pub use_global_notifications: bool,
}

impl HostnameConfig {
    /// New enabled config with a daily limit, created now.
    pub fn new(hostname: impl Into<String>, daily_limit_seconds: u32, created_at: i64) -> Self {
        Self {
            hostname: hostname.into(),
            enabled: true,
            daily_limit_seconds,
            pause_allowance_seconds: 0,
            reset_time: None,
            day_overrides: HashMap::new(),
            created_at,
            notification_rules: Vec::new(),
            use_global_notifications: true,
        }
    }

    /// The notification rules in effect for this hostname.
    pub fn effective_rules<'a>(&'a self, settings: &'a GlobalSettings) -> &'a [NotificationRule] {
        if self.use_global_notifications {
            &settings.notification_rules
        } else {
            &self.notification_rules
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !domain::is_normalized(&self.hostname) {
            return Err(ValidationError::InvalidHostname(self.hostname.clone()));
        }
        if self.daily_limit_seconds == 0 || self.daily_limit_seconds > MAX_DAILY_LIMIT_SECONDS {
            return Err(ValidationError::OutOfRange {
                field: "dailyLimitSeconds",
                value: i64::from(self.daily_limit_seconds),
                min: 1,
                max: i64::from(MAX_DAILY_LIMIT_SECONDS),
            });
        }
        if self.pause_allowance_seconds > MAX_PAUSE_ALLOWANCE_SECONDS {
            return Err(ValidationError::OutOfRange {
                field: "pauseAllowanceSeconds",
                value: i64::from(self.pause_allowance_seconds),
                min: 0,
                max: i64::from(MAX_PAUSE_ALLOWANCE_SECONDS),
            });
        }
        if let Some(reset) = &self.reset_time {
            validate_reset_time(reset)?;
        }
        for (day, over) in &self.day_overrides {
            if *day > 6 {
                return Err(ValidationError::OutOfRange {
                    field: "dayOverrides",
                    value: i64::from(*day),
                    min: 0,
                    max: 6,
                });
            }
            if let Some(limit) = over.limit_seconds {
                if limit == 0 || limit > MAX_DAILY_LIMIT_SECONDS {
                    return Err(ValidationError::OutOfRange {
                        field: "dayOverrides.limitSeconds",
                        value: i64::from(limit),
                        min: 1,
                        max: i64::from(MAX_DAILY_LIMIT_SECONDS),
                    });
                }
            }
            if let Some(reset) = &over.reset_time {
                validate_reset_time(reset)?;
            }
        }
        for rule in &self.notification_rules {
            rule.validate()?;
        }
        Ok(())
    }
}

/// Settings shared by every tracked hostname.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default = "default_reset_time")]
    pub reset_time: String,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default = "default_grace_period")]
    pub grace_period_seconds: u32,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_notification_rules")]
    pub notification_rules: Vec<NotificationRule>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            reset_time: default_reset_time(),
            notifications_enabled: true,
            grace_period_seconds: default_grace_period(),
            theme: default_theme(),
            notification_rules: default_notification_rules(),
        }
    }
}

impl GlobalSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_reset_time(&self.reset_time)?;
        if self.grace_period_seconds > MAX_PAUSE_ALLOWANCE_SECONDS {
            return Err(ValidationError::OutOfRange {
                field: "gracePeriodSeconds",
                value: i64::from(self.grace_period_seconds),
                min: 0,
                max: i64::from(MAX_PAUSE_ALLOWANCE_SECONDS),
            });
        }
        for rule in &self.notification_rules {
            rule.validate()?;
        }
        Ok(())
    }
}

fn validate_reset_time(s: &str) -> Result<(), ValidationError> {
    crate::period::parse_reset_time(s)
        .map(|_| ())
        .ok_or_else(|| ValidationError::InvalidResetTime(s.to_string()))
}

fn default_true() -> bool {
    true
}

fn default_reset_time() -> String {
    "00:00".into()
}

fn default_grace_period() -> u32 {
    60
}

fn default_theme() -> String {
    "system".into()
}

/// A fresh install warns at half the budget and at five minutes left.
fn default_notification_rules() -> Vec<NotificationRule> {
    vec![
        NotificationRule::at_percentage(50),
        NotificationRule::at_time_remaining(300),
    ]
}
