//! Alarm-name grammar.
//!
//! Alarms are the only state that survives process restarts on the host
//! side, so every scheduled deadline is routed through a name the engine
//! can parse back into a handler:
//!
//! ```text
//! reset-<hostname>
//! limit-<hostname>
//! notify-rule-<ruleId>::<hostname>
//! grace-end-<hostname>
//! pause-end-<hostname>
//! badge-refresh
//! ```
//!
//! Hostnames are the exact configured strings; rule ids are opaque.

use std::fmt;

pub const RESET_PREFIX: &str = "reset-";
pub const LIMIT_PREFIX: &str = "limit-";
pub const NOTIFY_PREFIX: &str = "notify-rule-";
pub const GRACE_END_PREFIX: &str = "grace-end-";
pub const PAUSE_END_PREFIX: &str = "pause-end-";
pub const BADGE_REFRESH: &str = "badge-refresh";

/// Separator between rule id and hostname in notify alarms.
const NOTIFY_SEPARATOR: &str = "::";

/// A parsed alarm name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmName {
    Reset { hostname: String },
    Limit { hostname: String },
    NotifyRule { rule_id: String, hostname: String },
    GraceEnd { hostname: String },
    PauseEnd { hostname: String },
    BadgeRefresh,
}

impl AlarmName {
    pub fn reset(hostname: &str) -> String {
        format!("{RESET_PREFIX}{hostname}")
    }

    pub fn limit(hostname: &str) -> String {
        format!("{LIMIT_PREFIX}{hostname}")
    }

    pub fn notify_rule(rule_id: &str, hostname: &str) -> String {
        format!("{NOTIFY_PREFIX}{rule_id}{NOTIFY_SEPARATOR}{hostname}")
    }

    pub fn grace_end(hostname: &str) -> String {
        format!("{GRACE_END_PREFIX}{hostname}")
    }

    pub fn pause_end(hostname: &str) -> String {
        format!("{PAUSE_END_PREFIX}{hostname}")
    }

    /// Parse an alarm name fired by the host. Unknown names yield None and
    /// are ignored by the dispatcher.
    pub fn parse(name: &str) -> Option<Self> {
        if name == BADGE_REFRESH {
            return Some(AlarmName::BadgeRefresh);
        }
        if let Some(rest) = name.strip_prefix(NOTIFY_PREFIX) {
            // Rule ids are opaque; the hostname is everything after the
            // last separator.
            let (rule_id, hostname) = rest.rsplit_once(NOTIFY_SEPARATOR)?;
            if rule_id.is_empty() || hostname.is_empty() {
                return None;
            }
            return Some(AlarmName::NotifyRule {
                rule_id: rule_id.to_string(),
                hostname: hostname.to_string(),
            });
        }
        let strip = |prefix: &str| {
            name.strip_prefix(prefix)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
        };
        if let Some(hostname) = strip(GRACE_END_PREFIX) {
            return Some(AlarmName::GraceEnd { hostname });
        }
        if let Some(hostname) = strip(PAUSE_END_PREFIX) {
            return Some(AlarmName::PauseEnd { hostname });
        }
        if let Some(hostname) = strip(RESET_PREFIX) {
            return Some(AlarmName::Reset { hostname });
        }
        if let Some(hostname) = strip(LIMIT_PREFIX) {
            return Some(AlarmName::Limit { hostname });
        }
        None
    }

    /// Whether this alarm carries a warning or limit deadline for the
    /// hostname: the set cleared when tracking stops.
    pub fn is_tracking_alarm_for(&self, hostname: &str) -> bool {
        match self {
            AlarmName::Limit { hostname: h } => h == hostname,
            AlarmName::NotifyRule { hostname: h, .. } => h == hostname,
            _ => false,
        }
    }
}

impl fmt::Display for AlarmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmName::Reset { hostname } => write!(f, "{RESET_PREFIX}{hostname}"),
            AlarmName::Limit { hostname } => write!(f, "{LIMIT_PREFIX}{hostname}"),
            AlarmName::NotifyRule { rule_id, hostname } => {
                write!(f, "{NOTIFY_PREFIX}{rule_id}{NOTIFY_SEPARATOR}{hostname}")
            }
            AlarmName::GraceEnd { hostname } => write!(f, "{GRACE_END_PREFIX}{hostname}"),
            AlarmName::PauseEnd { hostname } => write!(f, "{PAUSE_END_PREFIX}{hostname}"),
            AlarmName::BadgeRefresh => write!(f, "{BADGE_REFRESH}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_format_roundtrip() {
        let names = [
            AlarmName::Reset { hostname: "a.test".into() },
            AlarmName::Limit { hostname: "a.test".into() },
            AlarmName::NotifyRule { rule_id: "r-1".into(), hostname: "a.test".into() },
            AlarmName::GraceEnd { hostname: "a.test".into() },
            AlarmName::PauseEnd { hostname: "a.test".into() },
            AlarmName::BadgeRefresh,
        ];
        for name in names {
            let rendered = name.to_string();
            assert_eq!(AlarmName::parse(&rendered), Some(name));
        }
    }

    #[test]
    fn notify_rule_ids_may_contain_separator() {
        let rendered = AlarmName::notify_rule("weird::id", "a.test");
        assert_eq!(
            AlarmName::parse(&rendered),
            Some(AlarmName::NotifyRule {
                rule_id: "weird::id".into(),
                hostname: "a.test".into()
            })
        );
    }

    #[test]
    fn unknown_names_rejected() {
        assert_eq!(AlarmName::parse("something-else"), None);
        assert_eq!(AlarmName::parse("reset-"), None);
        assert_eq!(AlarmName::parse("notify-rule-no-separator"), None);
        assert_eq!(AlarmName::parse(""), None);
    }

    #[test]
    fn tracking_alarms_identified_per_hostname() {
        let limit = AlarmName::parse(&AlarmName::limit("a.test")).unwrap();
        let notify = AlarmName::parse(&AlarmName::notify_rule("r", "a.test")).unwrap();
        let reset = AlarmName::parse(&AlarmName::reset("a.test")).unwrap();
        assert!(limit.is_tracking_alarm_for("a.test"));
        assert!(notify.is_tracking_alarm_for("a.test"));
        assert!(!notify.is_tracking_alarm_for("b.test"));
        assert!(!reset.is_tracking_alarm_for("a.test"));
    }
}
