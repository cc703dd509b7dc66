//! Toolbar badge model.
//!
//! The badge mirrors the active tab's hostname. Appearance priority:
//! blocked > grace countdown > pause countdown > tracking, with the
//! tracking colour keyed to the share of budget remaining.

pub const COLOR_RED: &str = "#dc2626";
pub const COLOR_AMBER: &str = "#f59e0b";
pub const COLOR_YELLOW: &str = "#eab308";
pub const COLOR_GREEN: &str = "#16a34a";

/// What the badge should show for the active tab's hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeState {
    /// No tracked hostname on the active tab.
    Clear,
    Blocked,
    Grace { remaining_seconds: u64 },
    Paused { remaining_seconds: u64 },
    Tracking {
        remaining_seconds: u64,
        limit_seconds: u32,
    },
}

impl BadgeState {
    pub fn text(&self) -> String {
        match self {
            BadgeState::Clear => String::new(),
            BadgeState::Blocked => "!".to_string(),
            BadgeState::Grace { remaining_seconds } => remaining_seconds.to_string(),
            BadgeState::Paused { remaining_seconds } => format_compact(*remaining_seconds),
            BadgeState::Tracking { remaining_seconds, .. } => {
                format_compact(*remaining_seconds)
            }
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            BadgeState::Clear => COLOR_GREEN,
            BadgeState::Blocked | BadgeState::Grace { .. } => COLOR_RED,
            BadgeState::Paused { .. } => COLOR_AMBER,
            BadgeState::Tracking {
                remaining_seconds,
                limit_seconds,
            } => {
                let limit = u64::from(*limit_seconds).max(1);
                let remaining_pct = remaining_seconds * 100 / limit;
                if remaining_pct > 25 {
                    COLOR_GREEN
                } else if remaining_pct > 10 {
                    COLOR_YELLOW
                } else {
                    COLOR_RED
                }
            }
        }
    }

    /// Whether the badge is showing a live countdown that wants a
    /// 1-second refresh instead of the periodic cadence.
    pub fn is_countdown(&self) -> bool {
        matches!(self, BadgeState::Grace { .. } | BadgeState::Paused { .. })
    }
}

/// Compact remaining-time text: seconds below a minute, whole minutes
/// below an hour, then "1h05"-style.
pub fn format_compact(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else {
        format!("{}h{:02}", seconds / 3600, (seconds % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_formatting() {
        assert_eq!(format_compact(0), "0s");
        assert_eq!(format_compact(59), "59s");
        assert_eq!(format_compact(60), "1m");
        assert_eq!(format_compact(2700), "45m");
        assert_eq!(format_compact(3900), "1h05");
    }

    #[test]
    fn tracking_colour_thresholds() {
        let state = |remaining| BadgeState::Tracking {
            remaining_seconds: remaining,
            limit_seconds: 1000,
        };
        assert_eq!(state(600).color(), COLOR_GREEN);
        assert_eq!(state(251).color(), COLOR_GREEN);
        assert_eq!(state(250).color(), COLOR_YELLOW);
        assert_eq!(state(101).color(), COLOR_YELLOW);
        assert_eq!(state(100).color(), COLOR_RED);
        assert_eq!(state(0).color(), COLOR_RED);
    }

    #[test]
    fn priority_appearance() {
        assert_eq!(BadgeState::Blocked.text(), "!");
        assert_eq!(BadgeState::Blocked.color(), COLOR_RED);
        assert_eq!(BadgeState::Grace { remaining_seconds: 7 }.text(), "7");
        assert_eq!(
            BadgeState::Paused { remaining_seconds: 90 }.color(),
            COLOR_AMBER
        );
        assert_eq!(BadgeState::Clear.text(), "");
    }

    #[test]
    fn countdown_states() {
        assert!(BadgeState::Grace { remaining_seconds: 3 }.is_countdown());
        assert!(BadgeState::Paused { remaining_seconds: 3 }.is_countdown());
        assert!(!BadgeState::Blocked.is_countdown());
        assert!(
            !BadgeState::Tracking { remaining_seconds: 10, limit_seconds: 60 }.is_countdown()
        );
    }
}
