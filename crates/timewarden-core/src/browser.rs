//! Capability interfaces the engine consumes from the host browser.
//!
//! The core never talks to a real extension API; it is handed trait objects
//! for tabs, windows, idle detection, alarms, notifications, navigation and
//! the toolbar badge. Any implementation may back them; the simulation
//! harness provides an in-memory one for tests.
//!
//! Events flow the other way: the host calls the engine's `on_*` entry
//! points when tabs change, focus moves, idle state flips or an alarm
//! fires.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type TabId = i64;
pub type WindowId = i64;

/// A capability call failed on the host side. Callers log and continue;
/// the next event re-drives the state machine.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CapabilityError(pub String);

impl CapabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One open tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    pub audible: bool,
    /// Active within its own window.
    pub active: bool,
    pub window_id: WindowId,
}

/// Host idle state. Anything but `Active` suspends accrual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

impl IdleState {
    pub fn is_idle(self) -> bool {
        !matches!(self, IdleState::Active)
    }
}

/// When an alarm should fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlarmSchedule {
    /// One shot at a Unix-millisecond deadline.
    At { when_ms: i64 },
    /// Recurring with a period in minutes (fractions allowed).
    Every { period_minutes: f64 },
}

/// A scheduled alarm as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmInfo {
    pub name: String,
    pub schedule: AlarmSchedule,
}

/// Open-tab enumeration.
pub trait TabStore: Send + Sync {
    fn list(&self) -> Result<Vec<TabInfo>, CapabilityError>;
}

/// Window focus queries. `None` means no window of ours is focused.
pub trait WindowStore: Send + Sync {
    fn focused_window(&self) -> Result<Option<WindowId>, CapabilityError>;
}

/// System idle detection.
pub trait IdleMonitor: Send + Sync {
    fn query_state(&self) -> Result<IdleState, CapabilityError>;
    fn set_detection_interval(&self, seconds: u32);
}

/// Host-persisted alarms. Creating an alarm under an existing name
/// replaces it; alarms survive process restarts.
pub trait AlarmStore: Send + Sync {
    fn create(&self, name: &str, schedule: AlarmSchedule) -> Result<(), CapabilityError>;
    fn clear(&self, name: &str) -> Result<(), CapabilityError>;
    fn get_all(&self) -> Result<Vec<AlarmInfo>, CapabilityError>;
}

/// Desktop notifications. Best-effort: failures are logged and swallowed.
pub trait NotificationStore: Send + Sync {
    fn create(&self, id: &str, title: &str, message: &str) -> Result<(), CapabilityError>;
    fn clear(&self, id: &str) -> Result<(), CapabilityError>;
}

/// Tab redirection.
pub trait Navigation: Send + Sync {
    fn redirect(&self, tab_id: TabId, url: &str) -> Result<(), CapabilityError>;
}

/// Toolbar badge.
pub trait BadgeSurface: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), CapabilityError>;
    fn set_background_color(&self, color: &str) -> Result<(), CapabilityError>;
}

/// The bundle of capabilities the engine is constructed with.
#[derive(Clone)]
pub struct BrowserHandles {
    pub tabs: Arc<dyn TabStore>,
    pub windows: Arc<dyn WindowStore>,
    pub idle: Arc<dyn IdleMonitor>,
    pub alarms: Arc<dyn AlarmStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub navigation: Arc<dyn Navigation>,
    pub badge: Arc<dyn BadgeSurface>,
}

impl BrowserHandles {
    /// Build the bundle from one object implementing every capability.
    pub fn from_host<H>(host: Arc<H>) -> Self
    where
        H: TabStore
            + WindowStore
            + IdleMonitor
            + AlarmStore
            + NotificationStore
            + Navigation
            + BadgeSurface
            + 'static,
    {
        Self {
            tabs: host.clone(),
            windows: host.clone(),
            idle: host.clone(),
            alarms: host.clone(),
            notifications: host.clone(),
            navigation: host.clone(),
            badge: host,
        }
    }
}

/// Build the local blocked-page URL for a hostname:
/// `<root>/blocked?domain=<url-encoded hostname>`.
pub fn blocked_page_url(extension_root: &str, hostname: &str) -> String {
    format!(
        "{}/blocked?domain={}",
        extension_root.trim_end_matches('/'),
        percent_encode(hostname)
    )
}

/// Minimal query-component percent-encoding: unreserved characters pass
/// through, everything else is %XX-escaped byte-wise.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_url_encodes_hostname() {
        assert_eq!(
            blocked_page_url("ext://warden", "a.test"),
            "ext://warden/blocked?domain=a.test"
        );
        assert_eq!(
            blocked_page_url("ext://warden/", "[::1]"),
            "ext://warden/blocked?domain=%5B%3A%3A1%5D"
        );
    }

    #[test]
    fn idle_states() {
        assert!(!IdleState::Active.is_idle());
        assert!(IdleState::Idle.is_idle());
        assert!(IdleState::Locked.is_idle());
    }
}
