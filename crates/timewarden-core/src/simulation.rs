//! Deterministic simulation environment.
//!
//! [`FakeBrowser`] implements every capability trait in [`crate::browser`]
//! against in-memory state, and pairs with [`crate::clock::ManualClock`] so
//! integration tests can script whole days of tab activity without
//! sleeping: open tabs, move focus, advance the clock, then fire whichever
//! scheduled alarms have come due, exactly as the host would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::browser::{
    AlarmInfo, AlarmSchedule, AlarmStore, BadgeSurface, CapabilityError, IdleMonitor, IdleState,
    Navigation, NotificationStore, TabId, TabInfo, TabStore, WindowId, WindowStore,
};

/// A notification captured by the fake host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub id: String,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
struct FakeState {
    tabs: Vec<TabInfo>,
    focused_window: Option<WindowId>,
    idle: Option<IdleState>,
    alarms: HashMap<String, AlarmSchedule>,
    notifications: Vec<SentNotification>,
    redirects: Vec<(TabId, String)>,
    badge_text: String,
    badge_color: String,
}

/// In-memory browser host for tests.
#[derive(Debug, Default)]
pub struct FakeBrowser {
    state: Mutex<FakeState>,
}

impl FakeBrowser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    // ── Scripting surface ────────────────────────────────────────────

    pub fn add_tab(&self, id: TabId, url: &str, window_id: WindowId, active: bool) {
        self.lock().tabs.push(TabInfo {
            id,
            url: url.to_string(),
            audible: false,
            active,
            window_id,
        });
    }

    pub fn set_tab_url(&self, id: TabId, url: &str) {
        if let Some(tab) = self.lock().tabs.iter_mut().find(|t| t.id == id) {
            tab.url = url.to_string();
        }
    }

    pub fn set_tab_audible(&self, id: TabId, audible: bool) {
        if let Some(tab) = self.lock().tabs.iter_mut().find(|t| t.id == id) {
            tab.audible = audible;
        }
    }

    pub fn remove_tab(&self, id: TabId) {
        self.lock().tabs.retain(|t| t.id != id);
    }

    pub fn set_focused_window(&self, window_id: Option<WindowId>) {
        self.lock().focused_window = window_id;
    }

    pub fn set_idle_state(&self, state: IdleState) {
        self.lock().idle = Some(state);
    }

    /// The active tab of a window, as the host would resolve it.
    pub fn active_tab_in(&self, window_id: WindowId) -> Option<TabId> {
        self.lock()
            .tabs
            .iter()
            .find(|t| t.window_id == window_id && t.active)
            .map(|t| t.id)
    }

    pub fn set_active_tab(&self, window_id: WindowId, tab_id: TabId) {
        for tab in self.lock().tabs.iter_mut() {
            if tab.window_id == window_id {
                tab.active = tab.id == tab_id;
            }
        }
    }

    // ── Inspection surface ───────────────────────────────────────────

    pub fn tab_url(&self, id: TabId) -> Option<String> {
        self.lock().tabs.iter().find(|t| t.id == id).map(|t| t.url.clone())
    }

    pub fn alarm(&self, name: &str) -> Option<AlarmSchedule> {
        self.lock().alarms.get(name).copied()
    }

    pub fn alarm_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.lock().alarms.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn notifications(&self) -> Vec<SentNotification> {
        self.lock().notifications.clone()
    }

    pub fn redirects(&self) -> Vec<(TabId, String)> {
        self.lock().redirects.clone()
    }

    pub fn badge(&self) -> (String, String) {
        let state = self.lock();
        (state.badge_text.clone(), state.badge_color.clone())
    }

    /// One-shot alarms due at `now_ms`, in deterministic order. Firing
    /// removes them, as the host would after delivery; periodic alarms are
    /// reported but kept armed.
    pub fn due_alarms(&self, now_ms: i64) -> Vec<String> {
        let mut state = self.lock();
        let mut due: Vec<String> = state
            .alarms
            .iter()
            .filter(|(_, schedule)| match schedule {
                AlarmSchedule::At { when_ms } => *when_ms <= now_ms,
                AlarmSchedule::Every { .. } => false,
            })
            .map(|(name, _)| name.clone())
            .collect();
        due.sort();
        for name in &due {
            state.alarms.remove(name);
        }
        due
    }
}

impl TabStore for FakeBrowser {
    fn list(&self) -> Result<Vec<TabInfo>, CapabilityError> {
        Ok(self.lock().tabs.clone())
    }
}

impl WindowStore for FakeBrowser {
    fn focused_window(&self) -> Result<Option<WindowId>, CapabilityError> {
        Ok(self.lock().focused_window)
    }
}

impl IdleMonitor for FakeBrowser {
    fn query_state(&self) -> Result<IdleState, CapabilityError> {
        Ok(self.lock().idle.unwrap_or(IdleState::Active))
    }

    fn set_detection_interval(&self, _seconds: u32) {}
}

impl AlarmStore for FakeBrowser {
    fn create(&self, name: &str, schedule: AlarmSchedule) -> Result<(), CapabilityError> {
        self.lock().alarms.insert(name.to_string(), schedule);
        Ok(())
    }

    fn clear(&self, name: &str) -> Result<(), CapabilityError> {
        self.lock().alarms.remove(name);
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<AlarmInfo>, CapabilityError> {
        let mut all: Vec<AlarmInfo> = self
            .lock()
            .alarms
            .iter()
            .map(|(name, schedule)| AlarmInfo {
                name: name.clone(),
                schedule: *schedule,
            })
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}

impl NotificationStore for FakeBrowser {
    fn create(&self, id: &str, title: &str, message: &str) -> Result<(), CapabilityError> {
        self.lock().notifications.push(SentNotification {
            id: id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn clear(&self, _id: &str) -> Result<(), CapabilityError> {
        Ok(())
    }
}

impl Navigation for FakeBrowser {
    fn redirect(&self, tab_id: TabId, url: &str) -> Result<(), CapabilityError> {
        let mut state = self.lock();
        state.redirects.push((tab_id, url.to_string()));
        if let Some(tab) = state.tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.url = url.to_string();
        }
        Ok(())
    }
}

impl BadgeSurface for FakeBrowser {
    fn set_text(&self, text: &str) -> Result<(), CapabilityError> {
        self.lock().badge_text = text.to_string();
        Ok(())
    }

    fn set_background_color(&self, color: &str) -> Result<(), CapabilityError> {
        self.lock().badge_color = color.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::AlarmStore;

    #[test]
    fn due_alarms_fire_once() {
        let fake = FakeBrowser::new();
        AlarmStore::create(&*fake, "limit-a.test", AlarmSchedule::At { when_ms: 1_000 })
            .unwrap();
        AlarmStore::create(&*fake, "reset-a.test", AlarmSchedule::At { when_ms: 5_000 })
            .unwrap();

        assert!(fake.due_alarms(500).is_empty());
        assert_eq!(fake.due_alarms(1_000), vec!["limit-a.test".to_string()]);
        assert!(fake.due_alarms(1_000).is_empty());
        assert_eq!(fake.due_alarms(10_000), vec!["reset-a.test".to_string()]);
    }

    #[test]
    fn create_replaces_existing_alarm() {
        let fake = FakeBrowser::new();
        AlarmStore::create(&*fake, "limit-a.test", AlarmSchedule::At { when_ms: 1_000 })
            .unwrap();
        AlarmStore::create(&*fake, "limit-a.test", AlarmSchedule::At { when_ms: 9_000 })
            .unwrap();
        assert!(fake.due_alarms(2_000).is_empty());
        assert_eq!(fake.due_alarms(9_000).len(), 1);
    }

    #[test]
    fn redirect_rewrites_the_tab() {
        let fake = FakeBrowser::new();
        fake.add_tab(1, "https://a.test/", 10, true);
        fake.redirect(1, "ext://warden/blocked?domain=a.test").unwrap();
        assert_eq!(
            fake.tab_url(1).unwrap(),
            "ext://warden/blocked?domain=a.test"
        );
        assert_eq!(fake.redirects().len(), 1);
    }
}
