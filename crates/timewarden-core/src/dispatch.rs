//! Request/response surface for UI collaborators.
//!
//! Settings, dashboard and popup surfaces talk to the engine through this
//! typed message layer. Every handler is wrapped: an internal failure
//! surfaces as `{error: "internal", type: <request>}` instead of an opaque
//! throw, while validation problems carry their own message.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::alarms::AlarmName;
use crate::config::{GlobalSettings, HostnameConfig};
use crate::domain;
use crate::engine::{Engine, Op, PauseToggle, Status};
use crate::error::{CoreError, Result};
use crate::period;
use crate::usage::DailyUsage;

/// Default dashboard range, matching the usage-log cap.
const DEFAULT_DASHBOARD_DAYS: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    GetSettings,
    SaveSettings { settings: GlobalSettings },
    GetHostnameConfigs,
    SaveHostnameConfig { config: HostnameConfig },
    RemoveHostname { hostname: String },
    GetStatus { hostname: String },
    GetAllStatus,
    TogglePause { hostname: String },
    GetDashboardData { #[serde(default)] days: Option<usize> },
    GetBlockedStatus { hostname: String },
}

impl Request {
    fn type_name(&self) -> &'static str {
        match self {
            Request::GetSettings => "GetSettings",
            Request::SaveSettings { .. } => "SaveSettings",
            Request::GetHostnameConfigs => "GetHostnameConfigs",
            Request::SaveHostnameConfig { .. } => "SaveHostnameConfig",
            Request::RemoveHostname { .. } => "RemoveHostname",
            Request::GetStatus { .. } => "GetStatus",
            Request::GetAllStatus => "GetAllStatus",
            Request::TogglePause { .. } => "TogglePause",
            Request::GetDashboardData { .. } => "GetDashboardData",
            Request::GetBlockedStatus { .. } => "GetBlockedStatus",
        }
    }
}

/// Everything the dashboard needs in one round trip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub configs: Vec<HostnameConfig>,
    pub settings: GlobalSettings,
    pub usage_log: Vec<DailyUsage>,
}

/// What the blocked page renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedStatus {
    pub hostname: String,
    pub time_spent_seconds: u64,
    pub limit_seconds: u32,
    pub visit_count: u64,
    pub session_count: usize,
    pub longest_session_seconds: u64,
    pub reset_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Settings(GlobalSettings),
    Configs(Vec<HostnameConfig>),
    Status(Status),
    AllStatus(Vec<Status>),
    PauseToggle(PauseToggle),
    Dashboard(DashboardData),
    BlockedStatus(BlockedStatus),
    Ack {
        ok: bool,
    },
    Error {
        error: String,
        #[serde(rename = "type")]
        request_type: String,
    },
}

impl Engine {
    /// Handle one UI request. Never panics, never propagates: failures
    /// come back as [`Response::Error`].
    pub fn handle_request(&mut self, request: Request) -> Response {
        let kind = request.type_name();
        match self.dispatch(request) {
            Ok(response) => response,
            Err(CoreError::Validation(err)) => Response::Error {
                error: err.to_string(),
                request_type: kind.to_string(),
            },
            Err(err) => {
                warn!(request = kind, %err, "request handler failed");
                Response::Error {
                    error: "internal".to_string(),
                    request_type: kind.to_string(),
                }
            }
        }
    }

    fn dispatch(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::GetSettings => Ok(Response::Settings(self.storage.load_settings())),

            Request::SaveSettings { settings } => {
                settings.validate()?;
                self.storage.save_settings(&settings)?;
                self.reschedule_all_resets();
                self.submit(Op::Reevaluate);
                Ok(Response::Ack { ok: true })
            }

            Request::GetHostnameConfigs => {
                Ok(Response::Configs(self.storage.load_configs()))
            }

            Request::SaveHostnameConfig { mut config } => {
                config.hostname = domain::normalize(&config.hostname);
                config.validate()?;
                let mut configs = self.storage.load_configs();
                match configs.iter_mut().find(|c| c.hostname == config.hostname) {
                    Some(existing) => *existing = config.clone(),
                    None => configs.push(config.clone()),
                }
                self.storage.save_configs(&configs)?;

                self.refresh_hostname_cache();
                let settings = self.storage.load_settings();
                if config.enabled {
                    self.schedule_reset(&config, &settings);
                } else {
                    self.clear_alarm(&AlarmName::reset(&config.hostname));
                }
                self.submit(Op::Reevaluate);
                Ok(Response::Ack { ok: true })
            }

            Request::RemoveHostname { hostname } => {
                let mut configs = self.storage.load_configs();
                configs.retain(|c| c.hostname != hostname);
                self.storage.save_configs(&configs)?;

                self.clear_hostname_alarms(&hostname);
                self.paused.remove(&hostname);
                self.grace_ends_at.remove(&hostname);
                self.refresh_hostname_cache();
                self.submit(Op::Reevaluate);
                Ok(Response::Ack { ok: true })
            }

            Request::GetStatus { hostname } => match self.status(&hostname) {
                Some(status) => Ok(Response::Status(status)),
                None => Err(CoreError::Custom(format!("unknown hostname: {hostname}"))),
            },

            Request::GetAllStatus => Ok(Response::AllStatus(self.all_status())),

            Request::TogglePause { hostname } => {
                Ok(Response::PauseToggle(self.toggle_pause(&hostname)))
            }

            Request::GetDashboardData { days } => {
                let days = days.unwrap_or(DEFAULT_DASHBOARD_DAYS);
                Ok(Response::Dashboard(DashboardData {
                    configs: self.storage.load_configs(),
                    settings: self.storage.load_settings(),
                    usage_log: self.dashboard_log(days),
                }))
            }

            Request::GetBlockedStatus { hostname } => {
                self.blocked_status(&hostname).map(Response::BlockedStatus)
            }
        }
    }

    fn blocked_status(&self, hostname: &str) -> Result<BlockedStatus> {
        let configs = self.storage.load_configs();
        let config = configs
            .iter()
            .find(|c| c.hostname == hostname)
            .ok_or_else(|| CoreError::Custom(format!("unknown hostname: {hostname}")))?;
        let settings = self.storage.load_settings();
        let now = self.now();
        let date = period::period_date(config, &settings, now);
        let log = self.storage.load_usage_log();
        let usage = log.usage(date, hostname);

        let (limit, reset) = match usage {
            Some(u) => (u.limit_seconds, u.reset_time.clone()),
            None => period::snapshot_values(config, &settings, now),
        };
        Ok(BlockedStatus {
            hostname: hostname.to_string(),
            time_spent_seconds: usage.map(|u| u.time_spent_seconds).unwrap_or(0),
            limit_seconds: limit,
            visit_count: usage.map(|u| u.visit_count).unwrap_or(0),
            session_count: usage.map(|u| u.sessions.len()).unwrap_or(0),
            longest_session_seconds: usage.map(|u| u.longest_session_seconds()).unwrap_or(0),
            reset_time: reset,
            blocked_at: usage.and_then(|u| u.blocked_at),
        })
    }

    /// Clear every alarm class for a hostname (used on removal).
    fn clear_hostname_alarms(&self, hostname: &str) {
        self.clear_tracking_alarms(hostname);
        self.clear_alarm(&AlarmName::reset(hostname));
        self.clear_alarm(&AlarmName::grace_end(hostname));
        self.clear_alarm(&AlarmName::pause_end(hostname));
    }
}
