//! # TimeWarden Core Library
//!
//! Per-site time-budget enforcement for a web browser host. The user
//! declares hostnames to track, each with a daily budget, optional
//! per-weekday overrides, a pause allowance and warning thresholds; the
//! engine accrues time only while a site is actually being consumed,
//! warns at the configured thresholds, runs a grace countdown when the
//! budget is reached, and then blocks navigation until the next period
//! boundary.
//!
//! ## Architecture
//!
//! - **Attention observer**: in-memory picture of tabs, focus, audio and
//!   idle state; every relevant change triggers a re-evaluate pass
//! - **Tracking engine**: a serialized state machine; every mutating
//!   operation runs through one FIFO queue, which is the whole
//!   concurrency story
//! - **Periods**: per-hostname reset boundaries (overridable per weekday)
//!   with limit/reset values frozen per period at first visit
//! - **Capabilities**: the host browser is abstracted behind traits for
//!   tabs, windows, idle, alarms, notifications, navigation, badge and
//!   the key-value store; the simulation harness fakes all of them
//!
//! ## Key Components
//!
//! - [`Engine`]: the state machine and its request surface
//! - [`AttentionObserver`]: tab/window/idle bookkeeping
//! - [`Storage`]: the three-key durable document protocol
//! - [`FakeBrowser`] + [`ManualClock`]: deterministic testing environment

pub mod alarms;
pub mod badge;
pub mod browser;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod error;
pub mod observer;
pub mod period;
pub mod simulation;
pub mod storage;
pub mod usage;

pub use alarms::AlarmName;
pub use browser::{BrowserHandles, IdleState, TabInfo};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DayOverride, GlobalSettings, HostnameConfig, NotificationRule, RuleTrigger};
pub use dispatch::{BlockedStatus, DashboardData, Request, Response};
pub use engine::{Engine, PauseToggle, Status};
pub use error::{CoreError, Result, StorageError, ValidationError};
pub use observer::{AttentionObserver, Reason};
pub use simulation::FakeBrowser;
pub use storage::{MemoryKv, SqliteKv, Storage};
pub use usage::{DailyUsage, HostnameUsage, Session, UsageLog};
