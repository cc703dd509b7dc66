use std::path::Path;

use clap::Subcommand;

use super::open_storage;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the global settings
    Show,
    /// Update global settings
    Set {
        /// Global reset time "HH:MM"
        #[arg(long)]
        reset_time: Option<String>,
        /// Grace period in seconds
        #[arg(long)]
        grace: Option<u32>,
        /// Enable or disable notifications
        #[arg(long)]
        notifications: Option<bool>,
        /// UI theme name
        #[arg(long)]
        theme: Option<String>,
    },
}

pub fn run(db: Option<&Path>, action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(db)?;
    match action {
        SettingsAction::Show => {
            let settings = storage.load_settings();
            println!("resetTime: {}", settings.reset_time);
            println!("notificationsEnabled: {}", settings.notifications_enabled);
            println!("gracePeriodSeconds: {}", settings.grace_period_seconds);
            println!("theme: {}", settings.theme);
            println!("notificationRules: {} rules", settings.notification_rules.len());
        }
        SettingsAction::Set {
            reset_time,
            grace,
            notifications,
            theme,
        } => {
            let mut settings = storage.load_settings();
            if let Some(reset_time) = reset_time {
                settings.reset_time = reset_time;
            }
            if let Some(grace) = grace {
                settings.grace_period_seconds = grace;
            }
            if let Some(notifications) = notifications {
                settings.notifications_enabled = notifications;
            }
            if let Some(theme) = theme {
                settings.theme = theme;
            }
            settings.validate()?;
            storage.save_settings(&settings)?;
            println!("ok");
        }
    }
    Ok(())
}
