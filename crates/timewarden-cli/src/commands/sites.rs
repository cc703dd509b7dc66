use std::path::Path;

use clap::Subcommand;
use timewarden_core::clock::{Clock, SystemClock};
use timewarden_core::config::HostnameConfig;
use timewarden_core::domain;

use super::open_storage;

#[derive(Subcommand)]
pub enum SitesAction {
    /// List tracked sites
    List,
    /// Add or update a tracked site
    Add {
        /// Hostname (e.g. "news.site.test")
        hostname: String,
        /// Daily budget in seconds
        limit_seconds: u32,
        /// Pause allowance in seconds
        #[arg(long, default_value_t = 0)]
        allowance: u32,
        /// Reset time "HH:MM" (defaults to the global reset time)
        #[arg(long)]
        reset: Option<String>,
    },
    /// Remove a tracked site
    Remove { hostname: String },
    /// Enable tracking for a site
    Enable { hostname: String },
    /// Disable tracking for a site
    Disable { hostname: String },
}

pub fn run(db: Option<&Path>, action: SitesAction) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(db)?;
    match action {
        SitesAction::List => {
            for config in storage.load_configs() {
                println!(
                    "{}\tenabled={}\tlimit={}s\tallowance={}s\treset={}",
                    config.hostname,
                    config.enabled,
                    config.daily_limit_seconds,
                    config.pause_allowance_seconds,
                    config.reset_time.as_deref().unwrap_or("(global)"),
                );
            }
        }
        SitesAction::Add {
            hostname,
            limit_seconds,
            allowance,
            reset,
        } => {
            let hostname = domain::normalize(&hostname);
            let mut config =
                HostnameConfig::new(hostname.clone(), limit_seconds, SystemClock.now_ms());
            config.pause_allowance_seconds = allowance;
            config.reset_time = reset;
            config.validate()?;

            let mut configs = storage.load_configs();
            match configs.iter_mut().find(|c| c.hostname == hostname) {
                Some(existing) => {
                    existing.daily_limit_seconds = config.daily_limit_seconds;
                    existing.pause_allowance_seconds = config.pause_allowance_seconds;
                    existing.reset_time = config.reset_time.clone();
                }
                None => configs.push(config),
            }
            storage.save_configs(&configs)?;
            println!("ok");
        }
        SitesAction::Remove { hostname } => {
            let hostname = domain::normalize(&hostname);
            let mut configs = storage.load_configs();
            let before = configs.len();
            configs.retain(|c| c.hostname != hostname);
            if configs.len() == before {
                eprintln!("unknown site: {hostname}");
                std::process::exit(1);
            }
            storage.save_configs(&configs)?;
            println!("ok");
        }
        SitesAction::Enable { hostname } => set_enabled(&storage, &hostname, true)?,
        SitesAction::Disable { hostname } => set_enabled(&storage, &hostname, false)?,
    }
    Ok(())
}

fn set_enabled(
    storage: &timewarden_core::Storage,
    hostname: &str,
    enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let hostname = domain::normalize(hostname);
    let mut configs = storage.load_configs();
    match configs.iter_mut().find(|c| c.hostname == hostname) {
        Some(config) => {
            config.enabled = enabled;
            storage.save_configs(&configs)?;
            println!("ok");
            Ok(())
        }
        None => {
            eprintln!("unknown site: {hostname}");
            std::process::exit(1);
        }
    }
}
