use std::path::Path;

use clap::Args;
use timewarden_core::clock::{Clock, SystemClock};
use timewarden_core::period;

use super::open_storage;

#[derive(Args)]
pub struct StatusArgs {
    /// Only this hostname
    #[arg(long)]
    pub hostname: Option<String>,
}

/// Budget status computed from the stored document and the wall clock.
/// Live tracking state belongs to the browser process; from here a site is
/// whatever its last persisted flush says it is.
pub fn run(db: Option<&Path>, args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(db)?;
    let configs = storage.load_configs();
    let settings = storage.load_settings();
    let log = storage.load_usage_log();
    let now = SystemClock.now();

    for config in configs.iter().filter(|c| c.enabled) {
        if let Some(only) = &args.hostname {
            if &config.hostname != only {
                continue;
            }
        }
        let date = period::period_date(config, &settings, now);
        let usage = log.usage(date, &config.hostname);
        let (limit, reset) = match usage {
            Some(u) => (u.limit_seconds, u.reset_time.clone()),
            None => period::snapshot_values(config, &settings, now),
        };
        let spent = usage.map(|u| u.time_spent_seconds).unwrap_or(0);
        let remaining = u64::from(limit).saturating_sub(spent);
        let blocked = usage.map(|u| u.blocked).unwrap_or(false);

        println!(
            "{}\tperiod={date}\tspent={spent}s\tremaining={remaining}s\treset={reset}{}",
            config.hostname,
            if blocked { "\tBLOCKED" } else { "" },
        );
    }
    Ok(())
}
