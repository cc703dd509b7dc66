use std::path::Path;

use clap::Args;

use super::open_storage;

#[derive(Args)]
pub struct UsageArgs {
    /// Only this hostname
    #[arg(long)]
    pub hostname: Option<String>,
    /// Number of most recent periods to show
    #[arg(long, default_value_t = 30)]
    pub days: usize,
    /// Emit raw JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(db: Option<&Path>, args: UsageArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(db)?;
    let log = storage.load_usage_log();
    let mut days = log.tail(args.days).to_vec();

    if let Some(hostname) = &args.hostname {
        for day in &mut days {
            day.hostnames.retain(|h| &h.hostname == hostname);
        }
        days.retain(|d| !d.hostnames.is_empty());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    for day in &days {
        println!("{}", day.date);
        for usage in &day.hostnames {
            println!(
                "  {}\tspent={}s/{}s\tvisits={}\tpaused={}s\tsessions={}{}",
                usage.hostname,
                usage.time_spent_seconds,
                usage.limit_seconds,
                usage.visit_count,
                usage.paused_seconds,
                usage.sessions.len(),
                if usage.blocked { "\tBLOCKED" } else { "" },
            );
        }
    }
    Ok(())
}
