use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "timewarden-cli", version, about = "TimeWarden CLI")]
struct Cli {
    /// Path to the store database (defaults to ~/.timewarden/timewarden.db).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tracked sites
    Sites {
        #[command(subcommand)]
        action: commands::sites::SitesAction,
    },
    /// Global settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Recorded usage
    Usage(commands::usage::UsageArgs),
    /// Per-site budget status for the current period
    Status(commands::status::StatusArgs),
}

fn main() {
    let cli = Cli::parse();
    let db = cli.db.as_deref();
    let result = match cli.command {
        Commands::Sites { action } => commands::sites::run(db, action),
        Commands::Settings { action } => commands::settings::run(db, action),
        Commands::Usage(args) => commands::usage::run(db, args),
        Commands::Status(args) => commands::status::run(db, args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
