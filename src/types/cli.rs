use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use super::range::parse_instant;

/// Sync and query historical air-quality data.
#[derive(Parser, Debug)]
#[command(name = "airq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sync air-pollution data for a city over `[from, to)`
    Sync {
        /// Name of the city to sync data for
        city: String,
        /// Start instant (inclusive), ISO-8601
        #[arg(value_parser = parse_cli_instant)]
        from: DateTime<Utc>,
        /// End instant (exclusive), ISO-8601
        #[arg(value_parser = parse_cli_instant)]
        to: DateTime<Utc>,
    },
    /// Delete all data related to the provided city
    Delete {
        /// Name of the city to delete from the database
        city: String,
    },
    /// Serve the HTTP query API
    Serve {
        /// Listen address (overrides AIRQ_LISTEN_ADDR)
        #[arg(short, long)]
        listen: Option<String>,
    },
}

fn parse_cli_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_instant(raw).map_err(|e| e.to_string())
}
