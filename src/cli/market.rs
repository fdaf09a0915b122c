//! Market indicator CLI commands

use clap::Subcommand;

use super::today;
use crate::config::settings::Settings;
use crate::display::market::{format_indicator_list, format_snapshots};
use crate::error::EstateResult;
use crate::market::{collector, MarketCollector};
use crate::storage::Storage;

/// Market subcommands
#[derive(Subcommand)]
pub enum MarketCommands {
    /// List indicator keys the configured sources provide
    Keys,
    /// Fetch one or more indicators
    Get {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Fetch every available indicator
    Summary,
    /// Fetch indicators and store them as today's datapoints
    Record {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Stored datapoints, newest first
    History {
        /// Indicator type (e.g., "cash_rate")
        #[arg(short = 't', long)]
        indicator_type: Option<String>,
        #[arg(short, long)]
        region: Option<String>,
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

/// Handle a market command
pub fn handle_market_command(
    storage: &Storage,
    settings: &Settings,
    cmd: MarketCommands,
) -> EstateResult<()> {
    match cmd {
        MarketCommands::Keys => {
            let collector = MarketCollector::from_settings(&settings.market)?;
            for key in collector.available_keys() {
                println!("{}", key);
            }
        }

        MarketCommands::Get { keys } => {
            let mut collector = MarketCollector::from_settings(&settings.market)?;
            print!("{}", format_snapshots(&collector.summary(&keys)));
        }

        MarketCommands::Summary => {
            let mut collector = MarketCollector::from_settings(&settings.market)?;
            let keys = collector.available_keys();
            print!("{}", format_snapshots(&collector.summary(&keys)));
        }

        MarketCommands::Record { keys } => {
            let mut collector = MarketCollector::from_settings(&settings.market)?;
            let date = today();
            let mut failures = 0;
            for (key, result) in collector.summary(&keys) {
                match result {
                    Ok(snapshot) => {
                        let stored = collector::record(storage, &snapshot, date)?;
                        println!("Recorded {} = {:.2} ({})", key, stored.value, stored.id);
                    }
                    Err(e) => {
                        failures += 1;
                        eprintln!("Skipped {}: {}", key, e);
                    }
                }
            }
            if failures > 0 {
                println!("{} indicator(s) could not be fetched.", failures);
            }
        }

        MarketCommands::History {
            indicator_type,
            region,
            limit,
        } => {
            let rows =
                collector::latest(storage, indicator_type.as_deref(), region.as_deref(), limit)?;
            print!("{}", format_indicator_list(&rows));
        }
    }

    Ok(())
}
