//! Report CLI commands
//!
//! Each report prints to the terminal, or writes CSV with `--csv <file>`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Subcommand;

use super::{parse_choice, today};
use crate::config::settings::Settings;
use crate::error::{EstateError, EstateResult};
use crate::models::{AssetStatus, AssetType};
use crate::reports::{FinanceOverviewReport, PortfolioReport, ProjectBudgetReport};
use crate::services::AssetService;
use crate::storage::{AssetFilter, ProjectFilter, Storage};

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Cash balance, this month and the cash-flow trend
    Finance {
        #[arg(short, long)]
        months: Option<u32>,
        /// Write CSV to this file instead of printing
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Asset register with portfolio totals
    Portfolio {
        #[arg(short, long)]
        region: Option<String>,
        #[arg(short = 't', long)]
        asset_type: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Budget against actual cost for each project
    Budget {
        /// Limit to one asset (name or ID)
        #[arg(short, long)]
        asset: Option<String>,
        /// Only projects flagged active
        #[arg(long)]
        active: bool,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

/// Handle a report command
pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReportCommands,
) -> EstateResult<()> {
    match cmd {
        ReportCommands::Finance { months, csv } => {
            let months = months.unwrap_or(settings.trend_months);
            let report = FinanceOverviewReport::generate(storage, today(), months)?;
            match csv {
                Some(path) => {
                    report.export_csv(&mut create_file(&path)?)?;
                    println!("Finance report exported to: {}", path.display());
                }
                None => print!("{}", report.format_terminal()),
            }
        }

        ReportCommands::Portfolio {
            region,
            asset_type,
            status,
            csv,
        } => {
            let filter = AssetFilter {
                region,
                asset_type: asset_type
                    .as_deref()
                    .map(|t| parse_choice(t, "asset type", "see `estate asset filters`", AssetType::parse))
                    .transpose()?,
                status: status
                    .as_deref()
                    .map(|s| parse_choice(s, "status", "see `estate asset filters`", AssetStatus::parse))
                    .transpose()?,
            };
            let report = PortfolioReport::generate(storage, &filter)?;
            match csv {
                Some(path) => {
                    report.export_csv(&mut create_file(&path)?)?;
                    println!("Portfolio report exported to: {}", path.display());
                }
                None => print!("{}", report.format_terminal()),
            }
        }

        ReportCommands::Budget { asset, active, csv } => {
            let filter = ProjectFilter {
                asset_id: match asset {
                    Some(a) => Some(AssetService::new(storage).require(&a)?.id),
                    None => None,
                },
                status: None,
                active_only: active,
            };
            let report = ProjectBudgetReport::generate(storage, &filter)?;
            match csv {
                Some(path) => {
                    report.export_csv(&mut create_file(&path)?)?;
                    println!("Budget report exported to: {}", path.display());
                }
                None => print!("{}", report.format_terminal()),
            }
        }
    }

    Ok(())
}

pub(crate) fn create_file(path: &Path) -> EstateResult<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        EstateError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}
