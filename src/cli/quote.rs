//! Quote CLI commands

use clap::Subcommand;

use super::{parse_choice, parse_date, parse_money, parse_opt_date, parse_opt_money, today};
use crate::display::consultant::format_quote_history;
use crate::error::EstateResult;
use crate::models::{Quote, QuoteStatus};
use crate::services::{AssetService, ConsultantService, ProjectService, QuoteService};
use crate::storage::Storage;

const QUOTE_STATUSES: &str = "pending, accepted, rejected, completed";

/// Quote subcommands
#[derive(Subcommand)]
pub enum QuoteCommands {
    /// Record a quote from a consultant
    Add {
        /// Consultant name or ID
        consultant: String,
        /// Quoted amount
        amount: String,
        /// Quote date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Last day the quote is valid (YYYY-MM-DD)
        #[arg(long)]
        valid_until: Option<String>,
        #[arg(short, long)]
        scope: Option<String>,
        #[arg(short = 't', long)]
        project_type: Option<String>,
        /// Job size, usually square metres
        #[arg(long)]
        size: Option<f64>,
        #[arg(short, long)]
        asset: Option<String>,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long, default_value = "pending")]
        status: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Quote history, newest first
    History {
        /// Filter by project (name, code or ID)
        #[arg(short, long)]
        project: Option<String>,
        /// Filter by consultant (name or ID)
        #[arg(short, long)]
        consultant: Option<String>,
    },
    /// Change a quote's status
    Status {
        /// Quote ID (e.g., "quo-3")
        id: String,
        /// pending, accepted, rejected or completed
        status: String,
        /// Final invoiced amount
        #[arg(long)]
        actual: Option<String>,
    },
    /// Check whether a quote is still valid
    Check {
        id: String,
        /// Date to check against (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Delete a quote
    Delete { id: String },
}

/// Handle a quote command
pub fn handle_quote_command(storage: &Storage, cmd: QuoteCommands) -> EstateResult<()> {
    let service = QuoteService::new(storage);

    match cmd {
        QuoteCommands::Add {
            consultant,
            amount,
            date,
            valid_until,
            scope,
            project_type,
            size,
            asset,
            project,
            status,
            notes,
        } => {
            let consultant = ConsultantService::new(storage).require(&consultant)?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => today(),
            };
            let mut quote = Quote::new(consultant.id, date, parse_money(&amount, "amount")?);
            quote.valid_until = parse_opt_date(valid_until.as_deref())?;
            quote.scope = scope;
            quote.project_type = project_type;
            quote.project_size = size;
            quote.asset_id = match asset {
                Some(a) => Some(AssetService::new(storage).require(&a)?.id),
                None => None,
            };
            quote.project_id = match project {
                Some(p) => Some(ProjectService::new(storage).require(&p)?.id),
                None => None,
            };
            quote.status = parse_choice(&status, "status", QUOTE_STATUSES, QuoteStatus::parse)?;
            quote.notes = notes.unwrap_or_default();

            let quote = service.add(quote)?;
            println!(
                "Recorded quote {} from {} for {}",
                quote.id, consultant.name, quote.amount
            );
        }

        QuoteCommands::History {
            project,
            consultant,
        } => {
            let project_id = match project {
                Some(p) => Some(ProjectService::new(storage).require(&p)?.id),
                None => None,
            };
            let consultant_id = match consultant {
                Some(c) => Some(ConsultantService::new(storage).require(&c)?.id),
                None => None,
            };
            print!(
                "{}",
                format_quote_history(&service.history(project_id, consultant_id)?)
            );
        }

        QuoteCommands::Status { id, status, actual } => {
            let quote = service.require(&id)?;
            let status = parse_choice(&status, "status", QUOTE_STATUSES, QuoteStatus::parse)?;
            let actual = parse_opt_money(actual.as_deref(), "actual amount")?;
            let updated = service.update_status(quote.id, status, actual)?;
            println!("Quote {} is now {}", updated.id, updated.status);
        }

        QuoteCommands::Check { id, date } => {
            let quote = service.require(&id)?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => today(),
            };
            match quote.valid_until {
                Some(until) if !quote.is_valid_on(date) => {
                    println!("Quote {} expired on {}", quote.id, until)
                }
                _ => println!("Quote {} is valid on {}", quote.id, date),
            }
        }

        QuoteCommands::Delete { id } => {
            let quote = service.require(&id)?;
            let deleted = service.delete(quote.id)?;
            println!("Deleted quote {} ({})", deleted.id, deleted.amount);
        }
    }

    Ok(())
}
