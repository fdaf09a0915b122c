//! Monthly expense CLI commands

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Subcommand;
use uuid::Uuid;

use super::{parse_money, parse_month, today};
use crate::display::expense::{format_batch_list, format_expense_list, format_totals};
use crate::error::{EstateError, EstateResult};
use crate::models::{ExpenseId, MonthlyExpense, YearMonth};
use crate::services::{AssetService, ExpenseService, ImportTarget, ProjectService};
use crate::storage::{ExpenseFilter, Storage};

/// Monthly expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Set the expense for a category and month (replaces an existing amount)
    Set {
        /// Month (YYYY-MM)
        month: String,
        /// Category (e.g., "Rates", "Insurance")
        category: String,
        amount: String,
        #[arg(short, long)]
        asset: Option<String>,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List monthly expenses
    List {
        #[arg(short, long)]
        asset: Option<String>,
        #[arg(short, long)]
        project: Option<String>,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a monthly expense
    Delete {
        /// Expense ID (e.g., "exp-7")
        id: String,
    },
    /// Totals per month for one year
    Monthly {
        /// Year; defaults to the current year
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        asset: Option<String>,
    },
    /// Totals per category over a month range
    Categories {
        /// First month (YYYY-MM)
        from: String,
        /// Last month, inclusive (YYYY-MM)
        to: String,
    },
    /// Import expenses from CSV (year,month,category,amount[,notes])
    Import {
        file: PathBuf,
        #[arg(short, long)]
        asset: Option<String>,
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Reverse an import batch
    Undo {
        /// Batch ID printed by `expense import`
        batch: String,
    },
    /// List import batches
    Batches,
}

/// Handle a monthly expense command
pub fn handle_expense_command(storage: &Storage, cmd: ExpenseCommands) -> EstateResult<()> {
    let service = ExpenseService::new(storage);

    match cmd {
        ExpenseCommands::Set {
            month,
            category,
            amount,
            asset,
            project,
            notes,
        } => {
            let mut expense =
                MonthlyExpense::new(parse_month(&month)?, category, parse_money(&amount, "amount")?);
            let target = resolve_target(storage, asset, project)?;
            expense.asset_id = target.asset_id;
            expense.project_id = target.project_id;
            expense.notes = notes.unwrap_or_default();

            let (saved, action) = service.upsert(expense)?;
            println!(
                "Saved {} {}-{:02}: {} ({}, {})",
                saved.category, saved.year, saved.month, saved.amount, saved.id, action
            );
        }

        ExpenseCommands::List {
            asset,
            project,
            year,
            category,
        } => {
            let target = resolve_target(storage, asset, project)?;
            let filter = ExpenseFilter {
                asset_id: target.asset_id,
                project_id: target.project_id,
                year,
                category,
            };
            print!("{}", format_expense_list(&service.list(&filter)?));
        }

        ExpenseCommands::Delete { id } => {
            let id: ExpenseId = id
                .parse()
                .map_err(|_| EstateError::expense_not_found(&id))?;
            let deleted = service.delete(id)?;
            println!(
                "Deleted {} {}-{:02} ({})",
                deleted.category, deleted.year, deleted.month, deleted.amount
            );
        }

        ExpenseCommands::Monthly { year, asset } => {
            let year = year.unwrap_or_else(|| YearMonth::of(today()).year());
            let asset_id = match asset {
                Some(a) => Some(AssetService::new(storage).require(&a)?.id),
                None => None,
            };
            print!("{}", format_totals("Month", &service.totals_by_month(year, asset_id)?));
        }

        ExpenseCommands::Categories { from, to } => {
            let totals = service.totals_by_category(parse_month(&from)?, parse_month(&to)?)?;
            print!("{}", format_totals("Category", &totals));
        }

        ExpenseCommands::Import {
            file,
            asset,
            project,
        } => {
            let target = resolve_target(storage, asset, project)?;
            let reader = File::open(&file).map_err(|e| {
                EstateError::Import(format!("Failed to open {}: {}", file.display(), e))
            })?;
            let file_name = file
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| file.display().to_string());

            let batch = service.import_csv(BufReader::new(reader), &file_name, target)?;
            println!(
                "Imported {}: {} inserted, {} updated",
                batch.file_name, batch.inserted_count, batch.updated_count
            );
            println!("Batch: {}", batch.batch_id);
            println!("Undo with: estate expense undo {}", batch.batch_id);
        }

        ExpenseCommands::Undo { batch } => {
            let batch_id = Uuid::parse_str(batch.trim()).map_err(|_| {
                EstateError::Validation(format!("Invalid batch ID: '{}'", batch))
            })?;
            let undone = service.undo_batch(batch_id)?;
            println!(
                "Undid import of {} ({} inserted row(s) removed, {} amount(s) restored)",
                undone.file_name, undone.inserted_count, undone.updated_count
            );
        }

        ExpenseCommands::Batches => {
            print!("{}", format_batch_list(&service.list_batches()?));
        }
    }

    Ok(())
}

fn resolve_target(
    storage: &Storage,
    asset: Option<String>,
    project: Option<String>,
) -> EstateResult<ImportTarget> {
    Ok(ImportTarget {
        asset_id: match asset {
            Some(a) => Some(AssetService::new(storage).require(&a)?.id),
            None => None,
        },
        project_id: match project {
            Some(p) => Some(ProjectService::new(storage).require(&p)?.id),
            None => None,
        },
    })
}
