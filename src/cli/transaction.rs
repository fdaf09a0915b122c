//! Transaction CLI commands
//!
//! Ledger entries: rent received, rates paid, construction invoices.

use clap::Subcommand;

use super::{parse_choice, parse_date, parse_money, parse_opt_date, today};
use crate::display::transaction::{format_transaction_details, format_transaction_list};
use crate::error::EstateResult;
use crate::models::{Transaction, TransactionKind};
use crate::services::{AssetService, ProjectService, TransactionService};
use crate::storage::{Storage, TransactionFilter};

const KINDS: &str = "income, expense";

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a transaction
    Add {
        /// income or expense
        kind: String,
        /// Positive amount (e.g., "12500.00")
        amount: String,
        /// Date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short = 'm', long)]
        description: Option<String>,
        /// Invoice or reference number
        #[arg(short, long)]
        reference: Option<String>,
        /// Vendor or payer
        #[arg(short, long)]
        payee: Option<String>,
        /// Asset name or ID
        #[arg(short, long)]
        asset: Option<String>,
        /// Project name, code or ID
        #[arg(long)]
        project: Option<String>,
    },
    /// List transactions, newest first
    List {
        #[arg(short, long)]
        asset: Option<String>,
        #[arg(long)]
        project: Option<String>,
        /// income or expense
        #[arg(short, long)]
        kind: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// From date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// To date, exclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Show one transaction
    Show {
        /// Transaction ID (e.g., "txn-12")
        id: String,
    },
    /// Edit a transaction
    Edit {
        id: String,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short = 'm', long)]
        description: Option<String>,
        #[arg(short, long)]
        reference: Option<String>,
        #[arg(short, long)]
        payee: Option<String>,
        /// Mark reconciled (true) or not (false)
        #[arg(long)]
        reconciled: Option<bool>,
    },
    /// Delete a transaction
    Delete { id: String },
}

/// Handle a transaction command
pub fn handle_transaction_command(storage: &Storage, cmd: TransactionCommands) -> EstateResult<()> {
    let service = TransactionService::new(storage);

    match cmd {
        TransactionCommands::Add {
            kind,
            amount,
            date,
            category,
            description,
            reference,
            payee,
            asset,
            project,
        } => {
            let kind = parse_choice(&kind, "kind", KINDS, TransactionKind::parse)?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => today(),
            };
            let mut txn = Transaction::new(date, kind, parse_money(&amount, "amount")?);
            txn.category = category;
            txn.description = description;
            txn.reference = reference;
            txn.payee = payee;
            txn.asset_id = match asset {
                Some(a) => Some(AssetService::new(storage).require(&a)?.id),
                None => None,
            };
            txn.project_id = match project {
                Some(p) => Some(ProjectService::new(storage).require(&p)?.id),
                None => None,
            };

            let txn = service.add(txn)?;
            println!(
                "Recorded {} of {} on {} ({})",
                txn.kind.as_str(),
                txn.amount,
                txn.date,
                txn.id
            );
        }

        TransactionCommands::List {
            asset,
            project,
            kind,
            category,
            from,
            to,
            limit,
        } => {
            let filter = TransactionFilter {
                asset_id: match asset {
                    Some(a) => Some(AssetService::new(storage).require(&a)?.id),
                    None => None,
                },
                project_id: match project {
                    Some(p) => Some(ProjectService::new(storage).require(&p)?.id),
                    None => None,
                },
                kind: kind
                    .as_deref()
                    .map(|k| parse_choice(k, "kind", KINDS, TransactionKind::parse))
                    .transpose()?,
                category,
                from: parse_opt_date(from.as_deref())?,
                to: parse_opt_date(to.as_deref())?,
                limit: Some(limit),
            };
            print!("{}", format_transaction_list(&service.list(&filter)?));
        }

        TransactionCommands::Show { id } => {
            print!("{}", format_transaction_details(&service.require(&id)?));
        }

        TransactionCommands::Edit {
            id,
            kind,
            amount,
            date,
            category,
            description,
            reference,
            payee,
            reconciled,
        } => {
            let mut txn = service.require(&id)?;
            let before = txn.clone();

            if let Some(k) = kind {
                txn.kind = parse_choice(&k, "kind", KINDS, TransactionKind::parse)?;
            }
            if let Some(a) = amount {
                txn.amount = parse_money(&a, "amount")?;
            }
            if let Some(d) = date {
                txn.date = parse_date(&d)?;
            }
            if category.is_some() {
                txn.category = category;
            }
            if description.is_some() {
                txn.description = description;
            }
            if reference.is_some() {
                txn.reference = reference;
            }
            if payee.is_some() {
                txn.payee = payee;
            }
            if let Some(r) = reconciled {
                txn.is_reconciled = r;
            }

            if txn == before {
                println!("No changes specified. Use --help to see editable fields.");
                return Ok(());
            }

            let updated = service.update(txn)?;
            println!("Updated transaction {}", updated.id);
        }

        TransactionCommands::Delete { id } => {
            let txn = service.require(&id)?;
            let deleted = service.delete(txn.id)?;
            println!("Deleted transaction {} ({})", deleted.id, deleted.amount);
        }
    }

    Ok(())
}
