//! Audit log CLI command

use clap::Args;

use super::parse_choice;
use crate::audit::EntityType;
use crate::error::EstateResult;
use crate::storage::Storage;

/// Audit log arguments
#[derive(Args)]
pub struct AuditArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value = "20")]
    pub count: usize,

    /// Only entries for this entity type (e.g., "asset", "quote", "task")
    #[arg(short, long)]
    pub entity: Option<String>,
}

/// Show the most recent audit entries, oldest first
pub fn handle_audit_command(storage: &Storage, args: AuditArgs) -> EstateResult<()> {
    let Some(logger) = storage.audit_logger() else {
        println!("No audit log for this database.");
        return Ok(());
    };

    let entity = args
        .entity
        .as_deref()
        .map(|e| {
            parse_choice(
                e,
                "entity type",
                "asset, project, transaction, consultant, quote, expense, task, import",
                EntityType::parse,
            )
        })
        .transpose()?;

    let entries = logger.read_recent(args.count, entity)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    println!();
    println!(
        "Showing {} of {} entries ({})",
        entries.len(),
        logger.entry_count()?,
        logger.path().display()
    );

    Ok(())
}
