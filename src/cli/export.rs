//! CLI commands for data export
//!
//! CSV covers one table at a time; JSON and YAML hold the whole database.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use super::report::create_file;
use crate::error::{EstateError, EstateResult};
use crate::export::{self, CsvTable, FullExport};
use crate::storage::Storage;

/// Full-export formats
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-readable)
    Yaml,
}

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export all data to a file
    All {
        /// Output file path
        output: PathBuf,

        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Export one table to CSV
    Csv {
        /// assets, projects, transactions, consultants, quotes, expenses or tasks
        table: String,
        /// Output file path
        output: PathBuf,
    },

    /// Write every table as CSV into a directory (defaults to the export directory)
    Tables { dir: Option<PathBuf> },

    /// Parse and check a JSON or YAML export file
    Verify { file: PathBuf },

    /// Show what an export would contain
    Info,
}

/// Handle an export command
pub fn handle_export_command(storage: &Storage, cmd: ExportCommands) -> EstateResult<()> {
    match cmd {
        ExportCommands::All {
            output,
            format,
            pretty,
        } => {
            let mut writer = create_file(&output)?;
            match format {
                ExportFormat::Json => export::export_full_json(storage, &mut writer, pretty)?,
                ExportFormat::Yaml => export::export_full_yaml(storage, &mut writer)?,
            }
            println!("Exported full database to: {}", output.display());
        }

        ExportCommands::Csv { table, output } => {
            let table = parse_table(&table)?;
            let mut writer = create_file(&output)?;
            export::export_table_csv(storage, table, &mut writer)?;
            println!("Exported {} to: {}", table.as_str(), output.display());
        }

        ExportCommands::Tables { dir } => {
            let dir = match dir {
                Some(d) => d,
                None => storage.require_paths()?.export_dir(),
            };
            std::fs::create_dir_all(&dir).map_err(|e| {
                EstateError::Export(format!("Failed to create {}: {}", dir.display(), e))
            })?;
            for table in CsvTable::ALL {
                let path = dir.join(format!("{}.csv", table.as_str()));
                let mut writer = create_file(&path)?;
                export::export_table_csv(storage, table, &mut writer)?;
                println!("  {}", path.display());
            }
            println!("Exported {} tables to: {}", CsvTable::ALL.len(), dir.display());
        }

        ExportCommands::Verify { file } => {
            let contents = std::fs::read_to_string(&file)
                .map_err(|e| EstateError::Io(format!("Failed to read {}: {}", file.display(), e)))?;
            let is_yaml = file
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
                .unwrap_or(false);
            let parsed = if is_yaml {
                export::import_from_yaml(&contents)?
            } else {
                export::import_from_json(&contents)?
            };
            println!("Export file is valid: {}", file.display());
            print_contents(&parsed);
        }

        ExportCommands::Info => {
            let snapshot = FullExport::from_storage(storage)?;
            println!("Export Information");
            println!("==================");
            println!();
            println!("Schema Version: {}", snapshot.schema_version);
            println!("App Version:    {}", snapshot.app_version);
            println!();
            print_contents(&snapshot);
            println!();
            println!("Examples:");
            println!("  estate export all portfolio.json --format json --pretty");
            println!("  estate export csv assets assets.csv");
            println!("  estate export tables");
        }
    }

    Ok(())
}

fn parse_table(value: &str) -> EstateResult<CsvTable> {
    CsvTable::parse(value).ok_or_else(|| {
        let valid: Vec<_> = CsvTable::ALL.iter().map(|t| t.as_str()).collect();
        EstateError::Validation(format!(
            "Unknown table '{}'. Valid tables: {}",
            value,
            valid.join(", ")
        ))
    })
}

fn print_contents(export: &FullExport) {
    let meta = &export.metadata;
    println!("Data Summary:");
    println!("  Assets:        {}", meta.asset_count);
    println!("  Projects:      {}", meta.project_count);
    println!("  Transactions:  {}", meta.transaction_count);
    println!("  Consultants:   {}", meta.consultant_count);
    println!("  Quotes:        {}", meta.quote_count);
    println!("  Expenses:      {}", meta.expense_count);
    println!("  Tasks:         {}", meta.task_count);

    if let (Some(earliest), Some(latest)) = (&meta.earliest_transaction, &meta.latest_transaction) {
        println!("Transactions from {} to {}", earliest, latest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_rejects_unknown() {
        assert!(parse_table("assets").is_ok());
        let err = parse_table("accounts").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("consultants"));
    }
}
