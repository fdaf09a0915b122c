use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use estate::cli::{
    handle_asset_command, handle_audit_command, handle_backup_command,
    handle_consultant_command, handle_expense_command, handle_export_command,
    handle_finance_command, handle_loan_command, handle_market_command, handle_project_command,
    handle_quote_command, handle_report_command, handle_task_command,
    handle_transaction_command,
};
use estate::config::{paths::EstatePaths, settings::Settings};
use estate::{display, logging};
use estate::storage::{seed, Storage};

#[derive(Parser)]
#[command(
    name = "estate",
    author = "Gilbert Hale",
    version,
    about = "Industrial real-estate asset and project-finance tracker",
    long_about = "estate keeps a register of industrial properties and their \
                  development projects, with the ledger, consultant quotes, \
                  monthly expenses and WBS schedules behind them."
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and settings file
    Init {
        /// Load a sample portfolio into an empty database
        #[arg(long)]
        sample: bool,
    },

    /// Show current configuration and paths
    Config,

    /// Asset register commands
    #[command(subcommand)]
    Asset(estate::cli::AssetCommands),

    /// Development project commands
    #[command(subcommand)]
    Project(estate::cli::ProjectCommands),

    /// Ledger transaction commands
    #[command(subcommand, alias = "transaction")]
    Txn(estate::cli::TransactionCommands),

    /// Consultant directory and pricing
    #[command(subcommand)]
    Consultant(estate::cli::ConsultantCommands),

    /// Consultant quote commands
    #[command(subcommand)]
    Quote(estate::cli::QuoteCommands),

    /// Monthly operating expense commands
    #[command(subcommand)]
    Expense(estate::cli::ExpenseCommands),

    /// Project task (WBS) commands
    #[command(subcommand)]
    Task(estate::cli::TaskCommands),

    /// Cash position and cash-flow views
    #[command(subcommand)]
    Finance(estate::cli::FinanceCommands),

    /// Generate reports
    #[command(subcommand)]
    Report(estate::cli::ReportCommands),

    /// Market indicators
    #[command(subcommand)]
    Market(estate::cli::MarketCommands),

    /// Investment, construction and refinance loan calculators
    #[command(subcommand)]
    Loan(estate::cli::LoanCommands),

    /// Backup management commands
    #[command(subcommand)]
    Backup(estate::cli::BackupCommands),

    /// Export data to CSV, JSON or YAML
    #[command(subcommand)]
    Export(estate::cli::ExportCommands),

    /// Show recent audit log entries
    Audit(estate::cli::AuditArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = EstatePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    logging::init_tracing(&settings.log_level, cli.verbose);
    display::apply_settings(&settings);
    debug!(base = %paths.base_dir().display(), "Resolved data directory");

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("estate - industrial real-estate asset and project-finance tracker");
            println!();
            println!("Run 'estate --help' for usage information.");
            println!("Run 'estate init --sample' to start with a sample portfolio.");
            return Ok(());
        }
    };

    // Commands that never touch the database
    let command = match command {
        Commands::Loan(cmd) => {
            handle_loan_command(cmd)?;
            return Ok(());
        }
        Commands::Config => {
            print_config(&paths, &settings);
            return Ok(());
        }
        other => other,
    };

    let storage = Storage::open(paths.clone())?;

    match command {
        Commands::Init { sample } => {
            println!("Initializing estate at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            println!("Database: {}", paths.database_file().display());

            if sample {
                let summary = seed::load_sample_data(&storage, chrono::Local::now().date_naive())?;
                println!();
                println!("Sample portfolio loaded:");
                println!("  Assets:       {}", summary.assets);
                println!("  Projects:     {}", summary.projects);
                println!("  Transactions: {}", summary.transactions);
                println!("  Consultants:  {}", summary.consultants);
                println!("  Quotes:       {}", summary.quotes);
                println!("  Expenses:     {}", summary.expenses);
                println!("  Tasks:        {}", summary.tasks);
            }

            println!();
            println!("Initialization complete!");
            println!("Run 'estate asset list' to see the register.");
        }
        Commands::Asset(cmd) => handle_asset_command(&storage, cmd)?,
        Commands::Project(cmd) => handle_project_command(&storage, cmd)?,
        Commands::Txn(cmd) => handle_transaction_command(&storage, cmd)?,
        Commands::Consultant(cmd) => handle_consultant_command(&storage, cmd)?,
        Commands::Quote(cmd) => handle_quote_command(&storage, cmd)?,
        Commands::Expense(cmd) => handle_expense_command(&storage, cmd)?,
        Commands::Task(cmd) => handle_task_command(&storage, cmd)?,
        Commands::Finance(cmd) => handle_finance_command(&storage, &settings, cmd)?,
        Commands::Report(cmd) => handle_report_command(&storage, &settings, cmd)?,
        Commands::Market(cmd) => handle_market_command(&storage, &settings, cmd)?,
        Commands::Backup(cmd) => handle_backup_command(storage, &paths, &settings, cmd)?,
        Commands::Export(cmd) => handle_export_command(&storage, cmd)?,
        Commands::Audit(args) => handle_audit_command(&storage, args)?,
        Commands::Loan(_) | Commands::Config => {}
    }

    Ok(())
}

fn print_config(paths: &EstatePaths, settings: &Settings) {
    println!("estate Configuration");
    println!("====================");
    println!("Base directory:   {}", paths.base_dir().display());
    println!("Database:         {}", paths.database_file().display());
    println!("Backup directory: {}", paths.backup_dir().display());
    println!("Export directory: {}", paths.export_dir().display());
    println!("Audit log:        {}", paths.audit_log().display());
    println!("Initialized:      {}", paths.is_initialized());
    println!();
    println!("Settings:");
    println!(
        "  Currency:         {} ({})",
        settings.currency_code, settings.currency_symbol
    );
    println!("  Date format:      {}", settings.date_format);
    println!("  Trend months:     {}", settings.trend_months);
    println!("  Log level:        {}", settings.log_level);
    println!(
        "  Backup retention: {} daily, {} monthly",
        settings.backup_retention.daily_count, settings.backup_retention.monthly_count
    );
    println!(
        "  Market data:      {} (country {}, cache {}s)",
        settings.market.world_bank_url, settings.market.country, settings.market.cache_ttl_secs
    );
}
