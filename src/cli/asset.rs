//! Asset CLI commands
//!
//! Implements CLI commands for the property register.

use clap::Subcommand;

use super::{parse_choice, parse_opt_date, parse_opt_money};
use crate::display::asset::{format_asset_details, format_asset_list, format_portfolio_summary};
use crate::error::EstateResult;
use crate::models::{Asset, AssetStatus, AssetType};
use crate::services::AssetService;
use crate::storage::{AssetFilter, Storage};

const ASSET_TYPES: &str =
    "warehouse, distribution_centre, manufacturing, cold_storage, industrial_land, office, other";
const ASSET_STATUSES: &str = "operational, leased, vacant, under_development, for_sale, sold";

/// Asset subcommands
#[derive(Subcommand)]
pub enum AssetCommands {
    /// Register a new property
    Create {
        /// Asset name
        name: String,
        /// Asset type
        #[arg(short = 't', long, default_value = "warehouse")]
        asset_type: String,
        /// Lifecycle status
        #[arg(short, long, default_value = "operational")]
        status: String,
        /// Region (e.g., "Brisbane")
        #[arg(short, long)]
        region: Option<String>,
        /// Street address
        #[arg(long)]
        address: Option<String>,
        /// Land area in square metres
        #[arg(long)]
        land_area: Option<f64>,
        /// Building area in square metres
        #[arg(long)]
        building_area: Option<f64>,
        /// Purchase price
        #[arg(long)]
        purchase_price: Option<String>,
        /// Current valuation
        #[arg(long)]
        valuation: Option<String>,
        /// Acquisition date (YYYY-MM-DD)
        #[arg(long)]
        acquired: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List assets
    List {
        /// Filter by region
        #[arg(short, long)]
        region: Option<String>,
        /// Filter by type
        #[arg(short = 't', long)]
        asset_type: Option<String>,
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show asset details
    Show {
        /// Asset name or ID
        asset: String,
    },
    /// Edit an asset
    Edit {
        /// Asset name or ID
        asset: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short = 't', long)]
        asset_type: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        region: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        land_area: Option<f64>,
        #[arg(long)]
        building_area: Option<f64>,
        #[arg(long)]
        purchase_price: Option<String>,
        #[arg(long)]
        valuation: Option<String>,
        #[arg(long)]
        acquired: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an asset
    Delete {
        /// Asset name or ID
        asset: String,
        /// Also delete linked projects, transactions, quotes and expenses
        #[arg(short, long)]
        force: bool,
    },
    /// Portfolio totals
    Summary,
    /// Regions, types and statuses in use
    Filters,
}

/// Handle an asset command
pub fn handle_asset_command(storage: &Storage, cmd: AssetCommands) -> EstateResult<()> {
    let service = AssetService::new(storage);

    match cmd {
        AssetCommands::Create {
            name,
            asset_type,
            status,
            region,
            address,
            land_area,
            building_area,
            purchase_price,
            valuation,
            acquired,
            notes,
        } => {
            let mut asset = Asset::new(
                name,
                parse_choice(&asset_type, "asset type", ASSET_TYPES, AssetType::parse)?,
            );
            asset.status = parse_choice(&status, "status", ASSET_STATUSES, AssetStatus::parse)?;
            asset.region = region;
            asset.address = address;
            asset.land_area_sqm = land_area;
            asset.building_area_sqm = building_area;
            asset.purchase_price = parse_opt_money(purchase_price.as_deref(), "purchase price")?;
            asset.current_valuation = parse_opt_money(valuation.as_deref(), "valuation")?;
            asset.acquisition_date = parse_opt_date(acquired.as_deref())?;
            asset.notes = notes.unwrap_or_default();

            let asset = service.create(asset)?;
            println!("Created asset: {}", asset.name);
            println!("  Type:   {}", asset.asset_type);
            println!("  Status: {}", asset.status);
            println!("  ID:     {}", asset.id);
        }

        AssetCommands::List {
            region,
            asset_type,
            status,
        } => {
            let filter = AssetFilter {
                region,
                asset_type: asset_type
                    .as_deref()
                    .map(|t| parse_choice(t, "asset type", ASSET_TYPES, AssetType::parse))
                    .transpose()?,
                status: status
                    .as_deref()
                    .map(|s| parse_choice(s, "status", ASSET_STATUSES, AssetStatus::parse))
                    .transpose()?,
            };
            print!("{}", format_asset_list(&service.list(&filter)?));
        }

        AssetCommands::Show { asset } => {
            let found = service.require(&asset)?;
            let dependants = storage.assets().dependants(found.id)?;
            print!("{}", format_asset_details(&found, &dependants));
        }

        AssetCommands::Edit {
            asset,
            name,
            asset_type,
            status,
            region,
            address,
            land_area,
            building_area,
            purchase_price,
            valuation,
            acquired,
            notes,
        } => {
            let mut found = service.require(&asset)?;
            let before = found.clone();

            if let Some(name) = name {
                found.name = name;
            }
            if let Some(t) = asset_type {
                found.asset_type = parse_choice(&t, "asset type", ASSET_TYPES, AssetType::parse)?;
            }
            if let Some(s) = status {
                found.status = parse_choice(&s, "status", ASSET_STATUSES, AssetStatus::parse)?;
            }
            if region.is_some() {
                found.region = region;
            }
            if address.is_some() {
                found.address = address;
            }
            if land_area.is_some() {
                found.land_area_sqm = land_area;
            }
            if building_area.is_some() {
                found.building_area_sqm = building_area;
            }
            if let Some(price) = parse_opt_money(purchase_price.as_deref(), "purchase price")? {
                found.purchase_price = Some(price);
            }
            if let Some(value) = parse_opt_money(valuation.as_deref(), "valuation")? {
                found.current_valuation = Some(value);
            }
            if let Some(date) = parse_opt_date(acquired.as_deref())? {
                found.acquisition_date = Some(date);
            }
            if let Some(notes) = notes {
                found.notes = notes;
            }

            if found == before {
                println!("No changes specified. Use --help to see editable fields.");
                return Ok(());
            }

            let updated = service.update(found)?;
            println!("Updated asset: {}", updated.name);
        }

        AssetCommands::Delete { asset, force } => {
            let found = service.require(&asset)?;
            let (deleted, dependants) = service.delete(found.id, force)?;
            println!("Deleted asset: {}", deleted.name);
            if dependants.total() > 0 {
                println!(
                    "  Also removed {} project(s), {} transaction(s), {} quote(s), {} monthly expense(s)",
                    dependants.projects, dependants.transactions, dependants.quotes, dependants.expenses
                );
            }
        }

        AssetCommands::Summary => {
            print!("{}", format_portfolio_summary(&service.portfolio_summary()?));
        }

        AssetCommands::Filters => {
            let options = service.filter_options()?;
            let types: Vec<String> = options.types.iter().map(|t| t.to_string()).collect();
            let statuses: Vec<String> = options.statuses.iter().map(|s| s.to_string()).collect();
            println!("Regions:  {}", options.regions.join(", "));
            println!("Types:    {}", types.join(", "));
            println!("Statuses: {}", statuses.join(", "));
        }
    }

    Ok(())
}
