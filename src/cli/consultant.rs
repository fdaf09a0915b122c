//! Consultant CLI commands
//!
//! Covers the consultant register plus price estimates and recommendations
//! built from past quotes.

use clap::Subcommand;

use super::split_list;
use crate::display::consultant::{
    format_consultant_details, format_consultant_list, format_price_estimate,
    format_recommendations,
};
use crate::error::EstateResult;
use crate::models::Consultant;
use crate::services::{ConsultantService, QuoteService};
use crate::storage::Storage;

/// Consultant subcommands
#[derive(Subcommand)]
pub enum ConsultantCommands {
    /// Add a consultant
    Add {
        /// Consultant name
        name: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Discipline (e.g., "civil", "architect")
        #[arg(short, long)]
        category: Option<String>,
        /// Comma-separated typical scopes
        #[arg(short, long)]
        scopes: Option<String>,
        /// Quality rating 1-5
        #[arg(long)]
        quality: Option<u8>,
        /// Reliability rating 1-5
        #[arg(long)]
        reliability: Option<u8>,
        /// Cost rating 1-5 (5 = best value)
        #[arg(long)]
        cost: Option<u8>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List consultants
    List {
        #[arg(short, long)]
        category: Option<String>,
        /// Include inactive consultants
        #[arg(short, long)]
        all: bool,
    },
    /// Show a consultant with their quotes
    Show {
        /// Consultant name or ID
        consultant: String,
    },
    /// Edit a consultant
    Edit {
        consultant: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        scopes: Option<String>,
        #[arg(long)]
        quality: Option<u8>,
        #[arg(long)]
        reliability: Option<u8>,
        #[arg(long)]
        cost: Option<u8>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Deactivate a consultant (quotes are kept)
    Deactivate { consultant: String },
    /// Reactivate a consultant
    Reactivate { consultant: String },
    /// Estimate a price from the consultant's quote history
    Estimate {
        consultant: String,
        /// Job size, usually square metres
        #[arg(long)]
        size: f64,
        /// Only use quotes of this project type
        #[arg(short = 't', long)]
        project_type: Option<String>,
    },
    /// Rank consultants for a job
    Recommend {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        size: f64,
        /// Comma-separated required scopes
        #[arg(short, long, default_value = "")]
        scopes: String,
        #[arg(short = 't', long)]
        project_type: Option<String>,
    },
}

/// Handle a consultant command
pub fn handle_consultant_command(storage: &Storage, cmd: ConsultantCommands) -> EstateResult<()> {
    let service = ConsultantService::new(storage);

    match cmd {
        ConsultantCommands::Add {
            name,
            company,
            email,
            phone,
            category,
            scopes,
            quality,
            reliability,
            cost,
            notes,
        } => {
            let mut consultant = Consultant::new(name);
            consultant.company = company;
            consultant.email = email;
            consultant.phone = phone;
            consultant.category = category;
            consultant.typical_scopes = scopes.as_deref().map(split_list).unwrap_or_default();
            consultant.quality_rating = quality;
            consultant.reliability_rating = reliability;
            consultant.cost_rating = cost;
            consultant.notes = notes.unwrap_or_default();

            let consultant = service.create(consultant)?;
            println!("Added consultant: {}", consultant);
            println!("  ID: {}", consultant.id);
        }

        ConsultantCommands::List { category, all } => {
            let consultants = service.list(category.as_deref(), !all)?;
            print!("{}", format_consultant_list(&consultants));
        }

        ConsultantCommands::Show { consultant } => {
            let found = service.require(&consultant)?;
            let quotes = QuoteService::new(storage).list_for_consultant(found.id)?;
            print!("{}", format_consultant_details(&found, &quotes));
        }

        ConsultantCommands::Edit {
            consultant,
            name,
            company,
            email,
            phone,
            category,
            scopes,
            quality,
            reliability,
            cost,
            notes,
        } => {
            let mut found = service.require(&consultant)?;
            let before = found.clone();

            if let Some(name) = name {
                found.name = name;
            }
            if company.is_some() {
                found.company = company;
            }
            if email.is_some() {
                found.email = email;
            }
            if phone.is_some() {
                found.phone = phone;
            }
            if category.is_some() {
                found.category = category;
            }
            if let Some(scopes) = scopes {
                found.typical_scopes = split_list(&scopes);
            }
            if quality.is_some() {
                found.quality_rating = quality;
            }
            if reliability.is_some() {
                found.reliability_rating = reliability;
            }
            if cost.is_some() {
                found.cost_rating = cost;
            }
            if let Some(notes) = notes {
                found.notes = notes;
            }

            if found == before {
                println!("No changes specified. Use --help to see editable fields.");
                return Ok(());
            }

            let updated = service.update(found)?;
            println!("Updated consultant: {}", updated.name);
        }

        ConsultantCommands::Deactivate { consultant } => {
            let found = service.require(&consultant)?;
            let updated = service.deactivate(found.id)?;
            println!("Deactivated consultant: {}", updated.name);
        }

        ConsultantCommands::Reactivate { consultant } => {
            let found = service.require(&consultant)?;
            let updated = service.reactivate(found.id)?;
            println!("Reactivated consultant: {}", updated.name);
        }

        ConsultantCommands::Estimate {
            consultant,
            size,
            project_type,
        } => {
            let found = service.require(&consultant)?;
            let estimate = service.estimate_price(found.id, size, project_type.as_deref())?;
            println!(
                "{} for {:.0} sqm: {}",
                found.name,
                size,
                format_price_estimate(&estimate)
            );
        }

        ConsultantCommands::Recommend {
            category,
            size,
            scopes,
            project_type,
        } => {
            let required = split_list(&scopes);
            let recommendations = service.recommend(
                category.as_deref(),
                size,
                &required,
                project_type.as_deref(),
            )?;
            print!("{}", format_recommendations(&recommendations));
        }
    }

    Ok(())
}
