//! Portfolio Report
//!
//! Every asset matching a filter with its valuation, plus portfolio totals.

use std::io::Write;

use crate::error::{EstateError, EstateResult};
use crate::export::csv::escape_csv;
use crate::models::{Asset, Money};
use crate::services::{AssetService, PortfolioSummary};
use crate::storage::assets::AssetFilter;
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct PortfolioReport {
    pub assets: Vec<Asset>,
    /// Totals across the whole portfolio, not just the filtered rows
    pub summary: PortfolioSummary,
    /// Valuation of the listed assets
    pub listed_valuation: Money,
}

impl PortfolioReport {
    pub fn generate(storage: &Storage, filter: &AssetFilter) -> EstateResult<Self> {
        let service = AssetService::new(storage);
        let assets = service.list(filter)?;
        let listed_valuation = assets.iter().filter_map(|a| a.current_valuation).sum();

        Ok(Self {
            assets,
            summary: service.portfolio_summary()?,
            listed_valuation,
        })
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str("Portfolio Report\n");
        output.push_str(&"=".repeat(90));
        output.push('\n');
        output.push_str(&format!("Assets: {}\n", self.summary.asset_count));
        output.push_str(&format!("Total Valuation: {}\n", self.summary.total_valuation));
        output.push_str(&format!(
            "Land Area: {:.0} sqm   Building Area: {:.0} sqm\n",
            self.summary.total_land_area_sqm, self.summary.total_building_area_sqm
        ));
        for (status, count) in &self.summary.by_status {
            output.push_str(&format!("  {:<20} {:>5}\n", status.to_string(), count));
        }
        output.push('\n');

        output.push_str(&format!(
            "{:<30} {:<20} {:<16} {:<14} {:>16}\n",
            "Name", "Type", "Region", "Status", "Valuation"
        ));
        output.push_str(&"-".repeat(90));
        output.push('\n');

        for asset in &self.assets {
            output.push_str(&format!(
                "{:<30} {:<20} {:<16} {:<14} {:>16}\n",
                truncate(&asset.name, 30),
                asset.asset_type.to_string(),
                truncate(asset.region.as_deref().unwrap_or("-"), 16),
                asset.status.to_string(),
                asset
                    .current_valuation
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ));
        }

        output.push_str(&"-".repeat(90));
        output.push('\n');
        output.push_str(&format!(
            "{:<30} {:>59}\n",
            format!("LISTED ({})", self.assets.len()),
            self.listed_valuation
        ));

        output
    }

    /// Export the asset rows to CSV
    pub fn export_csv<W: Write>(&self, writer: &mut W) -> EstateResult<()> {
        writeln!(
            writer,
            "ID,Name,Type,Status,Region,Land Area (sqm),Building Area (sqm),Purchase Price,Valuation,Acquired"
        )
        .map_err(|e| EstateError::Export(e.to_string()))?;

        for asset in &self.assets {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{},{}",
                asset.id,
                escape_csv(&asset.name),
                asset.asset_type,
                asset.status,
                escape_csv(asset.region.as_deref().unwrap_or("")),
                optional(asset.land_area_sqm),
                optional(asset.building_area_sqm),
                optional(asset.purchase_price.map(|m| m.as_f64())),
                optional(asset.current_valuation.map(|m| m.as_f64())),
                asset.acquisition_date.map(|d| d.to_string()).unwrap_or_default()
            )
            .map_err(|e| EstateError::Export(e.to_string()))?;
        }

        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetStatus, AssetType};

    fn seeded() -> Storage {
        let storage = Storage::in_memory().unwrap();
        let service = AssetService::new(&storage);

        let mut hub = Asset::new("Brisbane Logistics Hub", AssetType::Warehouse);
        hub.region = Some("Brisbane".into());
        hub.current_valuation = Some(Money::from_dollars(12_000_000));
        hub.land_area_sqm = Some(20_000.0);
        service.create(hub).unwrap();

        let mut site = Asset::new("Caloundra, Lot 4", AssetType::IndustrialLand);
        site.region = Some("Sunshine Coast".into());
        site.status = AssetStatus::UnderDevelopment;
        site.current_valuation = Some(Money::from_dollars(3_000_000));
        service.create(site).unwrap();

        storage
    }

    #[test]
    fn test_filtered_listing_keeps_portfolio_totals() {
        let storage = seeded();
        let filter = AssetFilter {
            region: Some("Brisbane".into()),
            ..Default::default()
        };
        let report = PortfolioReport::generate(&storage, &filter).unwrap();

        assert_eq!(report.assets.len(), 1);
        assert_eq!(report.listed_valuation, Money::from_dollars(12_000_000));
        assert_eq!(report.summary.asset_count, 2);
        assert_eq!(report.summary.total_valuation, Money::from_dollars(15_000_000));
    }

    #[test]
    fn test_csv_escapes_names() {
        let storage = seeded();
        let report = PortfolioReport::generate(&storage, &AssetFilter::default()).unwrap();

        let mut csv = Vec::new();
        report.export_csv(&mut csv).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("\"Caloundra, Lot 4\""));
        assert!(report.format_terminal().contains("LISTED (2)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long asset name", 10), "a very ...");
    }
}
