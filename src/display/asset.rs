//! Asset display formatting

use tabled::Tabled;

use super::{opt_date, or_dash, render};
use crate::models::Asset;
use crate::services::PortfolioSummary;
use crate::storage::assets::AssetDependants;

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    asset_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Valuation")]
    valuation: String,
}

pub fn format_asset_list(assets: &[Asset]) -> String {
    let rows = assets
        .iter()
        .map(|a| AssetRow {
            id: a.id.to_string(),
            name: a.name.clone(),
            asset_type: a.asset_type.to_string(),
            status: a.status.to_string(),
            region: or_dash(a.region.as_deref()),
            valuation: or_dash(a.current_valuation),
        })
        .collect();
    render(rows, "No assets found.")
}

pub fn format_asset_details(asset: &Asset, dependants: &AssetDependants) -> String {
    let mut output = String::new();

    output.push_str(&format!("Asset: {}\n", asset.name));
    output.push_str(&format!("  ID:             {}\n", asset.id));
    output.push_str(&format!("  Type:           {}\n", asset.asset_type));
    output.push_str(&format!("  Status:         {}\n", asset.status));
    output.push_str(&format!("  Region:         {}\n", or_dash(asset.region.as_deref())));
    output.push_str(&format!("  Address:        {}\n", or_dash(asset.address.as_deref())));
    output.push_str(&format!(
        "  Land Area:      {}\n",
        or_dash(asset.land_area_sqm.map(|a| format!("{:.0} sqm", a)))
    ));
    output.push_str(&format!(
        "  Building Area:  {}\n",
        or_dash(asset.building_area_sqm.map(|a| format!("{:.0} sqm", a)))
    ));
    output.push_str(&format!("  Purchase Price: {}\n", or_dash(asset.purchase_price)));
    output.push_str(&format!("  Valuation:      {}\n", or_dash(asset.current_valuation)));
    output.push_str(&format!("  Acquired:       {}\n", opt_date(asset.acquisition_date)));

    if !asset.notes.is_empty() {
        output.push_str(&format!("  Notes:          {}\n", asset.notes));
    }

    output.push('\n');
    output.push_str(&format!(
        "  Linked: {} projects, {} transactions, {} quotes, {} monthly expenses\n",
        dependants.projects, dependants.transactions, dependants.quotes, dependants.expenses
    ));

    output
}

pub fn format_portfolio_summary(summary: &PortfolioSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!("Assets:          {}\n", summary.asset_count));
    output.push_str(&format!("Total Valuation: {}\n", summary.total_valuation));
    output.push_str(&format!("Land Area:       {:.0} sqm\n", summary.total_land_area_sqm));
    output.push_str(&format!("Building Area:   {:.0} sqm\n", summary.total_building_area_sqm));
    for (status, count) in &summary.by_status {
        output.push_str(&format!("  {:<18} {}\n", status.to_string(), count));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetType, Money};

    #[test]
    fn test_asset_list() {
        let mut asset = Asset::new("Brisbane Logistics Hub", AssetType::Warehouse);
        asset.current_valuation = Some(Money::from_dollars(12_500_000));

        let out = format_asset_list(&[asset]);
        assert!(out.contains("Brisbane Logistics Hub"));
        assert!(out.contains("$12,500,000.00"));
        assert_eq!(format_asset_list(&[]), "No assets found.");
    }

    #[test]
    fn test_asset_details() {
        let asset = Asset::new("Site", AssetType::IndustrialLand);
        let out = format_asset_details(&asset, &AssetDependants::default());
        assert!(out.contains("Region:         -"));
        assert!(out.contains("0 projects"));
    }
}
