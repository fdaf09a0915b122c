//! Asset model
//!
//! Represents an owned industrial property (warehouse, distribution centre,
//! development site, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AssetId;
use super::money::Money;

/// Kind of property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    #[default]
    Warehouse,
    DistributionCentre,
    Manufacturing,
    ColdStorage,
    IndustrialLand,
    Office,
    Other,
}

impl AssetType {
    pub const ALL: [AssetType; 7] = [
        Self::Warehouse,
        Self::DistributionCentre,
        Self::Manufacturing,
        Self::ColdStorage,
        Self::IndustrialLand,
        Self::Office,
        Self::Other,
    ];

    /// Stable storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::DistributionCentre => "distribution_centre",
            Self::Manufacturing => "manufacturing",
            Self::ColdStorage => "cold_storage",
            Self::IndustrialLand => "industrial_land",
            Self::Office => "office",
            Self::Other => "other",
        }
    }

    /// Parse asset type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "warehouse" => Some(Self::Warehouse),
            "distribution_centre" | "distribution_center" | "dc" => Some(Self::DistributionCentre),
            "manufacturing" | "factory" => Some(Self::Manufacturing),
            "cold_storage" => Some(Self::ColdStorage),
            "industrial_land" | "land" => Some(Self::IndustrialLand),
            "office" => Some(Self::Office),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Warehouse => "Warehouse",
            Self::DistributionCentre => "Distribution Centre",
            Self::Manufacturing => "Manufacturing",
            Self::ColdStorage => "Cold Storage",
            Self::IndustrialLand => "Industrial Land",
            Self::Office => "Office",
            Self::Other => "Other",
        };
        f.pad(label)
    }
}

impl_sql_text!(AssetType);

/// Occupancy / lifecycle status of a property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[default]
    Operational,
    Leased,
    Vacant,
    UnderDevelopment,
    ForSale,
    Sold,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Leased => "leased",
            Self::Vacant => "vacant",
            Self::UnderDevelopment => "under_development",
            Self::ForSale => "for_sale",
            Self::Sold => "sold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "operational" | "active" => Some(Self::Operational),
            "leased" => Some(Self::Leased),
            "vacant" => Some(Self::Vacant),
            "under_development" | "development" => Some(Self::UnderDevelopment),
            "for_sale" => Some(Self::ForSale),
            "sold" => Some(Self::Sold),
            _ => None,
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Operational => "Operational",
            Self::Leased => "Leased",
            Self::Vacant => "Vacant",
            Self::UnderDevelopment => "Under Development",
            Self::ForSale => "For Sale",
            Self::Sold => "Sold",
        };
        f.pad(label)
    }
}

impl_sql_text!(AssetStatus);

/// An owned property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,

    /// Property name (e.g., "Brisbane Logistics Hub")
    pub name: String,

    #[serde(rename = "type")]
    pub asset_type: AssetType,

    pub status: AssetStatus,

    /// Market region used for filtering (e.g., "Brisbane")
    pub region: Option<String>,

    pub address: Option<String>,

    pub land_area_sqm: Option<f64>,

    pub building_area_sqm: Option<f64>,

    pub purchase_price: Option<Money>,

    pub current_valuation: Option<Money>,

    pub acquisition_date: Option<NaiveDate>,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Create a new, unsaved asset
    pub fn new(name: impl Into<String>, asset_type: AssetType) -> Self {
        let now = Utc::now();
        Self {
            id: AssetId::default(),
            name: name.into(),
            asset_type,
            status: AssetStatus::default(),
            region: None,
            address: None,
            land_area_sqm: None,
            building_area_sqm: None,
            purchase_price: None,
            current_valuation: None,
            acquisition_date: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the asset
    pub fn validate(&self) -> Result<(), AssetValidationError> {
        if self.name.trim().is_empty() {
            return Err(AssetValidationError::EmptyName);
        }

        if self.name.len() > 200 {
            return Err(AssetValidationError::NameTooLong(self.name.len()));
        }

        for area in [self.land_area_sqm, self.building_area_sqm].into_iter().flatten() {
            if !area.is_finite() || area < 0.0 {
                return Err(AssetValidationError::NegativeArea);
            }
        }

        for value in [self.purchase_price, self.current_valuation].into_iter().flatten() {
            if value.is_negative() {
                return Err(AssetValidationError::NegativeValue);
            }
        }

        Ok(())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.asset_type)
    }
}

/// Validation errors for assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeArea,
    NegativeValue,
}

impl fmt::Display for AssetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Asset name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Asset name too long ({} chars, max 200)", len),
            Self::NegativeArea => write!(f, "Land and building areas must be zero or more"),
            Self::NegativeValue => write!(f, "Purchase price and valuation cannot be negative"),
        }
    }
}

impl std::error::Error for AssetValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_asset() {
        let asset = Asset::new("Brisbane Logistics Hub", AssetType::Warehouse);
        assert!(asset.id.is_unsaved());
        assert_eq!(asset.status, AssetStatus::Operational);
        assert!(asset.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut asset = Asset::new("", AssetType::Warehouse);
        assert_eq!(asset.validate(), Err(AssetValidationError::EmptyName));

        asset.name = "Site".into();
        asset.land_area_sqm = Some(-1.0);
        assert_eq!(asset.validate(), Err(AssetValidationError::NegativeArea));

        asset.land_area_sqm = Some(6000.0);
        asset.current_valuation = Some(Money::from_cents(-1));
        assert_eq!(asset.validate(), Err(AssetValidationError::NegativeValue));
    }

    #[test]
    fn test_type_and_status_parsing() {
        assert_eq!(
            AssetType::parse("Distribution Center"),
            Some(AssetType::DistributionCentre)
        );
        assert_eq!(AssetType::parse("cold-storage"), Some(AssetType::ColdStorage));
        assert_eq!(AssetType::parse("castle"), None);
        assert_eq!(
            AssetStatus::parse("Under Development"),
            Some(AssetStatus::UnderDevelopment)
        );
        for t in AssetType::ALL {
            assert_eq!(AssetType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_display() {
        let asset = Asset::new("Eagle Farm", AssetType::ColdStorage);
        assert_eq!(asset.to_string(), "Eagle Farm (Cold Storage)");
    }
}
