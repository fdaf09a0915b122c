//! Market intelligence
//!
//! Economic indicators come from pluggable [`IndicatorSource`]s. The
//! [`MarketCollector`] caches fetched snapshots for a configurable time and
//! can persist them into the `market_indicators` table.

pub mod collector;
pub mod static_source;
pub mod world_bank;

pub use collector::MarketCollector;
pub use static_source::StaticSource;
pub use world_bank::WorldBankSource;

use crate::error::EstateResult;

/// One reading of an indicator as returned by a source
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    /// Lookup key the snapshot was fetched under (e.g. "rba_cash_rate")
    pub key: String,
    /// Stored indicator type (e.g. "cash_rate", "gdp_growth")
    pub indicator_type: String,
    pub region: String,
    pub value: f64,
    pub previous_value: Option<f64>,
    /// Reporting period as the source labels it ("Q3 2025", "2024")
    pub period: Option<String>,
    pub source: String,
    pub source_url: Option<String>,
}

/// A provider of indicator snapshots
pub trait IndicatorSource {
    /// Human-readable source name used in errors and logs
    fn name(&self) -> &str;

    /// Whether this source can answer `key`
    fn supports(&self, key: &str) -> bool;

    /// The keys this source knows about, for listings
    fn keys(&self) -> Vec<String>;

    fn fetch(&self, key: &str) -> EstateResult<IndicatorSnapshot>;
}
