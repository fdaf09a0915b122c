//! Hand-maintained reference values
//!
//! ABS and the RBA publish no simple JSON API for these series, so the
//! latest releases are kept here and updated when new figures come out.

use super::{IndicatorSnapshot, IndicatorSource};
use crate::error::{EstateError, EstateResult};

struct Reference {
    key: &'static str,
    indicator_type: &'static str,
    value: f64,
    previous_value: Option<f64>,
    period: &'static str,
    source: &'static str,
    url: &'static str,
}

const REFERENCES: &[Reference] = &[
    Reference {
        key: "abs_gdp",
        indicator_type: "gdp_growth",
        value: 2.1,
        previous_value: None,
        period: "Q3 2025",
        source: "ABS",
        url: "https://www.abs.gov.au/statistics/economy/national-accounts/australian-national-accounts-national-income-expenditure-and-product",
    },
    Reference {
        key: "abs_unemployment",
        indicator_type: "unemployment_rate",
        value: 4.1,
        previous_value: Some(4.0),
        period: "December 2025",
        source: "ABS",
        url: "https://www.abs.gov.au/statistics/labour/employment-and-unemployment/labour-force-australia",
    },
    Reference {
        key: "rba_cash_rate",
        indicator_type: "cash_rate",
        value: 4.35,
        previous_value: Some(4.35),
        period: "2025-12-03",
        source: "RBA",
        url: "https://www.rba.gov.au/statistics/cash-rate/",
    },
];

#[derive(Debug, Clone, Default)]
pub struct StaticSource;

impl StaticSource {
    pub fn new() -> Self {
        Self
    }
}

impl IndicatorSource for StaticSource {
    fn name(&self) -> &str {
        "Reference data"
    }

    fn supports(&self, key: &str) -> bool {
        REFERENCES.iter().any(|r| r.key == key)
    }

    fn keys(&self) -> Vec<String> {
        REFERENCES.iter().map(|r| r.key.to_string()).collect()
    }

    fn fetch(&self, key: &str) -> EstateResult<IndicatorSnapshot> {
        let reference = REFERENCES
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| EstateError::upstream(self.name(), format!("unknown indicator '{}'", key)))?;

        Ok(IndicatorSnapshot {
            key: reference.key.to_string(),
            indicator_type: reference.indicator_type.to_string(),
            region: "Australia".to_string(),
            value: reference.value,
            previous_value: reference.previous_value,
            period: Some(reference.period.to_string()),
            source: reference.source.to_string(),
            source_url: Some(reference.url.to_string()),
        })
    }
}
