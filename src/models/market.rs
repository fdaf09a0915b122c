//! Market indicator model
//!
//! A persisted statistics datapoint (GDP growth, unemployment, cash rate).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::IndicatorId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndicator {
    pub id: IndicatorId,

    /// Indicator key (e.g., "gdp_growth", "rba_cash_rate")
    pub indicator_type: String,

    pub region: String,

    pub value: f64,

    pub previous_value: Option<f64>,

    /// Percent change against `previous_value`
    pub change_percent: Option<f64>,

    /// Reporting period label (e.g., "2024", "Q3 2025")
    pub period: Option<String>,

    pub date: NaiveDate,

    pub source: String,

    pub source_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl MarketIndicator {
    /// Percent change from `previous` to `value`; `None` when there is no
    /// usable previous value
    pub fn change_from(value: f64, previous: Option<f64>) -> Option<f64> {
        match previous {
            Some(prev) if prev != 0.0 => Some((value - prev) / prev.abs() * 100.0),
            _ => None,
        }
    }
}

impl fmt::Display for MarketIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {:.2}", self.indicator_type, self.region, self.value)?;
        if let Some(change) = self.change_percent {
            write!(f, " ({:+.1}%)", change)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_from() {
        assert_eq!(MarketIndicator::change_from(4.4, Some(4.0)).map(|c| (c * 10.0).round()), Some(100.0));
        assert_eq!(MarketIndicator::change_from(-1.0, Some(-2.0)), Some(50.0));
        assert_eq!(MarketIndicator::change_from(1.0, Some(0.0)), None);
        assert_eq!(MarketIndicator::change_from(1.0, None), None);
    }
}
