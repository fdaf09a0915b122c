//! World Bank Open Data source
//!
//! Keys have the form `world_bank_<INDICATOR CODE>`, for example
//! `world_bank_NY.GDP.MKTP.KD.ZG`. The API answers with a two-element
//! array `[metadata, data]`, where `data` is newest first and may hold
//! null values for years not yet published.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use super::{IndicatorSnapshot, IndicatorSource};
use crate::config::settings::MarketSettings;
use crate::error::{EstateError, EstateResult};

const KEY_PREFIX: &str = "world_bank_";
const SOURCE_NAME: &str = "World Bank";

/// Indicator codes offered in listings, with their stored type names
const KNOWN_INDICATORS: &[(&str, &str)] = &[
    ("NY.GDP.MKTP.KD.ZG", "gdp_growth"),
    ("SL.UEM.TOTL.ZS", "unemployment_rate"),
    ("FP.CPI.TOTL.ZG", "inflation"),
];

pub struct WorldBankSource {
    client: Client,
    base_url: String,
    country: String,
}

impl WorldBankSource {
    pub fn new(base_url: impl Into<String>, country: impl Into<String>, timeout: Duration) -> EstateResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            country: country.into(),
        })
    }

    pub fn from_settings(settings: &MarketSettings) -> EstateResult<Self> {
        Self::new(
            settings.world_bank_url.clone(),
            settings.country.clone(),
            Duration::from_secs(settings.http_timeout_secs),
        )
    }

    fn url(&self, code: &str) -> String {
        format!(
            "{}/country/{}/indicator/{}?format=json&per_page=10",
            self.base_url, self.country, code
        )
    }
}

/// Stored type for an indicator code; unknown codes are lowercased
pub fn indicator_type(code: &str) -> String {
    KNOWN_INDICATORS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_lowercase())
}

/// Extract the latest and previous non-null values from a response body
pub fn parse_response(key: &str, code: &str, url: &str, body: &Value) -> EstateResult<IndicatorSnapshot> {
    let bad = |message: &str| EstateError::upstream(SOURCE_NAME, message.to_string());

    let data = body
        .as_array()
        .filter(|parts| parts.len() > 1)
        .and_then(|parts| parts[1].as_array())
        .ok_or_else(|| {
            // Errors come back as a single-element array with a message
            let message = body
                .pointer("/0/message/0/value")
                .and_then(Value::as_str)
                .unwrap_or("unexpected response shape");
            bad(message)
        })?;

    let mut readings = data.iter().filter_map(|entry| {
        let value = entry.get("value").and_then(Value::as_f64)?;
        let period = entry.get("date").and_then(Value::as_str).map(str::to_string);
        let region = entry
            .pointer("/country/value")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some((value, period, region))
    });

    let (value, period, region) = readings
        .next()
        .ok_or_else(|| bad(&format!("no published values for {}", code)))?;
    let previous_value = readings.next().map(|(v, _, _)| v);

    Ok(IndicatorSnapshot {
        key: key.to_string(),
        indicator_type: indicator_type(code),
        region: region.unwrap_or_else(|| "Unknown".to_string()),
        value,
        previous_value,
        period,
        source: SOURCE_NAME.to_string(),
        source_url: Some(url.to_string()),
    })
}

impl IndicatorSource for WorldBankSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn supports(&self, key: &str) -> bool {
        key.strip_prefix(KEY_PREFIX).is_some_and(|code| !code.is_empty())
    }

    fn keys(&self) -> Vec<String> {
        KNOWN_INDICATORS
            .iter()
            .map(|(code, _)| format!("{}{}", KEY_PREFIX, code))
            .collect()
    }

    fn fetch(&self, key: &str) -> EstateResult<IndicatorSnapshot> {
        let code = key
            .strip_prefix(KEY_PREFIX)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| EstateError::upstream(SOURCE_NAME, format!("unsupported key '{}'", key)))?;

        let url = self.url(code);
        debug!(%url, "Fetching World Bank indicator");
        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(EstateError::upstream(
                SOURCE_NAME,
                format!("HTTP {} for {}", response.status(), code),
            ));
        }
        let body: Value = response.json()?;
        parse_response(key, code, &url, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "world_bank_NY.GDP.MKTP.KD.ZG";
    const CODE: &str = "NY.GDP.MKTP.KD.ZG";

    #[test]
    fn test_parse_skips_nulls() {
        let body = json!([
            {"page": 1, "pages": 1, "per_page": 10, "total": 3},
            [
                {"date": "2025", "value": null, "country": {"id": "AU", "value": "Australia"}},
                {"date": "2024", "value": 1.5, "country": {"id": "AU", "value": "Australia"}},
                {"date": "2023", "value": 2.0, "country": {"id": "AU", "value": "Australia"}}
            ]
        ]);

        let snapshot = parse_response(KEY, CODE, "http://x", &body).unwrap();
        assert_eq!(snapshot.value, 1.5);
        assert_eq!(snapshot.previous_value, Some(2.0));
        assert_eq!(snapshot.period.as_deref(), Some("2024"));
        assert_eq!(snapshot.region, "Australia");
        assert_eq!(snapshot.indicator_type, "gdp_growth");
    }

    #[test]
    fn test_parse_error_message() {
        let body = json!([{"message": [{"id": "120", "key": "Invalid value", "value": "The provided parameter value is not valid"}]}]);
        let err = parse_response(KEY, CODE, "http://x", &body).unwrap_err();
        assert!(err.is_upstream());
        assert!(err.to_string().contains("not valid"));
    }

    #[test]
    fn test_parse_all_null() {
        let body = json!([{}, [{"date": "2025", "value": null}]]);
        assert!(parse_response(KEY, CODE, "http://x", &body).unwrap_err().is_upstream());
    }

    #[test]
    fn test_supports_and_url() {
        let source = WorldBankSource::new("https://api.worldbank.org/v2/", "AUS", Duration::from_secs(1)).unwrap();
        assert!(source.supports(KEY));
        assert!(!source.supports("world_bank_"));
        assert!(!source.supports("rba_cash_rate"));
        assert_eq!(
            source.url(CODE),
            "https://api.worldbank.org/v2/country/AUS/indicator/NY.GDP.MKTP.KD.ZG?format=json&per_page=10"
        );
    }

    #[test]
    fn test_unreachable_host_is_upstream_error() {
        let source = WorldBankSource::new("http://127.0.0.1:9", "AUS", Duration::from_millis(500)).unwrap();
        assert!(source.fetch(KEY).unwrap_err().is_upstream());
    }

    #[test]
    fn test_unknown_code_type() {
        assert_eq!(indicator_type("AB.CD"), "ab.cd");
    }
}
