//! Market indicator display formatting

use tabled::Tabled;

use super::{fmt_date, or_dash, render};
use crate::error::EstateResult;
use crate::market::IndicatorSnapshot;
use crate::models::MarketIndicator;

fn change(value: f64, previous: Option<f64>) -> String {
    match MarketIndicator::change_from(value, previous) {
        Some(pct) => format!("{:+.2}%", pct),
        None => "-".to_string(),
    }
}

/// One line per requested key; failed fetches show their error in place
pub fn format_snapshots(results: &[(String, EstateResult<IndicatorSnapshot>)]) -> String {
    if results.is_empty() {
        return "No indicators requested.".to_string();
    }

    let key_width = results.iter().map(|(k, _)| k.len()).max().unwrap_or(0).max(9);
    let mut output = String::new();
    output.push_str(&format!(
        "{:<w$}  {:>10}  {:>10}  {:>9}  {:<14}  {}\n",
        "Indicator", "Value", "Previous", "Change", "Period", "Source",
        w = key_width
    ));
    output.push_str(&format!(
        "{:-<w$}  {:-<10}  {:-<10}  {:-<9}  {:-<14}  {:-<10}\n",
        "", "", "", "", "", "",
        w = key_width
    ));

    for (key, result) in results {
        match result {
            Ok(s) => output.push_str(&format!(
                "{:<w$}  {:>10.2}  {:>10}  {:>9}  {:<14}  {}\n",
                key,
                s.value,
                or_dash(s.previous_value.map(|v| format!("{:.2}", v))),
                change(s.value, s.previous_value),
                s.period.as_deref().unwrap_or("-"),
                s.source,
                w = key_width
            )),
            Err(e) => output.push_str(&format!("{:<w$}  unavailable: {}\n", key, e, w = key_width)),
        }
    }

    output
}

#[derive(Tabled)]
struct IndicatorRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    indicator_type: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn format_indicator_list(indicators: &[MarketIndicator]) -> String {
    let rows = indicators
        .iter()
        .map(|i| IndicatorRow {
            date: fmt_date(i.date),
            indicator_type: i.indicator_type.clone(),
            region: i.region.clone(),
            value: format!("{:.2}", i.value),
            change: or_dash(i.change_percent.map(|c| format!("{:+.2}%", c))),
            period: or_dash(i.period.as_deref()),
            source: i.source.clone(),
        })
        .collect();
    render(rows, "No market indicators recorded.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EstateError;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            key: "rba_cash_rate".into(),
            indicator_type: "cash_rate".into(),
            region: "Australia".into(),
            value: 4.35,
            previous_value: Some(4.10),
            period: Some("2025-12-03".into()),
            source: "RBA".into(),
            source_url: None,
        }
    }

    #[test]
    fn test_snapshot_rows() {
        let results = vec![
            ("rba_cash_rate".to_string(), Ok(snapshot())),
            (
                "world_bank_XYZ".to_string(),
                Err(EstateError::upstream("World Bank", "timed out")),
            ),
        ];
        let out = format_snapshots(&results);
        assert!(out.contains("4.35"));
        assert!(out.contains("+6.10%"));
        assert!(out.contains("unavailable"));
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(format_indicator_list(&[]), "No market indicators recorded.");
    }
}
