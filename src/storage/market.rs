//! Market indicator repository

use rusqlite::{params, Connection, Row};

use crate::error::EstateResult;
use crate::models::{IndicatorId, MarketIndicator};

use super::push_filter;

const COLUMNS: &str = "id, indicator_type, region, value, previous_value, change_percent, period, \
    date, source, source_url, created_at";

pub struct MarketRepository<'a> {
    conn: &'a Connection,
}

impl<'a> MarketRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<MarketIndicator> {
        Ok(MarketIndicator {
            id: row.get(0)?,
            indicator_type: row.get(1)?,
            region: row.get(2)?,
            value: row.get(3)?,
            previous_value: row.get(4)?,
            change_percent: row.get(5)?,
            period: row.get(6)?,
            date: row.get(7)?,
            source: row.get(8)?,
            source_url: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    pub fn insert(&self, indicator: &MarketIndicator) -> EstateResult<IndicatorId> {
        self.conn.execute(
            "INSERT INTO market_indicators (indicator_type, region, value, previous_value,
                change_percent, period, date, source, source_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                indicator.indicator_type,
                indicator.region,
                indicator.value,
                indicator.previous_value,
                indicator.change_percent,
                indicator.period,
                indicator.date,
                indicator.source,
                indicator.source_url,
                indicator.created_at,
            ],
        )?;
        Ok(IndicatorId::new(self.conn.last_insert_rowid()))
    }

    /// Most recent datapoints, newest first
    pub fn latest(
        &self,
        indicator_type: Option<&str>,
        region: Option<&str>,
        limit: usize,
    ) -> EstateResult<Vec<MarketIndicator>> {
        let mut sql = format!("SELECT {} FROM market_indicators WHERE 1=1", COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];
        push_filter(
            &mut sql,
            &mut params_vec,
            "indicator_type = ?",
            indicator_type.map(str::to_string),
        );
        push_filter(
            &mut sql,
            &mut params_vec,
            "LOWER(region) = LOWER(?)",
            region.map(str::to_string),
        );
        sql.push_str(&format!(" ORDER BY date DESC, id DESC LIMIT {}", limit));

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), Self::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use chrono::{NaiveDate, Utc};

    fn indicator(kind: &str, day: u32, value: f64) -> MarketIndicator {
        MarketIndicator {
            id: IndicatorId::default(),
            indicator_type: kind.to_string(),
            region: "Australia".to_string(),
            value,
            previous_value: None,
            change_percent: None,
            period: None,
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            source: "test".to_string(),
            source_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_latest_filters_and_orders() {
        let storage = Storage::in_memory().unwrap();
        let repo = storage.market();
        repo.insert(&indicator("gdp_growth", 1, 1.0)).unwrap();
        repo.insert(&indicator("gdp_growth", 3, 3.0)).unwrap();
        repo.insert(&indicator("rba_cash_rate", 2, 4.35)).unwrap();

        let latest = repo.latest(Some("gdp_growth"), None, 10).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].value, 3.0);

        assert_eq!(repo.latest(None, Some("australia"), 1).unwrap().len(), 1);
    }
}
