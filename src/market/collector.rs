//! Cached access to indicator sources

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::{IndicatorSnapshot, IndicatorSource, StaticSource, WorldBankSource};
use crate::config::settings::MarketSettings;
use crate::error::{EstateError, EstateResult};
use crate::models::{IndicatorId, MarketIndicator};
use crate::storage::Storage;

struct CachedSnapshot {
    snapshot: IndicatorSnapshot,
    fetched_at: Instant,
}

/// Routes lookups to the first source that supports a key and keeps
/// successful results for `ttl`
pub struct MarketCollector {
    sources: Vec<Box<dyn IndicatorSource>>,
    ttl: Duration,
    cache: HashMap<String, CachedSnapshot>,
}

impl MarketCollector {
    pub fn new(sources: Vec<Box<dyn IndicatorSource>>, ttl: Duration) -> Self {
        Self {
            sources,
            ttl,
            cache: HashMap::new(),
        }
    }

    /// Reference data plus the World Bank, configured from settings
    pub fn from_settings(settings: &MarketSettings) -> EstateResult<Self> {
        let sources: Vec<Box<dyn IndicatorSource>> = vec![
            Box::new(StaticSource::new()),
            Box::new(WorldBankSource::from_settings(settings)?),
        ];
        Ok(Self::new(sources, Duration::from_secs(settings.cache_ttl_secs)))
    }

    /// Every key the configured sources advertise
    pub fn available_keys(&self) -> Vec<String> {
        self.sources.iter().flat_map(|s| s.keys()).collect()
    }

    /// Fetch `key`, serving from the cache while the entry is fresh
    pub fn get(&mut self, key: &str) -> EstateResult<IndicatorSnapshot> {
        if let Some(cached) = self.cache.get(key) {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!(key, "Using cached indicator");
                return Ok(cached.snapshot.clone());
            }
            self.cache.remove(key);
        }

        let source = self
            .sources
            .iter()
            .find(|s| s.supports(key))
            .ok_or_else(|| EstateError::Validation(format!("No source provides indicator '{}'", key)))?;

        match source.fetch(key) {
            Ok(snapshot) => {
                info!(key, source = source.name(), value = snapshot.value, "Fetched indicator");
                self.cache.insert(
                    key.to_string(),
                    CachedSnapshot {
                        snapshot: snapshot.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(key, source = source.name(), error = %e, "Indicator fetch failed");
                Err(e)
            }
        }
    }

    /// Fetch several keys, keeping per-key failures
    pub fn summary(&mut self, keys: &[String]) -> Vec<(String, EstateResult<IndicatorSnapshot>)> {
        keys.iter()
            .map(|key| (key.clone(), self.get(key)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

/// Persist a snapshot as a dated datapoint
pub fn record(storage: &Storage, snapshot: &IndicatorSnapshot, date: NaiveDate) -> EstateResult<MarketIndicator> {
    let mut indicator = MarketIndicator {
        id: IndicatorId::default(),
        indicator_type: snapshot.indicator_type.clone(),
        region: snapshot.region.clone(),
        value: snapshot.value,
        previous_value: snapshot.previous_value,
        change_percent: MarketIndicator::change_from(snapshot.value, snapshot.previous_value),
        period: snapshot.period.clone(),
        date,
        source: snapshot.source.clone(),
        source_url: snapshot.source_url.clone(),
        created_at: Utc::now(),
    };
    indicator.id = storage.market().insert(&indicator)?;
    debug!(id = %indicator.id, kind = %indicator.indicator_type, "Recorded indicator");
    Ok(indicator)
}

/// Stored datapoints, newest first
pub fn latest(
    storage: &Storage,
    indicator_type: Option<&str>,
    region: Option<&str>,
    limit: usize,
) -> EstateResult<Vec<MarketIndicator>> {
    storage.market().latest(indicator_type, region, limit)
}
