//! Time-bounded memoization of yearly book-value tables.
//!
//! Report pages query the same assets and years repeatedly. Entries are keyed
//! by asset, year and a fingerprint of every depreciation-affecting field.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::Result;

use super::depreciation_config::DepreciationConfig;
use super::depreciation_model::{AssetDepreciationInput, YearBookValues};
use super::depreciation_traits::BookValueServiceTrait;

/// Identity of a cached yearly table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub asset_id: String,
    pub year: i32,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(asset_id: &str, year: i32, input: &AssetDepreciationInput) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            year,
            fingerprint: input_fingerprint(input),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.asset_id, self.year, self.fingerprint)
    }
}

/// Snapshot of cache contents for monitoring and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

/// Cache entry for a yearly book-value table.
struct CachedBookValues {
    values: BTreeMap<u32, Decimal>,
    cached_at: DateTime<Utc>,
}

/// Memoizing wrapper around a book-value query service.
///
/// Only computed tables are stored. Errors and fallback substitutes pass
/// through uncached. Concurrent misses on the same key may both compute; the
/// results are identical, so the last insert simply wins.
pub struct BookValueCache {
    query: Arc<dyn BookValueServiceTrait>,
    entries: DashMap<CacheKey, CachedBookValues>,
    ttl: Duration,
}

impl BookValueCache {
    pub fn new(query: Arc<dyn BookValueServiceTrait>, ttl: Duration) -> Self {
        Self {
            query,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Creates a cache using the TTL from `config`.
    pub fn from_config(query: Arc<dyn BookValueServiceTrait>, config: &DepreciationConfig) -> Self {
        let ttl = i64::try_from(config.cache_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self::new(query, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Book values for all months of `year`, served from cache when fresh.
    pub fn get_cached(
        &self,
        asset_id: &str,
        year: i32,
        input: &AssetDepreciationInput,
    ) -> Result<BTreeMap<u32, Decimal>> {
        self.get_cached_at(asset_id, year, input, Utc::now())
    }

    /// Same as `get_cached` with an explicit clock reading.
    pub fn get_cached_at(
        &self,
        asset_id: &str,
        year: i32,
        input: &AssetDepreciationInput,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<u32, Decimal>> {
        let key = CacheKey::new(asset_id, year, input);

        let fresh = self
            .entries
            .get(&key)
            .filter(|entry| self.is_fresh(entry.cached_at, now))
            .map(|entry| entry.values.clone());
        if let Some(values) = fresh {
            debug!("Book value cache hit for {}", key);
            return Ok(values);
        }

        debug!("Book value cache miss for {}", key);
        let YearBookValues {
            values,
            substituted,
        } = self.query.book_values_for_year_checked(input, year)?;
        if substituted {
            // Never stored; every call goes back to the query service.
            debug!("Not caching fallback book values for {}", key);
            return Ok(values);
        }
        self.entries.insert(
            key,
            CachedBookValues {
                values: values.clone(),
                cached_at: now,
            },
        );
        Ok(values)
    }

    /// Removes every entry belonging to `asset_id`. Returns the number removed.
    pub fn invalidate(&self, asset_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.asset_id != asset_id);
        let removed = before.saturating_sub(self.entries.len());
        debug!(
            "Invalidated {} cached book value tables for {}",
            removed, asset_id
        );
        removed
    }

    pub fn invalidate_all(&self) {
        let removed = self.entries.len();
        self.entries.clear();
        info!("Book value cache cleared ({} entries)", removed);
    }

    /// Drops expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| self.is_fresh(entry.cached_at, now));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().to_string()).collect();
        keys.sort();
        CacheStats {
            size: keys.len(),
            keys,
        }
    }

    fn is_fresh(&self, cached_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - cached_at < self.ttl
    }
}

/// SHA-256 over every field that affects the schedule.
pub fn input_fingerprint(input: &AssetDepreciationInput) -> String {
    let mut hasher = Sha256::new();

    hasher.update(normalize_decimal(input.unit_price).as_bytes());
    hasher.update(b"|");
    hasher.update(input.service_start_date.trim().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(input.useful_life_years).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(input.salvage_value).as_bytes());
    hasher.update(b"|");
    hasher.update(input.method.as_str().as_bytes());
    hasher.update(b"|");
    if let Some(rate) = input.declining_rate_override {
        hasher.update(normalize_decimal(rate).as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// Remove trailing zeros so 5 and 5.00 hash identically
fn normalize_decimal(d: Decimal) -> String {
    d.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depreciation::{BookValueService, DepreciationSchedule};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delegates to the real service while counting yearly computations.
    struct CountingService {
        inner: BookValueService,
        year_calls: AtomicUsize,
    }

    impl CountingService {
        fn new() -> Self {
            Self {
                inner: BookValueService::default(),
                year_calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.year_calls.load(Ordering::SeqCst)
        }
    }

    impl BookValueServiceTrait for CountingService {
        fn schedule(&self, input: &AssetDepreciationInput) -> Result<DepreciationSchedule> {
            self.inner.schedule(input)
        }

        fn book_value_as_of(
            &self,
            input: &AssetDepreciationInput,
            as_of: NaiveDate,
        ) -> Result<Decimal> {
            self.inner.book_value_as_of(input, as_of)
        }

        fn book_value_for_month(
            &self,
            input: &AssetDepreciationInput,
            year: i32,
            month: u32,
        ) -> Result<Decimal> {
            self.inner.book_value_for_month(input, year, month)
        }

        fn book_values_for_year_checked(
            &self,
            input: &AssetDepreciationInput,
            year: i32,
        ) -> Result<YearBookValues> {
            self.year_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.book_values_for_year_checked(input, year)
        }

        fn current_book_value(&self, input: &AssetDepreciationInput) -> Result<Decimal> {
            self.inner.current_book_value(input)
        }
    }

    fn setup() -> (Arc<CountingService>, BookValueCache) {
        let service = Arc::new(CountingService::new());
        let cache = BookValueCache::new(service.clone(), Duration::minutes(5));
        (service, cache)
    }

    fn laptop() -> AssetDepreciationInput {
        AssetDepreciationInput::straight_line(dec!(10000), "2023-01-01", 5, dec!(1000))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_second_query_is_served_from_cache() {
        let (service, cache) = setup();

        let first = cache.get_cached_at("A1", 2024, &laptop(), t0()).unwrap();
        let second = cache
            .get_cached_at("A1", 2024, &laptop(), t0() + Duration::minutes(4))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first[&5], dec!(7450));
        assert_eq!(service.calls(), 1);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (service, cache) = setup();

        cache.get_cached_at("A1", 2024, &laptop(), t0()).unwrap();
        cache
            .get_cached_at("A1", 2024, &laptop(), t0() + Duration::minutes(5))
            .unwrap();

        assert_eq!(service.calls(), 2);
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn test_material_change_misses_cache() {
        let (service, cache) = setup();
        let original = laptop();
        let mut revalued = laptop();
        revalued.salvage_value = dec!(0);

        let before = cache.get_cached_at("A1", 2024, &original, t0()).unwrap();
        let after = cache.get_cached_at("A1", 2024, &revalued, t0()).unwrap();

        assert_eq!(service.calls(), 2);
        assert_ne!(before[&12], after[&12]);
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn test_invalidate_removes_only_that_asset() {
        let (service, cache) = setup();
        cache.get_cached_at("A1", 2023, &laptop(), t0()).unwrap();
        cache.get_cached_at("A1", 2024, &laptop(), t0()).unwrap();
        cache.get_cached_at("A10", 2024, &laptop(), t0()).unwrap();

        assert_eq!(cache.invalidate("A1"), 2);

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert!(stats.keys[0].starts_with("A10:2024:"));

        cache.get_cached_at("A1", 2024, &laptop(), t0()).unwrap();
        assert_eq!(service.calls(), 4);
    }

    #[test]
    fn test_invalidate_all() {
        let (_, cache) = setup();
        cache.get_cached_at("A1", 2024, &laptop(), t0()).unwrap();
        cache.get_cached_at("A2", 2024, &laptop(), t0()).unwrap();

        cache.invalidate_all();
        assert_eq!(
            cache.stats(),
            CacheStats {
                size: 0,
                keys: vec![]
            }
        );
    }

    #[test]
    fn test_purge_expired() {
        let (_, cache) = setup();
        cache.get_cached_at("A1", 2024, &laptop(), t0()).unwrap();
        cache
            .get_cached_at("A2", 2024, &laptop(), t0() + Duration::minutes(3))
            .unwrap();

        let removed = cache.purge_expired_at(t0() + Duration::minutes(6));
        assert_eq!(removed, 1);
        assert!(cache.stats().keys[0].starts_with("A2:"));
    }

    #[test]
    fn test_validation_errors_are_not_cached() {
        let (service, cache) = setup();
        let mut broken = laptop();
        broken.salvage_value = dec!(20000);

        assert!(cache
            .get_cached_at("A1", 2024, &broken, t0())
            .unwrap_err()
            .is_validation());
        assert!(cache.get_cached_at("A1", 2024, &broken, t0()).is_err());
        assert_eq!(service.calls(), 2);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_fallback_values_are_not_cached() {
        let (service, cache) = setup();
        let start = NaiveDate::MAX.format("%Y-%m-%d").to_string();
        let beyond_calendar =
            AssetDepreciationInput::straight_line(dec!(2500), start, 2, Decimal::ZERO);

        for i in 1..=10 {
            let values = cache
                .get_cached_at("A1", 2024, &beyond_calendar, t0())
                .unwrap();
            assert!(values.values().all(|v| *v == dec!(2500)));
            assert_eq!(service.inner.fallback_count(), i);
        }

        assert_eq!(service.calls(), 10);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_from_config_ttl() {
        let service: Arc<dyn BookValueServiceTrait> = Arc::new(BookValueService::default());
        let cache = BookValueCache::from_config(service, &DepreciationConfig::default());
        assert_eq!(cache.ttl(), Duration::minutes(5));
    }

    #[test]
    fn test_fingerprint_normalizes_decimals() {
        let a = laptop();
        let mut b = laptop();
        b.unit_price = dec!(10000.00);
        assert_eq!(input_fingerprint(&a), input_fingerprint(&b));
        assert_eq!(input_fingerprint(&a).len(), 64);

        let mut c = laptop();
        c.method = crate::depreciation::DepreciationMethod::DecliningBalance;
        assert_ne!(input_fingerprint(&a), input_fingerprint(&c));
    }
}
