use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, Utc};
use log::warn;
use rust_decimal::Decimal;

use crate::constants::MONTHS_PER_YEAR;
use crate::errors::Result;
use crate::utils::valuation_date_from_utc;

use super::depreciation_config::{DepreciationConfig, FallbackPolicy};
use super::depreciation_model::{AssetDepreciationInput, YearBookValues};
use super::depreciation_traits::BookValueServiceTrait;
use super::schedule_generator::{generate_schedule, DepreciationSchedule};

/// Book-value query layer used by reporting.
///
/// Under `FallbackPolicy::UnitPrice` any non-validation failure is logged,
/// counted and answered with the asset's unit price. `FallbackPolicy::Strict`
/// returns the error instead.
pub struct BookValueService {
    config: DepreciationConfig,
    fallback_count: AtomicU64,
}

impl BookValueService {
    pub fn new(config: DepreciationConfig) -> Self {
        Self {
            config,
            fallback_count: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DepreciationConfig {
        &self.config
    }

    /// Number of queries answered with a fallback value since construction.
    pub fn fallback_count(&self) -> u64 {
        self.fallback_count.load(Ordering::Relaxed)
    }

    /// Applies the fallback policy to a query result. The flag is set when
    /// the returned value is the fallback.
    fn resolve<T>(
        &self,
        operation: &str,
        input: &AssetDepreciationInput,
        result: Result<T>,
        fallback: impl FnOnce() -> T,
    ) -> Result<(T, bool)> {
        match result {
            Ok(value) => Ok((value, false)),
            Err(e) if e.is_validation() => Err(e),
            Err(e) => match self.config.fallback_policy {
                FallbackPolicy::Strict => Err(e),
                FallbackPolicy::UnitPrice => {
                    let total = self.fallback_count.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        "{} failed for asset (unit price {}, service start {}): {}. \
                         Reporting unit price instead ({} fallbacks so far).",
                        operation, input.unit_price, input.service_start_date, e, total
                    );
                    Ok((fallback(), true))
                }
            },
        }
    }
}

impl Default for BookValueService {
    fn default() -> Self {
        Self::new(DepreciationConfig::default())
    }
}

impl BookValueServiceTrait for BookValueService {
    fn schedule(&self, input: &AssetDepreciationInput) -> Result<DepreciationSchedule> {
        generate_schedule(input, &self.config)
    }

    fn book_value_as_of(
        &self,
        input: &AssetDepreciationInput,
        as_of: NaiveDate,
    ) -> Result<Decimal> {
        let result = self.schedule(input).map(|s| s.book_value_as_of(as_of));
        let (value, _) = self.resolve("book_value_as_of", input, result, || input.unit_price)?;
        Ok(value)
    }

    fn book_value_for_month(
        &self,
        input: &AssetDepreciationInput,
        year: i32,
        month: u32,
    ) -> Result<Decimal> {
        let result = self
            .schedule(input)
            .and_then(|s| s.book_value_for_month(year, month));
        let (value, _) =
            self.resolve("book_value_for_month", input, result, || input.unit_price)?;
        Ok(value)
    }

    fn book_values_for_year_checked(
        &self,
        input: &AssetDepreciationInput,
        year: i32,
    ) -> Result<YearBookValues> {
        let result = self.schedule(input).map(|s| s.book_values_for_year(year));
        let (values, substituted) = self.resolve("book_values_for_year", input, result, || {
            (1..=MONTHS_PER_YEAR)
                .map(|month| (month, input.unit_price))
                .collect()
        })?;
        Ok(if substituted {
            YearBookValues::substituted(values)
        } else {
            YearBookValues::computed(values)
        })
    }

    fn current_book_value(&self, input: &AssetDepreciationInput) -> Result<Decimal> {
        let today = valuation_date_from_utc(Utc::now(), self.config.valuation_timezone);
        self.book_value_as_of(input, today)
    }
}
