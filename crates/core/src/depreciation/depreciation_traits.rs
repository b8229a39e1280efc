use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::depreciation_model::{AssetDepreciationInput, YearBookValues};
use super::schedule_generator::DepreciationSchedule;
use crate::errors::Result;

/// Book-value queries over an asset's depreciation schedule.
///
/// Implementations generate the schedule on demand. Validation errors always
/// reach the caller; other failures may be replaced by a fallback value
/// depending on the implementation's policy.
pub trait BookValueServiceTrait: Send + Sync {
    /// Full monthly schedule. Never substitutes a fallback.
    fn schedule(&self, input: &AssetDepreciationInput) -> Result<DepreciationSchedule>;

    fn book_value_as_of(
        &self,
        input: &AssetDepreciationInput,
        as_of: NaiveDate,
    ) -> Result<Decimal>;

    fn book_value_for_month(
        &self,
        input: &AssetDepreciationInput,
        year: i32,
        month: u32,
    ) -> Result<Decimal>;

    /// Twelve monthly book values for `year`, flagged when they are a
    /// fallback substitute.
    fn book_values_for_year_checked(
        &self,
        input: &AssetDepreciationInput,
        year: i32,
    ) -> Result<YearBookValues>;

    /// Book values keyed by month (1-12), always twelve entries.
    fn book_values_for_year(
        &self,
        input: &AssetDepreciationInput,
        year: i32,
    ) -> Result<BTreeMap<u32, Decimal>> {
        self.book_values_for_year_checked(input, year).map(|table| table.values)
    }

    /// Book value as of today's valuation date.
    fn current_book_value(&self, input: &AssetDepreciationInput) -> Result<Decimal>;
}
