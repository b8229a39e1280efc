//! Book-value lookups over an already generated schedule.
//!
//! Periods before the schedule report the unit price and periods after it
//! report the salvage value, so callers can query any month without bounds
//! checks.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::constants::MONTHS_PER_YEAR;
use crate::errors::{Result, ValidationError};
use crate::utils::YearMonth;

use super::depreciation_model::{AnnualDepreciationRecord, MonthlyDepreciationRecord};
use super::schedule_generator::{roll_up_annual, DepreciationSchedule};

impl DepreciationSchedule {
    /// Calendar month of the first record.
    pub fn start_month(&self) -> YearMonth {
        YearMonth::from_date(self.service_start)
    }

    /// Calendar month of the last record.
    pub fn end_month(&self) -> Option<YearMonth> {
        self.records
            .last()
            .and_then(|r| YearMonth::new(r.year, r.month))
    }

    /// Record covering the given calendar month, if scheduled.
    pub fn record_for(&self, year: i32, month: u32) -> Option<&MonthlyDepreciationRecord> {
        if ensure_month(month).is_err() {
            return None;
        }
        let offset = self.offset_of(year, month);
        usize::try_from(offset)
            .ok()
            .and_then(|idx| self.records.get(idx))
    }

    /// Book value for a calendar month. `month` must be 1-12; any year is valid.
    pub fn book_value_for_month(&self, year: i32, month: u32) -> Result<Decimal> {
        ensure_month(month)?;
        Ok(self.book_value_at_offset(self.offset_of(year, month)))
    }

    /// Book value on a given date.
    ///
    /// Dates before the service start report the unit price, even within the
    /// start month.
    pub fn book_value_as_of(&self, as_of: NaiveDate) -> Decimal {
        if as_of < self.service_start {
            return self.unit_price;
        }
        let period = YearMonth::from_date(as_of);
        self.book_value_at_offset(self.offset_of(period.year, period.month))
    }

    /// Book values for all twelve months of `year`.
    pub fn book_values_for_year(&self, year: i32) -> BTreeMap<u32, Decimal> {
        (1..=MONTHS_PER_YEAR)
            .map(|month| {
                let offset = self.offset_of(year, month);
                (month, self.book_value_at_offset(offset))
            })
            .collect()
    }

    /// Calendar-year roll-up of this schedule.
    pub fn to_annual(&self) -> Vec<AnnualDepreciationRecord> {
        roll_up_annual(&self.records)
    }

    /// Sum of all scheduled expenses.
    pub fn total_expense(&self) -> Decimal {
        self.records.iter().map(|r| r.depreciation_expense).sum()
    }

    /// Months from the first scheduled month to `year`-`month`. Not bounded by
    /// the calendar range chrono supports.
    fn offset_of(&self, year: i32, month: u32) -> i64 {
        YearMonth { year, month }.months_since(self.start_month())
    }

    fn book_value_at_offset(&self, offset: i64) -> Decimal {
        if offset < 0 {
            return self.unit_price;
        }
        usize::try_from(offset)
            .ok()
            .and_then(|idx| self.records.get(idx))
            .map_or(self.salvage_value, |r| r.book_value)
    }
}

fn ensure_month(month: u32) -> Result<()> {
    if (1..=MONTHS_PER_YEAR).contains(&month) {
        Ok(())
    } else {
        Err(ValidationError::invalid(format!(
            "Month must be between 1 and 12, got {}",
            month
        ))
        .into())
    }
}
