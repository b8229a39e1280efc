use chrono::NaiveDate;
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{DISPLAY_DECIMAL_PRECISION, MAX_USEFUL_LIFE_YEARS, MONTHS_PER_YEAR};
use crate::errors::{CalculatorError, Result, ValidationError};
use crate::utils::{parse_service_date, YearMonth};

use super::depreciation_config::{DepreciationConfig, FractionalLifePolicy};
use super::depreciation_model::{
    AnnualDepreciationRecord, AssetDepreciationInput, BookValueRow, DepreciationMethod,
    GeneratedSchedule, MonthlyDepreciationRecord, ScheduleGranularity,
};

/// A generated monthly schedule together with the parameters needed to answer
/// queries outside of its range.
#[derive(Debug, Clone, PartialEq)]
pub struct DepreciationSchedule {
    pub unit_price: Decimal,
    pub salvage_value: Decimal,
    pub service_start: NaiveDate,
    pub method: DepreciationMethod,
    pub records: Vec<MonthlyDepreciationRecord>,
}

/// Input that passed validation, with dates parsed and life converted to months.
#[derive(Debug, Clone, PartialEq)]
struct ValidatedInput {
    unit_price: Decimal,
    salvage_value: Decimal,
    service_start: NaiveDate,
    total_months: u32,
    method: DepreciationMethod,
    /// Annual rate as a fraction (0.2 for 20%)
    annual_rate: Decimal,
}

/// Generates the monthly schedule for an asset using the default configuration.
pub fn generate_monthly_schedule(
    input: &AssetDepreciationInput,
) -> Result<Vec<MonthlyDepreciationRecord>> {
    generate_schedule(input, &DepreciationConfig::default()).map(|s| s.records)
}

/// Generates the full monthly schedule for an asset.
///
/// One record per calendar month, starting at the month containing the service
/// start date, for `useful_life_years * 12` months. The day of month is ignored.
pub fn generate_schedule(
    input: &AssetDepreciationInput,
    config: &DepreciationConfig,
) -> Result<DepreciationSchedule> {
    let validated = validate_input(input, config)?;
    let start = YearMonth::from_date(validated.service_start);

    let records = match validated.method {
        DepreciationMethod::StraightLine => straight_line_records(&validated, start)?,
        DepreciationMethod::DecliningBalance => declining_balance_records(&validated, start)?,
    };

    debug!(
        "Generated {}-month {} schedule from {} (unit price {}, salvage {})",
        records.len(),
        validated.method,
        start,
        validated.unit_price,
        validated.salvage_value
    );

    Ok(DepreciationSchedule {
        unit_price: validated.unit_price,
        salvage_value: validated.salvage_value,
        service_start: validated.service_start,
        method: validated.method,
        records,
    })
}

/// Generates the calendar-year roll-up of the monthly schedule.
pub fn generate_annual_schedule(
    input: &AssetDepreciationInput,
    config: &DepreciationConfig,
) -> Result<Vec<AnnualDepreciationRecord>> {
    generate_schedule(input, config).map(|s| roll_up_annual(&s.records))
}

/// Single entry point for both granularities.
pub fn generate(
    input: &AssetDepreciationInput,
    config: &DepreciationConfig,
    granularity: ScheduleGranularity,
) -> Result<GeneratedSchedule> {
    let schedule = generate_schedule(input, config)?;
    Ok(match granularity {
        ScheduleGranularity::Monthly => GeneratedSchedule::Monthly(schedule.records),
        ScheduleGranularity::Annual => GeneratedSchedule::Annual(roll_up_annual(&schedule.records)),
    })
}

/// Per-month book value rows for persisting into reporting tables.
/// Book values are rounded to display precision here and nowhere earlier.
pub fn book_value_rows(asset_id: &str, schedule: &DepreciationSchedule) -> Vec<BookValueRow> {
    schedule
        .records
        .iter()
        .map(|r| {
            let rounded = r.rounded(DISPLAY_DECIMAL_PRECISION);
            BookValueRow {
                asset_id: asset_id.to_string(),
                year: rounded.year,
                month: rounded.month,
                book_value: rounded.book_value,
            }
        })
        .collect()
}

pub(crate) fn roll_up_annual(
    records: &[MonthlyDepreciationRecord],
) -> Vec<AnnualDepreciationRecord> {
    let mut annual: Vec<AnnualDepreciationRecord> = Vec::new();
    for record in records {
        match annual.last_mut() {
            Some(current) if current.year == record.year => {
                current.depreciation_expense += record.depreciation_expense;
                current.accumulated_depreciation = record.accumulated_depreciation;
                current.book_value = record.book_value;
                current.months += 1;
            }
            _ => annual.push(AnnualDepreciationRecord {
                year: record.year,
                depreciation_expense: record.depreciation_expense,
                accumulated_depreciation: record.accumulated_depreciation,
                book_value: record.book_value,
                months: 1,
            }),
        }
    }
    annual
}

fn validate_input(
    input: &AssetDepreciationInput,
    config: &DepreciationConfig,
) -> Result<ValidatedInput> {
    if input.unit_price < Decimal::ZERO {
        return Err(ValidationError::invalid(format!(
            "Unit price must not be negative, got {}",
            input.unit_price
        ))
        .into());
    }
    if input.salvage_value < Decimal::ZERO {
        return Err(ValidationError::invalid(format!(
            "Salvage value must not be negative, got {}",
            input.salvage_value
        ))
        .into());
    }
    if input.salvage_value > input.unit_price {
        return Err(ValidationError::invalid(format!(
            "Salvage value {} exceeds unit price {}",
            input.salvage_value, input.unit_price
        ))
        .into());
    }

    let total_months = total_months(input.useful_life_years, config.fractional_life_policy)?;
    let service_start = parse_service_date(&input.service_start_date)?;

    let rate_percent = input
        .declining_rate_override
        .unwrap_or(config.default_declining_rate);
    if input.method == DepreciationMethod::DecliningBalance
        && (rate_percent <= Decimal::ZERO || rate_percent > Decimal::ONE_HUNDRED)
    {
        return Err(ValidationError::invalid(format!(
            "Declining balance rate must be in (0, 100], got {}",
            rate_percent
        ))
        .into());
    }

    Ok(ValidatedInput {
        unit_price: input.unit_price,
        salvage_value: input.salvage_value,
        service_start,
        total_months,
        method: input.method,
        annual_rate: rate_percent / Decimal::ONE_HUNDRED,
    })
}

/// Converts a useful life in years to a whole number of months.
fn total_months(useful_life_years: Decimal, policy: FractionalLifePolicy) -> Result<u32> {
    if useful_life_years <= Decimal::ZERO {
        return Err(ValidationError::invalid(format!(
            "Useful life must be positive, got {} years",
            useful_life_years
        ))
        .into());
    }
    if useful_life_years > Decimal::from(MAX_USEFUL_LIFE_YEARS) {
        return Err(ValidationError::invalid(format!(
            "Useful life must not exceed {} years, got {}",
            MAX_USEFUL_LIFE_YEARS, useful_life_years
        ))
        .into());
    }

    let months = useful_life_years * Decimal::from(MONTHS_PER_YEAR);
    let months = match policy {
        FractionalLifePolicy::Reject => {
            if !useful_life_years.fract().is_zero() {
                return Err(ValidationError::invalid(format!(
                    "Useful life must be a whole number of years, got {}",
                    useful_life_years
                ))
                .into());
            }
            months
        }
        FractionalLifePolicy::RoundMonths => {
            months.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        }
    };

    match months.to_u32() {
        Some(m) if m > 0 => Ok(m),
        _ => Err(ValidationError::invalid(format!(
            "Useful life of {} years is shorter than one month",
            useful_life_years
        ))
        .into()),
    }
}

fn period_at(start: YearMonth, offset: u32) -> Result<YearMonth> {
    start.checked_add_months(offset).ok_or_else(|| {
        // Report the calendar month that fell outside chrono's range.
        let ordinal = start.ordinal() + i64::from(offset);
        CalculatorError::DateOutOfRange {
            year: i32::try_from(ordinal.div_euclid(12)).unwrap_or(i32::MAX),
            month: (ordinal.rem_euclid(12) + 1) as u32,
        }
        .into()
    })
}

fn straight_line_records(
    input: &ValidatedInput,
    start: YearMonth,
) -> Result<Vec<MonthlyDepreciationRecord>> {
    let depreciable = input.unit_price - input.salvage_value;
    let monthly = depreciable
        .checked_div(Decimal::from(input.total_months))
        .ok_or(CalculatorError::Overflow("monthly depreciation"))?;

    let mut records = Vec::with_capacity(input.total_months as usize);
    let mut previous = Decimal::ZERO;

    for i in 1..=input.total_months {
        let period = period_at(start, i - 1)?;

        // The last month absorbs the division remainder so the schedule sums
        // to the depreciable amount exactly.
        let accumulated = if i == input.total_months {
            depreciable
        } else {
            monthly
                .checked_mul(Decimal::from(i))
                .ok_or(CalculatorError::Overflow("accumulated depreciation"))?
                .min(depreciable)
        };

        records.push(MonthlyDepreciationRecord {
            year: period.year,
            month: period.month,
            depreciation_expense: accumulated - previous,
            accumulated_depreciation: accumulated,
            book_value: (input.unit_price - accumulated).max(input.salvage_value),
        });
        previous = accumulated;
    }

    Ok(records)
}

fn declining_balance_records(
    input: &ValidatedInput,
    start: YearMonth,
) -> Result<Vec<MonthlyDepreciationRecord>> {
    let monthly_rate = input.annual_rate / Decimal::from(MONTHS_PER_YEAR);

    let mut records = Vec::with_capacity(input.total_months as usize);
    let mut book_value = input.unit_price;
    let mut accumulated = Decimal::ZERO;

    for i in 0..input.total_months {
        let period = period_at(start, i)?;

        let headroom = book_value - input.salvage_value;
        let expense = if headroom <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            book_value
                .checked_mul(monthly_rate)
                .ok_or(CalculatorError::Overflow("declining balance expense"))?
                .min(headroom)
        };

        accumulated = accumulated
            .checked_add(expense)
            .ok_or(CalculatorError::Overflow("accumulated depreciation"))?;
        book_value = (input.unit_price - accumulated).max(input.salvage_value);

        records.push(MonthlyDepreciationRecord {
            year: period.year,
            month: period.month,
            depreciation_expense: expense,
            accumulated_depreciation: accumulated,
            book_value,
        });
    }

    Ok(records)
}
