//! Depreciation domain models.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Supported depreciation methods.
///
/// Serialized as `STRAIGHT_LINE` / `DECLINING_BALANCE`. Parsing, from strings
/// and from JSON alike, ignores case and surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum DepreciationMethod {
    /// Equal expense every month
    StraightLine,
    /// Fixed percentage of the current book value every month
    DecliningBalance,
}

impl DepreciationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepreciationMethod::StraightLine => "STRAIGHT_LINE",
            DepreciationMethod::DecliningBalance => "DECLINING_BALANCE",
        }
    }
}

impl std::fmt::Display for DepreciationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DepreciationMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRAIGHT_LINE" => Ok(DepreciationMethod::StraightLine),
            "DECLINING_BALANCE" => Ok(DepreciationMethod::DecliningBalance),
            _ => Err(ValidationError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for DepreciationMethod {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Granularity of a generated schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleGranularity {
    #[default]
    Monthly,
    /// Calendar-year roll-up of the monthly schedule
    Annual,
}

/// Depreciation parameters of a single asset, as supplied by callers.
///
/// `service_start_date` is kept as the raw string so that parse failures are
/// reported by the engine as validation errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetDepreciationInput {
    /// Acquisition cost
    pub unit_price: Decimal,
    /// Start-in-value (SIV) date from which depreciation begins
    pub service_start_date: String,
    /// Depreciation horizon in years
    pub useful_life_years: Decimal,
    /// Residual value at the end of useful life
    #[serde(default)]
    pub salvage_value: Decimal,
    pub method: DepreciationMethod,
    /// Annual percentage for declining balance (e.g. 20 = 20%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declining_rate_override: Option<Decimal>,
}

impl AssetDepreciationInput {
    /// Creates a straight-line input with the given parameters.
    pub fn straight_line(
        unit_price: Decimal,
        service_start_date: impl Into<String>,
        useful_life_years: u32,
        salvage_value: Decimal,
    ) -> Self {
        Self {
            unit_price,
            service_start_date: service_start_date.into(),
            useful_life_years: Decimal::from(useful_life_years),
            salvage_value,
            method: DepreciationMethod::StraightLine,
            declining_rate_override: None,
        }
    }

    /// Creates a declining-balance input. `rate` is an annual percentage;
    /// None uses the configured default.
    pub fn declining_balance(
        unit_price: Decimal,
        service_start_date: impl Into<String>,
        useful_life_years: u32,
        salvage_value: Decimal,
        rate: Option<Decimal>,
    ) -> Self {
        Self {
            unit_price,
            service_start_date: service_start_date.into(),
            useful_life_years: Decimal::from(useful_life_years),
            salvage_value,
            method: DepreciationMethod::DecliningBalance,
            declining_rate_override: rate,
        }
    }

    /// Depreciable amount (unit price less salvage value).
    pub fn depreciable_amount(&self) -> Decimal {
        self.unit_price - self.salvage_value
    }
}

/// One calendar month of a depreciation schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDepreciationRecord {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// Amount depreciated during this month
    pub depreciation_expense: Decimal,
    /// Expense from service start through this month, inclusive
    pub accumulated_depreciation: Decimal,
    /// Unit price less accumulated depreciation, never below salvage
    pub book_value: Decimal,
}

impl MonthlyDepreciationRecord {
    /// Copy of this record rounded for presentation. Never use the result for
    /// further calculation.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            year: self.year,
            month: self.month,
            depreciation_expense: round_money(self.depreciation_expense, dp),
            accumulated_depreciation: round_money(self.accumulated_depreciation, dp),
            book_value: round_money(self.book_value, dp),
        }
    }
}

/// Calendar-year roll-up of monthly records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnualDepreciationRecord {
    pub year: i32,
    /// Sum of the monthly expenses scheduled in this year
    pub depreciation_expense: Decimal,
    /// Accumulated depreciation at the last scheduled month of the year
    pub accumulated_depreciation: Decimal,
    /// Book value at the last scheduled month of the year
    pub book_value: Decimal,
    /// Number of scheduled months that fall in this year
    pub months: u32,
}

/// Per-month book value row in the shape persisted by seeding jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookValueRow {
    pub asset_id: String,
    pub year: i32,
    pub month: u32,
    pub book_value: Decimal,
}

/// Book values for the twelve months of a calendar year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearBookValues {
    /// Keyed by month, 1-12
    pub values: BTreeMap<u32, Decimal>,
    /// Set when the values are a fallback substitute, not a computed schedule
    pub substituted: bool,
}

impl YearBookValues {
    pub fn computed(values: BTreeMap<u32, Decimal>) -> Self {
        Self {
            values,
            substituted: false,
        }
    }

    pub fn substituted(values: BTreeMap<u32, Decimal>) -> Self {
        Self {
            values,
            substituted: true,
        }
    }
}

/// Output of the consolidated generator entry point.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(
    tag = "granularity",
    content = "records",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum GeneratedSchedule {
    Monthly(Vec<MonthlyDepreciationRecord>),
    Annual(Vec<AnnualDepreciationRecord>),
}

impl GeneratedSchedule {
    pub fn granularity(&self) -> ScheduleGranularity {
        match self {
            GeneratedSchedule::Monthly(_) => ScheduleGranularity::Monthly,
            GeneratedSchedule::Annual(_) => ScheduleGranularity::Annual,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GeneratedSchedule::Monthly(records) => records.len(),
            GeneratedSchedule::Annual(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn round_money(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
