use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Calendar months per depreciation year
pub const MONTHS_PER_YEAR: u32 = 12;

/// Annual declining-balance rate (percent) used when an asset has no override
pub const DEFAULT_DECLINING_RATE: Decimal = dec!(20);

/// Time-to-live for cached yearly book-value tables (5 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Longest useful life accepted, bounds the size of a generated schedule
pub const MAX_USEFUL_LIFE_YEARS: u32 = 1000;
