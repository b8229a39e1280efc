pub mod time_utils;

pub use time_utils::{parse_service_date, valuation_date_from_utc, YearMonth, DEFAULT_VALUATION_TZ};
