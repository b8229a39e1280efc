//! Asset depreciation engine.
//!
//! Turns an asset's acquisition data into a month-by-month schedule of
//! depreciation expense, accumulated depreciation and book value, and answers
//! book-value queries over it.
//!
//! # Architecture
//!
//! ```text
//! AssetDepreciationInput
//!      ↓
//! Schedule Generator  (schedule_generator.rs, pure)
//!      ↓
//! DepreciationSchedule lookups  (book_value.rs, pure)
//!      ↓
//! BookValueService  (book_value_service.rs, fallback policy)
//!      ↓
//! BookValueCache  (book_value_cache.rs, TTL memoization)
//! ```
//!
//! # Methods
//!
//! - **Straight line** - `(unit price - salvage) / months` every month
//! - **Declining balance** - `book value * annual rate / 12` every month,
//!   floored at salvage value
//!
//! Schedules are bucketed by calendar month; the day of the service start
//! date only matters for `book_value_as_of` queries inside the start month.

mod book_value;
mod book_value_cache;
mod book_value_service;
mod depreciation_config;
mod depreciation_model;
mod depreciation_traits;
mod schedule_generator;


pub use book_value_cache::{input_fingerprint, BookValueCache, CacheKey, CacheStats};
pub use book_value_service::BookValueService;
pub use depreciation_config::{DepreciationConfig, FallbackPolicy, FractionalLifePolicy};
pub use depreciation_model::{
    AnnualDepreciationRecord, AssetDepreciationInput, BookValueRow, DepreciationMethod,
    GeneratedSchedule, MonthlyDepreciationRecord, ScheduleGranularity, YearBookValues,
};
pub use depreciation_traits::BookValueServiceTrait;
pub use schedule_generator::{
    book_value_rows, generate, generate_annual_schedule, generate_monthly_schedule,
    generate_schedule, DepreciationSchedule,
};
