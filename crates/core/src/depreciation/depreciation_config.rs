//! Depreciation engine configuration.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CACHE_TTL_SECS, DEFAULT_DECLINING_RATE};
use crate::errors::{Error, Result};
use crate::utils::DEFAULT_VALUATION_TZ;

/// How a useful life that is not a whole number of years is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FractionalLifePolicy {
    /// Fractional years are a validation error
    #[default]
    Reject,
    /// `years * 12` is rounded half away from zero to whole months
    RoundMonths,
}

/// What the book-value query layer does with non-validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackPolicy {
    /// Log a warning and report the unit price so reports keep rendering
    #[default]
    UnitPrice,
    /// Return the error to the caller
    Strict,
}

/// Configuration for the depreciation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DepreciationConfig {
    /// Annual declining-balance rate in percent (default: 20)
    pub default_declining_rate: Decimal,

    /// Policy for non-integer useful lives (default: Reject)
    pub fractional_life_policy: FractionalLifePolicy,

    /// Policy for unexpected query failures (default: UnitPrice)
    pub fallback_policy: FallbackPolicy,

    /// Cache entry time-to-live in seconds (default: 300)
    pub cache_ttl_secs: u64,

    /// IANA timezone that decides today's date for current book values
    /// (default: UTC)
    pub valuation_timezone: Tz,
}

impl Default for DepreciationConfig {
    fn default() -> Self {
        Self {
            default_declining_rate: DEFAULT_DECLINING_RATE,
            fractional_life_policy: FractionalLifePolicy::default(),
            fallback_policy: FallbackPolicy::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            valuation_timezone: DEFAULT_VALUATION_TZ,
        }
    }
}

impl DepreciationConfig {
    /// Strict configuration for callers that must fail loudly (seeding, exports).
    pub fn strict() -> Self {
        Self {
            fallback_policy: FallbackPolicy::Strict,
            ..Self::default()
        }
    }

    /// Parses a JSON configuration document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_declining_rate <= Decimal::ZERO
            || self.default_declining_rate > Decimal::ONE_HUNDRED
        {
            return Err(Error::InvalidConfigValue(format!(
                "defaultDecliningRate must be in (0, 100], got {}",
                self.default_declining_rate
            )));
        }
        Ok(())
    }
}
