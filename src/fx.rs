//! Currency normalization
//!
//! Converts (period, currency, amount) triples to USD using the loaded FX
//! table. Pure lookup: a missing rate is a hard error, never a silent
//! 1.0 fallback, because a misconverted amount corrupts every downstream
//! aggregate.

use crate::error::{CopilotError, Result};
use crate::models::{FxRate, Period};
use std::collections::HashMap;

pub const USD: &str = "USD";

/// FX table indexed by (period, currency) for O(1) lookup.
#[derive(Debug, Clone, Default)]
pub struct FxIndex {
    rates: HashMap<(Period, String), f64>,
}

impl FxIndex {
    pub fn build(rows: &[FxRate]) -> Self {
        let mut rates = HashMap::with_capacity(rows.len());
        for row in rows {
            rates.insert((row.period, row.currency.to_uppercase()), row.rate_to_usd);
        }
        Self { rates }
    }

    pub fn rate(&self, period: Period, currency: &str) -> Option<f64> {
        self.rates.get(&(period, currency.to_uppercase())).copied()
    }
}

/// Convert an amount to USD for the given month.
///
/// USD amounts pass through unchanged (the rate is defined as 1.0 and is
/// not required to be present in the table).
pub fn to_usd(fx: &FxIndex, period: Period, currency: &str, amount: f64) -> Result<f64> {
    let currency = currency.trim();
    if currency.eq_ignore_ascii_case(USD) {
        return Ok(amount);
    }

    match fx.rate(period, currency) {
        Some(rate) => Ok(amount * rate),
        None => Err(CopilotError::MissingFxRate {
            period,
            currency: currency.to_uppercase(),
        }),
    }
}
