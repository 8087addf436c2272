//! Yield estimation
//!
//! The estimate is a fold over independent per-month contributions, so the
//! backend, the external compute worker and the WASM preview all agree on
//! the same numbers. All arithmetic stays in exact decimals; results are
//! persisted and compared for equality, so binary floats are never used.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Inputs for one month's contribution: the catalog's reference conditions
/// paired with the observations recorded on the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldFactors {
    pub base_yield: Decimal,
    pub ideal_temp: Decimal,
    pub ideal_precip: Decimal,
    pub avg_temp: Decimal,
    pub sum_precipitation: Decimal,
}

impl YieldFactors {
    /// `base_yield` scaled by how close both observations are to ideal.
    /// The factors multiply, so one severely-off condition zeroes the month.
    pub fn contribution(&self) -> Decimal {
        self.base_yield
            * condition_coef(self.ideal_temp, self.avg_temp)
            * condition_coef(self.ideal_precip, self.sum_precipitation)
    }
}

/// Proximity coefficient in [0, 1] for one observed condition.
///
/// With a zero ideal the coefficient decays as 1 / (actual + 1) so that an
/// exact match still scores 1. Otherwise it falls linearly with the relative
/// deviation from ideal and bottoms out at 0 once the deviation reaches 100%.
pub fn condition_coef(ideal: Decimal, actual: Decimal) -> Decimal {
    if ideal.is_zero() {
        if actual.is_zero() {
            return Decimal::ONE;
        }
        return match Decimal::ONE.checked_div(actual + Decimal::ONE) {
            Some(coef) => clamp_unit(coef),
            None => Decimal::ZERO,
        };
    }

    let deviation = (actual - ideal).abs() / ideal;
    clamp_unit(Decimal::ONE - deviation)
}

/// Total estimated yield, rounded half-up to exactly two decimal places.
/// An empty input yields exactly 0.00.
pub fn estimate_yield(factors: &[YieldFactors]) -> Decimal {
    let total: Decimal = factors.iter().map(YieldFactors::contribution).sum();
    let mut rounded = total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}
