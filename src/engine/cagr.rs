//! CAGR annualizer.

use rust_decimal::{Decimal, MathematicalOps};
use tracing::warn;

use super::model::SubPeriod;
use crate::error::EngineError;

/// Years covered by the sub-periods that actually moved (non-zero return).
pub fn years_elapsed(periods: &[SubPeriod], days_per_year: Decimal) -> Decimal {
    periods
        .iter()
        .filter(|period| !period.period_return.is_zero())
        .map(|period| Decimal::from(period.days()) / days_per_year)
        .sum()
}

/// Product of `1 + r` over a series of returns.
pub fn compound_growth<I>(returns: I) -> Result<Decimal, EngineError>
where
    I: IntoIterator<Item = Decimal>,
{
    returns
        .into_iter()
        .try_fold(Decimal::ONE, |acc, r| {
            Decimal::ONE.checked_add(r).and_then(|factor| acc.checked_mul(factor))
        })
        .ok_or_else(|| EngineError::Overflow("compounding fiscal-year returns".to_string()))
}

/// `growth_factor^(1 / years) - 1`, or zero when a year or less has elapsed.
///
/// A non-positive growth factor means the capital was wiped out, reported as
/// -100% a year.
pub fn annualize(growth_factor: Decimal, years_elapsed: Decimal) -> Decimal {
    if years_elapsed <= Decimal::ONE {
        return Decimal::ZERO;
    }
    if growth_factor <= Decimal::ZERO {
        return Decimal::NEGATIVE_ONE;
    }
    match growth_factor.checked_powd(Decimal::ONE / years_elapsed) {
        Some(annual) => annual - Decimal::ONE,
        None => {
            warn!(
                "Could not annualize growth {} over {} years",
                growth_factor, years_elapsed
            );
            Decimal::ZERO
        }
    }
}
