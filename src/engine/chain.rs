//! TWRR chainer.

use rust_decimal::Decimal;

use super::model::SubPeriod;
use crate::error::EngineError;

/// Geometrically link sub-period returns: `prod(1 + r_i) - 1`.
///
/// Sub-periods must already be in ascending date order. An empty chain is a
/// zero return.
pub fn chain_twrr(periods: &[SubPeriod]) -> Result<Decimal, EngineError> {
    let growth = periods
        .iter()
        .try_fold(Decimal::ONE, |acc, period| acc.checked_mul(period.growth_factor))
        .ok_or_else(|| {
            EngineError::Overflow(format!("chaining {} sub-period returns", periods.len()))
        })?;
    Ok(growth - Decimal::ONE)
}
