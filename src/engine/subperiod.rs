//! Sub-period constructor.

use rust_decimal::Decimal;
use tracing::debug;

use super::model::{SubPeriod, TimelineRow};
use crate::error::{EngineError, PerformanceWarning};

/// Sub-periods built from a derived timeline, plus the pairs that had to be
/// left out of the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubPeriods {
    pub periods: Vec<SubPeriod>,
    pub skipped: Vec<PerformanceWarning>,
}

/// Pair each period node with the next one: start at its period-end value,
/// end at the next valuation.
///
/// Pairs whose start value is not positive would divide by zero (or flip the
/// sign of the return) and are skipped. A return too large for a `Decimal`
/// fails the whole construction.
pub fn construct_sub_periods(rows: &[TimelineRow]) -> Result<SubPeriods, EngineError> {
    let nodes: Vec<&TimelineRow> = rows.iter().filter(|row| row.is_period_node()).collect();
    let mut result = SubPeriods::default();

    for pair in nodes.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start.period_end_value <= Decimal::ZERO {
            debug!(
                "Skipping sub-period {} -> {}: start value {}",
                start.event_date, end.event_date, start.period_end_value
            );
            result.skipped.push(PerformanceWarning::DegenerateSubPeriodSkipped {
                start_date: start.event_date,
                end_date: end.event_date,
                start_value: start.period_end_value,
            });
            continue;
        }
        result.periods.push(SubPeriod::new(
            start.event_date,
            start.period_end_value,
            end.event_date,
            end.portfolio,
        )?);
    }

    Ok(result)
}
