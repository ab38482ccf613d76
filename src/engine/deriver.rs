//! Period-end value deriver.
//!
//! A valuation row's period-end value is what the next sub-period has to be
//! measured against: the valuation itself plus every cash flow that lands
//! after it and up to (including) the next valuation date. Comparing the next
//! valuation with this figure instead of the raw valuation keeps the timing of
//! contributions and withdrawals out of the measured return.

use rust_decimal::Decimal;

use super::model::TimelineRow;
use super::policy::LastRowPolicy;

/// Return a copy of `rows` with `period_end_value` filled in.
///
/// Rows that are neither valuations nor the anchor keep a zero period-end
/// value. The anchor row's base is its own (pre-investment) cash flow.
pub fn derive_period_end_values(rows: &[TimelineRow], last_row: LastRowPolicy) -> Vec<TimelineRow> {
    // cumulative[i] = sum of cash flows of rows[..i]
    let mut cumulative = Vec::with_capacity(rows.len() + 1);
    cumulative.push(Decimal::ZERO);
    for row in rows {
        let running = cumulative[cumulative.len() - 1];
        cumulative.push(running + row.cashflow);
    }
    let flows_between = |after: usize, through: usize| cumulative[through + 1] - cumulative[after + 1];

    let mut next_valuation = vec![None; rows.len()];
    let mut upcoming = None;
    for idx in (0..rows.len()).rev() {
        next_valuation[idx] = upcoming;
        if rows[idx].has_valuation() {
            upcoming = Some(idx);
        }
    }

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            if !row.is_period_node() {
                return row.with_period_end_value(Decimal::ZERO);
            }
            let base = if row.anchor { row.cashflow } else { row.portfolio };
            let value = match next_valuation[idx] {
                Some(next) => base + flows_between(idx, next),
                None => match last_row {
                    LastRowPolicy::Zero => Decimal::ZERO,
                    LastRowPolicy::CarryTrailingFlows => {
                        base + flows_between(idx, rows.len() - 1)
                    }
                },
            };
            row.with_period_end_value(value)
        })
        .collect()
}
