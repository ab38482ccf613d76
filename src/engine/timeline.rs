//! Timeline builder: merges cash flows and valuations into one dated sequence.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use super::model::{CashflowEvent, TimelineRow, ValuationSnapshot};
use super::policy::ValuationDating;

/// Build the ascending, de-duplicated timeline for one owner.
///
/// Flows and valuations sharing a date are summed. Dates where both sums are
/// zero are dropped unless they are the only date. Cash that arrived before
/// the first valuation is folded into a single anchor row.
pub fn build_timeline(
    events: &[CashflowEvent],
    snapshots: &[ValuationSnapshot],
    dating: ValuationDating,
) -> Vec<TimelineRow> {
    let mut by_date: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for event in events {
        by_date.entry(event.event_date).or_default().0 += event.amount;
    }
    for snapshot in snapshots {
        let date = dating.effective_date(snapshot.snapshot_date);
        by_date.entry(date).or_default().1 += snapshot.portfolio_value;
    }

    let only_date = by_date.len() == 1;
    let rows: Vec<TimelineRow> = by_date
        .into_iter()
        .filter(|(_, (cashflow, portfolio))| {
            only_date || !cashflow.is_zero() || !portfolio.is_zero()
        })
        .map(|(date, (cashflow, portfolio))| TimelineRow::new(date, cashflow, portfolio))
        .collect();

    anchor_pre_investment_cash(rows)
}

/// Replace the rows before the first valuation with one anchor row dated at
/// the last of them.
fn anchor_pre_investment_cash(rows: Vec<TimelineRow>) -> Vec<TimelineRow> {
    let Some(first_valuation) = rows.iter().position(TimelineRow::has_valuation) else {
        return rows;
    };
    if first_valuation == 0 {
        return rows;
    }

    let (pre_investment, invested) = rows.split_at(first_valuation);
    let opening_cash: Decimal = pre_investment.iter().map(|row| row.cashflow).sum();
    let anchor_date = pre_investment[pre_investment.len() - 1].event_date;
    debug!(
        "Anchoring {} pre-investment rows ({}) at {}",
        pre_investment.len(),
        opening_cash,
        anchor_date
    );

    let mut anchored = Vec::with_capacity(invested.len() + 1);
    anchored.push(TimelineRow::anchor(anchor_date, opening_cash));
    anchored.extend_from_slice(invested);
    anchored
}

/// Turn timeline rows back into raw inputs, e.g. to re-run a slice of them.
pub fn rows_to_inputs(rows: &[TimelineRow]) -> (Vec<CashflowEvent>, Vec<ValuationSnapshot>) {
    let events = rows
        .iter()
        .filter(|row| !row.cashflow.is_zero())
        .map(|row| {
            let tag = if row.anchor { "opening" } else { "" };
            CashflowEvent::new(row.event_date, row.cashflow, tag)
        })
        .collect();
    let snapshots = rows
        .iter()
        .filter(|row| row.has_valuation())
        .map(|row| ValuationSnapshot::new(row.event_date, row.portfolio))
        .collect();
    (events, snapshots)
}
