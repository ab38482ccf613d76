//! Fiscal-year segmenter.
//!
//! A fiscal year starting in April 2022 runs from 2022-04-01 to 2023-03-31.
//! Each slice opens on the prior year's closing valuation (March 31) so that
//! the first sub-period of the year starts from a real market value; when no
//! valuation sits on that day the earliest date of the year is used and the
//! approximation is logged.

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use tracing::warn;

use super::model::TimelineRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalSlice {
    pub fiscal_year: i32,
    /// Day before the fiscal year starts (the boundary the slice should open on).
    pub expected_opening: NaiveDate,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub boundary_exact: bool,
    pub rows: Vec<TimelineRow>,
}

/// Fiscal year a date belongs to, named after the calendar year it starts in.
pub fn fiscal_year_of(date: NaiveDate, start_month: u32) -> i32 {
    if date.month() >= start_month {
        date.year()
    } else {
        date.year() - 1
    }
}

/// `(prior close, close)` of a fiscal year: the days before it and the next
/// one start.
pub fn fiscal_year_bounds(fiscal_year: i32, start_month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let prior_close = NaiveDate::from_ymd_opt(fiscal_year, start_month, 1)?.pred_opt()?;
    let close = NaiveDate::from_ymd_opt(fiscal_year + 1, start_month, 1)?.pred_opt()?;
    Some((prior_close, close))
}

/// Split an ascending timeline into one slice per fiscal year present in it.
pub fn segment_fiscal_years(rows: &[TimelineRow], start_month: u32) -> Vec<FiscalSlice> {
    let fiscal_years: Vec<i32> = rows
        .iter()
        .map(|row| fiscal_year_of(row.event_date, start_month))
        .dedup()
        .collect();

    fiscal_years
        .into_iter()
        .filter_map(|fiscal_year| {
            let (prior_close, close) = fiscal_year_bounds(fiscal_year, start_month)?;
            let boundary_exact = rows
                .iter()
                .any(|row| row.event_date == prior_close && row.has_valuation());
            let opening_date = if boundary_exact {
                prior_close
            } else {
                let earliest = rows
                    .iter()
                    .map(|row| row.event_date)
                    .find(|date| fiscal_year_of(*date, start_month) == fiscal_year)?;
                warn!(
                    "FY {}: no valuation on {}, opening at {} instead (approximation)",
                    fiscal_year, prior_close, earliest
                );
                earliest
            };

            let slice_rows = rows
                .iter()
                .filter(|row| row.event_date >= opening_date && row.event_date <= close)
                .cloned()
                .collect();

            Some(FiscalSlice {
                fiscal_year,
                expected_opening: prior_close,
                opening_date,
                closing_date: close,
                boundary_exact,
                rows: slice_rows,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn valuation(d: NaiveDate, value: Decimal) -> TimelineRow {
        TimelineRow::new(d, Decimal::ZERO, value)
    }

    #[test]
    fn test_fiscal_year_of_april_start() {
        assert_eq!(fiscal_year_of(date(2023, 3, 31), 4), 2022);
        assert_eq!(fiscal_year_of(date(2023, 4, 1), 4), 2023);
        assert_eq!(fiscal_year_of(date(2023, 12, 31), 4), 2023);
        assert_eq!(fiscal_year_of(date(2023, 1, 1), 1), 2023);
    }

    #[test]
    fn test_bounds_handle_leap_years() {
        assert_eq!(
            fiscal_year_bounds(2023, 4),
            Some((date(2023, 3, 31), date(2024, 3, 31)))
        );
        assert_eq!(
            fiscal_year_bounds(2023, 3),
            Some((date(2023, 2, 28), date(2024, 2, 29)))
        );
    }

    #[test]
    fn test_slice_opens_on_prior_march_close() {
        let rows = vec![
            valuation(date(2022, 4, 30), dec!(100)),
            valuation(date(2023, 3, 31), dec!(120)),
            valuation(date(2023, 4, 30), dec!(125)),
        ];

        let slices = segment_fiscal_years(&rows, 4);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].fiscal_year, 2022);
        assert!(!slices[0].boundary_exact);
        assert_eq!(slices[0].opening_date, date(2022, 4, 30));
        assert_eq!(slices[0].rows.len(), 2);

        assert_eq!(slices[1].fiscal_year, 2023);
        assert!(slices[1].boundary_exact);
        assert_eq!(slices[1].opening_date, date(2023, 3, 31));
        assert_eq!(slices[1].closing_date, date(2024, 3, 31));
        assert_eq!(slices[1].rows.len(), 2);
    }

    #[test]
    fn test_cash_only_boundary_is_not_exact() {
        let rows = vec![
            valuation(date(2023, 2, 28), dec!(100)),
            TimelineRow::new(date(2023, 3, 31), dec!(50), Decimal::ZERO),
            valuation(date(2023, 4, 15), dec!(160)),
            valuation(date(2023, 5, 31), dec!(170)),
        ];

        let slices = segment_fiscal_years(&rows, 4);

        assert_eq!(slices.len(), 2);
        assert!(!slices[1].boundary_exact);
        assert_eq!(slices[1].expected_opening, date(2023, 3, 31));
        assert_eq!(slices[1].opening_date, date(2023, 4, 15));
        assert_eq!(slices[1].rows.len(), 2);
    }

    #[test]
    fn test_empty_timeline_has_no_slices() {
        assert!(segment_fiscal_years(&[], 4).is_empty());
    }
}
