//! Performance-attribution engine.
//!
//! Pipeline per owner, each stage returning a new collection:
//!
//! 1. [`timeline::build_timeline`] merges cash flows and valuations
//! 2. [`deriver::derive_period_end_values`] adds the value each sub-period starts from
//! 3. [`subperiod::construct_sub_periods`] pairs starts with the next valuation
//! 4. [`chain::chain_twrr`] links the sub-period returns
//! 5. [`fiscal::segment_fiscal_years`] re-runs 1-4 on every fiscal year
//! 6. [`cagr::annualize`] compounds the fiscal years over the elapsed time
//!
//! The engine is pure: no I/O, no clock, no shared state.

pub mod cagr;
pub mod chain;
pub mod deriver;
pub mod fiscal;
pub mod model;
pub mod policy;
pub mod subperiod;
pub mod timeline;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{EngineError, PerformanceWarning};
pub use model::{
    CashflowEvent, FiscalYearReturn, OwnerInput, OwnerKind, PerformanceResult, SubPeriod,
    TimelineRow, ValuationSnapshot,
};
pub use policy::{EngineConfig, LastRowPolicy, ValuationDating};
use subperiod::SubPeriods;

/// Timeline, sub-periods and chained return of one run of stages 1-4.
struct ChainedSlice {
    timeline: Vec<TimelineRow>,
    sub_periods: SubPeriods,
    twrr: Decimal,
}

fn chain_slice(
    events: &[CashflowEvent],
    snapshots: &[ValuationSnapshot],
    config: &EngineConfig,
    dating: ValuationDating,
) -> Result<ChainedSlice, EngineError> {
    let built = timeline::build_timeline(events, snapshots, dating);
    let derived = deriver::derive_period_end_values(&built, config.last_row);
    let sub_periods = subperiod::construct_sub_periods(&derived)?;
    let twrr = chain::chain_twrr(&sub_periods.periods)?;
    Ok(ChainedSlice {
        timeline: derived,
        sub_periods,
        twrr,
    })
}

fn push_unique(warnings: &mut Vec<PerformanceWarning>, warning: PerformanceWarning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}

fn fiscal_year_returns(
    timeline: &[TimelineRow],
    config: &EngineConfig,
    warnings: &mut Vec<PerformanceWarning>,
) -> Result<Vec<FiscalYearReturn>, EngineError> {
    fiscal::segment_fiscal_years(timeline, config.fiscal_year_start_month)
        .into_iter()
        .map(|slice| -> Result<FiscalYearReturn, EngineError> {
            if !slice.boundary_exact {
                push_unique(
                    warnings,
                    PerformanceWarning::FiscalYearBoundaryMissing {
                        fiscal_year: slice.fiscal_year,
                        expected: slice.expected_opening,
                        substituted: slice.opening_date,
                    },
                );
            }

            // Slice dates are already effective dates; do not shift them again.
            let (events, snapshots) = timeline::rows_to_inputs(&slice.rows);
            let chained = chain_slice(&events, &snapshots, config, ValuationDating::AsReported)?;
            for skipped in chained.sub_periods.skipped {
                push_unique(warnings, skipped);
            }
            debug!(
                "FY {}: {} sub-periods, twrr {}",
                slice.fiscal_year,
                chained.sub_periods.periods.len(),
                chained.twrr
            );

            Ok(FiscalYearReturn {
                fiscal_year: slice.fiscal_year,
                opening_date: slice.opening_date,
                closing_date: slice.closing_date,
                twrr: chained.twrr,
                boundary_exact: slice.boundary_exact,
                sub_period_count: chained.sub_periods.periods.len(),
            })
        })
        .collect()
}

/// Compute since-inception TWRR, current fiscal-year TWRR and CAGR for one
/// owner's cash flows and valuations (in any order).
///
/// Only a negative valuation, an invalid configuration or a return too large
/// for a `Decimal` is an error; missing data is reported through
/// `insufficient_data` and the result's warnings.
pub fn compute_performance(
    events: &[CashflowEvent],
    snapshots: &[ValuationSnapshot],
    config: &EngineConfig,
) -> Result<PerformanceResult, EngineError> {
    config.validate()?;
    if let Some(bad) = snapshots
        .iter()
        .find(|snapshot| snapshot.portfolio_value < Decimal::ZERO)
    {
        return Err(EngineError::NegativeValuation {
            date: bad.snapshot_date,
            value: bad.portfolio_value,
        });
    }

    let full = chain_slice(events, snapshots, config, config.valuation_dating)?;
    if !full.timeline.iter().any(TimelineRow::has_valuation) {
        info!(
            "No valuation snapshots among {} timeline rows; insufficient data",
            full.timeline.len()
        );
        return Ok(PerformanceResult::insufficient(full.timeline));
    }

    let mut warnings = full.sub_periods.skipped.clone();
    let fiscal_years = fiscal_year_returns(&full.timeline, config, &mut warnings)?;
    let current_fiscal_year_twrr = fiscal_years
        .last()
        .map(|fy| fy.twrr)
        .unwrap_or(Decimal::ZERO);

    let years_elapsed = cagr::years_elapsed(&full.sub_periods.periods, config.days_per_year);
    let cagr = if years_elapsed > Decimal::ONE {
        let growth = cagr::compound_growth(fiscal_years.iter().map(|fy| fy.twrr))?;
        cagr::annualize(growth, years_elapsed)
    } else {
        debug!("{} years elapsed; CAGR not annualized", years_elapsed);
        warnings.push(PerformanceWarning::UnderAnnualizationHorizon { years_elapsed });
        Decimal::ZERO
    };

    Ok(PerformanceResult {
        since_inception_twrr: full.twrr,
        current_fiscal_year_twrr,
        cagr,
        years_elapsed,
        insufficient_data: false,
        fiscal_years,
        sub_periods: full.sub_periods.periods,
        timeline: full.timeline,
        warnings,
    })
}

/// [`compute_performance`] for an owner handed over by the data provider.
pub fn evaluate_owner(
    owner: &OwnerInput,
    config: &EngineConfig,
) -> Result<PerformanceResult, EngineError> {
    debug!(
        "Evaluating {} owner {} ({} flows, {} valuations)",
        owner.owner_kind,
        owner.owner_id,
        owner.cashflows.len(),
        owner.valuations.len()
    );
    let result = compute_performance(&owner.cashflows, &owner.valuations, config)?;
    info!(
        "Owner {}: twrr {}, current FY {}, cagr {}",
        owner.owner_id, result.since_inception_twrr, result.current_fiscal_year_twrr, result.cagr
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_zero_flow_case() {
        let events = vec![CashflowEvent::new(date(2022, 4, 1), dec!(100000), "deposit")];
        let snapshots = vec![ValuationSnapshot::new(date(2022, 4, 30), dec!(110000))];

        let result = compute_performance(&events, &snapshots, &EngineConfig::default()).unwrap();

        assert_eq!(result.sub_periods.len(), 1);
        assert_eq!(result.sub_periods[0].start_value, dec!(100000));
        assert_eq!(result.sub_periods[0].end_value, dec!(110000));
        assert_eq!(result.sub_periods[0].period_return, dec!(0.10));
        assert_eq!(result.since_inception_twrr, dec!(0.10));
        assert_eq!(result.current_fiscal_year_twrr, dec!(0.10));
        assert_eq!(result.cagr, Decimal::ZERO);
        assert!(!result.insufficient_data);
    }

    #[test]
    fn test_negative_valuation_is_rejected() {
        let snapshots = vec![ValuationSnapshot::new(date(2022, 4, 30), dec!(-1))];
        let err = compute_performance(&[], &snapshots, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::NegativeValuation { .. }));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            fiscal_year_start_month: 0,
            ..EngineConfig::default()
        };
        assert!(compute_performance(&[], &[], &config).is_err());
    }

    #[test]
    fn test_no_snapshots_is_insufficient_data() {
        let events = vec![CashflowEvent::new(date(2022, 4, 1), dec!(100000), "deposit")];
        let result = compute_performance(&events, &[], &EngineConfig::default()).unwrap();
        assert!(result.insufficient_data);
        assert_eq!(result.warnings, vec![PerformanceWarning::InsufficientData]);
    }

    #[test]
    fn test_short_history_records_horizon_warning() {
        let snapshots = vec![
            ValuationSnapshot::new(date(2022, 4, 30), dec!(100)),
            ValuationSnapshot::new(date(2022, 5, 31), dec!(101)),
        ];
        let result = compute_performance(&[], &snapshots, &EngineConfig::default()).unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, PerformanceWarning::UnderAnnualizationHorizon { .. })));
    }
}
