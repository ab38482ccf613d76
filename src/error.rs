//! Error handling for perftrack
//!
//! Library stages report typed errors with `thiserror`; the binary and the
//! file adapters use `anyhow` for context chaining and error propagation.
//! Conditions the engine recovers from on its own are not errors: they are
//! collected as [`PerformanceWarning`] values on the result.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Input problems the engine refuses to normalize.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("negative valuation {value} on {date}")]
    NegativeValuation { date: NaiveDate, value: Decimal },

    #[error("fiscal year start month must be 1..=12, got {0}")]
    InvalidFiscalStartMonth(u32),

    #[error("days per year must be positive, got {0}")]
    InvalidDaysPerYear(Decimal),

    #[error("arithmetic overflow {0}")]
    Overflow(String),
}

/// Application-level error types for the file adapters and CLI
#[derive(Error, Debug)]
pub enum PerftrackError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

/// Recoverable conditions met while computing one owner's performance.
///
/// Each one is logged where it happens and kept on the result so callers can
/// audit how the metrics were obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PerformanceWarning {
    #[error("no valuation snapshots; metrics reported as zero")]
    InsufficientData,

    #[error("skipped sub-period {start_date} -> {end_date}: start value {start_value} is not positive")]
    DegenerateSubPeriodSkipped {
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_value: Decimal,
    },

    #[error("only {years_elapsed} years elapsed; CAGR reported as zero")]
    UnderAnnualizationHorizon { years_elapsed: Decimal },

    #[error("fiscal year {fiscal_year}: no valuation on {expected}, opened at {substituted} instead")]
    FiscalYearBoundaryMissing {
        fiscal_year: i32,
        expected: NaiveDate,
        substituted: NaiveDate,
    },
}

/// Result type alias for application operations
pub type Result<T> = anyhow::Result<T>;
