//! Data model for the performance engine
//!
//! Inputs (`CashflowEvent`, `ValuationSnapshot`) come from the caller; every
//! other type is produced fresh by a pipeline stage and never mutated after.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, PerformanceWarning};

/// Money moving into (positive) or out of (negative) an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashflowEvent {
    pub event_date: NaiveDate,
    pub amount: Decimal,
    #[serde(default)]
    pub tag: String,
}

impl CashflowEvent {
    pub fn new(event_date: NaiveDate, amount: Decimal, tag: impl Into<String>) -> Self {
        Self {
            event_date,
            amount,
            tag: tag.into(),
        }
    }
}

/// Market value of an owner's holdings (plus cash where tracked) on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub snapshot_date: NaiveDate,
    pub portfolio_value: Decimal,
}

impl ValuationSnapshot {
    pub fn new(snapshot_date: NaiveDate, portfolio_value: Decimal) -> Self {
        Self {
            snapshot_date,
            portfolio_value,
        }
    }
}

/// One date of the merged cash-flow/valuation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub event_date: NaiveDate,
    pub cashflow: Decimal,
    pub portfolio: Decimal,
    /// Valuation plus the cash that arrives before the next valuation.
    /// Zero until the deriver has run.
    pub period_end_value: Decimal,
    /// Synthetic row carrying cash invested before the first valuation.
    pub anchor: bool,
}

impl TimelineRow {
    pub fn new(event_date: NaiveDate, cashflow: Decimal, portfolio: Decimal) -> Self {
        Self {
            event_date,
            cashflow,
            portfolio,
            period_end_value: Decimal::ZERO,
            anchor: false,
        }
    }

    pub fn anchor(event_date: NaiveDate, cashflow: Decimal) -> Self {
        Self {
            anchor: true,
            ..Self::new(event_date, cashflow, Decimal::ZERO)
        }
    }

    pub fn has_valuation(&self) -> bool {
        self.portfolio > Decimal::ZERO
    }

    /// Rows that can open or close a sub-period.
    pub fn is_period_node(&self) -> bool {
        self.anchor || self.has_valuation()
    }

    pub fn with_period_end_value(&self, period_end_value: Decimal) -> Self {
        Self {
            period_end_value,
            ..self.clone()
        }
    }
}

/// Interval between two valuation points with its growth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubPeriod {
    pub start_date: NaiveDate,
    pub start_value: Decimal,
    pub end_date: NaiveDate,
    pub end_value: Decimal,
    #[serde(rename = "return")]
    pub period_return: Decimal,
    pub growth_factor: Decimal,
}

impl SubPeriod {
    /// Callers guarantee `start_value > 0`. Fails when the ratio of end to
    /// start value does not fit in a `Decimal`.
    pub fn new(
        start_date: NaiveDate,
        start_value: Decimal,
        end_date: NaiveDate,
        end_value: Decimal,
    ) -> Result<Self, EngineError> {
        let period_return = end_value
            .checked_div(start_value)
            .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
            .ok_or_else(|| {
                EngineError::Overflow(format!(
                    "computing the return from {} ({}) to {} ({})",
                    start_date, start_value, end_date, end_value
                ))
            })?;
        Ok(Self {
            start_date,
            start_value,
            end_date,
            end_value,
            period_return,
            growth_factor: Decimal::ONE + period_return,
        })
    }

    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// Time-weighted return of one fiscal year slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearReturn {
    /// Calendar year in which the fiscal year starts (FY 2022 = Apr 2022 - Mar 2023).
    pub fiscal_year: i32,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub twrr: Decimal,
    /// False when no valuation sat on the prior year's closing day and the
    /// earliest date of the year was used instead.
    pub boundary_exact: bool,
    pub sub_period_count: usize,
}

impl FiscalYearReturn {
    pub fn label(&self) -> String {
        format!("FY {}-{:02}", self.fiscal_year, (self.fiscal_year + 1) % 100)
    }
}

/// Everything the engine reports for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceResult {
    pub since_inception_twrr: Decimal,
    pub current_fiscal_year_twrr: Decimal,
    pub cagr: Decimal,
    pub years_elapsed: Decimal,
    pub insufficient_data: bool,
    pub fiscal_years: Vec<FiscalYearReturn>,
    pub sub_periods: Vec<SubPeriod>,
    /// Derived timeline with period-end values, kept for drill-down.
    pub timeline: Vec<TimelineRow>,
    #[serde(skip_deserializing)]
    pub warnings: Vec<PerformanceWarning>,
}

impl PerformanceResult {
    /// Zero metrics for an owner without any valuation.
    pub fn insufficient(timeline: Vec<TimelineRow>) -> Self {
        Self {
            since_inception_twrr: Decimal::ZERO,
            current_fiscal_year_twrr: Decimal::ZERO,
            cagr: Decimal::ZERO,
            years_elapsed: Decimal::ZERO,
            insufficient_data: true,
            fiscal_years: Vec::new(),
            sub_periods: Vec::new(),
            timeline,
            warnings: vec![PerformanceWarning::InsufficientData],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Single,
    Joint,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Single => "single",
            OwnerKind::Joint => "joint",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(OwnerKind::Single),
            "joint" => Ok(OwnerKind::Joint),
            other => Err(format!("unknown owner kind '{}'", other)),
        }
    }
}

/// Cash flows and valuations of one account owner, as handed over by the
/// portfolio data provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerInput {
    pub owner_id: String,
    pub owner_kind: OwnerKind,
    pub cashflows: Vec<CashflowEvent>,
    pub valuations: Vec<ValuationSnapshot>,
}

impl OwnerInput {
    pub fn single(
        owner_id: impl Into<String>,
        cashflows: Vec<CashflowEvent>,
        valuations: Vec<ValuationSnapshot>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            owner_kind: OwnerKind::Single,
            cashflows,
            valuations,
        }
    }
}
