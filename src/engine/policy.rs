//! Engine configuration and the named boundary policies
//!
//! Two historical variants of the calculation disagree on how the last
//! valuation row and the fiscal-year boundary are handled. Both behaviours are
//! kept as explicit policies so they can be selected and tested side by side.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// What the last valuation row carries as its period-end value.
///
/// The last row never opens a sub-period under either policy; the choice only
/// changes what the audit timeline shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastRowPolicy {
    /// Period-end value of the last valuation is zero.
    #[default]
    Zero,
    /// Last valuation plus any cash that arrived after it.
    CarryTrailingFlows,
}

/// Which date a valuation snapshot is effective on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationDating {
    /// Use the snapshot date as stamped.
    #[default]
    AsReported,
    /// Feed stamps day D's close on D+1: move every snapshot back one day.
    PreviousDay,
}

impl ValuationDating {
    pub fn effective_date(&self, stamped: NaiveDate) -> NaiveDate {
        match self {
            ValuationDating::AsReported => stamped,
            ValuationDating::PreviousDay => stamped.pred_opt().unwrap_or(stamped),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// First month of the fiscal year (4 = April-March).
    pub fiscal_year_start_month: u32,
    pub last_row: LastRowPolicy,
    pub valuation_dating: ValuationDating,
    /// Day count used to turn sub-period lengths into years.
    pub days_per_year: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fiscal_year_start_month: 4,
            last_row: LastRowPolicy::default(),
            valuation_dating: ValuationDating::default(),
            days_per_year: Decimal::new(36525, 2),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(1..=12).contains(&self.fiscal_year_start_month) {
            return Err(EngineError::InvalidFiscalStartMonth(
                self.fiscal_year_start_month,
            ));
        }
        if self.days_per_year <= Decimal::ZERO {
            return Err(EngineError::InvalidDaysPerYear(self.days_per_year));
        }
        Ok(())
    }
}
