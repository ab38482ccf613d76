// Pricing module - market data lookups and holdings valuation

pub mod holdings;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

pub use holdings::{value_holdings, HoldingsSnapshot, Position, CASH_SYMBOL};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("no price for {symbol} on or before {date}")]
    MissingPrice { symbol: String, date: NaiveDate },

    #[error("negative price {price} for {symbol} on {date}")]
    NegativePrice {
        symbol: String,
        date: NaiveDate,
        price: Decimal,
    },
}

/// Source of closing prices, handed explicitly to whatever needs to value
/// holdings.
pub trait MarketDataProvider: Send + Sync {
    /// Closing price of `symbol` effective on `date`.
    fn close_price(&self, symbol: &str, date: NaiveDate) -> Option<Decimal>;
}

/// In-memory price table. A lookup returns the latest close on or before the
/// requested date, within `max_staleness_days`.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    prices: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
    max_staleness_days: Option<i64>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse prices older than `days` relative to the lookup date.
    pub fn with_max_staleness(mut self, days: i64) -> Self {
        self.max_staleness_days = Some(days);
        self
    }

    pub fn insert(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        close: Decimal,
    ) -> Result<(), PricingError> {
        if close < Decimal::ZERO {
            return Err(PricingError::NegativePrice {
                symbol: symbol.to_string(),
                date,
                price: close,
            });
        }
        self.prices
            .entry(normalize_symbol(symbol))
            .or_default()
            .insert(date, close);
        Ok(())
    }

    pub fn symbol_count(&self) -> usize {
        self.prices.len()
    }
}

impl MarketDataProvider for StaticMarketData {
    fn close_price(&self, symbol: &str, date: NaiveDate) -> Option<Decimal> {
        let history = self.prices.get(&normalize_symbol(symbol))?;
        let (price_date, close) = history.range(..=date).next_back()?;
        if let Some(max_days) = self.max_staleness_days {
            let age = (date - *price_date).num_days();
            if age > max_days {
                debug!(
                    "Price for {} on {} is {} days old (limit {})",
                    symbol, date, age, max_days
                );
                return None;
            }
        }
        Some(*close)
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
