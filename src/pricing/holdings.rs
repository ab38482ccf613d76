use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{MarketDataProvider, PricingError};
use crate::engine::ValuationSnapshot;

/// Symbol under which a cash balance is listed among positions.
pub const CASH_SYMBOL: &str = "CASH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
}

/// Positions held on a date plus the uninvested cash balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub date: NaiveDate,
    pub positions: Vec<Position>,
    pub cash: Decimal,
}

impl HoldingsSnapshot {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            positions: Vec::new(),
            cash: Decimal::ZERO,
        }
    }

    /// Add a position, or cash when `symbol` is [`CASH_SYMBOL`].
    pub fn add(&mut self, symbol: &str, quantity: Decimal) {
        if symbol.trim().eq_ignore_ascii_case(CASH_SYMBOL) {
            self.cash += quantity;
            return;
        }
        match self
            .positions
            .iter_mut()
            .find(|p| p.symbol.eq_ignore_ascii_case(symbol.trim()))
        {
            Some(existing) => existing.quantity += quantity,
            None => self.positions.push(Position {
                symbol: symbol.trim().to_uppercase(),
                quantity,
            }),
        }
    }
}

/// Value each holdings snapshot at market: `sum(quantity * close) + cash`.
///
/// A position without a usable price fails the whole call rather than being
/// valued at zero, which would show up as a fake loss.
pub fn value_holdings(
    snapshots: &[HoldingsSnapshot],
    provider: &dyn MarketDataProvider,
) -> Result<Vec<ValuationSnapshot>, PricingError> {
    let mut valuations: Vec<ValuationSnapshot> = snapshots
        .iter()
        .map(|snapshot| {
            let market_value = snapshot
                .positions
                .iter()
                .filter(|position| !position.quantity.is_zero())
                .map(|position| {
                    provider
                        .close_price(&position.symbol, snapshot.date)
                        .map(|close| close * position.quantity)
                        .ok_or_else(|| PricingError::MissingPrice {
                            symbol: position.symbol.clone(),
                            date: snapshot.date,
                        })
                })
                .sum::<Result<Decimal, PricingError>>()?;
            debug!(
                "Valued {} positions on {}: {} + cash {}",
                snapshot.positions.len(),
                snapshot.date,
                market_value,
                snapshot.cash
            );
            Ok(ValuationSnapshot::new(snapshot.date, market_value + snapshot.cash))
        })
        .collect::<Result<_, PricingError>>()?;

    valuations.sort_by_key(|v| v.snapshot_date);
    info!("Valued {} holdings snapshots", valuations.len());
    Ok(valuations)
}
