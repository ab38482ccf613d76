//! Bracket/basket allocation
//!
//! An investment amount falls into a bracket (an amount band); each bracket
//! splits money across model baskets by percentage. Baskets marked leveraged
//! may push the total above 100%, in which case the excess is taken back from
//! the leveraged baskets in proportion to their weights.
//!
//! Allocation is independent of the return engine: callers use it next to the
//! engine, never inside it.

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Basket names carrying this marker are treated as leveraged.
pub const LEVERAGED_MARKER: &str = "(Leveraged)";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no bracket covers amount {amount}")]
    NoBracket { amount: Decimal },

    #[error("amount to allocate must not be negative, got {0}")]
    NegativeAmount(Decimal),

    #[error("invalid bracket table: {0}")]
    InvalidTable(String),
}

/// Strategy deciding how an amount is split across baskets.
pub trait AllocationPolicy {
    fn allocate(&self, amount: Decimal) -> Result<Allocation, AllocationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketWeight {
    pub basket_id: u32,
    pub name: String,
    pub allocation_pct: Decimal,
    #[serde(default)]
    pub leveraged: bool,
}

impl BasketWeight {
    pub fn is_leveraged(&self) -> bool {
        self.leveraged || self.name.contains(LEVERAGED_MARKER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub id: u32,
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    #[serde(default)]
    pub baskets: Vec<BasketWeight>,
}

impl Bracket {
    pub fn covers(&self, amount: Decimal) -> bool {
        self.min <= amount && amount <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasketAllocation {
    pub basket_id: u32,
    pub name: String,
    pub leveraged: bool,
    pub allocation_pct: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub bracket_id: u32,
    pub bracket_name: String,
    pub amount: Decimal,
    /// Percentage total after leveraged renormalization.
    pub total_pct: Decimal,
    pub baskets: Vec<BasketAllocation>,
}

/// Bracket table loaded from TOML:
///
/// ```toml
/// [[brackets]]
/// id = 1
/// name = "Up to 10L"
/// min = 0
/// max = 1000000
///
/// [[brackets.baskets]]
/// basket_id = 1
/// name = "Core Equity"
/// allocation_pct = 70
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketBasketPolicy {
    pub brackets: Vec<Bracket>,
}

impl BracketBasketPolicy {
    pub fn from_toml_str(text: &str) -> Result<Self, AllocationError> {
        let policy: Self =
            toml::from_str(text).map_err(|e| AllocationError::InvalidTable(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bracket table {:?}", path))?;
        let policy = Self::from_toml_str(&text)
            .with_context(|| format!("Failed to load bracket table {:?}", path))?;
        info!("Loaded {} brackets from {:?}", policy.brackets.len(), path);
        Ok(policy)
    }

    fn validate(&self) -> Result<(), AllocationError> {
        for bracket in &self.brackets {
            if bracket.min > bracket.max {
                return Err(AllocationError::InvalidTable(format!(
                    "bracket '{}' has min {} above max {}",
                    bracket.name, bracket.min, bracket.max
                )));
            }
            if let Some(basket) = bracket
                .baskets
                .iter()
                .find(|b| b.allocation_pct < Decimal::ZERO)
            {
                return Err(AllocationError::InvalidTable(format!(
                    "basket '{}' in bracket '{}' has negative weight {}",
                    basket.name, bracket.name, basket.allocation_pct
                )));
            }
        }
        Ok(())
    }

    pub fn bracket_for(&self, amount: Decimal) -> Option<&Bracket> {
        self.brackets
            .iter()
            .filter(|bracket| bracket.covers(amount))
            .min_by_key(|bracket| bracket.min)
    }
}

impl AllocationPolicy for BracketBasketPolicy {
    fn allocate(&self, amount: Decimal) -> Result<Allocation, AllocationError> {
        if amount < Decimal::ZERO {
            return Err(AllocationError::NegativeAmount(amount));
        }
        let bracket = self.bracket_for(amount).ok_or_else(|| {
            warn!("No bracket found for amount {}", amount);
            AllocationError::NoBracket { amount }
        })?;
        debug!("Amount {} falls in bracket {} ({})", amount, bracket.id, bracket.name);

        let weights = renormalize_leveraged(&bracket.name, &bracket.baskets);
        let baskets: Vec<BasketAllocation> = bracket
            .baskets
            .iter()
            .zip(weights)
            .map(|(basket, pct)| BasketAllocation {
                basket_id: basket.basket_id,
                name: basket.name.clone(),
                leveraged: basket.is_leveraged(),
                allocation_pct: pct,
                amount: amount * pct / Decimal::ONE_HUNDRED,
            })
            .collect();

        Ok(Allocation {
            bracket_id: bracket.id,
            bracket_name: bracket.name.clone(),
            amount,
            total_pct: baskets.iter().map(|b| b.allocation_pct).sum(),
            baskets,
        })
    }
}

/// Basket percentages with any excess over 100 taken from the leveraged
/// baskets, proportionally to their own weights. Non-leveraged baskets are
/// never touched; reduced weights stop at zero.
pub fn renormalize_leveraged(bracket_name: &str, baskets: &[BasketWeight]) -> Vec<Decimal> {
    let total: Decimal = baskets.iter().map(|b| b.allocation_pct).sum();
    let mut weights: Vec<Decimal> = baskets.iter().map(|b| b.allocation_pct).collect();
    if total <= Decimal::ONE_HUNDRED {
        return weights;
    }

    let excess = total - Decimal::ONE_HUNDRED;
    let leveraged_total: Decimal = baskets
        .iter()
        .filter(|b| b.is_leveraged())
        .map(|b| b.allocation_pct)
        .sum();
    if leveraged_total.is_zero() {
        warn!(
            "Bracket {} allocates {}% but has no leveraged baskets to reduce",
            bracket_name, total
        );
        return weights;
    }

    info!(
        "Bracket {} allocates {}%, reducing leveraged baskets by {}%",
        bracket_name, total, excess
    );
    for (weight, basket) in weights.iter_mut().zip(baskets) {
        if basket.is_leveraged() {
            let reduction = excess * basket.allocation_pct / leveraged_total;
            *weight = (*weight - reduction).max(Decimal::ZERO);
            debug!("Basket {} reduced by {} to {}", basket.name, reduction, weight);
        }
    }

    let adjusted: Decimal = weights.iter().sum();
    if adjusted > Decimal::ONE_HUNDRED {
        warn!(
            "Bracket {} still allocates {}% after zeroing leveraged baskets",
            bracket_name, adjusted
        );
    }
    weights
}
