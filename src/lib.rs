//! Perftrack - performance attribution for advisory accounts
//!
//! This library computes time-weighted returns (since inception and per
//! fiscal year) and CAGR for account owners from their cash flows and
//! portfolio valuations, with joint-account aggregation, batch evaluation,
//! holdings valuation and bracket/basket allocation around the core engine.

pub mod allocation;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod importers;
pub mod joint;
pub mod pricing;
pub mod utils;
