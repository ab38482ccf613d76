//! Batch evaluation of many owners
//!
//! Owners are independent of each other, so they are evaluated in parallel on
//! the rayon pool. One owner's bad data never stops the others: every owner
//! yields a report, either with its result or with the reason it failed.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::engine::{self, EngineConfig, OwnerInput, OwnerKind, PerformanceResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OwnerOutcome {
    Computed { result: PerformanceResult },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerReport {
    pub owner_id: String,
    pub owner_kind: OwnerKind,
    pub outcome: OwnerOutcome,
}

impl OwnerReport {
    pub fn result(&self) -> Option<&PerformanceResult> {
        match &self.outcome {
            OwnerOutcome::Computed { result } => Some(result),
            OwnerOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub computed: usize,
    pub insufficient_data: usize,
    pub failed: usize,
}

/// Evaluate every owner; reports come back in input order.
pub fn run_batch(owners: &[OwnerInput], config: &EngineConfig) -> Vec<OwnerReport> {
    info!("Evaluating {} owners", owners.len());

    let reports: Vec<OwnerReport> = owners
        .par_iter()
        .map(|owner| {
            let outcome = match engine::evaluate_owner(owner, config) {
                Ok(result) => OwnerOutcome::Computed { result },
                Err(e) => {
                    warn!("Owner {} failed: {}", owner.owner_id, e);
                    OwnerOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            OwnerReport {
                owner_id: owner.owner_id.clone(),
                owner_kind: owner.owner_kind,
                outcome,
            }
        })
        .collect();

    let summary = summarize(&reports);
    info!(
        "Batch complete: {} computed ({} with insufficient data), {} failed",
        summary.computed, summary.insufficient_data, summary.failed
    );
    reports
}

pub fn summarize(reports: &[OwnerReport]) -> BatchSummary {
    reports
        .iter()
        .fold(BatchSummary::default(), |mut summary, report| {
            match &report.outcome {
                OwnerOutcome::Computed { result } => {
                    summary.computed += 1;
                    if result.insufficient_data {
                        summary.insufficient_data += 1;
                    }
                }
                OwnerOutcome::Failed { .. } => summary.failed += 1,
            }
            summary
        })
}
