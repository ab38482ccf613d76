// Import module - CSV adapters turning provider exports into engine inputs

pub mod ledger_csv;

use anyhow::{Context, Result};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::engine::{CashflowEvent, OwnerInput, ValuationSnapshot};
use crate::pricing::{HoldingsSnapshot, StaticMarketData};
pub use ledger_csv::OwnedRecord;

/// Owner id used for rows of files without an owner column.
pub const DEFAULT_OWNER: &str = "default";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("{file_kind} file has no {column} column")]
    MissingColumn { file_kind: String, column: String },

    #[error("unsupported file format: {0}. Supported formats: .csv, .txt")]
    UnsupportedFormat(String),
}

fn open_csv(path: &Path) -> Result<File> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if !matches!(extension.as_str(), "csv" | "txt") {
        return Err(ImportError::UnsupportedFormat(extension).into());
    }
    info!("Reading {:?}", path);
    File::open(path).with_context(|| format!("Failed to open CSV file {:?}", path))
}

pub fn read_cashflows(path: &Path) -> Result<Vec<OwnedRecord<CashflowEvent>>> {
    ledger_csv::parse_cashflows(open_csv(path)?)
        .with_context(|| format!("Failed to import cash flows from {:?}", path))
}

pub fn read_valuations(path: &Path) -> Result<Vec<OwnedRecord<ValuationSnapshot>>> {
    ledger_csv::parse_valuations(open_csv(path)?)
        .with_context(|| format!("Failed to import valuations from {:?}", path))
}

pub fn read_holdings(path: &Path) -> Result<Vec<HoldingsSnapshot>> {
    ledger_csv::parse_holdings(open_csv(path)?)
        .with_context(|| format!("Failed to import holdings from {:?}", path))
}

pub fn read_prices(path: &Path) -> Result<StaticMarketData> {
    ledger_csv::parse_prices(open_csv(path)?)
        .with_context(|| format!("Failed to import prices from {:?}", path))
}

pub fn read_joint_mapping(path: &Path) -> Result<Vec<(String, String)>> {
    ledger_csv::parse_joint_mapping(open_csv(path)?)
        .with_context(|| format!("Failed to import joint mapping from {:?}", path))
}

/// Split owner-tagged rows into one single-owner input per owner id, sorted by
/// id. Rows without an owner go to [`DEFAULT_OWNER`].
pub fn group_by_owner(
    cashflows: Vec<OwnedRecord<CashflowEvent>>,
    valuations: Vec<OwnedRecord<ValuationSnapshot>>,
) -> Vec<OwnerInput> {
    let owner_of = |owner_id: Option<String>| owner_id.unwrap_or_else(|| DEFAULT_OWNER.to_string());

    let mut owners: BTreeMap<String, OwnerInput> = BTreeMap::new();
    let flows = cashflows
        .into_iter()
        .map(|row| (owner_of(row.owner_id), row.record))
        .into_group_map();
    let values = valuations
        .into_iter()
        .map(|row| (owner_of(row.owner_id), row.record))
        .into_group_map();

    for (owner_id, events) in flows {
        owners
            .entry(owner_id.clone())
            .or_insert_with(|| OwnerInput::single(owner_id, Vec::new(), Vec::new()))
            .cashflows = events;
    }
    for (owner_id, snapshots) in values {
        owners
            .entry(owner_id.clone())
            .or_insert_with(|| OwnerInput::single(owner_id, Vec::new(), Vec::new()))
            .valuations = snapshots;
    }

    info!("Grouped input rows into {} owners", owners.len());
    owners.into_values().collect()
}
