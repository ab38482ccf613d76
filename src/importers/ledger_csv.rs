use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::ImportError;
use crate::error::PerftrackError;
use crate::engine::{CashflowEvent, ValuationSnapshot};
use crate::pricing::{HoldingsSnapshot, StaticMarketData};

/// A parsed row together with the owner column, when the file has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRecord<T> {
    pub owner_id: Option<String>,
    pub record: T,
}

/// Needles matched against lowercased headers; `exclude` rules out headers
/// that would otherwise match (e.g. `joint_id` for the member column).
struct ColumnRule {
    name: &'static str,
    needles: &'static [&'static str],
    exclude: &'static [&'static str],
}

const OWNER: ColumnRule = ColumnRule {
    name: "owner_id",
    needles: &["owner", "account", "client", "member"],
    exclude: &["joint"],
};
const DATE: ColumnRule = ColumnRule {
    name: "date",
    needles: &["date"],
    exclude: &[],
};
const AMOUNT: ColumnRule = ColumnRule {
    name: "amount",
    needles: &["amount", "cashflow", "flow"],
    exclude: &[],
};
const TAG: ColumnRule = ColumnRule {
    name: "tag",
    needles: &["tag", "type", "description", "narration"],
    exclude: &[],
};
const VALUE: ColumnRule = ColumnRule {
    name: "value",
    needles: &["value", "valuation", "portfolio"],
    exclude: &[],
};
const SYMBOL: ColumnRule = ColumnRule {
    name: "symbol",
    needles: &["symbol", "ticker", "scrip"],
    exclude: &[],
};
const QUANTITY: ColumnRule = ColumnRule {
    name: "quantity",
    needles: &["quantity", "qty", "units"],
    exclude: &[],
};
const CLOSE: ColumnRule = ColumnRule {
    name: "close",
    needles: &["close", "price"],
    exclude: &[],
};
const JOINT: ColumnRule = ColumnRule {
    name: "joint_id",
    needles: &["joint"],
    exclude: &[],
};

fn find_column(headers: &StringRecord, rule: &ColumnRule) -> Option<usize> {
    headers.iter().position(|header| {
        let text = header.trim().to_lowercase();
        rule.needles.iter().any(|needle| text.contains(needle))
            && !rule.exclude.iter().any(|word| text.contains(word))
    })
}

fn require_column(headers: &StringRecord, rule: &ColumnRule, file_kind: &str) -> Result<usize> {
    find_column(headers, rule).ok_or_else(|| {
        ImportError::MissingColumn {
            file_kind: file_kind.to_string(),
            column: rule.name.to_string(),
        }
        .into()
    })
}

/// Read every record of a comma-separated file with a header row.
fn read_table<R: Read>(reader: R, file_kind: &str) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut reader = ReaderBuilder::new()
        .flexible(true) // Allow variable number of columns
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read {} CSV headers", file_kind))?
        .clone();
    debug!("{} CSV headers: {:?}", file_kind, headers);

    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read {} CSV record", file_kind))?;
    Ok((headers, records))
}

fn cell<'a>(record: &'a StringRecord, idx: usize, field: &str, row_num: usize) -> Result<&'a str> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| anyhow!("Missing {} at row {}", field, row_num))
}

fn owner_cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Apply `parse` to every data row; rows that fail are logged and skipped,
/// rows that return `Ok(None)` are blank and skipped silently.
fn parse_rows<T, F>(records: &[StringRecord], file_kind: &str, mut parse: F) -> Vec<T>
where
    F: FnMut(&StringRecord, usize) -> Result<Option<T>>,
{
    let mut parsed = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        // Header is row 1
        let row_num = idx + 2;
        match parse(record, row_num) {
            Ok(Some(item)) => parsed.push(item),
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping {} row {}: {}", file_kind, row_num, e);
                continue;
            }
        }
    }
    info!("Parsed {} {} rows", parsed.len(), file_kind);
    parsed
}

pub fn parse_cashflows<R: Read>(reader: R) -> Result<Vec<OwnedRecord<CashflowEvent>>> {
    let (headers, records) = read_table(reader, "cash flow")?;
    let owner = find_column(&headers, &OWNER);
    let date = require_column(&headers, &DATE, "cash flow")?;
    let amount = require_column(&headers, &AMOUNT, "cash flow")?;
    let tag = find_column(&headers, &TAG);

    Ok(parse_rows(&records, "cash flow", |record, row_num| {
        let date_str = cell(record, date, "date", row_num)?;
        if date_str.is_empty() {
            return Ok(None);
        }
        let event_date = parse_csv_date(date_str)?;
        let amount = parse_csv_decimal(cell(record, amount, "amount", row_num)?)?;
        let tag = tag
            .and_then(|i| record.get(i))
            .map(str::trim)
            .unwrap_or_default();

        Ok(Some(OwnedRecord {
            owner_id: owner_cell(record, owner),
            record: CashflowEvent::new(event_date, amount, tag),
        }))
    }))
}

pub fn parse_valuations<R: Read>(reader: R) -> Result<Vec<OwnedRecord<ValuationSnapshot>>> {
    let (headers, records) = read_table(reader, "valuation")?;
    let owner = find_column(&headers, &OWNER);
    let date = require_column(&headers, &DATE, "valuation")?;
    let value = require_column(&headers, &VALUE, "valuation")?;

    Ok(parse_rows(&records, "valuation", |record, row_num| {
        let date_str = cell(record, date, "date", row_num)?;
        if date_str.is_empty() {
            return Ok(None);
        }
        let snapshot_date = parse_csv_date(date_str)?;
        let portfolio_value = parse_csv_decimal(cell(record, value, "value", row_num)?)?;

        Ok(Some(OwnedRecord {
            owner_id: owner_cell(record, owner),
            record: ValuationSnapshot::new(snapshot_date, portfolio_value),
        }))
    }))
}

/// Holdings rows grouped into one snapshot per date, ascending.
pub fn parse_holdings<R: Read>(reader: R) -> Result<Vec<HoldingsSnapshot>> {
    let (headers, records) = read_table(reader, "holdings")?;
    let date = require_column(&headers, &DATE, "holdings")?;
    let symbol = require_column(&headers, &SYMBOL, "holdings")?;
    let quantity = require_column(&headers, &QUANTITY, "holdings")?;

    let rows = parse_rows(&records, "holdings", |record, row_num| {
        let symbol = cell(record, symbol, "symbol", row_num)?;
        if symbol.is_empty() {
            return Ok(None);
        }
        let held_on = parse_csv_date(cell(record, date, "date", row_num)?)?;
        let qty = parse_csv_decimal(cell(record, quantity, "quantity", row_num)?)?;
        Ok(Some((held_on, symbol.to_string(), qty)))
    });

    let mut by_date: BTreeMap<NaiveDate, HoldingsSnapshot> = BTreeMap::new();
    for (held_on, symbol, qty) in rows {
        by_date
            .entry(held_on)
            .or_insert_with(|| HoldingsSnapshot::new(held_on))
            .add(&symbol, qty);
    }
    Ok(by_date.into_values().collect())
}

pub fn parse_prices<R: Read>(reader: R) -> Result<StaticMarketData> {
    let (headers, records) = read_table(reader, "price")?;
    let date = require_column(&headers, &DATE, "price")?;
    let symbol = require_column(&headers, &SYMBOL, "price")?;
    let close = require_column(&headers, &CLOSE, "price")?;

    let mut market = StaticMarketData::new();
    let rows = parse_rows(&records, "price", |record, row_num| {
        let symbol = cell(record, symbol, "symbol", row_num)?;
        if symbol.is_empty() {
            return Ok(None);
        }
        let priced_on = parse_csv_date(cell(record, date, "date", row_num)?)?;
        let close = parse_csv_decimal(cell(record, close, "close", row_num)?)?;
        Ok(Some((symbol.to_string(), priced_on, close)))
    });
    for (symbol, priced_on, close) in rows {
        if let Err(e) = market.insert(&symbol, priced_on, close) {
            warn!("Skipping price: {}", e);
        }
    }
    info!("Loaded prices for {} symbols", market.symbol_count());
    Ok(market)
}

/// `(joint_id, member_owner_id)` pairs.
pub fn parse_joint_mapping<R: Read>(reader: R) -> Result<Vec<(String, String)>> {
    let (headers, records) = read_table(reader, "joint mapping")?;
    let joint = require_column(&headers, &JOINT, "joint mapping")?;
    let member = require_column(&headers, &OWNER, "joint mapping")?;

    Ok(parse_rows(&records, "joint mapping", |record, row_num| {
        let joint_id = cell(record, joint, "joint_id", row_num)?;
        let member_id = cell(record, member, "owner_id", row_num)?;
        if joint_id.is_empty() || member_id.is_empty() {
            return Ok(None);
        }
        Ok(Some((joint_id.to_string(), member_id.to_string())))
    }))
}

pub(crate) fn parse_csv_date(date_str: &str) -> Result<NaiveDate> {
    let trimmed = date_str.trim();
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(PerftrackError::ParseError(format!("could not parse date '{}'", date_str)).into())
}

pub(crate) fn parse_csv_decimal(text: &str) -> Result<Decimal> {
    let cleaned: String = text
        .replace('₹', "")
        .replace("Rs.", "")
        .replace("INR", "")
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    // Accounting style negatives: (1,000.00)
    let cleaned = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => format!("-{}", inner),
        None => cleaned,
    };

    Decimal::from_str(&cleaned)
        .map_err(|_| PerftrackError::ParseError(format!("could not parse amount '{}'", text)).into())
}
