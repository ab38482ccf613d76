//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use colored::Colorize;
use perftrack::allocation::Allocation;
use perftrack::batch::{BatchSummary, OwnerOutcome, OwnerReport};
use perftrack::engine::{PerformanceResult, ValuationSnapshot};
use perftrack::error::PerformanceWarning;
use perftrack::utils::{format_currency, format_percent};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

/// Pretty JSON for any report.
pub fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

fn colored_return(value: Decimal) -> String {
    let text = format_percent(value);
    if value >= Decimal::ZERO {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

/// Headline metrics, the fiscal-year table and optionally the sub-periods.
pub fn format_performance_table(
    owner_id: &str,
    result: &PerformanceResult,
    show_periods: bool,
) -> String {
    let mut output = format!("\n{} Performance - {}\n", "📈".cyan().bold(), owner_id.bold());

    if result.insufficient_data {
        output.push_str(&format!(
            "\n{} No valuations found; returns cannot be computed yet\n",
            "ℹ".blue().bold()
        ));
        return output;
    }

    output.push_str(&format!(
        "\n{:<24} {}",
        "Since inception TWRR:".bold(),
        colored_return(result.since_inception_twrr)
    ));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Current FY TWRR:".bold(),
        colored_return(result.current_fiscal_year_twrr)
    ));
    let cagr = if result.years_elapsed > Decimal::ONE {
        colored_return(result.cagr)
    } else {
        "N/A (under a year)".bright_black().to_string()
    };
    output.push_str(&format!("\n{:<24} {}", "CAGR:".bold(), cagr));
    output.push_str(&format!(
        "\n{:<24} {:.2}\n",
        "Years elapsed:".bold(),
        result.years_elapsed
    ));

    if !result.fiscal_years.is_empty() {
        output.push_str(&format!("\n{}\n", "Fiscal years".bold()));
        output.push_str(&format_fiscal_years_table(result));
        output.push('\n');
    }

    if show_periods && !result.sub_periods.is_empty() {
        output.push_str(&format!("\n{}\n", "Sub-periods".bold()));
        output.push_str(&format_sub_periods_table(result));
        output.push('\n');
    }

    output.push_str(&format_warnings(&result.warnings));
    output
}

pub fn format_fiscal_years_table(result: &PerformanceResult) -> String {
    #[derive(Tabled)]
    struct FiscalYearRow {
        #[tabled(rename = "Fiscal year")]
        label: String,
        #[tabled(rename = "From")]
        opening: String,
        #[tabled(rename = "To")]
        closing: String,
        #[tabled(rename = "Periods")]
        periods: usize,
        #[tabled(rename = "TWRR")]
        twrr: String,
    }

    let rows: Vec<FiscalYearRow> = result
        .fiscal_years
        .iter()
        .map(|fy| FiscalYearRow {
            label: if fy.boundary_exact {
                fy.label()
            } else {
                format!("{} *", fy.label())
            },
            opening: fy.opening_date.to_string(),
            closing: fy.closing_date.to_string(),
            periods: fy.sub_period_count,
            twrr: colored_return(fy.twrr),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(3..), Alignment::right());
    table.to_string()
}

pub fn format_sub_periods_table(result: &PerformanceResult) -> String {
    #[derive(Tabled)]
    struct SubPeriodRow {
        #[tabled(rename = "Start")]
        start_date: String,
        #[tabled(rename = "Start value")]
        start_value: String,
        #[tabled(rename = "End")]
        end_date: String,
        #[tabled(rename = "End value")]
        end_value: String,
        #[tabled(rename = "Return")]
        period_return: String,
    }

    let rows: Vec<SubPeriodRow> = result
        .sub_periods
        .iter()
        .map(|p| SubPeriodRow {
            start_date: p.start_date.to_string(),
            start_value: format_currency(p.start_value),
            end_date: p.end_date.to_string(),
            end_value: format_currency(p.end_value),
            period_return: colored_return(p.period_return),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..2), Alignment::right());
    table.modify(Columns::new(3..), Alignment::right());
    table.to_string()
}

pub fn format_warnings(warnings: &[PerformanceWarning]) -> String {
    warnings
        .iter()
        .map(|w| format!("{} {}\n", "⚠".yellow().bold(), w))
        .collect()
}

pub fn format_batch_table(reports: &[OwnerReport], summary: &BatchSummary) -> String {
    #[derive(Tabled)]
    struct OwnerRow {
        #[tabled(rename = "Owner")]
        owner_id: String,
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "TWRR")]
        twrr: String,
        #[tabled(rename = "Current FY")]
        current_fy: String,
        #[tabled(rename = "CAGR")]
        cagr: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let dash = || "-".to_string();
    let rows: Vec<OwnerRow> = reports
        .iter()
        .map(|report| match &report.outcome {
            OwnerOutcome::Computed { result } if result.insufficient_data => OwnerRow {
                owner_id: report.owner_id.clone(),
                kind: report.owner_kind.to_string(),
                twrr: dash(),
                current_fy: dash(),
                cagr: dash(),
                notes: "insufficient data".yellow().to_string(),
            },
            OwnerOutcome::Computed { result } => OwnerRow {
                owner_id: report.owner_id.clone(),
                kind: report.owner_kind.to_string(),
                twrr: colored_return(result.since_inception_twrr),
                current_fy: colored_return(result.current_fiscal_year_twrr),
                cagr: if result.years_elapsed > Decimal::ONE {
                    colored_return(result.cagr)
                } else {
                    dash()
                },
                notes: match result.warnings.len() {
                    0 => String::new(),
                    1 => "1 warning".to_string(),
                    n => format!("{} warnings", n),
                },
            },
            OwnerOutcome::Failed { error } => OwnerRow {
                owner_id: report.owner_id.clone(),
                kind: report.owner_kind.to_string(),
                twrr: dash(),
                current_fy: dash(),
                cagr: dash(),
                notes: error.red().to_string(),
            },
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(2..5), Alignment::right());

    let mut output = format!("\n{} Batch performance\n\n", "📊".cyan().bold());
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{} computed, {} insufficient data, {} failed\n",
        summary.computed.to_string().green(),
        summary.insufficient_data.to_string().yellow(),
        summary.failed.to_string().red()
    ));
    output
}

pub fn format_valuations_table(valuations: &[ValuationSnapshot]) -> String {
    #[derive(Tabled)]
    struct ValuationRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<ValuationRow> = valuations
        .iter()
        .map(|v| ValuationRow {
            date: v.snapshot_date.to_string(),
            value: format_currency(v.portfolio_value),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    table.to_string()
}

pub fn format_allocation_table(allocation: &Allocation) -> String {
    #[derive(Tabled)]
    struct BasketRow {
        #[tabled(rename = "Basket")]
        name: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Amount")]
        amount: String,
    }

    let rows: Vec<BasketRow> = allocation
        .baskets
        .iter()
        .map(|b| BasketRow {
            name: if b.leveraged {
                format!("{} {}", b.name, "⚡".yellow())
            } else {
                b.name.clone()
            },
            weight: format!("{:.2}%", b.allocation_pct),
            amount: format_currency(b.amount),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());

    format!(
        "\n{} {} in bracket {}\n\n{}\n",
        "💼".cyan().bold(),
        format_currency(allocation.amount).bold(),
        allocation.bracket_name.bold(),
        table
    )
}

/// Format empty input message
pub fn format_empty_input() -> String {
    format!(
        "{} No owners found in the input files\nCheck the CSV headers: {}\n",
        "ℹ".blue().bold(),
        "date, amount / date, value".bold()
    )
}
