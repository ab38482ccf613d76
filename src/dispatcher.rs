//! Command dispatcher routing parsed clap commands to their handlers.

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use perftrack::allocation::{AllocationPolicy, BracketBasketPolicy};
use perftrack::batch;
use perftrack::config::Config;
use perftrack::engine::{self, OwnerInput};
use perftrack::error::PerftrackError;
use perftrack::{importers, joint, pricing};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::cli::formatters;
use crate::cli::Commands;

/// Route a parsed command to its handler
pub fn dispatch_command(command: Commands, config: &Config, json_output: bool) -> Result<()> {
    match command {
        Commands::Performance {
            cashflows,
            valuations,
            owner,
            periods,
        } => dispatch_performance(
            &cashflows,
            &valuations,
            owner.as_deref(),
            periods,
            config,
            json_output,
        ),
        Commands::Batch {
            cashflows,
            valuations,
            joint,
        } => dispatch_batch(&cashflows, &valuations, joint.as_deref(), config, json_output),
        Commands::Value {
            holdings,
            prices,
            max_staleness_days,
            csv,
        } => dispatch_value(&holdings, &prices, max_staleness_days, csv, json_output),
        Commands::Allocate { amount, brackets } => dispatch_allocate(amount, &brackets, json_output),
    }
}

fn load_owners(cashflows: &Path, valuations: &Path) -> Result<Vec<OwnerInput>> {
    let flows = importers::read_cashflows(cashflows)?;
    let values = importers::read_valuations(valuations)?;
    Ok(importers::group_by_owner(flows, values))
}

/// Pick the owner to report on: the requested one, or the only one present.
fn select_owner(owners: Vec<OwnerInput>, requested: Option<&str>) -> Result<OwnerInput> {
    match requested {
        Some(id) => owners
            .into_iter()
            .find(|owner| owner.owner_id == id)
            .ok_or_else(|| {
                PerftrackError::ValidationError(format!("owner '{}' not found in the input files", id))
                    .into()
            }),
        None => {
            let count = owners.len();
            if count > 1 {
                return Err(PerftrackError::ValidationError(format!(
                    "input holds {} owners; choose one with --owner or use `batch`",
                    count
                ))
                .into());
            }
            owners
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("No owners found in the input files"))
        }
    }
}

fn dispatch_performance(
    cashflows: &Path,
    valuations: &Path,
    owner: Option<&str>,
    show_periods: bool,
    config: &Config,
    json_output: bool,
) -> Result<()> {
    let owners = load_owners(cashflows, valuations)?;
    let selected = select_owner(owners, owner)?;

    let result = engine::evaluate_owner(&selected, &config.engine)
        .with_context(|| format!("Cannot compute performance for {}", selected.owner_id))?;

    if json_output {
        #[derive(Serialize)]
        struct Payload<'a> {
            owner_id: &'a str,
            #[serde(flatten)]
            result: &'a engine::PerformanceResult,
        }
        println!(
            "{}",
            formatters::format_json(&Payload {
                owner_id: &selected.owner_id,
                result: &result,
            })
        );
    } else {
        print!(
            "{}",
            formatters::format_performance_table(&selected.owner_id, &result, show_periods)
        );
    }
    Ok(())
}

fn dispatch_batch(
    cashflows: &Path,
    valuations: &Path,
    joint_mapping: Option<&Path>,
    config: &Config,
    json_output: bool,
) -> Result<()> {
    let mut owners = load_owners(cashflows, valuations)?;
    if let Some(mapping_path) = joint_mapping {
        let mapping = importers::read_joint_mapping(mapping_path)?;
        let joints = joint::build_joint_inputs(&mapping, &owners);
        info!("Adding {} joint accounts", joints.len());
        owners.extend(joints);
    }

    if owners.is_empty() {
        if json_output {
            println!("{}", formatters::format_json(&serde_json::json!({ "reports": [] })));
        } else {
            print!("{}", formatters::format_empty_input());
        }
        return Ok(());
    }

    let reports = batch::run_batch(&owners, &config.engine);
    let summary = batch::summarize(&reports);

    if json_output {
        let payload = serde_json::json!({
            "summary": summary,
            "reports": reports,
        });
        println!("{}", formatters::format_json(&payload));
    } else {
        print!("{}", formatters::format_batch_table(&reports, &summary));
    }
    Ok(())
}

fn dispatch_value(
    holdings: &Path,
    prices: &Path,
    max_staleness_days: Option<i64>,
    csv_output: bool,
    json_output: bool,
) -> Result<()> {
    let snapshots = importers::read_holdings(holdings)?;
    let mut market = importers::read_prices(prices)?;
    if let Some(days) = max_staleness_days {
        market = market.with_max_staleness(days);
    }

    let valuations =
        pricing::value_holdings(&snapshots, &market).context("Failed to value holdings")?;

    if json_output {
        println!("{}", formatters::format_json(&valuations));
    } else if csv_output {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        writer.write_record(["date", "value"])?;
        for valuation in &valuations {
            writer.write_record([
                valuation.snapshot_date.to_string(),
                valuation.portfolio_value.to_string(),
            ])?;
        }
        writer.flush()?;
    } else {
        println!(
            "\n{} Valued {} holdings snapshots\n",
            "✓".green().bold(),
            valuations.len()
        );
        println!("{}", formatters::format_valuations_table(&valuations));
    }
    Ok(())
}

fn dispatch_allocate(amount: Decimal, brackets: &Path, json_output: bool) -> Result<()> {
    let policy = BracketBasketPolicy::load(brackets)?;
    let allocation = policy
        .allocate(amount)
        .with_context(|| format!("Cannot allocate {}", amount))?;

    if json_output {
        println!("{}", formatters::format_json(&allocation));
    } else {
        print!("{}", formatters::format_allocation_table(&allocation));
    }
    Ok(())
}
