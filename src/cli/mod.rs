use clap::{ArgAction, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "perftrack")]
#[command(
    version,
    about = "Time-weighted returns and fiscal-year CAGR for advisory accounts"
)]
#[command(
    long_about = "Compute since-inception TWRR, current fiscal-year TWRR and CAGR per account owner from cash-flow and valuation exports, with joint-account aggregation, holdings valuation and bracket/basket allocation."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Config file (defaults to <config dir>/perftrack/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Performance of one owner: TWRR, current fiscal-year TWRR and CAGR
    Performance {
        /// Cash flow CSV (date, amount[, tag][, owner_id])
        #[arg(long)]
        cashflows: PathBuf,

        /// Valuation CSV (date, value[, owner_id])
        #[arg(long)]
        valuations: PathBuf,

        /// Owner to evaluate when the files hold several
        #[arg(short, long)]
        owner: Option<String>,

        /// Also show every sub-period
        #[arg(short, long)]
        periods: bool,
    },

    /// Evaluate every owner in the files, in parallel
    Batch {
        /// Cash flow CSV with an owner_id column
        #[arg(long)]
        cashflows: PathBuf,

        /// Valuation CSV with an owner_id column
        #[arg(long)]
        valuations: PathBuf,

        /// Joint account mapping CSV (joint_id, owner_id)
        #[arg(long)]
        joint: Option<PathBuf>,
    },

    /// Value dated holdings with closing prices
    Value {
        /// Holdings CSV (date, symbol, quantity; symbol CASH for cash)
        #[arg(long)]
        holdings: PathBuf,

        /// Price CSV (date, symbol, close)
        #[arg(long)]
        prices: PathBuf,

        /// Ignore prices older than this many days
        #[arg(long)]
        max_staleness_days: Option<i64>,

        /// Print valuations as CSV (date,value), ready for `performance --valuations`
        #[arg(long)]
        csv: bool,
    },

    /// Split an amount across baskets by bracket
    Allocate {
        /// Amount to allocate
        #[arg(short, long, allow_negative_numbers = true)]
        amount: Decimal,

        /// Bracket table (TOML)
        #[arg(short, long)]
        brackets: PathBuf,
    },
}
