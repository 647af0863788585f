//! Synthetic data generator for the call-center observation log
//!
//! Each base row becomes three observations (attended calls, handling time,
//! satisfaction) sharing one random dimension key.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --rows <N>        Base rows to generate (default: 5000)
//!   --start <DATE>    First date, inclusive (default: 2024-01-01)
//!   --end <DATE>      Last date, exclusive (default: 2024-07-28)
//!   --seed <N>        Random seed for reproducibility (optional)
//!   --output <PATH>   Output CSV path (default: data/call_center_data.csv)

use anyhow::Result;
use call_center_bi::models::parse_date;
use call_center_bi::synthetic::{self, SyntheticConfig};
use call_center_bi::{dataset, indicators};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Synthetic data generator for call-center indicators
#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate a synthetic call-center observation log")]
struct Args {
    /// Base rows; each yields one observation per indicator
    #[arg(long, default_value = "5000")]
    rows: usize,

    /// First date (inclusive)
    #[arg(long, default_value = "2024-01-01", value_parser = parse_arg_date)]
    start: NaiveDate,

    /// Last date (exclusive)
    #[arg(long, default_value = "2024-07-28", value_parser = parse_arg_date)]
    end: NaiveDate,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = "data/call_center_data.csv")]
    output: PathBuf,
}

fn parse_arg_date(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    println!("🔧 Synthetic Data Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Output:           {}", args.output.display());
    println!("Base rows:        {}", args.rows);
    println!("Date range:       {} to {} (exclusive)", args.start, args.end);
    if let Some(seed) = args.seed {
        println!("Random seed:      {}", seed);
    }
    println!();

    let config = SyntheticConfig {
        rows: args.rows,
        start: args.start,
        end: args.end,
        seed: args.seed,
    };

    println!("🏭 Generating observations...");
    let observations = synthetic::generate(&config)?;
    dataset::write_observations(&args.output, &observations)?;

    println!("\n✅ Generation complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for name in [
        indicators::ATTENDED_CALLS,
        indicators::AVERAGE_HANDLING_TIME,
        indicators::SATISFACTION_SCORE,
    ] {
        let count = observations.iter().filter(|o| o.indicator == name).count();
        println!("{:<24} {:>8}", name, count);
    }
    println!("{:<24} {:>8}", "Total written", observations.len());
    println!("Output file:             {}", args.output.display());

    Ok(())
}
