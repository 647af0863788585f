//! Aggregate an observation log into the wide indicator table
//!
//! Prints the first rows, the absent-cell count per indicator and the
//! range of every rate indicator; optionally writes the table as CSV.
//!
//! Usage:
//!   ./target/release/calculate_indicators --input data/call_center_data.csv [--output data/indicators.csv]

use anyhow::{Context, Result};
use call_center_bi::config::AggregationArgs;
use call_center_bi::models::Dimension;
use call_center_bi::{dataset, IndicatorKind};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "calculate_indicators")]
#[command(about = "Aggregate call-center observations into per-cell indicators")]
struct Args {
    /// Observation log (CSV)
    #[arg(long, default_value = "data/call_center_data.csv")]
    input: PathBuf,

    /// Write the indicator table to this CSV path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Rows to preview
    #[arg(long, default_value = "5")]
    head: usize,

    #[command(flatten)]
    aggregation: AggregationArgs,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let aggregator = args.aggregation.aggregator()?;

    let observations = dataset::read_observations(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let table = aggregator.aggregate(&observations)?;
    info!("Indicator calculation complete: {} rows", table.len());

    println!("\nFirst {} rows of the indicator table:", args.head.min(table.len()));
    let key_width = 14;
    print!("  {:<12}", "date");
    for d in &Dimension::ALL[1..] {
        print!(" {:<width$}", d.column(), width = key_width);
    }
    for name in &table.indicators {
        print!(" {:>22}", name);
    }
    println!();
    for row in table.rows.iter().take(args.head) {
        print!("  {:<12}", row.key.get(Dimension::Date));
        for d in &Dimension::ALL[1..] {
            print!(" {:<width$}", truncate(&row.key.get(*d), key_width), width = key_width);
        }
        for name in &table.indicators {
            match row.value(name) {
                Some(v) => print!(" {:>22.2}", v),
                None => print!(" {:>22}", "-"),
            }
        }
        println!();
    }

    println!("\nAbsent cells per indicator:");
    for name in &table.indicators {
        println!("  {:<24} {:>8}", name, table.absent_count(name));
    }

    for def in aggregator.registry().iter().filter(|d| d.kind == IndicatorKind::Rate) {
        let values: Vec<f64> = table.rows.iter().filter_map(|r| r.value(&def.name)).collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if values.is_empty() {
            println!("\n{} range: no values", def.name);
        } else {
            println!("\n{} range: min {:.2}, max {:.2}", def.name, min, max);
        }
    }

    if let Some(output) = &args.output {
        dataset::write_table(output, &table)?;
        println!("\nIndicator table written to {}", output.display());
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
