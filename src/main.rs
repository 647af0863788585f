//! Launcher: generates a synthetic dataset when none exists, then serves the report API.

use anyhow::Result;
use call_center_bi::config::ServerConfig;
use call_center_bi::synthetic::{self, SyntheticConfig};
use call_center_bi::{api, dataset};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "call_center_bi")]
#[command(about = "Call-center BI: prepare data and serve the interactive report")]
struct Args {
    #[command(flatten)]
    server: ServerConfig,

    /// Base rows to generate when the data file is missing
    #[arg(long, default_value = "5000")]
    rows: usize,

    /// Seed for the generated dataset
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    println!("📞 Call Center BI");
    println!("{}", "=".repeat(40));

    if args.server.data.exists() {
        info!("Found data at {:?}", args.server.data);
    } else {
        info!("No data at {:?}; generating synthetic observations", args.server.data);
        let config = SyntheticConfig {
            rows: args.rows,
            seed: args.seed,
            ..SyntheticConfig::default()
        };
        let observations = synthetic::generate(&config)?;
        dataset::write_observations(&args.server.data, &observations)?;
    }

    println!("📱 Open: http://localhost:{}/api/v1/dashboard", args.server.port);
    println!("🛑 Press Ctrl+C to stop");
    println!("{}", "-".repeat(40));

    tokio::select! {
        result = api::serve(&args.server) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
