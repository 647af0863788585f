//! REST API server for the call-center report
//!
//! Usage:
//!   ./target/release/api_server [--port PORT] [--data PATH] [--indicators FILE]
//!
//! REST endpoints (all report routes accept ?start=&end=&business_line=&state=):
//!   GET  /api/v1/health                   - Health check
//!   GET  /api/v1/indicators               - Registered indicators
//!   GET  /api/v1/filters                  - Filter options
//!   GET  /api/v1/table?limit=N            - Indicator rows
//!   GET  /api/v1/dashboard?top=N          - Dashboard panels
//!   GET  /api/v1/breakdown/:dim?indicator=X&op=sum|mean
//!   GET  /api/v1/top/:dim?indicator=X&limit=N
//!   POST /api/v1/cache/invalidate         - Drop the memoized table

use anyhow::Result;
use call_center_bi::api;
use call_center_bi::config::ServerConfig;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "api_server")]
#[command(about = "Serve call-center indicators over HTTP")]
struct Args {
    #[command(flatten)]
    server: ServerConfig,
}

fn print_banner(config: &ServerConfig) {
    println!("============================================================");
    println!("            CALL CENTER BI - REPORT API SERVER");
    println!("============================================================");
    println!();
    println!("  Listen:   {}:{}", config.host, config.port);
    println!("  Data:     {}", config.data.display());
    println!("  REST:     http://localhost:{}/api/v1/", config.port);
    println!();
    println!("REST Endpoints:");
    println!("  GET  /api/v1/health              Health check");
    println!("  GET  /api/v1/indicators          Registered indicators");
    println!("  GET  /api/v1/filters             Filter options");
    println!("  GET  /api/v1/table               Indicator rows");
    println!("  GET  /api/v1/dashboard           Dashboard panels");
    println!("  GET  /api/v1/breakdown/:dim      Per-group rollup");
    println!("  GET  /api/v1/top/:dim            Top-N ranking");
    println!("  POST /api/v1/cache/invalidate    Reload data");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();
    print_banner(&args.server);

    api::serve(&args.server).await?;
    Ok(())
}
