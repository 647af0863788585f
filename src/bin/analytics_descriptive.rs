//! Descriptive Analytics - How is the call center doing?
//! Headline KPIs, daily volume and per-operation, per-state and per-agent rollups
//!
//! Run: ./target/release/analytics_descriptive [section] [--start D] [--end D] [--business-line X] [--state Y]
//! Sections: all, kpi, daily, operations, states, agents

use anyhow::Result;
use call_center_bi::cache::load_table;
use call_center_bi::config::AggregationArgs;
use call_center_bi::indicators::{ATTENDED_CALLS, AVERAGE_HANDLING_TIME, SATISFACTION_SCORE};
use call_center_bi::models::parse_date;
use call_center_bi::report::{DashboardReport, GroupValue, ReportFilter};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "analytics_descriptive")]
#[command(about = "Terminal report over call-center indicators")]
struct Args {
    /// all, kpi, daily, operations, states, agents
    #[arg(default_value = "all")]
    section: String,

    /// Observation log (CSV)
    #[arg(long, default_value = "data/call_center_data.csv")]
    input: PathBuf,

    #[arg(long, value_parser = parse_arg_date)]
    start: Option<NaiveDate>,

    #[arg(long, value_parser = parse_arg_date)]
    end: Option<NaiveDate>,

    #[arg(long)]
    business_line: Option<String>,

    #[arg(long)]
    state: Option<String>,

    /// Agents in the ranking
    #[arg(long, default_value = "10")]
    top: usize,

    #[command(flatten)]
    aggregation: AggregationArgs,
}

fn parse_arg_date(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(80));
    println!("  {}", title);
    println!("{}\n", "═".repeat(80));
}

fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(70));
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let table = load_table(&args.input, &args.aggregation.aggregator()?)?;
    let filter = ReportFilter {
        start: args.start,
        end: args.end,
        business_line: args.business_line.clone(),
        state: args.state.clone(),
    };
    let report = DashboardReport::build(&table, &filter, args.top);

    println!("\n{}", "█".repeat(80));
    println!("{}  DESCRIPTIVE ANALYTICS - Call Center  {}", "█".repeat(19), "█".repeat(20));
    println!("{}\n", "█".repeat(80));

    match args.section.as_str() {
        "all" => {
            run_kpi_section(&report);
            run_daily_section(&report);
            run_operations_section(&report);
            run_states_section(&report);
            run_agents_section(&report);
        }
        "kpi" => run_kpi_section(&report),
        "daily" => run_daily_section(&report),
        "operations" => run_operations_section(&report),
        "states" => run_states_section(&report),
        "agents" => run_agents_section(&report),
        _ => {
            println!("Unknown section: {}", args.section);
            println!("Available: all, kpi, daily, operations, states, agents");
        }
    }

    println!("\n{}", "█".repeat(80));
    Ok(())
}

fn run_kpi_section(report: &DashboardReport) {
    print_section_header("1. HEADLINE KPIs");

    let h = &report.headline;
    println!("  Indicator rows:         {:>12}", report.rows);
    println!("  Attended Calls:         {:>12.0}", h.total_attended_calls);
    println!("  Avg Handling Time (s):  {:>12}", fmt_opt(h.mean_handling_time, 1));
    println!("  Avg Satisfaction:       {:>12}", fmt_opt(h.mean_satisfaction, 2));
    println!("  Agents:                 {:>12}", h.agents);
    if !report.missing_indicators.is_empty() {
        println!("\n  ⚠ Not in the indicator registry: {}", report.missing_indicators.join(", "));
    }
}

fn run_daily_section(report: &DashboardReport) {
    print_section_header("2. DAILY VOLUME");
    print_subsection("Attended Calls per Day");

    let max = report
        .daily_calls
        .iter()
        .filter_map(|g| g.value)
        .fold(1.0_f64, f64::max);

    println!("  {:12} {:>10}  {}", "Date", "Calls", "Volume");
    println!("  {}", "─".repeat(64));
    for day in &report.daily_calls {
        let calls = day.value.unwrap_or(0.0);
        let bar_len = ((calls / max) * 40.0) as usize;
        println!("  {:12} {:>10.0}  {}", day.group, calls, "▓".repeat(bar_len));
    }
}

fn run_operations_section(report: &DashboardReport) {
    print_section_header("3. BUSINESS LINES");

    print_subsection("Average Handling Time by Business Line");
    print_group_values(&report.handling_time_by_business_line, "Business Line", "Avg AHT (s)", 1);

    print_subsection("Call Distribution by Business Line");
    println!("  {:20} {:>12} {:>12} {:>20}", "Business Line", "Calls", "% of Total", "Share");
    println!("  {}", "─".repeat(66));
    for row in &report.calls_by_business_line {
        let pct = row.share * 100.0;
        let bar_len = (pct / 2.0).min(30.0) as usize;
        println!("  {:20} {:>12.0} {:>11.1}% {}", row.group, row.value, pct, "█".repeat(bar_len));
    }
}

fn run_states_section(report: &DashboardReport) {
    print_section_header("4. STATES");
    print_subsection("Customer Satisfaction by State");
    print_group_values(&report.satisfaction_by_state, "State", "Avg CSAT", 2);
}

fn run_agents_section(report: &DashboardReport) {
    print_section_header("5. AGENTS");
    print_subsection(&format!("Top {} Agents by Attended Calls", report.top_agents.len()));

    println!("  {:16} {:>12} {:>14} {:>12}", "Agent", "Calls", "Avg AHT (s)", "Avg CSAT");
    println!("  {}", "─".repeat(58));
    for agent in &report.top_agents {
        let get = |name: &str| agent.values.get(name).copied().flatten();
        println!(
            "  {:16} {:>12} {:>14} {:>12}",
            agent.group,
            fmt_opt(get(ATTENDED_CALLS), 0),
            fmt_opt(get(AVERAGE_HANDLING_TIME), 2),
            fmt_opt(get(SATISFACTION_SCORE), 2)
        );
    }
}

fn print_group_values(groups: &[GroupValue], label: &str, value_label: &str, precision: usize) {
    println!("  {:20} {:>12}", label, value_label);
    println!("  {}", "─".repeat(34));
    for g in groups {
        println!("  {:20} {:>12}", g.group, fmt_opt(g.value, precision));
    }
}
