//! Recovery Report - How far has each service come back?
//! Headline KPIs, the pre/post comparison table, service correlation and
//! long-run trends, printed to the terminal
//!
//! Run: ./target/release/recovery_report [section] [--data PATH] [--granularity G]
//! Sections: all, kpi, comparison, correlation, trend

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use transit_recovery::config::{Calendar, DEFAULT_DATA_PATH};
use transit_recovery::format::{percent, with_commas};
use transit_recovery::loader::load_csv;
use transit_recovery::metrics::comparison::{comparison_table, COMPARISON_HEADERS};
use transit_recovery::metrics::correlation::{correlation_matrix, display_value};
use transit_recovery::metrics::kpi::create_kpis;
use transit_recovery::metrics::recovery::ranked_recoveries;
use transit_recovery::metrics::resample::{resample, to_thousands, Granularity};
use transit_recovery::metrics::trend::trend_lines;
use transit_recovery::models::{RidershipTable, Service};

#[derive(Parser, Debug)]
#[command(name = "recovery_report")]
#[command(about = "Print the ridership recovery report")]
struct Args {
    /// Section to print: all, kpi, comparison, correlation, trend
    #[arg(default_value = "all")]
    section: String,

    /// Daily ridership CSV
    #[arg(long, env = "RIDERSHIP_CSV", default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Period used for the correlation section
    #[arg(long, default_value = "Month")]
    granularity: Granularity,
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

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .init();

    let args = Args::parse();
    let table = load_csv(&args.data).with_context(|| format!("Failed to load {}", args.data.display()))?;
    let calendar = Calendar::default();

    println!("\n{}", "█".repeat(80));
    println!("{}  RIDERSHIP RECOVERY - How Far Has Each Service Come Back?  {}", "█".repeat(10), "█".repeat(10));
    println!("{}\n", "█".repeat(80));

    match args.section.as_str() {
        "all" => {
            run_kpi_section(&table, &calendar)?;
            run_comparison_section(&table, &calendar);
            run_correlation_section(&table, args.granularity);
            run_trend_section(&table);
        }
        "kpi" => run_kpi_section(&table, &calendar)?,
        "comparison" => run_comparison_section(&table, &calendar),
        "correlation" => run_correlation_section(&table, args.granularity),
        "trend" => run_trend_section(&table),
        other => {
            println!("Unknown section: {}", other);
            println!("Available: all, kpi, comparison, correlation, trend");
        }
    }

    println!("\n{}", "█".repeat(80));
    Ok(())
}

fn run_kpi_section(table: &RidershipTable, calendar: &Calendar) -> Result<()> {
    print_section_header("1. HEADLINE KPIs");

    let kpis = create_kpis(table, calendar).context("Failed to compute KPIs")?;
    let display = kpis.display();

    println!("  {:<32} {} on {}", "Highest Ridership:", display.total_ridership, display.highest_ridership_day);
    println!("  {:<32} {}", "Overall Ridership Recovery:", display.total_recovery);
    println!("  {:<32} {} ({})", "Top Recovered Service:", display.top_service, display.recovery_percentage);
    println!("  {:<32} {}", "Year-over-Year Growth:", display.yoy_growth);
    println!("  {:<32} {}", "Avg Lockdown Ridership:", display.avg_lockdown_ridership);
    println!("  {:<32} {}", "Avg Post-Lockdown Ridership:", display.avg_post_lockdown_ridership);

    print_subsection("Recovery by Service (current window vs pre-pandemic)");
    for (rank, r) in ranked_recoveries(table, &calendar.baseline(), &calendar.current)
        .iter()
        .enumerate()
    {
        let bar = "▓".repeat((r.recovery / 5.0).clamp(0.0, 40.0) as usize);
        println!("  {}. {:<24} {:>8}  {}", rank + 1, r.service.name(), percent(r.recovery), bar);
    }
    Ok(())
}

fn run_comparison_section(table: &RidershipTable, calendar: &Calendar) {
    print_section_header("2. PRE-PANDEMIC VS POST-PANDEMIC");

    println!(
        "  {:<22} {:>14} {:>14} {:>14} {:>12} {:>12}",
        "Service", "Pre-Pandemic", "Oct 2021", "Current", "% (Post)", "% (Current)"
    );
    println!("  {}", "─".repeat(94));
    for row in comparison_table(table, calendar) {
        let [service, pre, post, current, post_pct, current_pct] = row.as_array();
        println!(
            "  {:<22} {:>14} {:>14} {:>14} {:>12} {:>12}",
            service, pre, post, current, post_pct, current_pct
        );
    }
    println!("\n  Columns: {}", COMPARISON_HEADERS.join(" | "));
}

fn run_correlation_section(table: &RidershipTable, granularity: Granularity) {
    print_section_header(&format!("3. SERVICE CORRELATION ({})", granularity));

    let periods = resample(&to_thousands(table), granularity);
    let matrix = correlation_matrix(&periods, &Service::ALL);

    print!("  {:<22}", "");
    for service in &matrix.services {
        print!(" {:>6}", short_name(*service));
    }
    println!();
    for (i, service) in matrix.services.iter().enumerate() {
        print!("  {:<22}", service.name());
        for value in &matrix.values[i] {
            print!(" {:>6}", display_value(*value));
        }
        println!();
    }
    println!("\n  {} periods; blank cells have no variance.", periods.len());
}

fn run_trend_section(table: &RidershipTable) {
    print_section_header("4. LONG-RUN TRENDS");

    println!("  {:<22} {:>16} {:>18} {:>18}", "Service", "Slope (per day)", "Trend at start", "Trend at end");
    println!("  {}", "─".repeat(78));
    for trend in trend_lines(table, &Service::ALL) {
        let (first, last) = match (trend.points.first(), trend.points.last()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => continue,
        };
        println!(
            "  {:<22} {:>16.1} {:>18} {:>18}",
            trend.service.name(),
            trend.slope,
            with_commas(trend.value_at(first)),
            with_commas(trend.value_at(last)),
        );
    }
}

fn short_name(service: Service) -> &'static str {
    match service {
        Service::Subways => "SUB",
        Service::Buses => "BUS",
        Service::Lirr => "LIRR",
        Service::MetroNorth => "MNR",
        Service::AccessARide => "AAR",
        Service::BridgesAndTunnels => "B&T",
        Service::StatenIslandRailway => "SIR",
    }
}
