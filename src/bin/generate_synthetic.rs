//! Synthetic daily ridership generator
//!
//! Writes a CSV with the published MTA headers: a pre-pandemic plateau, a
//! collapse on the day the pandemic was declared, then a recovery curve that
//! approaches each service's current level. Weekends run lighter and every
//! day gets a little multiplicative noise.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --start <DATE>    First day (default: 2019-01-01)
//!   --end <DATE>      Last day (default: 2024-10-31)
//!   --noise <F>       Daily noise as a fraction (default: 0.05)
//!   --seed <N>        Random seed for reproducibility (optional)
//!   --output <PATH>   Output CSV path (default: data/MTA_Daily_Ridership.csv)

use anyhow::{ensure, Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use clap::Parser;
use csv::WriterBuilder;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::path::PathBuf;
use transit_recovery::config::DEFAULT_DATA_PATH;
use transit_recovery::models::{Service, SERVICE_COUNT};

/// Synthetic data generator for the daily ridership file
#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate a synthetic MTA daily ridership file")]
struct Args {
    /// First day to generate
    #[arg(long, default_value = "2019-01-01")]
    start: NaiveDate,

    /// Last day to generate
    #[arg(long, default_value = "2024-10-31")]
    end: NaiveDate,

    /// Daily multiplicative noise (0.0 - 1.0)
    #[arg(long, default_value = "0.05")]
    noise: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    output: PathBuf,
}

/// Shape of one service's ridership over time
struct Profile {
    /// Typical weekday before the pandemic
    weekday_level: f64,
    /// Weekend day as a share of a weekday
    weekend_share: f64,
    /// Share of the pre-pandemic level left at the bottom of lockdown
    trough: f64,
    /// Share of the pre-pandemic level reached by the end of 2024
    recovered: f64,
}

const PROFILES: [Profile; SERVICE_COUNT] = [
    Profile { weekday_level: 5_500_000.0, weekend_share: 0.55, trough: 0.08, recovered: 0.84 },
    Profile { weekday_level: 2_200_000.0, weekend_share: 0.60, trough: 0.20, recovered: 0.73 },
    Profile { weekday_level: 310_000.0, weekend_share: 0.40, trough: 0.03, recovered: 0.90 },
    Profile { weekday_level: 280_000.0, weekend_share: 0.35, trough: 0.05, recovered: 1.35 },
    Profile { weekday_level: 30_000.0, weekend_share: 0.45, trough: 0.25, recovered: 1.25 },
    Profile { weekday_level: 900_000.0, weekend_share: 0.90, trough: 0.45, recovered: 1.09 },
    Profile { weekday_level: 16_000.0, weekend_share: 0.30, trough: 0.06, recovered: 0.65 },
];

fn pandemic_declared() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 11).unwrap_or(NaiveDate::MIN)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Share of the pre-pandemic level on `date`, before weekly and random variation
fn recovery_share(profile: &Profile, date: NaiveDate) -> f64 {
    let declared = pandemic_declared();
    if date < declared {
        return 1.0;
    }
    // Roughly 4.5 years from trough to the current level
    let years = (date - declared).num_days() as f64 / 365.25;
    let progress = (1.0 - (-years / 1.5).exp()) / (1.0 - (-3.0f64).exp());
    profile.trough + (profile.recovered - profile.trough) * progress.min(1.2)
}

/// Count and percentage-of-comparable-day for one service on one day
fn sample_day(profile: &Profile, date: NaiveDate, noise: f64, rng: &mut impl Rng) -> (u64, u64) {
    let base = if is_weekend(date) {
        profile.weekday_level * profile.weekend_share
    } else {
        profile.weekday_level
    };
    let share = recovery_share(profile, date);
    let jitter = if noise > 0.0 { 1.0 + rng.gen_range(-noise..=noise) } else { 1.0 };
    let count = (base * share * jitter).max(0.0).round();
    let pct = (share * jitter * 100.0).max(0.0).round();
    (count as u64, pct as u64)
}

fn header() -> Vec<String> {
    let mut columns = vec!["Date".to_string()];
    for service in Service::ALL {
        columns.push(service.raw_count_header());
        columns.push(service.raw_pct_header());
    }
    columns
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.start <= args.end, "--start must not be after --end");
    ensure!((0.0..1.0).contains(&args.noise), "--noise must be in [0, 1)");

    println!("🔧 Synthetic Ridership Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Output:           {}", args.output.display());
    println!("Date range:       {} to {}", args.start, args.end);
    println!("Daily noise:      ±{:.1}%", args.noise * 100.0);
    if let Some(seed) = args.seed {
        println!("Random seed:      {}", seed);
    }
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    writer.write_record(header())?;

    let mut days = 0usize;
    for date in args.start.iter_days().take_while(|d| *d <= args.end) {
        let mut row = vec![date.format("%m/%d/%Y").to_string()];
        for profile in &PROFILES {
            let (count, pct) = sample_day(profile, date, args.noise, &mut rng);
            row.push(count.to_string());
            row.push(pct.to_string());
        }
        writer.write_record(&row)?;
        days += 1;
    }

    writer.flush()?;

    println!("✅ Generation complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Days written:      {:>8}", days);
    println!("Output file:       {}", args.output.display());

    Ok(())
}
