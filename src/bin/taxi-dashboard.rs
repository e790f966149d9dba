//! Command-line front end: applies one filter selection and prints the five dashboard views.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use taxi_dashboard::cache::LoadReport;
use taxi_dashboard::views::payment_type_label;
use taxi_dashboard::{Dashboard, DashboardSettings, DashboardViews, FilterSelection, OnParseError};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taxi-dashboard")]
#[command(about = "Summarise taxi trip records for a date range and payment type", long_about = None)]
struct Cli {
    /// Directory containing the trip part files (overrides TAXI_DASHBOARD_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Zone lookup CSV (overrides TAXI_DASHBOARD_ZONES)
    #[arg(short, long)]
    zones: Option<PathBuf>,

    /// First pickup date to include (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01")]
    start: NaiveDate,

    /// Last pickup date to include (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-31")]
    end: NaiveDate,

    /// Payment type code; defaults to the first code present in the date range
    #[arg(short, long)]
    payment_type: Option<i64>,

    /// Sample the trip table before filtering
    #[arg(long)]
    sample: bool,

    /// What to do with a part file that fails to parse: skip or abort
    #[arg(long)]
    on_parse_error: Option<OnParseError>,

    /// Log stage timings at info level
    #[arg(short, long)]
    verbose: bool,
}

fn print_report(report: &LoadReport) {
    println!(
        "Loaded {} trips from {} files",
        report.rows,
        report.files_read.len()
    );
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
}

fn print_views(views: &DashboardViews) {
    let options: Vec<String> = views
        .payment_options
        .iter()
        .map(|code| format!("{} ({})", code, payment_type_label(*code)))
        .collect();
    println!("\nPayment types available: {}", options.join(", "));
    match views.payment_type {
        Some(code) => println!("Payment type selected: {} ({})", code, payment_type_label(code)),
        None => println!("Payment type selected: none"),
    }
    println!("Clean trips: {}", views.total_trips);

    println!("\nTop pickup zones");
    println!("{:<40} {:>10}", "Zone", "Trip Count");
    for row in &views.top_pickup_zones {
        println!("{:<40} {:>10}", row.zone, row.trip_count);
    }

    println!("\nTrips per hour");
    for row in &views.trips_per_hour {
        println!("{:>4} {:>10}", row.hour, row.trip_count);
    }

    println!("\nDaily total fare");
    for row in &views.daily_total_fare {
        println!("{} {:>14.2}", row.date, row.total_fare);
    }

    println!("\nPayment type distribution");
    for row in &views.payment_type_distribution {
        println!("{:<14} {:>10}", row.label(), row.trip_count);
    }

    println!(
        "\nDistance vs fare sample ({} points)",
        views.distance_fare_sample.len()
    );
    for point in &views.distance_fare_sample {
        println!("{:>8.2} mi {:>10.2}", point.trip_distance, point.fare_amount);
    }
}

async fn run(cli: Cli) -> taxi_dashboard::DashboardResult<()> {
    let mut settings = DashboardSettings::from_env()?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(zones) = cli.zones {
        settings.zone_lookup_path = zones;
    }
    if let Some(policy) = cli.on_parse_error {
        settings.on_parse_error = policy;
    }
    settings.verbose = cli.verbose;

    let mut selection = FilterSelection::new(cli.start, cli.end);
    if let Some(code) = cli.payment_type {
        selection = selection.with_payment_type(code);
    }
    if cli.sample {
        selection = selection.with_sample_fraction(settings.sample_fraction);
    }

    let mut dashboard = Dashboard::new(settings)?;
    let views = dashboard.refresh(&selection).await?;
    print_report(dashboard.trips().await?.report());
    print_views(&views);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
