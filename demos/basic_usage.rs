// Run `cargo run --example basic_usage` to execute this example

use chrono::NaiveDate;
use std::error::Error;
use taxi_dashboard::{Dashboard, DashboardSettings, FilterSelection};
mod shared;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Write a small synthetic dataset
    let dir = shared::demo_dir();
    let zones_path = shared::write_demo_data(&dir)?;

    let mut dashboard = Dashboard::new(DashboardSettings::new(&dir, zones_path))?;

    // First week of January, card payments
    let selection = FilterSelection::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?,
        NaiveDate::from_ymd_opt(2024, 1, 7).ok_or("bad date")?,
    )
    .with_payment_type(1);
    let views = dashboard.refresh(&selection).await?;

    println!("Clean trips: {}", views.total_trips);
    for row in &views.top_pickup_zones {
        println!("{:<30} {}", row.zone, row.trip_count);
    }

    // Show the first 5 enriched rows
    let enriched = dashboard.enriched(&selection).await?;
    enriched.frame.limit(0, Some(5))?.show().await?;

    Ok(())
}
