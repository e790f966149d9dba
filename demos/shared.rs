#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// Directory the demo writes its synthetic trip parts into
pub fn demo_dir() -> PathBuf {
    std::env::temp_dir().join("taxi-dashboard-demo")
}

pub const TRIP_HEADER: &str = "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,\
trip_distance,RatecodeID,store_and_fwd_flag,PULocationID,DOLocationID,payment_type,fare_amount";

/// Writes a small zone lookup and two trip parts covering the first week of January 2024.
pub fn write_demo_data(dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let zones = "\"LocationID\",\"Borough\",\"Zone\",\"service_zone\"\n\
1,\"EWR\",\"Newark Airport\",\"EWR\"\n\
132,\"Queens\",\"JFK Airport\",\"Airports\"\n\
161,\"Manhattan\",\"Midtown Center\",\"Yellow Zone\"\n\
236,\"Manhattan\",\"Upper East Side North\",\"Yellow Zone\"\n\
237,\"Manhattan\",\"Upper East Side South\",\"Yellow Zone\"\n";
    let zones_path = dir.join("taxi_zone_lookup.csv");
    fs::write(&zones_path, zones)?;

    let locations = [161, 236, 237, 132, 1, 264];
    for part in 1..=2 {
        let mut body = String::from(TRIP_HEADER);
        body.push('\n');
        for i in 0..200u32 {
            let day = 1 + (i + part * 3) % 7;
            let hour = (i * 7 + part) % 24;
            let minute = i % 60;
            let distance = 0.5 + (i % 17) as f64 * 0.9;
            let fare = 3.0 + distance * 2.8;
            let payment = if i % 5 == 0 { 2 } else { 1 };
            let pickup = locations[(i as usize + part as usize) % locations.len()];
            let dropoff = locations[(i as usize * 3) % locations.len()];
            body.push_str(&format!(
                "2,2024-01-{day:02} {hour:02}:{minute:02}:00,2024-01-{day:02} {hour:02}:{end:02}:30,{passengers},{distance:.2},1,N,{pickup},{dropoff},{payment},{fare:.2}\n",
                end = (minute + 12).min(59),
                passengers = 1 + i % 3,
            ));
        }
        fs::write(dir.join(format!("yellow_tripdata_part_{}.csv", part)), body)?;
    }
    Ok(zones_path)
}
