#![allow(dead_code)]

use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use datafusion::prelude::{DataFrame, SessionContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taxi_dashboard::exceptions::DashboardResult;
use taxi_dashboard::ingest::normalize_trips;
use taxi_dashboard::schema::zone_schema;

pub const TRIP_HEADER: [&str; 9] = [
    "VendorID",
    "tpep_pickup_datetime",
    "tpep_dropoff_datetime",
    "passenger_count",
    "trip_distance",
    "PULocationID",
    "DOLocationID",
    "payment_type",
    "fare_amount",
];

/// One raw trip row, every field as it would appear in a CSV part.
#[derive(Debug, Clone)]
pub struct Trip {
    pub pickup: String,
    pub dropoff: String,
    pub passengers: String,
    pub distance: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub payment: String,
    pub fare: String,
}

impl Trip {
    /// A clean card trip from Midtown Center to Upper East Side North, 15 minutes long.
    pub fn on(day: u32, hour: u32) -> Self {
        Self {
            pickup: format!("2024-01-{:02} {:02}:10:00", day, hour),
            dropoff: format!("2024-01-{:02} {:02}:25:00", day, hour),
            passengers: "1".to_string(),
            distance: "2.5".to_string(),
            pickup_location: "161".to_string(),
            dropoff_location: "236".to_string(),
            payment: "1".to_string(),
            fare: "14.0".to_string(),
        }
    }

    pub fn times(mut self, pickup: &str, dropoff: &str) -> Self {
        self.pickup = pickup.to_string();
        self.dropoff = dropoff.to_string();
        self
    }

    pub fn passengers(mut self, value: &str) -> Self {
        self.passengers = value.to_string();
        self
    }

    pub fn distance(mut self, value: &str) -> Self {
        self.distance = value.to_string();
        self
    }

    pub fn fare(mut self, value: &str) -> Self {
        self.fare = value.to_string();
        self
    }

    pub fn payment(mut self, value: &str) -> Self {
        self.payment = value.to_string();
        self
    }

    pub fn pickup_location(mut self, value: &str) -> Self {
        self.pickup_location = value.to_string();
        self
    }

    pub fn dropoff_location(mut self, value: &str) -> Self {
        self.dropoff_location = value.to_string();
        self
    }

    fn fields(&self) -> [&str; 9] {
        [
            "2",
            &self.pickup,
            &self.dropoff,
            &self.passengers,
            &self.distance,
            &self.pickup_location,
            &self.dropoff_location,
            &self.payment,
            &self.fare,
        ]
    }
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

/// One clean trip per day of January 2024.
pub fn january() -> Vec<Trip> {
    (1..=31).map(|day| Trip::on(day, (day * 5) % 24)).collect()
}

pub fn trips_csv(trips: &[Trip]) -> String {
    let mut body = TRIP_HEADER.join(",");
    body.push('\n');
    for trip in trips {
        body.push_str(&trip.fields().join(","));
        body.push('\n');
    }
    body
}

pub fn write_part(dir: &Path, name: &str, trips: &[Trip]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, trips_csv(trips)).unwrap();
    path
}

pub const ZONES_CSV: &str = "\"LocationID\",\"Borough\",\"Zone\",\"service_zone\"\n\
1,\"EWR\",\"Newark Airport\",\"EWR\"\n\
132,\"Queens\",\"JFK Airport\",\"Airports\"\n\
161,\"Manhattan\",\"Midtown Center\",\"Yellow Zone\"\n\
236,\"Manhattan\",\"Upper East Side North\",\"Yellow Zone\"\n\
237,\"Manhattan\",\"Upper East Side South\",\"Yellow Zone\"\n";

pub fn write_zones(dir: &Path) -> PathBuf {
    let path = dir.join("taxi_zone_lookup.csv");
    fs::write(&path, ZONES_CSV).unwrap();
    path
}

/// A canonical trip DataFrame built from raw rows the same way ingestion builds it.
pub fn trips_frame(ctx: &SessionContext, trips: &[Trip]) -> DashboardResult<DataFrame> {
    let fields: Vec<Field> = TRIP_HEADER
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let columns: Vec<ArrayRef> = (0..TRIP_HEADER.len())
        .map(|i| {
            let values: Vec<Option<&str>> = trips
                .iter()
                .map(|t| {
                    let v = t.fields()[i];
                    if v.is_empty() {
                        None
                    } else {
                        Some(v)
                    }
                })
                .collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema, columns)?;
    normalize_trips(ctx.read_batch(batch)?)
}

/// A canonical zone DataFrame with the given (id, borough, zone) rows.
pub fn zones_frame(ctx: &SessionContext, zones: &[(i64, &str, &str)]) -> DashboardResult<DataFrame> {
    let ids = Int64Array::from(zones.iter().map(|z| z.0).collect::<Vec<_>>());
    let boroughs = StringArray::from(zones.iter().map(|z| Some(z.1)).collect::<Vec<_>>());
    let names = StringArray::from(zones.iter().map(|z| Some(z.2)).collect::<Vec<_>>());
    let service = StringArray::from(vec![None::<&str>; zones.len()]);
    let batch = RecordBatch::try_new(
        zone_schema(),
        vec![
            Arc::new(ids),
            Arc::new(boroughs),
            Arc::new(names),
            Arc::new(service),
        ],
    )?;
    Ok(ctx.read_batch(batch)?)
}

pub fn default_zones() -> Vec<(i64, &'static str, &'static str)> {
    vec![
        (1, "EWR", "Newark Airport"),
        (132, "Queens", "JFK Airport"),
        (161, "Manhattan", "Midtown Center"),
        (236, "Manhattan", "Upper East Side North"),
        (237, "Manhattan", "Upper East Side South"),
    ]
}

/// Collects a DataFrame into a single batch.
pub async fn collect_one(df: DataFrame) -> DashboardResult<RecordBatch> {
    let schema = Arc::new(df.schema().as_arrow().clone());
    let batches = df.collect().await?;
    let schema = batches.first().map(|b| b.schema()).unwrap_or(schema);
    Ok(concat_batches(&schema, &batches)?)
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> &'a ArrayRef {
    batch.column(batch.schema().index_of(name).unwrap())
}

pub fn f64_values(batch: &RecordBatch, name: &str) -> Vec<Option<f64>> {
    let array = column(batch, name)
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("Expected Float64Array");
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i)))
        .collect()
}

pub fn i64_values(batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    let array = column(batch, name)
        .as_any()
        .downcast_ref::<Int64Array>()
        .expect("Expected Int64Array");
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i)))
        .collect()
}

pub fn i32_values(batch: &RecordBatch, name: &str) -> Vec<Option<i32>> {
    let array = column(batch, name)
        .as_any()
        .downcast_ref::<Int32Array>()
        .expect("Expected Int32Array");
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i)))
        .collect()
}

pub fn date_values(batch: &RecordBatch, name: &str) -> Vec<Option<NaiveDate>> {
    let array = column(batch, name)
        .as_any()
        .downcast_ref::<Date32Array>()
        .expect("Expected Date32Array");
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value_as_date(i)).flatten())
        .collect()
}

pub fn string_values(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let array = column(batch, name)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("Expected StringArray");
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i).to_string()))
        .collect()
}
