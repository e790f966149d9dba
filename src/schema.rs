//! Column names and the canonical Arrow schemas of the trip and zone tables.
//!
//! Source files use the TLC header names (`tpep_pickup_datetime`, `PULocationID`, ...).
//! Ingestion renames them to the snake_case names below so the rest of the crate never has to
//! care about the spelling used by a particular file.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::sync::Arc;

pub const ROW_ID: &str = "row_id";
pub const PICKUP_DATETIME: &str = "pickup_datetime";
pub const DROPOFF_DATETIME: &str = "dropoff_datetime";
pub const PICKUP_LOCATION_ID: &str = "pickup_location_id";
pub const DROPOFF_LOCATION_ID: &str = "dropoff_location_id";
pub const PASSENGER_COUNT: &str = "passenger_count";
pub const TRIP_DISTANCE: &str = "trip_distance";
pub const FARE_AMOUNT: &str = "fare_amount";
pub const PAYMENT_TYPE: &str = "payment_type";
pub const PICKUP_DATE: &str = "pickup_date";
pub const PICKUP_HOUR: &str = "pickup_hour";
pub const TRIP_DURATION_MINUTES: &str = "trip_duration_minutes";

pub const LOCATION_ID: &str = "location_id";
pub const BOROUGH: &str = "borough";
pub const ZONE: &str = "zone";
pub const SERVICE_ZONE: &str = "service_zone";

pub const PICKUP_BOROUGH: &str = "pickup_borough";
pub const PICKUP_ZONE: &str = "pickup_zone";
pub const DROPOFF_BOROUGH: &str = "dropoff_borough";
pub const DROPOFF_ZONE: &str = "dropoff_zone";

/// Source header → canonical name for every column a trip part must provide.
pub const TRIP_SOURCE_COLUMNS: [(&str, &str); 8] = [
    ("tpep_pickup_datetime", PICKUP_DATETIME),
    ("tpep_dropoff_datetime", DROPOFF_DATETIME),
    ("PULocationID", PICKUP_LOCATION_ID),
    ("DOLocationID", DROPOFF_LOCATION_ID),
    ("passenger_count", PASSENGER_COUNT),
    ("trip_distance", TRIP_DISTANCE),
    ("fare_amount", FARE_AMOUNT),
    ("payment_type", PAYMENT_TYPE),
];

/// Source header → canonical name for the zone lookup. `service_zone` is optional.
pub const ZONE_SOURCE_COLUMNS: [(&str, &str); 3] = [
    ("LocationID", LOCATION_ID),
    ("Borough", BOROUGH),
    ("Zone", ZONE),
];
pub const ZONE_SOURCE_SERVICE_ZONE: &str = "service_zone";

pub fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Nanosecond, None)
}

/// The canonical type of each trip column, in table order, without `row_id`.
pub fn trip_column_types() -> Vec<(&'static str, DataType)> {
    vec![
        (PICKUP_DATETIME, timestamp_type()),
        (DROPOFF_DATETIME, timestamp_type()),
        (PICKUP_LOCATION_ID, DataType::Int64),
        (DROPOFF_LOCATION_ID, DataType::Int64),
        (PASSENGER_COUNT, DataType::Float64),
        (TRIP_DISTANCE, DataType::Float64),
        (FARE_AMOUNT, DataType::Float64),
        (PAYMENT_TYPE, DataType::Int64),
        (PICKUP_DATE, DataType::Date32),
        (PICKUP_HOUR, DataType::Int32),
        (TRIP_DURATION_MINUTES, DataType::Float64),
    ]
}

/// Schema of the loaded trip table.
pub fn trip_schema() -> SchemaRef {
    let mut fields = vec![Field::new(ROW_ID, DataType::UInt64, false)];
    fields.extend(
        trip_column_types()
            .into_iter()
            .map(|(name, data_type)| Field::new(name, data_type, true)),
    );
    Arc::new(Schema::new(fields))
}

/// Schema of the loaded zone lookup table.
pub fn zone_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(LOCATION_ID, DataType::Int64, false),
        Field::new(BOROUGH, DataType::Utf8, true),
        Field::new(ZONE, DataType::Utf8, true),
        Field::new(SERVICE_ZONE, DataType::Utf8, true),
    ]))
}
