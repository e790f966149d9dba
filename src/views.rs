//! ## Aggregate Views
//!
//! The five read-only summaries shown by the dashboard. Each view is a pure function of the
//! enriched trip table and returns plain Rust rows ready for presentation:
//!
//! - [`top_pickup_zones`]: trips per pickup zone, busiest first, truncated to a limit.
//! - [`trips_per_hour`]: trips per pickup hour, for hours that occur in the data.
//! - [`daily_total_fare`]: summed fare per pickup date.
//! - [`payment_type_distribution`]: trips per payment code, most frequent first.
//! - [`distance_fare_sample`]: a deterministic sample of `(distance, fare)` pairs for plotting.
//!
//! Ties on a count are broken by the grouping key ascending, so every view has a total order.

use crate::exceptions::{DashboardError, DashboardResult};
use crate::filters::validate_columns;
use crate::sampling::{collect_ordered, sample_batch};
use crate::schema::{FARE_AMOUNT, PAYMENT_TYPE, PICKUP_DATE, PICKUP_HOUR, PICKUP_ZONE, TRIP_DISTANCE};
use arrow::array::{Array, Date32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use datafusion::functions_aggregate::expr_fn::{count, sum};
use datafusion::logical_expr::{col, lit};
use datafusion::prelude::*;

const TRIP_COUNT: &str = "trip_count";
const TOTAL_FARE: &str = "total_fare";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneCount {
    pub zone: String,
    pub trip_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourCount {
    pub hour: i32,
    pub trip_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyFare {
    pub date: NaiveDate,
    pub total_fare: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentCount {
    pub payment_type: i64,
    pub trip_count: i64,
}

impl PaymentCount {
    pub fn label(&self) -> &'static str {
        payment_type_label(self.payment_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub trip_distance: f64,
    pub fare_amount: f64,
}

/// Human-readable name of a TLC payment code.
pub fn payment_type_label(code: i64) -> &'static str {
    match code {
        0 => "Flex fare",
        1 => "Credit card",
        2 => "Cash",
        3 => "No charge",
        4 => "Dispute",
        5 => "Unknown",
        6 => "Voided trip",
        _ => "Other",
    }
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> DashboardResult<&'a T> {
    let index = batch.schema().index_of(name)?;
    batch
        .column(index)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| {
            DashboardError::InvalidParameter(format!(
                "Unexpected array type for column {}",
                name
            ))
        })
}

/// Trip counts per pickup zone, highest first, at most `limit` rows.
/// Trips without a pickup zone (lookup misses) are not counted as a zone.
pub async fn top_pickup_zones(df: &DataFrame, limit: usize) -> DashboardResult<Vec<ZoneCount>> {
    validate_columns(df, &[PICKUP_ZONE])?;
    let grouped = df
        .clone()
        .filter(col(PICKUP_ZONE).is_not_null())?
        .aggregate(
            vec![col(PICKUP_ZONE)],
            vec![count(lit(1)).alias(TRIP_COUNT)],
        )?
        .sort(vec![
            col(TRIP_COUNT).sort(false, false),
            col(PICKUP_ZONE).sort(true, false),
        ])?
        .limit(0, Some(limit))?;
    let mut rows = Vec::new();
    for batch in grouped.collect().await? {
        let zones = column::<StringArray>(&batch, PICKUP_ZONE)?;
        let counts = column::<Int64Array>(&batch, TRIP_COUNT)?;
        for i in 0..batch.num_rows() {
            rows.push(ZoneCount {
                zone: zones.value(i).to_string(),
                trip_count: counts.value(i),
            });
        }
    }
    Ok(rows)
}

/// Trip counts per pickup hour, ascending by hour. Hours without trips are omitted.
pub async fn trips_per_hour(df: &DataFrame) -> DashboardResult<Vec<HourCount>> {
    validate_columns(df, &[PICKUP_HOUR])?;
    let grouped = df
        .clone()
        .filter(col(PICKUP_HOUR).is_not_null())?
        .aggregate(
            vec![col(PICKUP_HOUR)],
            vec![count(lit(1)).alias(TRIP_COUNT)],
        )?
        .sort(vec![col(PICKUP_HOUR).sort(true, false)])?;
    let mut rows = Vec::new();
    for batch in grouped.collect().await? {
        let hours = column::<Int32Array>(&batch, PICKUP_HOUR)?;
        let counts = column::<Int64Array>(&batch, TRIP_COUNT)?;
        for i in 0..batch.num_rows() {
            rows.push(HourCount {
                hour: hours.value(i),
                trip_count: counts.value(i),
            });
        }
    }
    Ok(rows)
}

/// Summed `fare_amount` per pickup date, ascending by date.
pub async fn daily_total_fare(df: &DataFrame) -> DashboardResult<Vec<DailyFare>> {
    validate_columns(df, &[PICKUP_DATE, FARE_AMOUNT])?;
    let grouped = df
        .clone()
        .filter(col(PICKUP_DATE).is_not_null())?
        .aggregate(
            vec![col(PICKUP_DATE)],
            vec![sum(col(FARE_AMOUNT)).alias(TOTAL_FARE)],
        )?
        .sort(vec![col(PICKUP_DATE).sort(true, false)])?;
    let mut rows = Vec::new();
    for batch in grouped.collect().await? {
        let dates = column::<Date32Array>(&batch, PICKUP_DATE)?;
        let totals = column::<Float64Array>(&batch, TOTAL_FARE)?;
        for i in 0..batch.num_rows() {
            let date = dates.value_as_date(i).ok_or_else(|| {
                DashboardError::InvalidParameter(format!(
                    "Pickup date {} is out of range",
                    dates.value(i)
                ))
            })?;
            rows.push(DailyFare {
                date,
                total_fare: if totals.is_null(i) { 0.0 } else { totals.value(i) },
            });
        }
    }
    Ok(rows)
}

/// Trip counts per payment code, highest first, ties by code ascending.
pub async fn payment_type_distribution(df: &DataFrame) -> DashboardResult<Vec<PaymentCount>> {
    validate_columns(df, &[PAYMENT_TYPE])?;
    let grouped = df
        .clone()
        .filter(col(PAYMENT_TYPE).is_not_null())?
        .aggregate(
            vec![col(PAYMENT_TYPE)],
            vec![count(lit(1)).alias(TRIP_COUNT)],
        )?
        .sort(vec![
            col(TRIP_COUNT).sort(false, false),
            col(PAYMENT_TYPE).sort(true, false),
        ])?;
    let mut rows = Vec::new();
    for batch in grouped.collect().await? {
        let codes = column::<Int64Array>(&batch, PAYMENT_TYPE)?;
        let counts = column::<Int64Array>(&batch, TRIP_COUNT)?;
        for i in 0..batch.num_rows() {
            rows.push(PaymentCount {
                payment_type: codes.value(i),
                trip_count: counts.value(i),
            });
        }
    }
    Ok(rows)
}

/// Deterministic sample of `(trip_distance, fare_amount)` pairs from trips with
/// `trip_distance < max_distance` and `fare_amount < max_fare`.
pub async fn distance_fare_sample(
    df: &DataFrame,
    max_distance: f64,
    max_fare: f64,
    fraction: f64,
    seed: u64,
) -> DashboardResult<Vec<ScatterPoint>> {
    validate_columns(df, &[TRIP_DISTANCE, FARE_AMOUNT])?;
    let candidates = df
        .clone()
        .filter(
            col(TRIP_DISTANCE)
                .lt(lit(max_distance))
                .and(col(FARE_AMOUNT).lt(lit(max_fare))),
        )?;
    let batch = collect_ordered(candidates).await?;
    let sampled = sample_batch(&batch, fraction, seed)?;
    let distances = column::<Float64Array>(&sampled, TRIP_DISTANCE)?;
    let fares = column::<Float64Array>(&sampled, FARE_AMOUNT)?;
    Ok((0..sampled.num_rows())
        .map(|i| ScatterPoint {
            trip_distance: distances.value(i),
            fare_amount: fares.value(i),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_labels() {
        assert_eq!(payment_type_label(1), "Credit card");
        assert_eq!(payment_type_label(2), "Cash");
        assert_eq!(payment_type_label(99), "Other");
        let row = PaymentCount {
            payment_type: 4,
            trip_count: 3,
        };
        assert_eq!(row.label(), "Dispute");
    }
}
