//! ## Filter and Clean Stages
//!
//! The three row filters applied to the trip table on every refresh, in this order:
//!
//! - **DateRangeFilter:** keep trips whose `pickup_date` lies in `[start, end]`.
//! - **PaymentTypeFilter:** keep trips with the selected `payment_type` code.
//! - **SanityBoundsFilter:** keep trips with `passenger_count > 0`,
//!   `0 < trip_distance < max_distance` and `fare_amount > 0`.
//!
//! Rows with a null in any compared column fail the comparison and are dropped.

use crate::exceptions::{DashboardError, DashboardResult};
use crate::impl_transformer;
use crate::schema::{FARE_AMOUNT, PASSENGER_COUNT, PAYMENT_TYPE, PICKUP_DATE, TRIP_DISTANCE};
use arrow::array::{Array, Int64Array};
use arrow::datatypes::Date32Type;
use chrono::NaiveDate;
use datafusion::logical_expr::{col, lit, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;

/// Validates that every column in `target_cols` exists in the DataFrame.
pub(crate) fn validate_columns(df: &DataFrame, target_cols: &[&str]) -> DashboardResult<()> {
    let schema = df.schema();
    for col_name in target_cols {
        if schema.field_with_name(None, col_name).is_err() {
            return Err(DashboardError::MissingColumn(format!(
                "Column '{}' not found in DataFrame",
                col_name
            )));
        }
    }
    Ok(())
}

fn date_lit(date: NaiveDate) -> Expr {
    lit(ScalarValue::Date32(Some(Date32Type::from_naive_date(date))))
}

/// Keeps trips picked up within an inclusive date range.
#[derive(Debug, Clone, Copy)]
pub struct DateRangeFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRangeFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Fails with [`DashboardError::InvalidDateRange`] when `start` is after `end`.
    pub fn validate(&self) -> DashboardResult<()> {
        if self.start > self.end {
            return Err(DashboardError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub async fn fit(&mut self, df: &DataFrame) -> DashboardResult<()> {
        self.validate()?;
        validate_columns(df, &[PICKUP_DATE])
    }

    pub fn transform(&self, df: DataFrame) -> DashboardResult<DataFrame> {
        self.validate()?;
        let predicate = col(PICKUP_DATE)
            .gt_eq(date_lit(self.start))
            .and(col(PICKUP_DATE).lt_eq(date_lit(self.end)));
        df.filter(predicate).map_err(DashboardError::from)
    }

    pub fn inherent_is_stateful(&self) -> bool {
        false
    }
}

/// Keeps trips paid with one payment type. With no selection nothing is kept.
#[derive(Debug, Clone, Copy)]
pub struct PaymentTypeFilter {
    pub payment_type: Option<i64>,
}

impl PaymentTypeFilter {
    pub fn new(payment_type: Option<i64>) -> Self {
        Self { payment_type }
    }

    pub async fn fit(&mut self, df: &DataFrame) -> DashboardResult<()> {
        validate_columns(df, &[PAYMENT_TYPE])
    }

    pub fn transform(&self, df: DataFrame) -> DashboardResult<DataFrame> {
        let predicate = match self.payment_type {
            Some(code) => col(PAYMENT_TYPE).eq(lit(code)),
            None => lit(false),
        };
        df.filter(predicate).map_err(DashboardError::from)
    }

    pub fn inherent_is_stateful(&self) -> bool {
        false
    }
}

/// Drops trips with implausible passenger counts, distances, or fares.
#[derive(Debug, Clone, Copy)]
pub struct SanityBoundsFilter {
    /// Exclusive upper bound on `trip_distance`.
    pub max_distance: f64,
}

impl SanityBoundsFilter {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    pub async fn fit(&mut self, df: &DataFrame) -> DashboardResult<()> {
        if self.max_distance.is_nan() || self.max_distance <= 0.0 {
            return Err(DashboardError::InvalidParameter(format!(
                "max_distance {} must be positive",
                self.max_distance
            )));
        }
        validate_columns(df, &[PASSENGER_COUNT, TRIP_DISTANCE, FARE_AMOUNT])
    }

    pub fn transform(&self, df: DataFrame) -> DashboardResult<DataFrame> {
        let predicate = col(PASSENGER_COUNT)
            .gt(lit(0.0))
            .and(col(TRIP_DISTANCE).gt(lit(0.0)))
            .and(col(TRIP_DISTANCE).lt(lit(self.max_distance)))
            .and(col(FARE_AMOUNT).gt(lit(0.0)));
        df.filter(predicate).map_err(DashboardError::from)
    }

    pub fn inherent_is_stateful(&self) -> bool {
        false
    }
}

impl_transformer!(DateRangeFilter);
impl_transformer!(PaymentTypeFilter);
impl_transformer!(SanityBoundsFilter);

/// Distinct non-null payment codes present in `df`, ascending.
pub async fn payment_type_options(df: &DataFrame) -> DashboardResult<Vec<i64>> {
    validate_columns(df, &[PAYMENT_TYPE])?;
    let distinct = df
        .clone()
        .select(vec![col(PAYMENT_TYPE)])?
        .filter(col(PAYMENT_TYPE).is_not_null())?
        .distinct()?
        .sort(vec![col(PAYMENT_TYPE).sort(true, false)])?;
    let batches = distinct.collect().await?;
    let mut options = Vec::new();
    for batch in batches {
        let array = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| {
                DashboardError::InvalidParameter(format!(
                    "Expected Int64 array for column {}",
                    PAYMENT_TYPE
                ))
            })?;
        for i in 0..array.len() {
            if !array.is_null(i) {
                options.push(array.value(i));
            }
        }
    }
    Ok(options)
}
