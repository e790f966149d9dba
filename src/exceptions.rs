//! ## Custom Errors for the Taxi Dashboard
//!
//! This module defines the error type shared by every stage of the dashboard pipeline.
//! It uses the `thiserror` crate to derive the `Error` trait. Library errors from DataFusion,
//! Arrow and the filesystem are wrapped transparently, while the remaining variants describe
//! failures that are meaningful to the person driving the dashboard (an invalid date range,
//! a malformed part file, a broken zone lookup).
//!
//! The `DashboardResult` type alias is used as the return type throughout the crate.
//!
//! ### Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use taxi_dashboard::exceptions::{DashboardError, DashboardResult};
//!
//! fn check(start: NaiveDate, end: NaiveDate) -> DashboardResult<()> {
//!     if start > end {
//!         return Err(DashboardError::InvalidDateRange { start, end });
//!     }
//!     Ok(())
//! }
//! ```

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, filtering, or aggregating trip data.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Wraps underlying I/O errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// A trip part file could not be read while the abort policy is active.
    #[error("Failed to load {}: {reason}", path.display())]
    FileLoad { path: PathBuf, reason: String },

    /// The selected start date falls after the selected end date.
    #[error("Start date {start} must not be after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// An invalid setting or argument was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A required column does not exist in the input.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The zone lookup table maps the same location id more than once.
    #[error("Duplicate location id {0} in zone lookup")]
    DuplicateZoneId(i64),

    /// A named pipeline stage failed.
    #[error("Stage '{name}' failed: {source}")]
    Stage {
        name: String,
        #[source]
        source: Box<DashboardError>,
    },
}

impl DashboardError {
    /// Returns the innermost error, looking through any `Stage` wrappers.
    pub fn root(&self) -> &DashboardError {
        match self {
            DashboardError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A convenient result type for dashboard operations.
pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test io error");
        let err: DashboardError = io_err.into();
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("I/O error:"));
        assert!(err_msg.contains("test io error"));
    }

    #[test]
    fn test_datafusion_error() {
        let df_err = datafusion::error::DataFusionError::Plan("test plan error".into());
        let err: DashboardError = df_err.into();
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("DataFusion error:"));
        assert!(err_msg.contains("test plan error"));
    }

    #[test]
    fn test_arrow_error() {
        let arrow_err = arrow::error::ArrowError::ComputeError("test compute error".into());
        let err: DashboardError = arrow_err.into();
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("Arrow error:"));
        assert!(err_msg.contains("test compute error"));
    }

    #[test]
    fn test_file_load_error() {
        let err = DashboardError::FileLoad {
            path: PathBuf::from("data/yellow_tripdata_part_3.csv"),
            reason: "unexpected end of record".into(),
        };
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("yellow_tripdata_part_3.csv"));
        assert!(err_msg.contains("unexpected end of record"));
    }

    #[test]
    fn test_invalid_date_range_error() {
        let err = DashboardError::InvalidDateRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let err_msg = format!("{}", err);
        assert_eq!(
            err_msg,
            "Start date 2024-02-01 must not be after end date 2024-01-01"
        );
    }

    #[test]
    fn test_duplicate_zone_id_error() {
        let err = DashboardError::DuplicateZoneId(132);
        assert!(format!("{}", err).contains("132"));
    }

    #[test]
    fn test_stage_error_root() {
        let err = DashboardError::Stage {
            name: "sanity_bounds".into(),
            source: Box::new(DashboardError::MissingColumn("fare_amount".into())),
        };
        let err_msg = format!("{}", err);
        assert!(err_msg.contains("Stage 'sanity_bounds' failed"));
        assert!(matches!(err.root(), DashboardError::MissingColumn(c) if c == "fare_amount"));
    }
}
