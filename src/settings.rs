//! ## Dashboard Settings
//!
//! [`DashboardSettings`] collects every knob of the pipeline: where the trip parts and the zone
//! lookup live, how parse failures are handled, and the constants used by cleaning and by the
//! scatter view. Defaults match the stock dashboard; [`DashboardSettings::from_env`] overlays
//! values from `TAXI_DASHBOARD_*` environment variables.

use crate::exceptions::{DashboardError, DashboardResult};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DATA_DIR_ENV: &str = "TAXI_DASHBOARD_DATA_DIR";
pub const ZONES_ENV: &str = "TAXI_DASHBOARD_ZONES";
pub const ON_PARSE_ERROR_ENV: &str = "TAXI_DASHBOARD_ON_PARSE_ERROR";
pub const SAMPLE_FRACTION_ENV: &str = "TAXI_DASHBOARD_SAMPLE_FRACTION";

/// What to do when a trip part file cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnParseError {
    /// Log a warning, record the file in the load report, and keep going.
    #[default]
    Skip,
    /// Fail the whole load.
    Abort,
}

impl FromStr for OnParseError {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(OnParseError::Skip),
            "abort" => Ok(OnParseError::Abort),
            other => Err(DashboardError::InvalidParameter(format!(
                "on_parse_error must be 'skip' or 'abort', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OnParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnParseError::Skip => write!(f, "skip"),
            OnParseError::Abort => write!(f, "abort"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    /// Directory holding the trip part files.
    pub data_dir: PathBuf,
    /// Shared file name prefix of the trip parts.
    pub file_prefix: String,
    /// Extension of the trip parts, without the dot.
    pub file_extension: String,
    pub zone_lookup_path: PathBuf,
    pub on_parse_error: OnParseError,
    /// Fraction used when the sampling toggle is switched on.
    pub sample_fraction: f64,
    pub sample_seed: u64,
    /// Exclusive upper bound on trip distance for a clean record.
    pub max_trip_distance: f64,
    pub top_zones_limit: usize,
    pub scatter_max_distance: f64,
    pub scatter_max_fare: f64,
    pub scatter_fraction: f64,
    pub scatter_seed: u64,
    /// Log per-stage timings at info level instead of debug.
    pub verbose: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_prefix: "yellow_tripdata_part_".to_string(),
            file_extension: "csv".to_string(),
            zone_lookup_path: PathBuf::from("data/taxi_zone_lookup.csv"),
            on_parse_error: OnParseError::Skip,
            sample_fraction: 0.1,
            sample_seed: 42,
            max_trip_distance: 100.0,
            top_zones_limit: 10,
            scatter_max_distance: 50.0,
            scatter_max_fare: 200.0,
            scatter_fraction: 0.02,
            scatter_seed: 1,
            verbose: false,
        }
    }
}

impl DashboardSettings {
    /// Default settings with the data directory and zone lookup path replaced.
    pub fn new(data_dir: impl Into<PathBuf>, zone_lookup_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            zone_lookup_path: zone_lookup_path.into(),
            ..Self::default()
        }
    }

    /// Default settings overlaid with any `TAXI_DASHBOARD_*` environment variables.
    pub fn from_env() -> DashboardResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> DashboardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ZONES_ENV) {
            self.zone_lookup_path = PathBuf::from(path);
        }
        if let Some(policy) = lookup(ON_PARSE_ERROR_ENV) {
            self.on_parse_error = policy.parse()?;
        }
        if let Some(fraction) = lookup(SAMPLE_FRACTION_ENV) {
            self.sample_fraction = fraction.trim().parse().map_err(|_| {
                DashboardError::InvalidParameter(format!(
                    "{} must be a number, got '{}'",
                    SAMPLE_FRACTION_ENV, fraction
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks that fractions are in (0, 1] and bounds are positive.
    pub fn validate(&self) -> DashboardResult<()> {
        validate_fraction("sample_fraction", self.sample_fraction)?;
        validate_fraction("scatter_fraction", self.scatter_fraction)?;
        for (name, value) in [
            ("max_trip_distance", self.max_trip_distance),
            ("scatter_max_distance", self.scatter_max_distance),
            ("scatter_max_fare", self.scatter_max_fare),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(DashboardError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.top_zones_limit == 0 {
            return Err(DashboardError::InvalidParameter(
                "top_zones_limit must be at least 1".to_string(),
            ));
        }
        if self.file_extension.starts_with('.') {
            return Err(DashboardError::InvalidParameter(format!(
                "file_extension must not start with a dot, got '{}'",
                self.file_extension
            )));
        }
        Ok(())
    }
}

/// Validates a sampling fraction, which must lie in (0, 1].
pub fn validate_fraction(name: &str, fraction: f64) -> DashboardResult<()> {
    if fraction > 0.0 && fraction <= 1.0 {
        Ok(())
    } else {
        Err(DashboardError::InvalidParameter(format!(
            "{} {} must be in (0, 1]",
            name, fraction
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let settings = DashboardSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.on_parse_error, OnParseError::Skip);
        assert_eq!(settings.top_zones_limit, 10);
        assert_eq!(settings.scatter_fraction, 0.02);
        assert_eq!(settings.scatter_seed, 1);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (DATA_DIR_ENV, "/srv/trips"),
            (ON_PARSE_ERROR_ENV, "Abort"),
            (SAMPLE_FRACTION_ENV, "0.25"),
        ]
        .into_iter()
        .collect();
        let settings = DashboardSettings::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/srv/trips"));
        assert_eq!(settings.on_parse_error, OnParseError::Abort);
        assert_eq!(settings.sample_fraction, 0.25);
        assert_eq!(
            settings.zone_lookup_path,
            PathBuf::from("data/taxi_zone_lookup.csv")
        );
    }

    #[test]
    fn test_bad_overrides_are_rejected() {
        let err = DashboardSettings::default()
            .with_overrides(|key| (key == ON_PARSE_ERROR_ENV).then(|| "ignore".to_string()))
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidParameter(_)));

        let err = DashboardSettings::default()
            .with_overrides(|key| (key == SAMPLE_FRACTION_ENV).then(|| "1.5".to_string()))
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidParameter(_)));
    }

    #[test]
    fn test_validate_fraction() {
        assert!(validate_fraction("f", 1.0).is_ok());
        assert!(validate_fraction("f", 0.02).is_ok());
        assert!(validate_fraction("f", 0.0).is_err());
        assert!(validate_fraction("f", -0.1).is_err());
        assert!(validate_fraction("f", f64::NAN).is_err());
    }

    #[test]
    fn test_on_parse_error_round_trip_display() {
        assert_eq!("skip".parse::<OnParseError>().unwrap(), OnParseError::Skip);
        assert_eq!(OnParseError::Abort.to_string(), "abort");
    }
}
