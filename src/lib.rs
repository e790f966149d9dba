//! # Taxi Dashboard
//!
//! Backend of a trip-record dashboard built on Apache DataFusion. Partitioned trip CSV files
//! are loaded once per session, filtered by pickup date, payment type and sanity bounds,
//! enriched with pickup/drop-off zone names, and summarised into five views: top pickup zones,
//! trips per hour, daily total fare, payment type distribution, and a distance-vs-fare sample.
//!
//! The entry point is [`dashboard::Dashboard`]; the modules below it can also be used
//! directly on any DataFrame in the canonical trip schema ([`schema`]).

pub mod cache;
pub mod dashboard;
pub mod enrich;
pub mod exceptions;
pub mod filters;
pub mod ingest;
mod logging;
pub mod pipeline;
pub mod sampling;
pub mod schema;
pub mod settings;
pub mod views;
pub mod zones;

pub use dashboard::{Dashboard, DashboardViews, FilterSelection};
pub use exceptions::{DashboardError, DashboardResult};
pub use settings::{DashboardSettings, OnParseError};
