//! ## Dashboard Session
//!
//! [`Dashboard`] owns everything that outlives a single interaction: the DataFusion context,
//! the settings, and the load caches for the trip parts and the zone lookup. Each call to
//! [`Dashboard::refresh`] recomputes the whole chain for a [`FilterSelection`]:
//!
//! 1. validate the date range (an inverted range stops here),
//! 2. load trips and zones (from cache after the first call),
//! 3. optionally sample the full trip table,
//! 4. filter by date, list the payment types present, filter by payment type and sanity bounds,
//! 5. join the zone names and compute the five views.
//!
//! ### Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use taxi_dashboard::dashboard::{Dashboard, FilterSelection};
//! use taxi_dashboard::settings::DashboardSettings;
//!
//! # async fn run() -> taxi_dashboard::exceptions::DashboardResult<()> {
//! let mut dashboard = Dashboard::new(DashboardSettings::new("data", "data/taxi_zone_lookup.csv"))?;
//! let selection = FilterSelection::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
//! );
//! let views = dashboard.refresh(&selection).await?;
//! println!("{} clean trips", views.total_trips);
//! # Ok(())
//! # }
//! ```

use crate::cache::{LoadedTable, TableCache};
use crate::enrich::ZoneEnricher;
use crate::exceptions::DashboardResult;
use crate::filters::{
    payment_type_options, DateRangeFilter, PaymentTypeFilter, SanityBoundsFilter,
};
use crate::ingest::load_trip_parts;
use crate::make_pipeline;
use crate::sampling::sample_frame;
use crate::settings::{validate_fraction, DashboardSettings};
use crate::views::{
    daily_total_fare, distance_fare_sample, payment_type_distribution, top_pickup_zones,
    trips_per_hour, DailyFare, HourCount, PaymentCount, ScatterPoint, ZoneCount,
};
use crate::zones::load_zone_lookup;
use chrono::NaiveDate;
use datafusion::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A single-threaded engine context. Scans run as one partition, so a plan sees rows in load
/// order unless it sorts them.
pub fn session_context() -> SessionContext {
    SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1))
}

/// The user's current filter choices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSelection {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Selected payment code. `None` selects the first available option.
    pub payment_type: Option<i64>,
    /// Sample the full table at this fraction before filtering.
    pub sample_fraction: Option<f64>,
}

impl FilterSelection {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            payment_type: None,
            sample_fraction: None,
        }
    }

    pub fn with_payment_type(mut self, payment_type: i64) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    pub fn with_sample_fraction(mut self, fraction: f64) -> Self {
        self.sample_fraction = Some(fraction);
        self
    }
}

/// The cleaned and zone-enriched trips for one selection.
pub struct EnrichedTrips {
    pub frame: DataFrame,
    /// Payment codes present in the date-filtered (and sampled) trips, ascending.
    pub payment_options: Vec<i64>,
    /// The payment code actually applied.
    pub payment_type: Option<i64>,
}

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardViews {
    pub selection: FilterSelection,
    pub payment_options: Vec<i64>,
    pub payment_type: Option<i64>,
    pub total_trips: usize,
    pub top_pickup_zones: Vec<ZoneCount>,
    pub trips_per_hour: Vec<HourCount>,
    pub daily_total_fare: Vec<DailyFare>,
    pub payment_type_distribution: Vec<PaymentCount>,
    pub distance_fare_sample: Vec<ScatterPoint>,
}

/// A dashboard session.
pub struct Dashboard {
    ctx: SessionContext,
    settings: DashboardSettings,
    trips: TableCache,
    zones: TableCache,
}

impl Dashboard {
    /// Creates a session after validating `settings`. Nothing is read until first use.
    pub fn new(settings: DashboardSettings) -> DashboardResult<Self> {
        settings.validate()?;
        Ok(Self {
            ctx: session_context(),
            settings,
            trips: TableCache::new(),
            zones: TableCache::new(),
        })
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// The trip table for the configured data directory, loading it on first use.
    pub async fn trips(&mut self) -> DashboardResult<Arc<LoadedTable>> {
        let dir = self.settings.data_dir.clone();
        if let Some(table) = self.trips.get(&dir) {
            debug!("Trip table for {} served from cache", dir.display());
            return Ok(table);
        }
        let table = load_trip_parts(&self.ctx, &self.settings).await?;
        Ok(self.trips.insert(dir, table))
    }

    /// The zone lookup for the configured path, loading it on first use.
    pub async fn zones(&mut self) -> DashboardResult<Arc<LoadedTable>> {
        let path = self.settings.zone_lookup_path.clone();
        if let Some(table) = self.zones.get(&path) {
            debug!("Zone lookup {} served from cache", path.display());
            return Ok(table);
        }
        let table = load_zone_lookup(&self.ctx, &path).await?;
        Ok(self.zones.insert(path, table))
    }

    /// Forgets both cached tables so the next refresh reads the files again.
    pub fn invalidate(&mut self) {
        self.trips.clear();
        self.zones.clear();
    }

    /// Produces the cleaned, enriched trips for `selection`.
    pub async fn enriched(&mut self, selection: &FilterSelection) -> DashboardResult<EnrichedTrips> {
        let date_filter = DateRangeFilter::new(selection.start, selection.end);
        date_filter.validate()?;
        if let Some(fraction) = selection.sample_fraction {
            validate_fraction("sample_fraction", fraction)?;
        }

        let trips = self.trips().await?;
        let zones = self.zones().await?;

        let mut df = trips.to_dataframe(&self.ctx)?;
        if let Some(fraction) = selection.sample_fraction {
            df = sample_frame(&self.ctx, df, fraction, self.settings.sample_seed).await?;
        }

        let mut by_date = make_pipeline!(self.settings.verbose, ("date_range", date_filter));
        let dated = by_date.fit_transform(&df).await?;

        let payment_options = payment_type_options(&dated).await?;
        let payment_type = selection
            .payment_type
            .or_else(|| payment_options.first().copied());

        let mut cleaning = make_pipeline!(
            self.settings.verbose,
            ("payment_type", PaymentTypeFilter::new(payment_type)),
            (
                "sanity_bounds",
                SanityBoundsFilter::new(self.settings.max_trip_distance)
            ),
            ("zones", ZoneEnricher::new(zones.to_dataframe(&self.ctx)?)),
        );
        let frame = cleaning.fit_transform(&dated).await?;

        Ok(EnrichedTrips {
            frame,
            payment_options,
            payment_type,
        })
    }

    /// Recomputes every view for `selection`.
    pub async fn refresh(&mut self, selection: &FilterSelection) -> DashboardResult<DashboardViews> {
        let start = Instant::now();
        let enriched = self.enriched(selection).await?;
        let frame = &enriched.frame;
        let settings = &self.settings;

        let views = DashboardViews {
            selection: *selection,
            payment_options: enriched.payment_options.clone(),
            payment_type: enriched.payment_type,
            total_trips: frame.clone().count().await?,
            top_pickup_zones: top_pickup_zones(frame, settings.top_zones_limit).await?,
            trips_per_hour: trips_per_hour(frame).await?,
            daily_total_fare: daily_total_fare(frame).await?,
            payment_type_distribution: payment_type_distribution(frame).await?,
            distance_fare_sample: distance_fare_sample(
                frame,
                settings.scatter_max_distance,
                settings.scatter_max_fare,
                settings.scatter_fraction,
                settings.scatter_seed,
            )
            .await?,
        };
        info!(
            "Refreshed {}..{} (payment type {:?}): {} trips in {:?}",
            selection.start,
            selection.end,
            views.payment_type,
            views.total_trips,
            start.elapsed()
        );
        Ok(views)
    }
}
