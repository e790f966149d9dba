//! ## Zone Enrichment
//!
//! [`ZoneEnricher`] left-joins the zone lookup twice: once on `pickup_location_id` to add
//! `pickup_borough` / `pickup_zone`, and once on `dropoff_location_id` to add
//! `dropoff_borough` / `dropoff_zone`. Trips whose location id is absent from the lookup keep
//! null zone fields; no trip is ever dropped or duplicated (lookup ids are unique).

use crate::exceptions::{DashboardError, DashboardResult};
use crate::filters::validate_columns;
use crate::impl_transformer;
use crate::schema::{
    BOROUGH, DROPOFF_BOROUGH, DROPOFF_LOCATION_ID, DROPOFF_ZONE, LOCATION_ID, PICKUP_BOROUGH,
    PICKUP_LOCATION_ID, PICKUP_ZONE, ZONE,
};
use datafusion::logical_expr::{col, JoinType};
use datafusion::prelude::*;

/// Attaches pickup and drop-off zone names to each trip.
#[derive(Clone)]
pub struct ZoneEnricher {
    zones: DataFrame,
}

impl ZoneEnricher {
    /// Creates an enricher over a DataFrame in the canonical zone schema.
    pub fn new(zones: DataFrame) -> Self {
        Self { zones }
    }

    pub async fn fit(&mut self, df: &DataFrame) -> DashboardResult<()> {
        validate_columns(df, &[PICKUP_LOCATION_ID, DROPOFF_LOCATION_ID])?;
        validate_columns(&self.zones, &[LOCATION_ID, BOROUGH, ZONE])
    }

    /// Left-joins one side of the lookup on `key`, renaming its fields.
    fn join_side(
        &self,
        df: DataFrame,
        key: &str,
        borough_alias: &str,
        zone_alias: &str,
    ) -> DashboardResult<DataFrame> {
        let join_key = format!("{}_{}", zone_alias, LOCATION_ID);
        let side = self.zones.clone().select(vec![
            col(LOCATION_ID).alias(&join_key),
            col(BOROUGH).alias(borough_alias),
            col(ZONE).alias(zone_alias),
        ])?;
        let joined = df.join(side, JoinType::Left, &[key], &[join_key.as_str()], None)?;
        joined
            .drop_columns(&[join_key.as_str()])
            .map_err(DashboardError::from)
    }

    pub fn transform(&self, df: DataFrame) -> DashboardResult<DataFrame> {
        let df = self.join_side(df, PICKUP_LOCATION_ID, PICKUP_BOROUGH, PICKUP_ZONE)?;
        self.join_side(df, DROPOFF_LOCATION_ID, DROPOFF_BOROUGH, DROPOFF_ZONE)
    }

    pub fn inherent_is_stateful(&self) -> bool {
        false
    }
}

impl_transformer!(ZoneEnricher);
