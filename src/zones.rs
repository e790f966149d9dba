//! ## Zone Lookup
//!
//! Loads the static `LocationID → Borough, Zone` reference table. The lookup is normalised to
//! the canonical zone schema (`location_id`, `borough`, `zone`, `service_zone`), rows without a
//! location id are dropped, and the remaining ids must be unique so that joining trips against
//! the lookup can never duplicate a trip.

use crate::cache::{LoadReport, LoadedTable};
use crate::exceptions::{DashboardError, DashboardResult};
use crate::ingest::read_csv_as_text;
use crate::schema::{self, zone_schema, ZONE_SOURCE_COLUMNS, ZONE_SOURCE_SERVICE_ZONE};
use arrow::array::{Array, Int64Array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use datafusion::logical_expr::Expr;
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use datafusion_expr::{cast, col, ident, lit, try_cast};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Rewrites a raw zone lookup DataFrame into the canonical zone schema.
pub fn normalize_zones(df: DataFrame) -> DashboardResult<DataFrame> {
    let mut exprs: Vec<Expr> = Vec::with_capacity(ZONE_SOURCE_COLUMNS.len() + 1);
    for (source, target) in ZONE_SOURCE_COLUMNS {
        df.schema().field_with_name(None, source).map_err(|_| {
            DashboardError::MissingColumn(format!("Column '{}' not found", source))
        })?;
        let expr = if target == schema::LOCATION_ID {
            try_cast(ident(source), DataType::Int64)
        } else {
            cast(ident(source), DataType::Utf8)
        };
        exprs.push(expr.alias(target));
    }
    let service_zone = if df
        .schema()
        .field_with_name(None, ZONE_SOURCE_SERVICE_ZONE)
        .is_ok()
    {
        cast(ident(ZONE_SOURCE_SERVICE_ZONE), DataType::Utf8)
    } else {
        lit(ScalarValue::Utf8(None))
    };
    exprs.push(service_zone.alias(schema::SERVICE_ZONE));

    Ok(df
        .select(exprs)?
        .filter(col(schema::LOCATION_ID).is_not_null())?)
}

/// Fails with [`DashboardError::DuplicateZoneId`] on the first location id seen twice.
fn ensure_unique_ids(batches: &[RecordBatch]) -> DashboardResult<()> {
    let mut seen = HashSet::new();
    for batch in batches {
        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| {
                DashboardError::InvalidParameter(format!(
                    "Expected Int64 array for column {}",
                    schema::LOCATION_ID
                ))
            })?;
        for i in 0..ids.len() {
            if ids.is_valid(i) && !seen.insert(ids.value(i)) {
                return Err(DashboardError::DuplicateZoneId(ids.value(i)));
            }
        }
    }
    Ok(())
}

/// Reads and validates the zone lookup CSV at `path`.
pub async fn load_zone_lookup(ctx: &SessionContext, path: &Path) -> DashboardResult<LoadedTable> {
    let df = read_csv_as_text(ctx, path)?;
    let raw = normalize_zones(df)?.collect().await?;
    ensure_unique_ids(&raw)?;

    let schema = zone_schema();
    let mut batches = Vec::with_capacity(raw.len());
    for batch in raw {
        batches.push(RecordBatch::try_new(schema.clone(), batch.columns().to_vec())?);
    }
    let rows = batches.iter().map(|b| b.num_rows()).sum();
    info!("Loaded {} zones from {}", rows, path.display());

    let report = LoadReport {
        files_read: vec![path.to_path_buf()],
        skipped: Vec::new(),
        rows,
    };
    Ok(LoadedTable::new(schema, batches, report))
}
