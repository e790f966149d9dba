//! ## Trip Part Ingestion
//!
//! Trip records arrive as a directory of CSV parts sharing a name prefix
//! (`yellow_tripdata_part_1.csv`, `yellow_tripdata_part_2.csv`, ...). Loading:
//!
//! 1. lists the matching parts in lexicographic file-name order,
//! 2. reads each part with Arrow's CSV reader and rewrites it to the canonical trip schema
//!    (see [`crate::schema`]), deriving `pickup_date`, `pickup_hour` and `trip_duration_minutes`,
//! 3. concatenates the parts in order and numbers every row with a global `row_id`.
//!
//! A part that cannot be read is handled according to [`OnParseError`]: skipped with a warning,
//! or fatal for the whole load.
//!
//! Types are decided here and nowhere else. Parts are read as text and every column is converted
//! explicitly: identifiers and payment codes become `Int64` (so `"1"`, `"1.0"` and `" 1 "` are the
//! same code) and measures become `Float64`. Parts written with different spellings therefore
//! concatenate cleanly.

use crate::cache::{LoadReport, LoadedTable, SkippedFile};
use crate::exceptions::{DashboardError, DashboardResult};
use crate::schema::{self, trip_schema, TRIP_SOURCE_COLUMNS};
use crate::settings::{DashboardSettings, OnParseError};
use arrow::array::{ArrayRef, UInt64Array};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::logical_expr::{Case as DFCase, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use datafusion_expr::{cast, col, ident, lit, try_cast};
use datafusion_functions::datetime::date_part;
use datafusion_functions::expr_fn::{btrim, floor};
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lists the files in `dir` named `<prefix>*.<extension>`, sorted by file name.
pub fn discover_part_files(
    dir: &Path,
    prefix: &str,
    extension: &str,
) -> DashboardResult<Vec<PathBuf>> {
    let suffix = format!(".{}", extension);
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let matches = name.starts_with(prefix)
            && name.ends_with(&suffix)
            && name.len() >= prefix.len() + suffix.len();
        if matches {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

const NANOS_PER_MINUTE: f64 = 60e9;

fn is_text(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

/// Converts a source column of any inferred type to `Float64`. Unparseable text becomes null.
fn measure_expr(source: Expr, source_type: &DataType) -> Expr {
    if is_text(source_type) {
        try_cast(btrim(vec![cast(source, DataType::Utf8)]), DataType::Float64)
    } else {
        try_cast(source, DataType::Float64)
    }
}

/// Converts a source column of any inferred type to an `Int64` code.
/// `"2"`, `2`, `2.0` and `" 2 "` all map to 2; non-integral values such as `2.5` map to null.
fn code_expr(source: Expr, source_type: &DataType) -> Expr {
    if source_type.is_integer() {
        return cast(source, DataType::Int64);
    }
    let as_float = measure_expr(source, source_type);
    Expr::Case(DFCase {
        expr: None,
        when_then_expr: vec![(
            Box::new(as_float.clone().eq(floor(as_float.clone()))),
            Box::new(try_cast(as_float, DataType::Int64)),
        )],
        else_expr: Some(Box::new(lit(ScalarValue::Int64(None)))),
    })
}

/// Rewrites a raw trip DataFrame with TLC headers into the canonical trip columns
/// (everything in [`schema::trip_column_types`]), deriving the date, hour and duration columns.
///
/// Returns [`DashboardError::MissingColumn`] if a required source column is absent.
pub fn normalize_trips(df: DataFrame) -> DashboardResult<DataFrame> {
    let mut exprs: Vec<Expr> = Vec::with_capacity(TRIP_SOURCE_COLUMNS.len());
    for (source, target) in TRIP_SOURCE_COLUMNS {
        let field = df.schema().field_with_name(None, source).map_err(|_| {
            DashboardError::MissingColumn(format!("Column '{}' not found", source))
        })?;
        let data_type = field.data_type().clone();
        let expr = match target {
            schema::PICKUP_DATETIME | schema::DROPOFF_DATETIME => {
                try_cast(ident(source), schema::timestamp_type())
            }
            schema::PICKUP_LOCATION_ID | schema::DROPOFF_LOCATION_ID | schema::PAYMENT_TYPE => {
                code_expr(ident(source), &data_type)
            }
            _ => measure_expr(ident(source), &data_type),
        };
        exprs.push(expr.alias(target));
    }
    let canonical = df.select(exprs)?;

    let pickup = col(schema::PICKUP_DATETIME);
    let dropoff = col(schema::DROPOFF_DATETIME);
    // Nanosecond difference, so sub-second parts of both timestamps survive.
    let duration_nanos =
        cast(dropoff, DataType::Int64) - cast(pickup.clone(), DataType::Int64);

    let mut derived: Vec<Expr> = canonical
        .schema()
        .fields()
        .iter()
        .map(|f| col(f.name()))
        .collect();
    derived.push(cast(pickup.clone(), DataType::Date32).alias(schema::PICKUP_DATE));
    derived.push(
        cast(
            date_part().call(vec![lit("hour"), pickup]),
            DataType::Int32,
        )
        .alias(schema::PICKUP_HOUR),
    );
    derived.push(
        (cast(duration_nanos, DataType::Float64) / lit(NANOS_PER_MINUTE))
            .alias(schema::TRIP_DURATION_MINUTES),
    );

    Ok(canonical.select(derived)?)
}

/// Reads the CSV file at `path` with every column typed as nullable `Utf8`.
///
/// The file is opened directly rather than handed to the engine as a table URL, so directory
/// names containing glob characters (`*`, `?`, `[`) are taken literally.
pub fn read_csv_as_text(ctx: &SessionContext, path: &Path) -> DashboardResult<DataFrame> {
    let mut file = File::open(path)?;
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))?;
    let text_schema = Arc::new(Schema::new(
        header
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    file.seek(SeekFrom::Start(0))?;
    let reader = ReaderBuilder::new(text_schema.clone())
        .with_header(true)
        .build(file)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    let table = MemTable::try_new(text_schema, vec![batches])?;
    Ok(ctx.read_table(Arc::new(table))?)
}

/// Reads one trip part and returns its rows in the canonical schema (without `row_id`).
pub async fn read_trip_part(ctx: &SessionContext, path: &Path) -> DashboardResult<Vec<RecordBatch>> {
    let df = read_csv_as_text(ctx, path)?;
    let batches = normalize_trips(df)?.collect().await?;
    Ok(batches)
}

/// Prepends a sequential `row_id` column, starting at `offset`, to each canonical batch.
fn number_rows(batches: Vec<RecordBatch>, mut offset: u64) -> DashboardResult<Vec<RecordBatch>> {
    let schema = trip_schema();
    let mut numbered = Vec::with_capacity(batches.len());
    for batch in batches {
        let n = batch.num_rows() as u64;
        let ids: ArrayRef = Arc::new(UInt64Array::from_iter_values(offset..offset + n));
        let mut columns = Vec::with_capacity(batch.num_columns() + 1);
        columns.push(ids);
        columns.extend(batch.columns().iter().cloned());
        numbered.push(RecordBatch::try_new(schema.clone(), columns)?);
        offset += n;
    }
    Ok(numbered)
}

/// Loads and concatenates every trip part under `settings.data_dir`.
pub async fn load_trip_parts(
    ctx: &SessionContext,
    settings: &DashboardSettings,
) -> DashboardResult<LoadedTable> {
    let start = Instant::now();
    let files = discover_part_files(
        &settings.data_dir,
        &settings.file_prefix,
        &settings.file_extension,
    )?;
    if files.is_empty() {
        warn!(
            "No files matching {}*.{} in {}",
            settings.file_prefix,
            settings.file_extension,
            settings.data_dir.display()
        );
    }

    let mut report = LoadReport::default();
    let mut batches = Vec::new();
    let mut next_row_id = 0u64;
    for path in files {
        match read_trip_part(ctx, &path).await {
            Ok(part) => {
                let rows: usize = part.iter().map(|b| b.num_rows()).sum();
                debug!("Read {} rows from {}", rows, path.display());
                batches.extend(number_rows(part, next_row_id)?);
                next_row_id += rows as u64;
                report.files_read.push(path);
            }
            Err(e) => match settings.on_parse_error {
                OnParseError::Skip => {
                    warn!("Failed to load {}: {}", path.display(), e);
                    report.skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
                OnParseError::Abort => {
                    return Err(DashboardError::FileLoad {
                        path,
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    report.rows = next_row_id as usize;
    if report.rows == 0 && !report.skipped.is_empty() {
        warn!("Every trip part was skipped; continuing with an empty table");
    }
    info!(
        "Loaded {} trip rows from {} files ({} skipped) in {:?}",
        report.rows,
        report.files_read.len(),
        report.skipped.len(),
        start.elapsed()
    );
    Ok(LoadedTable::new(trip_schema(), batches, report))
}
