//! ## Deterministic Sampling
//!
//! DataFusion has no seeded `TABLESAMPLE`, so sampling materialises the frame and draws row
//! indices with a seeded [`StdRng`]. The sample size is `round(fraction * rows)`, and the chosen
//! rows keep their original relative order. Frames carrying a `row_id` column are sorted by it
//! first, so the draw does not depend on how the engine happened to order batches.

use crate::exceptions::DashboardResult;
use crate::schema::ROW_ID;
use crate::settings::validate_fraction;
use arrow::array::UInt64Array;
use arrow::compute::{concat_batches, take_record_batch};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Number of rows kept when sampling `rows` rows at `fraction`.
pub fn sample_size(rows: usize, fraction: f64) -> usize {
    ((rows as f64) * fraction).round().min(rows as f64) as usize
}

/// Sorted row indices of a `fraction` sample over `rows` rows, drawn with `seed`.
pub fn sample_indices(rows: usize, fraction: f64, seed: u64) -> Vec<u64> {
    let amount = sample_size(rows, fraction);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<u64> = rand::seq::index::sample(&mut rng, rows, amount)
        .into_iter()
        .map(|i| i as u64)
        .collect();
    indices.sort_unstable();
    indices
}

/// Samples the rows of a single batch.
pub fn sample_batch(batch: &RecordBatch, fraction: f64, seed: u64) -> DashboardResult<RecordBatch> {
    validate_fraction("fraction", fraction)?;
    let indices = UInt64Array::from(sample_indices(batch.num_rows(), fraction, seed));
    Ok(take_record_batch(batch, &indices)?)
}

/// Materialises `df` (ordered by `row_id` when present) into one batch.
pub async fn collect_ordered(df: DataFrame) -> DashboardResult<RecordBatch> {
    let df = if df.schema().field_with_name(None, ROW_ID).is_ok() {
        df.sort(vec![col(ROW_ID).sort(true, false)])?
    } else {
        df
    };
    let schema = df.schema().inner().clone();
    let batches = df.collect().await?;
    let schema = batches.first().map(|b| b.schema()).unwrap_or(schema);
    Ok(concat_batches(&schema, &batches)?)
}

/// Returns a new DataFrame holding a deterministic `fraction` sample of `df`.
pub async fn sample_frame(
    ctx: &SessionContext,
    df: DataFrame,
    fraction: f64,
    seed: u64,
) -> DashboardResult<DataFrame> {
    validate_fraction("fraction", fraction)?;
    let batch = collect_ordered(df).await?;
    let sampled = sample_batch(&batch, fraction, seed)?;
    debug!(
        "Sampled {} of {} rows (fraction {}, seed {})",
        sampled.num_rows(),
        batch.num_rows(),
        fraction,
        seed
    );
    Ok(ctx.read_batch(sampled)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_size_rounds() {
        assert_eq!(sample_size(100, 0.02), 2);
        assert_eq!(sample_size(10, 0.1), 1);
        assert_eq!(sample_size(10, 1.0), 10);
        assert_eq!(sample_size(0, 0.5), 0);
        assert_eq!(sample_size(24, 0.02), 0);
    }

    #[test]
    fn test_sample_indices_are_reproducible() {
        let first = sample_indices(1_000, 0.1, 7);
        let second = sample_indices(1_000, 0.1, 7);
        assert_eq!(first, second);
        assert_eq!(first.len(), 100);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(first.iter().all(|&i| i < 1_000));
    }

    #[test]
    fn test_different_seeds_differ() {
        assert_ne!(sample_indices(1_000, 0.1, 1), sample_indices(1_000, 0.1, 2));
    }

    #[test]
    fn test_full_fraction_keeps_everything_in_order() {
        let indices = sample_indices(5, 1.0, 3);
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }
}
