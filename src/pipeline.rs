//! ## Cleaning Pipeline
//!
//! This module provides the abstractions used to chain the filter and enrichment stages of a
//! dashboard refresh.
//!
//! ### Overview
//!
//! - The [`Transformer`] trait is the common interface of a stage. `fit` checks the stage's
//!   preconditions against the incoming DataFrame (required columns, argument sanity) and
//!   `transform` extends the logical plan without executing it.
//! - The [`Pipeline`] struct runs stages in the order they were given, so the fixed
//!   date → payment type → sanity bounds → zones order is decided once, where the pipeline is
//!   built.
//! - Macros [`crate::impl_transformer`] and [`crate::make_pipeline`] simplify the implementation
//!   of stages and the creation of pipelines.

use crate::exceptions::{DashboardError, DashboardResult};
use async_trait::async_trait;
use datafusion::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Trait for stages of the cleaning pipeline.
#[async_trait]
pub trait Transformer {
    /// Check the stage's preconditions against the input DataFrame.
    ///
    /// # Arguments
    ///
    /// * `df` - The input DataFrame.
    async fn fit(&mut self, df: &DataFrame) -> DashboardResult<()>;

    /// Returns a new DataFrame with the stage applied to the logical plan.
    ///
    /// # Arguments
    ///
    /// * `df` - The input DataFrame.
    fn transform(&self, df: DataFrame) -> DashboardResult<DataFrame>;

    /// Returns true if the stage needs `fit` to run before `transform`.
    fn is_stateful(&self) -> bool;
}

/// Macro to implement the [`Transformer`] trait for a stage.
///
/// The type must already have inherent methods:
/// - `async fn fit(&mut self, &DataFrame) -> DashboardResult<()>`
/// - `fn transform(&self, DataFrame) -> DashboardResult<DataFrame>`
/// - **`fn inherent_is_stateful(&self) -> bool`**
///
/// # Example
///
/// ```rust,no_run
/// use taxi_dashboard::exceptions::DashboardResult;
/// use datafusion::prelude::DataFrame;
/// use taxi_dashboard::impl_transformer;
///
/// pub struct KeepAll;
///
/// impl KeepAll {
///     pub async fn fit(&mut self, _df: &DataFrame) -> DashboardResult<()> {
///         Ok(())
///     }
///
///     pub fn transform(&self, df: DataFrame) -> DashboardResult<DataFrame> {
///         Ok(df)
///     }
///
///     pub fn inherent_is_stateful(&self) -> bool {
///         false
///     }
/// }
///
/// impl_transformer!(KeepAll);
/// ```
#[macro_export]
macro_rules! impl_transformer {
    ($ty:ty) => {
        #[async_trait::async_trait]
        impl $crate::pipeline::Transformer for $ty {
            async fn fit(
                &mut self,
                df: &datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::DashboardResult<()> {
                <$ty>::fit(self, df).await
            }
            fn transform(
                &self,
                df: datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::DashboardResult<datafusion::prelude::DataFrame> {
                <$ty>::transform(self, df)
            }
            fn is_stateful(&self) -> bool {
                <$ty>::inherent_is_stateful(self)
            }
        }
    };
}

/// A named, boxed pipeline stage.
pub type Step = (String, Box<dyn Transformer + Send + Sync>);

/// A pipeline that chains a sequence of stages.
///
/// Each stage's output (a new logical plan) is passed as input to the next one; nothing is
/// executed until the caller collects the final DataFrame.
pub struct Pipeline {
    steps: Vec<Step>,
    verbose: bool,
}

fn stage_error(name: &str, source: DashboardError) -> DashboardError {
    DashboardError::Stage {
        name: name.to_string(),
        source: Box::new(source),
    }
}

impl Pipeline {
    /// Creates a new pipeline.
    ///
    /// # Arguments
    ///
    /// * `steps` - A vector of (name, stage) pairs.
    /// * `verbose` - If true, stage timings are logged at info level instead of debug.
    pub fn new(steps: Vec<Step>, verbose: bool) -> Self {
        Self { steps, verbose }
    }

    /// Names of the stages in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Fits each stage against the output of the previous one and returns the final plan.
    pub async fn fit(&mut self, df: &DataFrame) -> DashboardResult<DataFrame> {
        if self.steps.is_empty() {
            return Err(DashboardError::InvalidParameter(
                "Pipeline must have at least one stage.".to_string(),
            ));
        }
        let mut current_df = df.clone();
        for (name, step) in self.steps.iter_mut() {
            let start = Instant::now();
            step.fit(&current_df)
                .await
                .map_err(|e| stage_error(name, e))?;
            current_df = step
                .transform(current_df)
                .map_err(|e| stage_error(name, e))?;
            if self.verbose {
                info!("Stage '{}' planned in {:?}", name, start.elapsed());
            } else {
                debug!("Stage '{}' planned in {:?}", name, start.elapsed());
            }
        }
        Ok(current_df)
    }

    /// Applies the `transform` method of each stage (without fitting).
    pub fn transform(&self, df: DataFrame) -> DashboardResult<DataFrame> {
        if self.steps.is_empty() {
            return Err(DashboardError::InvalidParameter(
                "Pipeline must have at least one stage.".to_string(),
            ));
        }
        let mut current_df = df;
        for (name, step) in self.steps.iter() {
            if step.is_stateful() {
                return Err(stage_error(
                    name,
                    DashboardError::InvalidParameter(
                        "stateful stage requires fit before transform".to_string(),
                    ),
                ));
            }
            current_df = step
                .transform(current_df)
                .map_err(|e| stage_error(name, e))?;
        }
        Ok(current_df)
    }

    /// Convenience method to call `fit` and return the final DataFrame.
    pub async fn fit_transform(&mut self, df: &DataFrame) -> DashboardResult<DataFrame> {
        self.fit(df).await
    }
}

/// Macro to simplify pipeline creation by automatically boxing stages.
///
/// # Example
///
/// ```rust,no_run
/// use taxi_dashboard::make_pipeline;
/// use taxi_dashboard::filters::SanityBoundsFilter;
///
/// let pipeline = make_pipeline!(false,
///     ("sanity_bounds", SanityBoundsFilter::new(100.0)),
/// );
/// ```
#[macro_export]
macro_rules! make_pipeline {
    ($verbose:expr, $(($name:expr, $transformer:expr)),+ $(,)?) => {
        {
            let steps: Vec<$crate::pipeline::Step> = vec![
                $(
                    ($name.to_string(), Box::new($transformer)),
                )+
            ];
            $crate::pipeline::Pipeline::new(steps, $verbose)
        }
    };
}
