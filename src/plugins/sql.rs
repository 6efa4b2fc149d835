//! SQL validator: runs the generated SQL for every selected explore.
//!
//! Modes:
//! - `batch`: one query per explore selecting every dimension
//! - `single`: one query per dimension
//! - `hybrid`: batch first, then re-run failing explores per dimension to
//!   pinpoint the broken dimensions
//!
//! Explores run on a bounded rayon pool. Outcomes come back in tree order
//! whatever the completion order was.

use crate::core::backend::{Backend, QueryOutcome};
use crate::core::error::SpectralError;
use crate::core::project::{Dimension, Explore, Model, Project};
use crate::core::validation_error::{SqlError, ValidationError};
use crate::plugins::{ExploreOutcome, Validator, ValidatorKind};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SqlMode {
    Batch,
    Single,
    #[default]
    Hybrid,
}

#[derive(Debug, Clone)]
pub struct SqlOptions {
    pub mode: SqlMode,
    pub concurrency: usize,
    pub fail_fast: bool,
    pub profile: bool,
    /// Queries slower than this are reported when profiling.
    pub runtime_threshold: Duration,
}

impl Default for SqlOptions {
    fn default() -> Self {
        Self {
            mode: SqlMode::Hybrid,
            concurrency: 10,
            fail_fast: false,
            profile: false,
            runtime_threshold: Duration::from_secs(5),
        }
    }
}

/// Result of one explore task.
struct ExploreRun {
    errors: Vec<ValidationError>,
    runtime: Duration,
}

pub struct SqlValidator<'a> {
    backend: &'a dyn Backend,
    options: SqlOptions,
}

impl<'a> SqlValidator<'a> {
    pub fn new(backend: &'a dyn Backend, options: SqlOptions) -> Self {
        Self { backend, options }
    }

    fn query_error(
        &self,
        model: &Model,
        explore: &Explore,
        dimension: Option<&Dimension>,
        sql: String,
        outcome: QueryOutcome,
    ) -> Option<ValidationError> {
        match outcome {
            QueryOutcome::Success { .. } => None,
            QueryOutcome::Error {
                message,
                line_number,
                ..
            } => Some(ValidationError::Sql(SqlError {
                model: model.name.clone(),
                explore: explore.name.clone(),
                dimension: dimension.map(|d| d.name.clone()),
                sql,
                message,
                line_number,
                explore_url: self.backend.explore_url(&model.name, &explore.name),
            })),
        }
    }

    fn run_batch(&self, model: &Model, explore: &Explore) -> Result<ExploreRun, SpectralError> {
        let sql = self
            .backend
            .explore_sql(&model.name, &explore.name, &explore.dimensions)?;
        let outcome = self.backend.run_query(&sql)?;
        let runtime = outcome.runtime();
        log::debug!(
            "{}/{}: batch query finished in {:.2}s (error: {})",
            model.name,
            explore.name,
            runtime.as_secs_f64(),
            outcome.is_error()
        );
        Ok(ExploreRun {
            errors: self
                .query_error(model, explore, None, sql, outcome)
                .into_iter()
                .collect(),
            runtime,
        })
    }

    fn run_single(&self, model: &Model, explore: &Explore) -> Result<ExploreRun, SpectralError> {
        let mut errors = Vec::new();
        let mut runtime = Duration::ZERO;
        for dimension in &explore.dimensions {
            let sql = self.backend.explore_sql(
                &model.name,
                &explore.name,
                std::slice::from_ref(dimension),
            )?;
            let outcome = self.backend.run_query(&sql)?;
            runtime += outcome.runtime();
            if let Some(err) = self.query_error(model, explore, Some(dimension), sql, outcome) {
                log::debug!("{}/{}: dimension '{}' failed", model.name, explore.name, dimension.name);
                errors.push(err);
                if self.options.fail_fast {
                    break;
                }
            }
        }
        Ok(ExploreRun { errors, runtime })
    }

    fn run_hybrid(&self, model: &Model, explore: &Explore) -> Result<ExploreRun, SpectralError> {
        let batch = self.run_batch(model, explore)?;
        if batch.errors.is_empty() {
            return Ok(batch);
        }
        let single = self.run_single(model, explore)?;
        let runtime = batch.runtime + single.runtime;
        if single.errors.is_empty() {
            // The explore as a whole fails but no dimension does on its own.
            return Ok(ExploreRun {
                errors: batch.errors,
                runtime,
            });
        }
        Ok(ExploreRun {
            errors: single.errors,
            runtime,
        })
    }

    fn run_explore(&self, model: &Model, explore: &Explore) -> Result<ExploreRun, SpectralError> {
        match self.options.mode {
            SqlMode::Batch => self.run_batch(model, explore),
            SqlMode::Single => self.run_single(model, explore),
            SqlMode::Hybrid => self.run_hybrid(model, explore),
        }
    }

    fn report_profile(&self, timings: &[(String, Duration)]) {
        let slow = slow_explores(timings, self.options.runtime_threshold);
        if slow.is_empty() {
            log::info!(
                "Profile: no explore exceeded {:.1}s",
                self.options.runtime_threshold.as_secs_f64()
            );
            return;
        }
        for (label, runtime) in slow {
            log::warn!("Profile: {} took {:.2}s", label, runtime.as_secs_f64());
        }
    }
}

/// Explores slower than `threshold`, slowest first. Ties keep tree order.
pub fn slow_explores(timings: &[(String, Duration)], threshold: Duration) -> Vec<(&str, Duration)> {
    let mut slow: Vec<(&str, Duration)> = timings
        .iter()
        .filter(|(_, runtime)| *runtime > threshold)
        .map(|(label, runtime)| (label.as_str(), *runtime))
        .collect();
    slow.sort_by(|a, b| b.1.cmp(&a.1));
    slow
}

impl Validator for SqlValidator<'_> {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::Sql
    }

    fn validate(&self, project: &Project) -> Result<Vec<ExploreOutcome>, SpectralError> {
        let tasks: Vec<(usize, usize, &Model, &Explore)> = project
            .iter_explores()
            .filter(|(_, _, model, explore)| {
                if explore.dimensions.is_empty() {
                    log::warn!("Skipping {}/{}: no dimensions to query", model.name, explore.name);
                    return false;
                }
                true
            })
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.concurrency.max(1))
            .build()
            .map_err(|e| SpectralError::BackendError(format!("failed to start query pool: {}", e)))?;

        let stop = AtomicBool::new(false);
        let fail_fast = self.options.fail_fast;

        let runs: Vec<Option<Result<ExploreRun, SpectralError>>> = pool.install(|| {
            tasks
                .par_iter()
                .map(|(_, _, model, explore)| {
                    if stop.load(Ordering::SeqCst) {
                        return None;
                    }
                    let run = self.run_explore(model, explore);
                    match &run {
                        // Faults always surface, even after the flag tripped.
                        Err(_) => {
                            stop.store(true, Ordering::SeqCst);
                        }
                        Ok(r) if fail_fast && !r.errors.is_empty() => {
                            // Only the first failure to trip the flag is kept.
                            if stop.swap(true, Ordering::SeqCst) {
                                return None;
                            }
                        }
                        Ok(_) => {
                            if fail_fast && stop.load(Ordering::SeqCst) {
                                return None;
                            }
                        }
                    }
                    Some(run)
                })
                .collect()
        });

        let mut outcomes = Vec::new();
        let mut timings = Vec::new();
        for ((mi, ei, model, explore), run) in tasks.iter().zip(runs) {
            let Some(run) = run else {
                continue;
            };
            let run = run?;
            timings.push((format!("{}/{}", model.name, explore.name), run.runtime));
            outcomes.push(ExploreOutcome {
                model_index: *mi,
                explore_index: *ei,
                errors: run.errors,
            });
        }

        if fail_fast && stop.load(Ordering::SeqCst) {
            log::info!(
                "Fail-fast: stopped after {} of {} explores",
                outcomes.len(),
                tasks.len()
            );
        }
        if self.options.profile {
            self.report_profile(&timings);
        }
        Ok(outcomes)
    }
}
