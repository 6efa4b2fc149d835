//! Spectral: explore-level validation for BI modeling projects.
//!
//! A project is a set of models, each exposing explores. Spectral runs one of
//! three validators over the selected explores and reports pass/fail per
//! explore in a canonical result:
//!
//! - `sql`: execute the generated SQL of each explore (batch, single or hybrid)
//! - `content`: find saved dashboards and looks that reference missing fields
//! - `assert`: run the project's declared data tests
//!
//! Results from two runs can be diffed so that CI only surfaces errors a
//! branch introduced relative to a baseline.
//!
//! # Examples
//!
//! ```bash
//! spectral sql --project eye_exam --fixture fixture.json --explores 'eye_exam/*' --fail-fast
//! spectral content --project eye_exam --branch feature --incremental --base-ref main
//! spectral diff main.json feature.json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: project tree, canonical result and diff engine, backend and
//!   branch capabilities, runner
//! - [`plugins`]: validator strategies (SQL, content, data tests)

mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{Cli, Command, TargetArgs};
use crate::core::backend::Backend;
use crate::core::branch::{BranchManager, GitBranchManager};
use crate::core::config::{Config, load_config};
use crate::core::error::SpectralError;
use crate::core::fixture::FixtureBackend;
use crate::core::result::{ValidationResult, incremental_results};
use crate::core::runner::Runner;
use crate::core::{logging, output};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Process exit code when validation ran and found errors.
pub const EXIT_VALIDATION_FAILED: i32 = 100;

/// Parse arguments, run the requested command and print its report.
///
/// Returns whether the result passed. Faults come back as errors.
pub fn run() -> Result<bool, SpectralError> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let config = load_config(cli.config.as_deref(), &cwd)?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| logging::DEFAULT_LOG_LEVEL.to_string());
    logging::init(&level)?;

    match cli.command {
        Command::Sql(sql) => {
            let mut options = config.sql_options();
            if sql.fail_fast {
                options.fail_fast = true;
            }
            if sql.profile {
                options.profile = true;
            }
            if let Some(mode) = sql.mode {
                options.mode = mode;
            }
            if let Some(concurrency) = sql.concurrency {
                options.concurrency = concurrency.max(1);
            }
            if let Some(secs) = sql.runtime_threshold {
                options.runtime_threshold = Duration::from_secs(secs);
            }
            with_runner(&sql.target, &config, |runner, selectors| {
                let result = runner.validate_sql(selectors, &options)?;
                emit(&sql.target.format, "SQL", &result)
            })
        }
        Command::Content(content) => {
            let mut options = config.content_options();
            if content.exclude_personal {
                options.exclude_personal = true;
            }
            let base_ref = content.base_ref.clone().or_else(|| config.base_ref.clone());
            with_runner(&content.target, &config, |runner, selectors| {
                let result = if content.incremental {
                    let base_ref = base_ref.as_deref().ok_or_else(|| {
                        SpectralError::ConfigError(
                            "--incremental needs a base ref (--base-ref or base_ref in config)"
                                .to_string(),
                        )
                    })?;
                    runner.validate_content_incremental(selectors, &options, base_ref)?
                } else {
                    runner.validate_content(selectors, &options)?
                };
                emit(&content.target.format, "Content", &result)
            })
        }
        Command::Assert(assert) => with_runner(&assert.target, &config, |runner, selectors| {
            let result = runner.validate_data_tests(selectors)?;
            emit(&assert.target.format, "Data test", &result)
        }),
        Command::Diff(diff) => {
            let main = read_result(&diff.main)?;
            let additional = read_result(&diff.additional)?;
            let result = incremental_results(&main, &additional);
            emit(&diff.format, "Incremental", &result)
        }
    }
}

fn read_result(path: &Path) -> Result<ValidationResult, SpectralError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Resolve backend and branch manager for a target, then hand over a runner.
fn with_runner<F>(target: &TargetArgs, config: &Config, f: F) -> Result<bool, SpectralError>
where
    F: FnOnce(&Runner<'_>, &[String]) -> Result<bool, SpectralError>,
{
    let project = target
        .project
        .clone()
        .or_else(|| config.project.clone())
        .ok_or_else(|| {
            SpectralError::ConfigError("no project given (--project or project in config)".into())
        })?;
    let fixture = target
        .fixture
        .clone()
        .or_else(|| config.fixture.clone())
        .ok_or_else(|| {
            SpectralError::ConfigError("no backend given (--fixture or fixture in config)".into())
        })?;

    let backend = FixtureBackend::load(&fixture)?;
    let git = target
        .git_dir
        .clone()
        .or_else(|| config.git_dir.clone())
        .map(GitBranchManager::new);
    let branches: &dyn BranchManager = match &git {
        Some(manager) => manager,
        None => &backend,
    };

    let runner = Runner::new(&backend as &dyn Backend, branches, project)?
        .with_branch(target.branch.clone().or_else(|| config.branch.clone()))
        .with_remote_reset(target.remote_reset || config.remote_reset.unwrap_or(false));
    f(&runner, &target.selectors())
}

fn emit(format: &str, label: &str, result: &ValidationResult) -> Result<bool, SpectralError> {
    match format {
        "json" => println!("{}", output::render_json(result)?),
        "text" => print!("{}", output::render_text(label, result)),
        other => {
            return Err(SpectralError::ConfigError(format!(
                "unknown format '{}': expected 'text' or 'json'",
                other
            )));
        }
    }
    Ok(result.passed())
}
