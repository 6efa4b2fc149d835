//! CLI struct definitions for the `spectral` command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use crate::plugins::SqlMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "spectral",
    version = env!("CARGO_PKG_VERSION"),
    about = "Validate a BI modeling project explore by explore: generated SQL, saved content and data tests."
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./spectral.toml when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log spec, e.g. 'info' or 'warn,spectral::plugins=debug'.
    #[clap(long, global = true)]
    pub log_level: Option<String>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub(crate) struct TargetArgs {
    /// Project to validate.
    #[clap(long)]
    pub project: Option<String>,
    /// Branch to check out for the duration of the run.
    #[clap(long)]
    pub branch: Option<String>,
    /// Backend fixture document (JSON).
    #[clap(long)]
    pub fixture: Option<PathBuf>,
    /// Switch branches in this local git checkout instead of on the backend.
    #[clap(long)]
    pub git_dir: Option<PathBuf>,
    /// Reset the working branch to its remote before validating.
    #[clap(long)]
    pub remote_reset: bool,
    /// Explores to include, as 'model/explore'. '*' is a wildcard.
    #[clap(long = "explores", num_args = 1..)]
    pub explores: Vec<String>,
    /// Explores to exclude, as 'model/explore'.
    #[clap(long = "exclude", num_args = 1..)]
    pub exclude: Vec<String>,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    pub format: String,
}

impl TargetArgs {
    /// Include selectors followed by `-`-prefixed exclusions.
    pub fn selectors(&self) -> Vec<String> {
        self.explores
            .iter()
            .cloned()
            .chain(self.exclude.iter().map(|e| format!("-{}", e)))
            .collect()
    }
}

#[derive(clap::Args, Debug)]
pub(crate) struct SqlCli {
    #[clap(flatten)]
    pub target: TargetArgs,
    /// Stop at the first explore with an error.
    #[clap(long)]
    pub fail_fast: bool,
    /// Query strategy.
    #[clap(long, value_enum)]
    pub mode: Option<SqlMode>,
    /// Maximum explores queried at once.
    #[clap(long)]
    pub concurrency: Option<usize>,
    /// Report explores whose queries exceed the runtime threshold.
    #[clap(long)]
    pub profile: bool,
    /// Runtime threshold in seconds for --profile.
    #[clap(long)]
    pub runtime_threshold: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ContentCli {
    #[clap(flatten)]
    pub target: TargetArgs,
    /// Only report errors not already present on the base ref.
    #[clap(long)]
    pub incremental: bool,
    /// Baseline ref for --incremental.
    #[clap(long)]
    pub base_ref: Option<String>,
    /// Ignore content in personal folders.
    #[clap(long)]
    pub exclude_personal: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct AssertCli {
    #[clap(flatten)]
    pub target: TargetArgs,
}

#[derive(clap::Args, Debug)]
pub(crate) struct DiffCli {
    /// Baseline result (JSON).
    pub main: PathBuf,
    /// Result to reduce to new errors (JSON).
    pub additional: PathBuf,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "json")]
    pub format: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run the generated SQL of every selected explore.
    Sql(SqlCli),
    /// Check saved dashboards and looks for broken field references.
    Content(ContentCli),
    /// Run the project's data tests.
    Assert(AssertCli),
    /// Keep only the errors in ADDITIONAL that MAIN does not have.
    Diff(DiffCli),
}
