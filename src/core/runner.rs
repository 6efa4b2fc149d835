//! Validation runner.
//!
//! One entry point per validator kind. Each call checks out the working
//! branch for its whole duration, builds a fresh project tree, runs the
//! validator and flattens the tree into a [`ValidationResult`]. Dependent
//! projects have their branches pinned for the same span.

use crate::core::backend::Backend;
use crate::core::branch::{BranchGuard, BranchManager, DependentBranches};
use crate::core::builder::build_project;
use crate::core::error::SpectralError;
use crate::core::project::SelectorSet;
use crate::core::result::{ValidationResult, incremental_results};
use crate::plugins::{
    ContentOptions, ContentValidator, DataTestValidator, SqlOptions, SqlValidator, Validator,
    apply_outcomes,
};
use std::time::Instant;
use ulid::Ulid;

pub struct Runner<'a> {
    backend: &'a dyn Backend,
    branches: &'a dyn BranchManager,
    project: String,
    branch: Option<String>,
    remote_reset: bool,
    run_id: Ulid,
}

impl<'a> Runner<'a> {
    /// Authenticate against the backend and bind the runner to `project`.
    pub fn new(
        backend: &'a dyn Backend,
        branches: &'a dyn BranchManager,
        project: impl Into<String>,
    ) -> Result<Self, SpectralError> {
        backend.authenticate()?;
        Ok(Self {
            backend,
            branches,
            project: project.into(),
            branch: None,
            remote_reset: false,
            run_id: Ulid::new(),
        })
    }

    /// Validate on `branch` instead of whatever ref is currently active.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Reset the working branch to its remote before each run.
    pub fn with_remote_reset(mut self, remote_reset: bool) -> Self {
        self.remote_reset = remote_reset;
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn run_id(&self) -> Ulid {
        self.run_id
    }

    pub fn validate_sql<S: AsRef<str>>(
        &self,
        selectors: &[S],
        options: &SqlOptions,
    ) -> Result<ValidationResult, SpectralError> {
        let validator = SqlValidator::new(self.backend, options.clone());
        self.run(self.branch.as_deref(), self.remote_reset, selectors, &validator)
    }

    pub fn validate_content<S: AsRef<str>>(
        &self,
        selectors: &[S],
        options: &ContentOptions,
    ) -> Result<ValidationResult, SpectralError> {
        let validator = ContentValidator::new(self.backend, options.clone());
        self.run(self.branch.as_deref(), self.remote_reset, selectors, &validator)
    }

    pub fn validate_data_tests<S: AsRef<str>>(
        &self,
        selectors: &[S],
    ) -> Result<ValidationResult, SpectralError> {
        let validator = DataTestValidator::new(self.backend);
        self.run(self.branch.as_deref(), self.remote_reset, selectors, &validator)
    }

    /// Content errors introduced by the working branch relative to `base_ref`.
    pub fn validate_content_incremental<S: AsRef<str>>(
        &self,
        selectors: &[S],
        options: &ContentOptions,
        base_ref: &str,
    ) -> Result<ValidationResult, SpectralError> {
        let validator = ContentValidator::new(self.backend, options.clone());
        let additional = self.run(
            self.branch.as_deref(),
            self.remote_reset,
            selectors,
            &validator,
        )?;
        let main = self.run(Some(base_ref), false, selectors, &validator)?;
        let diff = incremental_results(&main, &additional);
        log::info!(
            "[{}] Incremental against '{}': {} of {} errors are new",
            self.run_id,
            base_ref,
            diff.errors.len(),
            additional.errors.len()
        );
        Ok(diff)
    }

    fn run<S: AsRef<str>>(
        &self,
        branch: Option<&str>,
        remote_reset: bool,
        selectors: &[S],
        validator: &dyn Validator,
    ) -> Result<ValidationResult, SpectralError> {
        let selectors = SelectorSet::parse(selectors)?;
        let started = Instant::now();
        log::info!(
            "[{}] Starting {} validation of '{}'",
            self.run_id,
            validator.kind(),
            self.project
        );

        let _guard = BranchGuard::enter(self.branches, branch, remote_reset)?;
        let _dependents = DependentBranches::pin(self.backend, &self.project)?;
        let mut project = build_project(self.backend, &self.project, &selectors)?;
        let outcomes = validator.validate(&project)?;
        apply_outcomes(&mut project, outcomes);
        let result = ValidationResult::from_project(&project);

        log::info!(
            "[{}] {} validation {} in {:.2}s: {} explores tested, {} failed, {} errors",
            self.run_id,
            validator.kind(),
            result.status,
            started.elapsed().as_secs_f64(),
            result.tested.len(),
            result.failed_count(),
            result.errors.len()
        );
        Ok(result)
    }
}
