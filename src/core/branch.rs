//! Branch scoping for validation runs.
//!
//! A [`BranchGuard`] checks out the working ref on entry and restores the
//! previous ref when dropped, on success, error and unwind alike.
//! [`DependentBranches`] does the same for projects that import the one
//! under validation.

use crate::core::backend::Backend;
use crate::core::error::SpectralError;
use std::path::{Path, PathBuf};
use std::process::Command;

pub trait BranchManager: Sync {
    fn current_ref(&self) -> Result<String, SpectralError>;

    fn checkout(&self, reference: &str) -> Result<(), SpectralError>;

    /// Discard local state on `reference` and move it to its remote head.
    fn reset_to_remote(&self, reference: &str) -> Result<(), SpectralError>;
}

/// Leaves whatever ref is active untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBranchManager;

impl BranchManager for NoopBranchManager {
    fn current_ref(&self) -> Result<String, SpectralError> {
        Ok("HEAD".to_string())
    }

    fn checkout(&self, _reference: &str) -> Result<(), SpectralError> {
        Ok(())
    }

    fn reset_to_remote(&self, _reference: &str) -> Result<(), SpectralError> {
        Ok(())
    }
}

/// Switches refs in a local git checkout.
#[derive(Debug, Clone)]
pub struct GitBranchManager {
    repo_root: PathBuf,
}

impl GitBranchManager {
    pub fn new(repo_root: impl AsRef<Path>) -> Self {
        Self {
            repo_root: repo_root.as_ref().to_path_buf(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<String, SpectralError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(args)
            .output()
            .map_err(SpectralError::IoError)?;
        if !output.status.success() {
            return Err(SpectralError::BranchError(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl BranchManager for GitBranchManager {
    fn current_ref(&self) -> Result<String, SpectralError> {
        let branch = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch == "HEAD" {
            // Detached; restore by commit.
            return self.git(&["rev-parse", "HEAD"]);
        }
        Ok(branch)
    }

    fn checkout(&self, reference: &str) -> Result<(), SpectralError> {
        self.git(&["checkout", "--quiet", reference]).map(|_| ())
    }

    fn reset_to_remote(&self, reference: &str) -> Result<(), SpectralError> {
        self.git(&["fetch", "--quiet", "origin", reference])?;
        let remote = format!("origin/{}", reference);
        self.git(&["reset", "--quiet", "--hard", &remote]).map(|_| ())
    }
}

pub struct BranchGuard<'a> {
    manager: &'a dyn BranchManager,
    previous: Option<String>,
}

impl<'a> BranchGuard<'a> {
    /// Check out `target` if given. With no target and no reset the guard is
    /// inert.
    ///
    /// With `remote_reset` the validated ref (`target`, or the current ref)
    /// is reset to its remote after checkout.
    pub fn enter(
        manager: &'a dyn BranchManager,
        target: Option<&str>,
        remote_reset: bool,
    ) -> Result<Self, SpectralError> {
        let mut guard = Self {
            manager,
            previous: None,
        };
        if let Some(target) = target {
            let previous = manager.current_ref()?;
            if previous == target {
                log::debug!("Already on '{}', nothing to check out", target);
            } else {
                log::info!("Checking out '{}' (was '{}')", target, previous);
                manager.checkout(target)?;
                guard.previous = Some(previous);
            }
        }
        if remote_reset {
            let reference = match target {
                Some(target) => target.to_string(),
                None => manager.current_ref()?,
            };
            log::info!("Resetting '{}' to its remote", reference);
            manager.reset_to_remote(&reference)?;
        }
        Ok(guard)
    }

    pub fn restores_to(&self) -> Option<&str> {
        self.previous.as_deref()
    }
}

impl Drop for BranchGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            log::info!("Restoring '{}'", previous);
            if let Err(err) = self.manager.checkout(&previous) {
                log::error!("Failed to restore '{}': {}", previous, err);
            }
        }
    }
}

/// Pins the branches of dependent projects for the lifetime of a run.
pub struct DependentBranches<'a> {
    backend: &'a dyn Backend,
    dependents: Vec<String>,
}

impl<'a> DependentBranches<'a> {
    pub fn pin(backend: &'a dyn Backend, project: &str) -> Result<Self, SpectralError> {
        let dependents = backend.dependent_projects(project)?;
        if !dependents.is_empty() {
            log::info!(
                "Pinning branches of {} dependent projects: {}",
                dependents.len(),
                dependents.join(", ")
            );
            backend.pin_dependent_branches(&dependents)?;
        }
        Ok(Self {
            backend,
            dependents,
        })
    }
}

impl Drop for DependentBranches<'_> {
    fn drop(&mut self) {
        if self.dependents.is_empty() {
            return;
        }
        log::info!("Releasing dependent project branches");
        if let Err(err) = self.backend.release_dependent_branches(&self.dependents) {
            log::error!("Failed to release dependent branches: {}", err);
        }
    }
}
