//! Run configuration loaded from `spectral.toml`.
//!
//! Every field is optional; command-line flags override file values and
//! missing values fall back to validator defaults.

use crate::core::error::SpectralError;
use crate::plugins::{ContentOptions, SqlMode, SqlOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "spectral.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqlConfig {
    pub mode: Option<SqlMode>,
    pub concurrency: Option<usize>,
    pub fail_fast: Option<bool>,
    pub profile: Option<bool>,
    /// Seconds.
    pub runtime_threshold: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    pub exclude_personal: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub project: Option<String>,
    pub branch: Option<String>,
    pub base_ref: Option<String>,
    pub fixture: Option<PathBuf>,
    pub git_dir: Option<PathBuf>,
    /// Reset the working branch to its remote before validating.
    pub remote_reset: Option<bool>,
    pub log_level: Option<String>,
    pub sql: SqlConfig,
    pub content: ContentConfig,
}

impl Config {
    pub fn parse(raw: &str) -> Result<Self, SpectralError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn sql_options(&self) -> SqlOptions {
        let defaults = SqlOptions::default();
        SqlOptions {
            mode: self.sql.mode.unwrap_or(defaults.mode),
            concurrency: self.sql.concurrency.unwrap_or(defaults.concurrency).max(1),
            fail_fast: self.sql.fail_fast.unwrap_or(defaults.fail_fast),
            profile: self.sql.profile.unwrap_or(defaults.profile),
            runtime_threshold: self
                .sql
                .runtime_threshold
                .map(Duration::from_secs)
                .unwrap_or(defaults.runtime_threshold),
        }
    }

    pub fn content_options(&self) -> ContentOptions {
        ContentOptions {
            exclude_personal: self.content.exclude_personal.unwrap_or(false),
        }
    }

    /// Resolve relative paths against the directory holding the config file.
    fn rebase(mut self, base: &Path) -> Self {
        if let Some(fixture) = self.fixture.take() {
            self.fixture = Some(if fixture.is_relative() {
                base.join(fixture)
            } else {
                fixture
            });
        }
        if let Some(git_dir) = self.git_dir.take() {
            self.git_dir = Some(if git_dir.is_relative() {
                base.join(git_dir)
            } else {
                git_dir
            });
        }
        self
    }
}

/// Load an explicit config file, or `spectral.toml` from `cwd` when present.
///
/// An explicit path that does not exist is an error; a missing default file
/// just yields the default config.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<Config, SpectralError> {
    let path = match explicit {
        Some(p) if !p.exists() => {
            return Err(SpectralError::NotFound(format!(
                "config file {}",
                p.display()
            )));
        }
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = cwd.join(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                return Ok(Config::default());
            }
            candidate
        }
    };

    let content = fs::read_to_string(&path)?;
    let config = Config::parse(&content)
        .map_err(|e| SpectralError::ConfigError(format!("{}: {}", path.display(), e)))?;
    log::debug!("Loaded config from {}", path.display());
    let base = path.parent().unwrap_or(cwd);
    Ok(config.rebase(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
project = "eye_exam"
branch = "feature/x"
base_ref = "main"
remote_reset = true

[sql]
mode = "batch"
concurrency = 4
fail_fast = true
runtime_threshold = 2

[content]
exclude_personal = true
"#,
        )
        .unwrap();
        assert_eq!(config.project.as_deref(), Some("eye_exam"));
        assert_eq!(config.remote_reset, Some(true));
        let sql = config.sql_options();
        assert_eq!(sql.mode, SqlMode::Batch);
        assert_eq!(sql.concurrency, 4);
        assert!(sql.fail_fast);
        assert!(!sql.profile);
        assert_eq!(sql.runtime_threshold, Duration::from_secs(2));
        assert!(config.content_options().exclude_personal);
    }

    #[test]
    fn test_defaults_apply() {
        let sql = Config::default().sql_options();
        assert_eq!(sql.mode, SqlMode::Hybrid);
        assert_eq!(sql.concurrency, 10);
        assert!(!Config::default().content_options().exclude_personal);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            Config::parse("projet = \"typo\""),
            Err(SpectralError::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_default_file_and_rebase_fixture() {
        let tmp = tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(DEFAULT_CONFIG_FILE),
            "fixture = \"fixture.json\"\n",
        )
        .unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.fixture, Some(tmp.path().join("fixture.json")));
    }

    #[test]
    fn test_missing_default_is_fine_but_missing_explicit_is_not() {
        let tmp = tempdir().expect("tempdir");
        assert_eq!(load_config(None, tmp.path()).unwrap(), Config::default());
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            load_config(Some(&missing), tmp.path()),
            Err(SpectralError::NotFound(_))
        ));
    }
}
