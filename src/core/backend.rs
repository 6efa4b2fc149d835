//! Backend capability consumed by the validators.
//!
//! Implementations own transport and authentication. Every call may fail with
//! a fault, which validators and the runner propagate unchanged.

use crate::core::error::SpectralError;
use crate::core::project::Dimension;
use crate::core::validation_error::ContentType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreDef {
    pub name: String,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    pub name: String,
    #[serde(default)]
    pub explores: Vec<ExploreDef>,
}

/// Outcome of executing one generated query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Success {
        runtime: Duration,
    },
    Error {
        message: String,
        line_number: Option<u32>,
        runtime: Duration,
    },
}

impl QueryOutcome {
    pub fn runtime(&self) -> Duration {
        match self {
            Self::Success { runtime } | Self::Error { runtime, .. } => *runtime,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A broken field reference found in saved content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFinding {
    pub model: String,
    pub explore: String,
    pub message: String,
    pub field_name: String,
    pub content_type: ContentType,
    pub title: String,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub personal: bool,
    pub url: String,
    #[serde(default)]
    pub tile_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTestDef {
    pub name: String,
    pub model: String,
    pub explore: String,
    pub file: String,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTestOutcome {
    pub name: String,
    /// One entry per failed assertion. Empty means the test passed.
    pub failures: Vec<String>,
}

impl DataTestOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

pub trait Backend: Send + Sync {
    fn authenticate(&self) -> Result<(), SpectralError>;

    fn models(&self, project: &str) -> Result<Vec<ModelDef>, SpectralError>;

    /// Generate the SQL selecting `dimensions` from an explore.
    fn explore_sql(
        &self,
        model: &str,
        explore: &str,
        dimensions: &[Dimension],
    ) -> Result<String, SpectralError>;

    fn explore_url(&self, _model: &str, _explore: &str) -> Option<String> {
        None
    }

    fn run_query(&self, sql: &str) -> Result<QueryOutcome, SpectralError>;

    fn content_validation(&self) -> Result<Vec<ContentFinding>, SpectralError>;

    fn data_tests(&self, project: &str) -> Result<Vec<DataTestDef>, SpectralError>;

    fn run_data_test(&self, project: &str, name: &str) -> Result<DataTestOutcome, SpectralError>;

    /// Projects that import `project` and must stay on a fixed branch while it
    /// is validated.
    fn dependent_projects(&self, _project: &str) -> Result<Vec<String>, SpectralError> {
        Ok(Vec::new())
    }

    fn pin_dependent_branches(&self, _dependents: &[String]) -> Result<(), SpectralError> {
        Ok(())
    }

    fn release_dependent_branches(&self, _dependents: &[String]) -> Result<(), SpectralError> {
        Ok(())
    }
}
