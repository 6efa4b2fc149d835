//! Replay backend driven by a JSON fixture document.
//!
//! The document describes a project tree, how generated queries behave,
//! content findings and data-test outcomes. Sections under `branches` replace
//! the top-level ones while that branch is checked out, so the same file can
//! model a baseline branch and a feature branch.

use crate::core::backend::{
    Backend, ContentFinding, DataTestDef, DataTestOutcome, ModelDef, QueryOutcome,
};
use crate::core::branch::BranchManager;
use crate::core::error::SpectralError;
use crate::core::project::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureProject {
    #[serde(default)]
    pub models: Vec<ModelDef>,
    /// Projects importing this one.
    #[serde(default)]
    pub dependents: Vec<String>,
}

/// Matches any generated query whose text contains `pattern`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRule {
    pub pattern: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    /// Simulated runtime in seconds.
    #[serde(default)]
    pub runtime: Option<f64>,
    /// Transport-level failure instead of a query error.
    #[serde(default)]
    pub fault: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureDataTest {
    #[serde(flatten)]
    pub def: DataTestDef,
    #[serde(default)]
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchOverride {
    #[serde(default)]
    pub queries: Option<Vec<QueryRule>>,
    #[serde(default)]
    pub content: Option<Vec<ContentFinding>>,
    #[serde(default)]
    pub data_tests: Option<Vec<FixtureDataTest>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureDocument {
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub auth_error: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub projects: BTreeMap<String, FixtureProject>,
    #[serde(default)]
    pub queries: Vec<QueryRule>,
    #[serde(default)]
    pub content: Vec<ContentFinding>,
    #[serde(default)]
    pub data_tests: Vec<FixtureDataTest>,
    #[serde(default)]
    pub branches: BTreeMap<String, BranchOverride>,
}

pub struct FixtureBackend {
    doc: FixtureDocument,
    branch: Mutex<String>,
    events: Mutex<Vec<String>>,
}

impl FixtureBackend {
    pub fn new(doc: FixtureDocument) -> Self {
        let branch = Mutex::new(doc.default_branch.clone());
        Self {
            doc,
            branch,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, SpectralError> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn load(path: &Path) -> Result<Self, SpectralError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Branch operations applied so far, e.g. `checkout feature`,
    /// `reset feature`, `pin looker_hub`, `release looker_hub`.
    pub fn branch_events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: String) -> Result<(), SpectralError> {
        self.events
            .lock()
            .map(|mut e| e.push(event))
            .map_err(|_| SpectralError::BranchError("fixture event lock poisoned".to_string()))
    }

    fn active_branch(&self) -> Result<String, SpectralError> {
        self.branch
            .lock()
            .map(|b| b.clone())
            .map_err(|_| SpectralError::BranchError("fixture branch lock poisoned".to_string()))
    }

    fn overrides(&self) -> Result<Option<&BranchOverride>, SpectralError> {
        let branch = self.active_branch()?;
        Ok(self.doc.branches.get(&branch))
    }

    fn query_rules(&self) -> Result<&[QueryRule], SpectralError> {
        Ok(self
            .overrides()?
            .and_then(|o| o.queries.as_deref())
            .unwrap_or(self.doc.queries.as_slice()))
    }

    fn data_test_fixtures(&self) -> Result<&[FixtureDataTest], SpectralError> {
        Ok(self
            .overrides()?
            .and_then(|o| o.data_tests.as_deref())
            .unwrap_or(self.doc.data_tests.as_slice()))
    }
}

impl Backend for FixtureBackend {
    fn authenticate(&self) -> Result<(), SpectralError> {
        match &self.doc.auth_error {
            Some(msg) => Err(SpectralError::AuthenticationError(msg.clone())),
            None => Ok(()),
        }
    }

    fn models(&self, project: &str) -> Result<Vec<ModelDef>, SpectralError> {
        self.doc
            .projects
            .get(project)
            .map(|p| p.models.clone())
            .ok_or_else(|| SpectralError::NotFound(format!("project '{}'", project)))
    }

    fn explore_sql(
        &self,
        model: &str,
        explore: &str,
        dimensions: &[Dimension],
    ) -> Result<String, SpectralError> {
        let columns = dimensions
            .iter()
            .map(|d| if d.sql.is_empty() { d.name.as_str() } else { d.sql.as_str() })
            .collect::<Vec<_>>()
            .join(",\n  ");
        Ok(format!(
            "SELECT\n  {}\nFROM {}.{}\nLIMIT 0",
            columns, model, explore
        ))
    }

    fn explore_url(&self, model: &str, explore: &str) -> Option<String> {
        self.doc
            .base_url
            .as_ref()
            .map(|base| format!("{}/explore/{}/{}", base.trim_end_matches('/'), model, explore))
    }

    fn run_query(&self, sql: &str) -> Result<QueryOutcome, SpectralError> {
        let mut runtime = 0.0f64;
        let mut failure: Option<(&str, Option<u32>)> = None;
        for rule in self.query_rules()?.iter().filter(|r| sql.contains(&r.pattern)) {
            if let Some(fault) = &rule.fault {
                return Err(SpectralError::BackendError(fault.clone()));
            }
            runtime = runtime.max(rule.runtime.unwrap_or(0.0));
            if failure.is_none() {
                if let Some(msg) = &rule.error {
                    failure = Some((msg.as_str(), rule.line));
                }
            }
        }
        let runtime = Duration::try_from_secs_f64(runtime.max(0.0)).map_err(|e| {
            SpectralError::ConfigError(format!("fixture runtime {} is out of range: {}", runtime, e))
        })?;
        Ok(match failure {
            Some((message, line_number)) => QueryOutcome::Error {
                message: message.to_string(),
                line_number,
                runtime,
            },
            None => QueryOutcome::Success { runtime },
        })
    }

    fn content_validation(&self) -> Result<Vec<ContentFinding>, SpectralError> {
        Ok(self
            .overrides()?
            .and_then(|o| o.content.clone())
            .unwrap_or_else(|| self.doc.content.clone()))
    }

    fn data_tests(&self, project: &str) -> Result<Vec<DataTestDef>, SpectralError> {
        if !self.doc.projects.contains_key(project) {
            return Err(SpectralError::NotFound(format!("project '{}'", project)));
        }
        Ok(self
            .data_test_fixtures()?
            .iter()
            .map(|t| t.def.clone())
            .collect())
    }

    fn run_data_test(&self, _project: &str, name: &str) -> Result<DataTestOutcome, SpectralError> {
        self.data_test_fixtures()?
            .iter()
            .find(|t| t.def.name == name)
            .map(|t| DataTestOutcome {
                name: name.to_string(),
                failures: t.failures.clone(),
            })
            .ok_or_else(|| SpectralError::NotFound(format!("data test '{}'", name)))
    }

    fn dependent_projects(&self, project: &str) -> Result<Vec<String>, SpectralError> {
        self.doc
            .projects
            .get(project)
            .map(|p| p.dependents.clone())
            .ok_or_else(|| SpectralError::NotFound(format!("project '{}'", project)))
    }

    fn pin_dependent_branches(&self, dependents: &[String]) -> Result<(), SpectralError> {
        for dependent in dependents {
            self.record(format!("pin {}", dependent))?;
        }
        Ok(())
    }

    fn release_dependent_branches(&self, dependents: &[String]) -> Result<(), SpectralError> {
        for dependent in dependents {
            self.record(format!("release {}", dependent))?;
        }
        Ok(())
    }
}

impl BranchManager for FixtureBackend {
    fn current_ref(&self) -> Result<String, SpectralError> {
        self.active_branch()
    }

    fn checkout(&self, reference: &str) -> Result<(), SpectralError> {
        let mut branch = self
            .branch
            .lock()
            .map_err(|_| SpectralError::BranchError("fixture branch lock poisoned".to_string()))?;
        *branch = reference.to_string();
        drop(branch);
        self.record(format!("checkout {}", reference))
    }

    /// There is no remote to pull from; the reset is only recorded.
    fn reset_to_remote(&self, reference: &str) -> Result<(), SpectralError> {
        self.record(format!("reset {}", reference))
    }
}
