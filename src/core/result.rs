//! Canonical validation result and the incremental diff engine.
//!
//! Every validator converges on [`ValidationResult`]; it is the only value
//! exchanged between the runner, the diff engine and the renderers.

use crate::core::project::Project;
use crate::core::validation_error::ErrorRecord;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestedExplore {
    pub model: String,
    pub explore: String,
    pub passed: bool,
}

impl TestedExplore {
    pub fn new(model: impl Into<String>, explore: impl Into<String>, passed: bool) -> Self {
        Self {
            model: model.into(),
            explore: explore.into(),
            passed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: Status,
    pub tested: Vec<TestedExplore>,
    pub errors: Vec<ErrorRecord>,
}

impl ValidationResult {
    /// Flatten a validated tree. Only explores a validator visited are listed.
    pub fn from_project(project: &Project) -> Self {
        let mut tested = Vec::new();
        let mut errors = Vec::new();
        for (_, _, model, explore) in project.iter_explores() {
            if !explore.queried {
                continue;
            }
            tested.push(TestedExplore::new(&model.name, &explore.name, explore.passed()));
            errors.extend(explore.errors.iter().map(|e| e.to_record()));
        }
        let status = if errors.is_empty() {
            Status::Passed
        } else {
            Status::Failed
        };
        Self {
            status,
            tested,
            errors,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }

    pub fn failed_count(&self) -> usize {
        self.tested.iter().filter(|t| !t.passed).count()
    }

    /// Whether `status`, `errors` and `tested` agree with each other.
    pub fn is_consistent(&self) -> bool {
        let failed = self.status == Status::Failed;
        failed == !self.errors.is_empty() && failed == self.tested.iter().any(|t| !t.passed)
    }
}

/// Reduce `additional` to the errors that `main` does not already contain.
///
/// Pass flags on `additional.tested` are recomputed from the surviving
/// errors; explores only present in `main` are dropped.
pub fn incremental_results(main: &ValidationResult, additional: &ValidationResult) -> ValidationResult {
    let baseline: FxHashSet<String> = main.errors.iter().map(ErrorRecord::identity_key).collect();

    let new_errors: Vec<ErrorRecord> = additional
        .errors
        .iter()
        .filter(|e| !baseline.contains(&e.identity_key()))
        .cloned()
        .collect();

    let failing: FxHashSet<(&str, &str)> = new_errors
        .iter()
        .map(|e| (e.model.as_str(), e.explore.as_str()))
        .collect();

    let tested = additional
        .tested
        .iter()
        .map(|t| {
            let passed = !failing.contains(&(t.model.as_str(), t.explore.as_str()));
            TestedExplore::new(&t.model, &t.explore, passed)
        })
        .collect();

    let status = if new_errors.is_empty() {
        Status::Passed
    } else {
        Status::Failed
    };

    ValidationResult {
        status,
        tested,
        errors: new_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::{Explore, Model};
    use crate::core::validation_error::{DataTestError, ValidationError};

    fn data_test_error(explore: &str, message: &str) -> ValidationError {
        ValidationError::DataTest(DataTestError {
            model: "eye_exam".into(),
            explore: explore.into(),
            message: message.into(),
            test_name: "t".into(),
            file_path: "f.lkml".into(),
            line_number: None,
        })
    }

    #[test]
    fn test_from_project_skips_unqueried_explores() {
        let mut users = Explore::new("users", vec![]);
        users.queried = true;
        let mut failing = Explore::new("users__fail", vec![]);
        failing.queried = true;
        failing.errors.push(data_test_error("users__fail", "first"));
        failing.errors.push(data_test_error("users__fail", "second"));
        let untouched = Explore::new("orders", vec![]);
        let project = Project::new(
            "eye_exam",
            vec![Model::new("eye_exam", vec![users, untouched, failing])],
        );

        let result = ValidationResult::from_project(&project);
        assert_eq!(result.status, Status::Failed);
        assert_eq!(
            result.tested,
            vec![
                TestedExplore::new("eye_exam", "users", true),
                TestedExplore::new("eye_exam", "users__fail", false),
            ]
        );
        let messages: Vec<_> = result.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert!(result.is_consistent());
        assert_eq!(result.failed_count(), 1);
    }

    #[test]
    fn test_empty_project_passes() {
        let result = ValidationResult::from_project(&Project::new("p", vec![]));
        assert!(result.passed());
        assert!(result.tested.is_empty());
        assert!(result.is_consistent());
    }

    #[test]
    fn test_wire_shape() {
        let result = ValidationResult {
            status: Status::Failed,
            tested: vec![TestedExplore::new("m", "e", false)],
            errors: vec![ErrorRecord::new("m", "e", "boom")],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["tested"][0]["passed"], false);
        assert!(value["errors"][0]["test"].is_null());
        assert!(value["errors"][0]["metadata"].is_object());
    }

    #[test]
    fn test_incremental_keeps_duplicate_new_errors() {
        let main = ValidationResult {
            status: Status::Passed,
            tested: vec![TestedExplore::new("m", "e", true)],
            errors: vec![],
        };
        let dup = ErrorRecord::new("m", "e", "boom");
        let additional = ValidationResult {
            status: Status::Failed,
            tested: vec![TestedExplore::new("m", "e", false)],
            errors: vec![dup.clone(), dup.clone()],
        };
        let diff = incremental_results(&main, &additional);
        assert_eq!(diff.errors, vec![dup.clone(), dup]);
        assert!(diff.is_consistent());
    }

    #[test]
    fn test_incremental_distinguishes_by_test_field() {
        let base = ErrorRecord::new("m", "e", "boom");
        let main = ValidationResult {
            status: Status::Failed,
            tested: vec![TestedExplore::new("m", "e", false)],
            errors: vec![base.clone()],
        };
        let additional = ValidationResult {
            status: Status::Failed,
            tested: vec![TestedExplore::new("m", "e", false)],
            errors: vec![base, ErrorRecord::new("m", "e", "boom").with_test("dim")],
        };
        let diff = incremental_results(&main, &additional);
        assert_eq!(diff.errors.len(), 1);
        assert_eq!(diff.errors[0].test.as_deref(), Some("dim"));
        assert_eq!(diff.tested, vec![TestedExplore::new("m", "e", false)]);
    }
}
