//! Validator strategies.
//!
//! A validator inspects a filtered project tree and reports what it found as
//! an explicit outcome list. It never touches the tree; the runner folds the
//! outcomes in afterwards.

pub mod content;
pub mod data_test;
pub mod sql;

use crate::core::error::SpectralError;
use crate::core::project::Project;
use crate::core::validation_error::ValidationError;
use serde::{Deserialize, Serialize};

pub use content::{ContentOptions, ContentValidator};
pub use data_test::DataTestValidator;
pub use sql::{SqlMode, SqlOptions, SqlValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    Sql,
    Content,
    DataTests,
}

impl std::fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sql => write!(f, "sql"),
            Self::Content => write!(f, "content"),
            Self::DataTests => write!(f, "data_tests"),
        }
    }
}

/// What a validator observed for one explore it exercised.
///
/// Explores absent from the outcome list were not queried.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreOutcome {
    pub model_index: usize,
    pub explore_index: usize,
    pub errors: Vec<ValidationError>,
}

impl ExploreOutcome {
    pub fn passed(model_index: usize, explore_index: usize) -> Self {
        Self {
            model_index,
            explore_index,
            errors: Vec::new(),
        }
    }
}

pub trait Validator {
    fn kind(&self) -> ValidatorKind;

    fn validate(&self, project: &Project) -> Result<Vec<ExploreOutcome>, SpectralError>;
}

/// Fold outcomes into the tree: mark explores queried and append errors.
pub fn apply_outcomes(project: &mut Project, outcomes: Vec<ExploreOutcome>) {
    for outcome in outcomes {
        let Some(explore) = project
            .models
            .get_mut(outcome.model_index)
            .and_then(|m| m.explores.get_mut(outcome.explore_index))
        else {
            log::warn!(
                "Dropping outcome for unknown explore index {}/{}",
                outcome.model_index,
                outcome.explore_index
            );
            continue;
        };
        explore.queried = true;
        explore.errors.extend(outcome.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::{Explore, Model};
    use crate::core::validation_error::DataTestError;

    #[test]
    fn test_apply_outcomes_marks_only_visited() {
        let mut project = Project::new(
            "p",
            vec![Model::new(
                "m",
                vec![Explore::new("a", vec![]), Explore::new("b", vec![])],
            )],
        );
        let err = ValidationError::DataTest(DataTestError {
            model: "m".into(),
            explore: "b".into(),
            message: "nope".into(),
            test_name: "t".into(),
            file_path: "f".into(),
            line_number: None,
        });
        apply_outcomes(
            &mut project,
            vec![
                ExploreOutcome {
                    model_index: 0,
                    explore_index: 1,
                    errors: vec![err.clone()],
                },
                ExploreOutcome::passed(3, 0),
            ],
        );
        let a = &project.models[0].explores[0];
        let b = &project.models[0].explores[1];
        assert!(!a.queried && a.passed());
        assert!(b.queried && !b.passed());
        assert_eq!(b.errors, vec![err]);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ValidatorKind::DataTests.to_string(), "data_tests");
        assert_eq!(ValidatorKind::Sql.to_string(), "sql");
    }
}
