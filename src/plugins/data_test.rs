//! Data-test validator: runs the project's declared data tests.
//!
//! Only explores with at least one test are queried. Tests run in parallel;
//! results are collected back in declaration order.

use crate::core::backend::{Backend, DataTestDef};
use crate::core::error::SpectralError;
use crate::core::project::Project;
use crate::core::validation_error::{DataTestError, ValidationError};
use crate::plugins::{ExploreOutcome, Validator, ValidatorKind};
use rayon::prelude::*;

pub struct DataTestValidator<'a> {
    backend: &'a dyn Backend,
}

impl<'a> DataTestValidator<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Pair each test that targets a selected explore with its tree indices.
    fn selected_tests(&self, project: &Project) -> Result<Vec<(usize, usize, DataTestDef)>, SpectralError> {
        let mut selected = Vec::new();
        for test in self.backend.data_tests(&project.name)? {
            match project.find_explore(&test.model, &test.explore) {
                Some((mi, ei)) => selected.push((mi, ei, test)),
                None => log::debug!(
                    "Skipping data test '{}' on unselected explore {}/{}",
                    test.name,
                    test.model,
                    test.explore
                ),
            }
        }
        Ok(selected)
    }
}

impl Validator for DataTestValidator<'_> {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::DataTests
    }

    fn validate(&self, project: &Project) -> Result<Vec<ExploreOutcome>, SpectralError> {
        let tests = self.selected_tests(project)?;
        log::info!("Running {} data tests", tests.len());

        let results: Vec<Result<Vec<ValidationError>, SpectralError>> = tests
            .par_iter()
            .map(|(_, _, test)| -> Result<Vec<ValidationError>, SpectralError> {
                let outcome = self.backend.run_data_test(&project.name, &test.name)?;
                Ok(outcome
                    .failures
                    .into_iter()
                    .map(|message| {
                        ValidationError::DataTest(DataTestError {
                            model: test.model.clone(),
                            explore: test.explore.clone(),
                            message,
                            test_name: test.name.clone(),
                            file_path: test.file.clone(),
                            line_number: test.line,
                        })
                    })
                    .collect())
            })
            .collect();

        let mut outcomes: Vec<ExploreOutcome> = Vec::new();
        for ((mi, ei, _), errors) in tests.iter().zip(results) {
            let errors = errors?;
            match outcomes
                .iter_mut()
                .find(|o| o.model_index == *mi && o.explore_index == *ei)
            {
                Some(slot) => slot.errors.extend(errors),
                None => outcomes.push(ExploreOutcome {
                    model_index: *mi,
                    explore_index: *ei,
                    errors,
                }),
            }
        }
        outcomes.sort_by_key(|o| (o.model_index, o.explore_index));
        Ok(outcomes)
    }
}
