//! Content validator: checks that saved dashboards and looks only reference
//! fields that still exist.
//!
//! The backend validates all content in one call, so every selected explore
//! counts as queried.

use crate::core::backend::{Backend, ContentFinding};
use crate::core::error::SpectralError;
use crate::core::project::Project;
use crate::core::validation_error::{ContentError, ValidationError};
use crate::plugins::{ExploreOutcome, Validator, ValidatorKind};

#[derive(Debug, Clone, Default)]
pub struct ContentOptions {
    /// Ignore content living in users' personal folders.
    pub exclude_personal: bool,
}

pub struct ContentValidator<'a> {
    backend: &'a dyn Backend,
    options: ContentOptions,
}

impl<'a> ContentValidator<'a> {
    pub fn new(backend: &'a dyn Backend, options: ContentOptions) -> Self {
        Self { backend, options }
    }

    fn to_error(finding: ContentFinding) -> ValidationError {
        ValidationError::Content(ContentError {
            model: finding.model,
            explore: finding.explore,
            message: finding.message,
            field_name: finding.field_name,
            content_type: finding.content_type,
            title: finding.title,
            folder: finding.folder,
            url: finding.url,
            tile_type: finding.tile_type,
        })
    }
}

impl Validator for ContentValidator<'_> {
    fn kind(&self) -> ValidatorKind {
        ValidatorKind::Content
    }

    fn validate(&self, project: &Project) -> Result<Vec<ExploreOutcome>, SpectralError> {
        let mut outcomes: Vec<ExploreOutcome> = project
            .iter_explores()
            .map(|(mi, ei, _, _)| ExploreOutcome::passed(mi, ei))
            .collect();

        let findings = self.backend.content_validation()?;
        let total = findings.len();
        let mut skipped_personal = 0usize;
        let mut outside = 0usize;

        for finding in findings {
            if self.options.exclude_personal && finding.personal {
                skipped_personal += 1;
                continue;
            }
            let Some((mi, ei)) = project.find_explore(&finding.model, &finding.explore) else {
                outside += 1;
                continue;
            };
            // Outcomes are in tree order; locate the slot for this explore.
            if let Some(slot) = outcomes
                .iter_mut()
                .find(|o| o.model_index == mi && o.explore_index == ei)
            {
                slot.errors.push(Self::to_error(finding));
            }
        }

        log::info!(
            "Content validation: {} findings, {} in personal folders skipped, {} outside selection",
            total,
            skipped_personal,
            outside
        );
        Ok(outcomes)
    }
}
