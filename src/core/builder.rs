use crate::core::backend::Backend;
use crate::core::error::SpectralError;
use crate::core::project::{Explore, Model, Project, SelectorSet};

/// Build the project tree, keeping only explores the selectors pick.
///
/// Models left without explores are dropped. A project with nothing selected
/// is an error rather than a silently empty run.
pub fn build_project(
    backend: &dyn Backend,
    project: &str,
    selectors: &SelectorSet,
) -> Result<Project, SpectralError> {
    let models: Vec<Model> = backend
        .models(project)?
        .into_iter()
        .filter_map(|model| {
            let explores: Vec<Explore> = model
                .explores
                .into_iter()
                .filter(|e| selectors.is_selected(&model.name, &e.name))
                .map(|e| Explore::new(e.name, e.dimensions))
                .collect();
            (!explores.is_empty()).then(|| Model::new(model.name, explores))
        })
        .collect();

    if models.is_empty() {
        return Err(SpectralError::NotFound(format!(
            "no explores in project '{}' match the given selectors",
            project
        )));
    }

    let built = Project::new(project, models);
    log::debug!(
        "Built project '{}': {} models, {} explores",
        built.name,
        built.models.len(),
        built.explore_count()
    );
    Ok(built)
}
