//! Project tree: models own explores, explores accumulate validation state.
//!
//! A tree is built fresh for every validation run, receives the outcomes of
//! exactly one validator, and is flattened into a `ValidationResult`.

use crate::core::error::SpectralError;
use crate::core::validation_error::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single dimension exposed by an explore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    /// SQL expression generated for the dimension.
    #[serde(default)]
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Explore {
    pub name: String,
    pub dimensions: Vec<Dimension>,
    /// Set once a validator has actually exercised this explore.
    pub queried: bool,
    pub errors: Vec<ValidationError>,
}

impl Explore {
    pub fn new(name: impl Into<String>, dimensions: Vec<Dimension>) -> Self {
        Self {
            name: name.into(),
            dimensions,
            queried: false,
            errors: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub explores: Vec<Explore>,
}

impl Model {
    pub fn new(name: impl Into<String>, explores: Vec<Explore>) -> Self {
        Self {
            name: name.into(),
            explores,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    pub models: Vec<Model>,
}

impl Project {
    pub fn new(name: impl Into<String>, models: Vec<Model>) -> Self {
        Self {
            name: name.into(),
            models,
        }
    }

    /// Iterate `(model_index, explore_index, model, explore)` in tree order.
    pub fn iter_explores(&self) -> impl Iterator<Item = (usize, usize, &Model, &Explore)> {
        self.models.iter().enumerate().flat_map(|(mi, model)| {
            model
                .explores
                .iter()
                .enumerate()
                .map(move |(ei, explore)| (mi, ei, model, explore))
        })
    }

    pub fn explore_count(&self) -> usize {
        self.models.iter().map(|m| m.explores.len()).sum()
    }

    /// Locate an explore by name, returning its tree indices.
    pub fn find_explore(&self, model: &str, explore: &str) -> Option<(usize, usize)> {
        let mi = self.models.iter().position(|m| m.name == model)?;
        let ei = self.models[mi]
            .explores
            .iter()
            .position(|e| e.name == explore)?;
        Some((mi, ei))
    }

    pub fn passed(&self) -> bool {
        self.iter_explores().all(|(_, _, _, e)| e.passed())
    }
}

/// One `model/explore` selector, with `*` wildcards on either side.
#[derive(Debug, Clone)]
pub struct Selector {
    model: Regex,
    explore: Regex,
    pub exclude: bool,
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, SpectralError> {
        let trimmed = raw.trim();
        let (exclude, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (model, explore) = body
            .split_once('/')
            .ok_or_else(|| SpectralError::InvalidSelector(raw.to_string()))?;
        if model.is_empty() || explore.is_empty() || explore.contains('/') {
            return Err(SpectralError::InvalidSelector(raw.to_string()));
        }
        Ok(Self {
            model: wildcard_regex(model)?,
            explore: wildcard_regex(explore)?,
            exclude,
        })
    }

    pub fn matches(&self, model: &str, explore: &str) -> bool {
        self.model.is_match(model) && self.explore.is_match(explore)
    }
}

fn wildcard_regex(pattern: &str) -> Result<Regex, SpectralError> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body)).map_err(|_| SpectralError::InvalidSelector(pattern.into()))
}

/// Parsed include/exclude selector set. No includes means everything.
#[derive(Debug, Clone, Default)]
pub struct SelectorSet {
    includes: Vec<Selector>,
    excludes: Vec<Selector>,
}

impl SelectorSet {
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, SpectralError> {
        let mut set = SelectorSet::default();
        for item in raw {
            let selector = Selector::parse(item.as_ref())?;
            if selector.exclude {
                set.excludes.push(selector);
            } else {
                set.includes.push(selector);
            }
        }
        Ok(set)
    }

    pub fn is_selected(&self, model: &str, explore: &str) -> bool {
        if self.excludes.iter().any(|s| s.matches(model, explore)) {
            return false;
        }
        self.includes.is_empty() || self.includes.iter().any(|s| s.matches(model, explore))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_wildcards() {
        let set = SelectorSet::parse(&["eye_exam/users*"]).unwrap();
        assert!(set.is_selected("eye_exam", "users"));
        assert!(set.is_selected("eye_exam", "users__fail"));
        assert!(!set.is_selected("eye_exam", "orders"));
        assert!(!set.is_selected("other", "users"));
    }

    #[test]
    fn test_empty_selectors_match_everything() {
        let set = SelectorSet::parse::<&str>(&[]).unwrap();
        assert!(set.is_selected("any", "thing"));
    }

    #[test]
    fn test_exclusion_wins() {
        let set = SelectorSet::parse(&["*/*", "-eye_exam/users__fail"]).unwrap();
        assert!(set.is_selected("eye_exam", "users"));
        assert!(!set.is_selected("eye_exam", "users__fail"));
    }

    #[test]
    fn test_only_exclusions_select_the_rest() {
        let set = SelectorSet::parse(&["-ecommerce/*"]).unwrap();
        assert!(!set.is_selected("ecommerce", "orders"));
        assert!(set.is_selected("eye_exam", "users"));
    }

    #[test]
    fn test_malformed_selector_rejected() {
        assert!(matches!(
            Selector::parse("no_slash"),
            Err(SpectralError::InvalidSelector(_))
        ));
        assert!(Selector::parse("a/b/c").is_err());
        assert!(Selector::parse("/b").is_err());
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let set = SelectorSet::parse(&["model.v2/orders"]).unwrap();
        assert!(set.is_selected("model.v2", "orders"));
        assert!(!set.is_selected("modelxv2", "orders"));
    }

    #[test]
    fn test_tree_order_and_lookup() {
        let project = Project::new(
            "p",
            vec![
                Model::new("a", vec![Explore::new("x", vec![]), Explore::new("y", vec![])]),
                Model::new("b", vec![Explore::new("z", vec![])]),
            ],
        );
        let names: Vec<_> = project
            .iter_explores()
            .map(|(_, _, m, e)| format!("{}/{}", m.name, e.name))
            .collect();
        assert_eq!(names, vec!["a/x", "a/y", "b/z"]);
        assert_eq!(project.find_explore("b", "z"), Some((1, 0)));
        assert_eq!(project.find_explore("b", "x"), None);
        assert_eq!(project.explore_count(), 3);
        assert!(project.passed());
    }
}
