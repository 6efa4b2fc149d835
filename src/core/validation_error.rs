//! Validator-specific error variants and their canonical projection.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Free-form error metadata. Key order carries no meaning.
pub type Metadata = BTreeMap<String, Value>;

/// The canonical error shape shared by every validator.
///
/// Two records are the same error iff all five fields are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub model: String,
    pub explore: String,
    pub test: Option<String>,
    pub message: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ErrorRecord {
    pub fn new(model: impl Into<String>, explore: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            explore: explore.into(),
            test: None,
            message: message.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_test(mut self, test: impl Into<String>) -> Self {
        self.test = Some(test.into());
        self
    }

    /// Stable textual key for set membership, covering all five fields.
    /// `Metadata` is ordered, so equal records always produce equal keys.
    pub fn identity_key(&self) -> String {
        let mut key = format!(
            "{:?}\u{1f}{:?}\u{1f}{:?}\u{1f}{:?}",
            self.model, self.explore, self.test, self.message
        );
        for (name, value) in &self.metadata {
            key.push_str(&format!("\u{1f}{:?}={}", name, value));
        }
        key
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlError {
    pub model: String,
    pub explore: String,
    /// Set when the failure was pinned to a single dimension.
    pub dimension: Option<String>,
    pub sql: String,
    pub message: String,
    pub line_number: Option<u32>,
    pub explore_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Dashboard,
    Look,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "dashboard"),
            Self::Look => write!(f, "look"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentError {
    pub model: String,
    pub explore: String,
    pub message: String,
    pub field_name: String,
    pub content_type: ContentType,
    pub title: String,
    pub folder: Option<String>,
    pub url: String,
    pub tile_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTestError {
    pub model: String,
    pub explore: String,
    pub message: String,
    pub test_name: String,
    pub file_path: String,
    pub line_number: Option<u32>,
}

/// A single explore-scoped failure, tagged by the validator that found it.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Sql(SqlError),
    Content(ContentError),
    DataTest(DataTestError),
}

impl ValidationError {
    pub fn model(&self) -> &str {
        match self {
            Self::Sql(e) => &e.model,
            Self::Content(e) => &e.model,
            Self::DataTest(e) => &e.model,
        }
    }

    pub fn explore(&self) -> &str {
        match self {
            Self::Sql(e) => &e.explore,
            Self::Content(e) => &e.explore,
            Self::DataTest(e) => &e.explore,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Sql(e) => &e.message,
            Self::Content(e) => &e.message,
            Self::DataTest(e) => &e.message,
        }
    }

    /// Project onto the canonical record; variant fields land in `metadata`.
    pub fn to_record(&self) -> ErrorRecord {
        let mut metadata = Metadata::new();
        let test = match self {
            Self::Sql(e) => {
                metadata.insert("sql".into(), json!(e.sql));
                if let Some(line) = e.line_number {
                    metadata.insert("line_number".into(), json!(line));
                }
                if let Some(url) = &e.explore_url {
                    metadata.insert("explore_url".into(), json!(url));
                }
                e.dimension.clone()
            }
            Self::Content(e) => {
                metadata.insert("field_name".into(), json!(e.field_name));
                metadata.insert("content_type".into(), json!(e.content_type.to_string()));
                metadata.insert("title".into(), json!(e.title));
                metadata.insert("url".into(), json!(e.url));
                if let Some(folder) = &e.folder {
                    metadata.insert("folder".into(), json!(folder));
                }
                if let Some(tile) = &e.tile_type {
                    metadata.insert("tile_type".into(), json!(tile));
                }
                None
            }
            Self::DataTest(e) => {
                metadata.insert("test_name".into(), json!(e.test_name));
                metadata.insert("file_path".into(), json!(e.file_path));
                if let Some(line) = e.line_number {
                    metadata.insert("line_number".into(), json!(line));
                }
                Some(e.test_name.clone())
            }
        };
        ErrorRecord {
            model: self.model().to_string(),
            explore: self.explore().to_string(),
            test,
            message: self.message().to_string(),
            metadata,
        }
    }
}
