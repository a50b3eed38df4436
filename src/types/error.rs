use std::fmt;

use thiserror::Error;

/// One offending field in a rule document.
///
/// `path` is dot-separated from the document root, e.g. `rules.0.target.web`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    pub(crate) fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A rule document failed schema validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid rule document: {}", join_issues(issues))]
    Invalid { issues: Vec<SchemaIssue> },

    #[error("rule document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// The offending field paths, empty for [`ConfigError::Json`].
    #[must_use]
    pub fn issues(&self) -> &[SchemaIssue] {
        match self {
            ConfigError::Invalid { issues } => issues,
            ConfigError::Json(_) => &[],
        }
    }
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
