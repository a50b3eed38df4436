//! Sources of raw rule payloads.
//!
//! Loaders return unvalidated JSON; validation happens at the resolution
//! boundary. Retries, caching and transport policy belong to the loader.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("no rules found for id '{id}'")]
    NotFound { id: String },

    #[error("failed to read rules: {0}")]
    Io(#[from] std::io::Error),

    #[error("rules payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait RuleLoader: Send + Sync {
    /// Fetch the raw rule document for `id`.
    async fn load(&self, id: &str) -> Result<Value, LoaderError>;
}

/// Always returns the same payload, whatever the id.
#[derive(Debug, Clone)]
pub struct StaticLoader(pub Value);

#[async_trait]
impl RuleLoader for StaticLoader {
    async fn load(&self, _id: &str) -> Result<Value, LoaderError> {
        Ok(self.0.clone())
    }
}

/// Reads `<dir>/<id>.json`.
///
/// Ids containing path separators or `..` are treated as not found.
#[derive(Debug, Clone)]
pub struct FileLoader {
    dir: PathBuf,
}

impl FileLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl RuleLoader for FileLoader {
    async fn load(&self, id: &str) -> Result<Value, LoaderError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(LoaderError::NotFound { id: id.to_owned() });
        }
        let path = self.dir.join(format!("{id}.json"));
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoaderError::NotFound { id: id.to_owned() });
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), "loaded rules file");
        Ok(serde_json::from_str(&text)?)
    }
}

/// Adapts an async closure into a [`RuleLoader`].
pub struct FnLoader<F>(pub F);

#[async_trait]
impl<F, Fut> RuleLoader for FnLoader<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, LoaderError>> + Send,
{
    async fn load(&self, id: &str) -> Result<Value, LoaderError> {
        (self.0)(id.to_owned()).await
    }
}

impl<F> fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnLoader")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn static_loader_ignores_id() {
        let loader = StaticLoader(json!({"rules": []}));
        assert_eq!(loader.load("a").await.unwrap(), json!({"rules": []}));
        assert_eq!(loader.load("b").await.unwrap(), json!({"rules": []}));
    }

    #[tokio::test]
    async fn fn_loader_receives_id() {
        let loader = FnLoader(|id: String| async move {
            Ok::<Value, LoaderError>(json!({ "id": id }))
        });
        assert_eq!(loader.load("promo").await.unwrap(), json!({"id": "promo"}));
    }

    #[tokio::test]
    async fn file_loader_reads_by_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("promo.json"),
            r#"{"rules":[{"target":{"web":"https://a.com"}}]}"#,
        )
        .unwrap();
        let loader = FileLoader::new(dir.path());

        let raw = loader.load("promo").await.unwrap();
        assert_eq!(raw["rules"][0]["target"]["web"], "https://a.com");

        assert!(matches!(
            loader.load("missing").await,
            Err(LoaderError::NotFound { id }) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn file_loader_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileLoader::new(dir.path());
        assert!(matches!(
            loader.load("../etc/passwd").await,
            Err(LoaderError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn file_loader_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let loader = FileLoader::new(dir.path());
        assert!(matches!(loader.load("broken").await, Err(LoaderError::Json(_))));
    }
}
