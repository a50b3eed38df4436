use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env::NavigationMode;
use crate::loader::FileLoader;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Deployment-level defaults for [`resolve`](crate::resolve).
///
/// ```toml
/// timeout_ms = 1500
/// prefer_web_on_desktop = false
/// navigation = "replace"
/// rules_dir = "/etc/applink/rules"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Wait before navigating to the fallback, in milliseconds.
    pub timeout_ms: u64,
    pub prefer_web_on_desktop: bool,
    pub navigation: NavigationMode,
    /// Directory served by a [`FileLoader`](crate::FileLoader).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_dir: Option<PathBuf>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 1200,
            prefer_web_on_desktop: true,
            navigation: NavigationMode::Assign,
            rules_dir: None,
        }
    }
}

impl ResolverSettings {
    /// Parse settings from TOML text. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Toml`] on malformed input and
    /// [`SettingsError::Invalid`] when `timeout_ms` is zero.
    pub fn from_toml_str(input: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(input)?;
        settings.check()?;
        Ok(settings)
    }

    /// Read and parse a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// A loader over `rules_dir`, if one is configured.
    pub fn file_loader(&self) -> Option<FileLoader> {
        self.rules_dir.as_ref().map(FileLoader::new)
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
