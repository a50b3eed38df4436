use serde::{Deserialize, Serialize};

use super::Os;

/// Destinations for one rule: per-platform deep links plus web and fallback pages.
///
/// Every field is optional. When `fallback` is absent the web page doubles as
/// the fallback, see [`fallback_or_web()`](Self::fallback_or_web).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, alias = "deepLinkIOS", skip_serializing_if = "Option::is_none")]
    pub ios: Option<String>,
    #[serde(default, alias = "deepLinkAndroid", skip_serializing_if = "Option::is_none")]
    pub android: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl Target {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ios(mut self, uri: impl Into<String>) -> Self {
        self.ios = Some(uri.into());
        self
    }

    #[must_use]
    pub fn android(mut self, uri: impl Into<String>) -> Self {
        self.android = Some(uri.into());
        self
    }

    #[must_use]
    pub fn web(mut self, uri: impl Into<String>) -> Self {
        self.web = Some(uri.into());
        self
    }

    #[must_use]
    pub fn fallback(mut self, uri: impl Into<String>) -> Self {
        self.fallback = Some(uri.into());
        self
    }

    /// The deep link for `os`, or `None` on Desktop.
    #[must_use]
    pub fn deep_link_for(&self, os: Os) -> Option<&str> {
        match os {
            Os::Ios => self.ios.as_deref(),
            Os::Android => self.android.as_deref(),
            Os::Desktop => None,
        }
    }

    /// The explicit fallback, else the web page.
    #[must_use]
    pub fn fallback_or_web(&self) -> Option<&str> {
        self.fallback.as_deref().or(self.web.as_deref())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ios.is_none() && self.android.is_none() && self.web.is_none() && self.fallback.is_none()
    }

    /// Iterates `(field name, uri)` for every present field.
    pub(crate) fn uris(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("ios", self.ios.as_deref()),
            ("android", self.android.as_deref()),
            ("web", self.web.as_deref()),
            ("fallback", self.fallback.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, uri)| uri.map(|u| (name, u)))
    }
}
