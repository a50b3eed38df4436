//! The host capabilities resolution depends on.
//!
//! Production code binds [`Environment`] to the real platform (a webview
//! bridge, an embedded browser, a native shell). Tests bind it to an in-memory
//! fake. [`HeadlessEnvironment`] is what a process without any navigation
//! surface gets.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// How a navigation treats the current history entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Push a new entry, keeping the current page in history.
    #[default]
    Assign,
    /// Swap the current entry.
    Replace,
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationMode::Assign => write!(f, "assign"),
            NavigationMode::Replace => write!(f, "replace"),
        }
    }
}

/// Page visibility as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    /// The host switched away from the page, usually to the native app.
    Hidden,
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("navigation to '{url}' rejected: {reason}")]
    Rejected { url: String, reason: String },

    #[error("no navigation surface available")]
    NoSurface,
}

/// The primitive that changes the current location.
pub trait Navigator: Send + Sync {
    /// Navigate to `url`. Errors are synchronous failures of the call itself
    /// (e.g. an unknown URL scheme refused by the host).
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError`] when the host refuses the navigation.
    fn navigate(&self, url: &str, mode: NavigationMode) -> Result<(), NavigationError>;
}

/// Ambient facts and capabilities of the host a resolution runs in.
pub trait Environment: Navigator {
    /// The URL of the current page, if there is one.
    fn current_url(&self) -> Option<String>;

    fn user_agent(&self) -> Option<String>;

    /// The host's reported language, in any tag or locale format.
    fn language(&self) -> Option<String>;

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// `false` for headless and server contexts where navigating means nothing.
    fn has_navigation_surface(&self) -> bool;

    /// A subscription to visibility changes, or `None` if the host never reports them.
    fn visibility(&self) -> Option<watch::Receiver<Visibility>>;
}

/// An environment with no page, no navigation surface, and no visibility events.
///
/// Language comes from `LANG`/`LC_ALL`, time from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessEnvironment;

impl Navigator for HeadlessEnvironment {
    fn navigate(&self, _url: &str, _mode: NavigationMode) -> Result<(), NavigationError> {
        Err(NavigationError::NoSurface)
    }
}

impl Environment for HeadlessEnvironment {
    fn current_url(&self) -> Option<String> {
        None
    }

    fn user_agent(&self) -> Option<String> {
        None
    }

    fn language(&self) -> Option<String> {
        ["LC_ALL", "LANG"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    fn has_navigation_surface(&self) -> bool {
        false
    }

    fn visibility(&self) -> Option<watch::Receiver<Visibility>> {
        None
    }
}

/// Adapts a closure into a [`Navigator`].
pub struct FnNavigator<F>(pub F);

impl<F> Navigator for FnNavigator<F>
where
    F: Fn(&str, NavigationMode) -> Result<(), NavigationError> + Send + Sync,
{
    fn navigate(&self, url: &str, mode: NavigationMode) -> Result<(), NavigationError> {
        (self.0)(url, mode)
    }
}

impl<F> fmt::Debug for FnNavigator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnNavigator")
    }
}
