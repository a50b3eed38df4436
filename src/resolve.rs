//! Load rules, evaluate them for the visitor, and drive the navigation.
//!
//! On mobile the deep link is attempted first and raced against a fallback
//! timer: if the host hides the page the app is assumed to have opened,
//! otherwise the visitor is sent to the fallback once the timeout elapses. A
//! backstop fires slightly later for hosts that never report visibility.

use std::fmt;
use std::future::pending;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::sleep;
use url::Url;

use crate::detect::{ContextOverrides, detect};
use crate::env::{
    Environment, HeadlessEnvironment, NavigationError, NavigationMode, Navigator, Visibility,
};
use crate::error::AppLinkError;
use crate::loader::RuleLoader;
use crate::select::select_uris;
use crate::settings::ResolverSettings;
use crate::types::{Evaluation, Os, RuleDocument};

/// Extra grace after the fallback timeout before assuming the app opened.
pub const BACKSTOP_TIMEOUT: Duration = Duration::from_millis(250);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1200);

/// Rule id used when none is given and the current URL carries no `id`.
pub const DEFAULT_ID: &str = "default";

/// What a resolution ended up navigating to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Used {
    #[serde(rename = "deeplink")]
    DeepLink,
    Web,
    Fallback,
    None,
}

impl fmt::Display for Used {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Used::DeepLink => write!(f, "deeplink"),
            Used::Web => write!(f, "web"),
            Used::Fallback => write!(f, "fallback"),
            Used::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResult {
    pub evaluation: Evaluation,
    #[serde(rename = "deeplink")]
    pub deep_link: Option<String>,
    pub web: Option<String>,
    pub fallback: Option<String>,
    pub used: Used,
    /// The navigation failure that led to this outcome, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type Hook = Box<dyn Fn(&ResolveResult) + Send + Sync>;

/// Inputs to [`resolve`].
///
/// ```no_run
/// # async fn run() -> Result<(), applink::AppLinkError> {
/// use std::time::Duration;
/// use applink::{ResolveOptions, StaticLoader, resolve};
///
/// let rules = serde_json::json!({
///     "rules": [{ "target": { "ios": "myapp://home", "web": "https://example.com" } }]
/// });
/// let result = resolve(
///     ResolveOptions::new(StaticLoader(rules))
///         .id("promo")
///         .timeout(Duration::from_millis(800)),
/// )
/// .await?;
/// println!("{}", result.used);
/// # Ok(())
/// # }
/// ```
pub struct ResolveOptions {
    loader: Arc<dyn RuleLoader>,
    id: Option<String>,
    overrides: ContextOverrides,
    timeout: Duration,
    prefer_web_on_desktop: bool,
    navigation: NavigationMode,
    on_before: Option<Hook>,
    on_after: Option<Hook>,
    navigator: Option<Arc<dyn Navigator>>,
    environment: Arc<dyn Environment>,
}

impl ResolveOptions {
    pub fn new(loader: impl RuleLoader + 'static) -> Self {
        Self::with_loader(Arc::new(loader))
    }

    pub fn with_loader(loader: Arc<dyn RuleLoader>) -> Self {
        Self {
            loader,
            id: None,
            overrides: ContextOverrides::default(),
            timeout: DEFAULT_TIMEOUT,
            prefer_web_on_desktop: true,
            navigation: NavigationMode::Assign,
            on_before: None,
            on_after: None,
            navigator: None,
            environment: Arc::new(HeadlessEnvironment),
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn overrides(mut self, overrides: ContextOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn prefer_web_on_desktop(mut self, prefer: bool) -> Self {
        self.prefer_web_on_desktop = prefer;
        self
    }

    #[must_use]
    pub fn navigation(mut self, mode: NavigationMode) -> Self {
        self.navigation = mode;
        self
    }

    /// Called with the undecided result (`used == None`) before any navigation.
    #[must_use]
    pub fn on_before(mut self, hook: impl Fn(&ResolveResult) + Send + Sync + 'static) -> Self {
        self.on_before = Some(Box::new(hook));
        self
    }

    /// Called exactly once with the settled result.
    #[must_use]
    pub fn on_after(mut self, hook: impl Fn(&ResolveResult) + Send + Sync + 'static) -> Self {
        self.on_after = Some(Box::new(hook));
        self
    }

    /// Navigate through `navigator` instead of the environment.
    ///
    /// An injected navigator also lifts the no-surface guard.
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    #[must_use]
    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    /// Apply timeout, desktop preference and navigation mode from `settings`.
    #[must_use]
    pub fn with_settings(self, settings: &ResolverSettings) -> Self {
        self.timeout(settings.timeout())
            .prefer_web_on_desktop(settings.prefer_web_on_desktop)
            .navigation(settings.navigation)
    }

    fn navigate(&self, url: &str) -> Result<(), NavigationError> {
        tracing::debug!(url, mode = %self.navigation, "navigating");
        match &self.navigator {
            Some(navigator) => navigator.navigate(url, self.navigation),
            None => self.environment.navigate(url, self.navigation),
        }
    }

    /// Navigate and record the outcome; a refused navigation settles `None`.
    fn navigate_to(&self, mut result: ResolveResult, url: &str, used: Used) -> ResolveResult {
        match self.navigate(url) {
            Ok(()) => result.used = used,
            Err(e) => {
                tracing::warn!(url, error = %e, "navigation failed");
                result.used = Used::None;
                result.error = Some(e.to_string());
            }
        }
        result
    }

    async fn execute(&self, result: ResolveResult) -> ResolveResult {
        if self.navigator.is_none() && !self.environment.has_navigation_surface() {
            tracing::debug!("no navigation surface, skipping navigation");
            return result;
        }

        if result.evaluation.os == Os::Desktop
            && self.prefer_web_on_desktop
            && let Some(web) = result.web.clone()
        {
            return self.navigate_to(result, &web, Used::Web);
        }

        if let Some(deep_link) = result.deep_link.clone() {
            return self.race(result, &deep_link).await;
        }
        if let Some(web) = result.web.clone() {
            return self.navigate_to(result, &web, Used::Web);
        }
        if let Some(fallback) = result.fallback.clone() {
            return self.navigate_to(result, &fallback, Used::Fallback);
        }
        result
    }

    async fn race(&self, mut result: ResolveResult, deep_link: &str) -> ResolveResult {
        // Only transitions after this point count as the app opening.
        let visibility = self.environment.visibility().map(|mut rx| {
            rx.mark_unchanged();
            rx
        });

        if let Err(e) = self.navigate(deep_link) {
            tracing::warn!(url = deep_link, error = %e, "deep link navigation failed");
            result.error = Some(e.to_string());
            return match result.fallback.clone() {
                Some(fallback) => self.navigate_to(result, &fallback, Used::Fallback),
                None => result,
            };
        }

        let fallback = result.fallback.clone();
        let timeout = self.timeout;
        let fallback_timer = async move {
            sleep(timeout).await;
            match fallback {
                Some(url) => url,
                None => pending().await,
            }
        };
        let backstop = sleep(self.timeout + BACKSTOP_TIMEOUT);

        let outcome = tokio::select! {
            biased;
            () = hidden(visibility) => RaceOutcome::Hidden,
            url = fallback_timer => RaceOutcome::Timeout(url),
            () = backstop => RaceOutcome::Backstop,
        };
        tracing::debug!(?outcome, "deep link race settled");

        match outcome {
            RaceOutcome::Hidden | RaceOutcome::Backstop => {
                result.used = Used::DeepLink;
                result
            }
            RaceOutcome::Timeout(url) => self.navigate_to(result, &url, Used::Fallback),
        }
    }
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("id", &self.id)
            .field("overrides", &self.overrides)
            .field("timeout", &self.timeout)
            .field("prefer_web_on_desktop", &self.prefer_web_on_desktop)
            .field("navigation", &self.navigation)
            .field("navigator", &self.navigator.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum RaceOutcome {
    Hidden,
    Timeout(String),
    Backstop,
}

/// Resolves on the next change to hidden; never resolves without a
/// subscription.
async fn hidden(visibility: Option<watch::Receiver<Visibility>>) {
    if let Some(mut rx) = visibility {
        while rx.changed().await.is_ok() {
            if *rx.borrow_and_update() == Visibility::Hidden {
                return;
            }
        }
    }
    pending().await
}

fn run_hook(hook: Option<&Hook>, result: &ResolveResult, name: &str) {
    let Some(hook) = hook else { return };
    if catch_unwind(AssertUnwindSafe(|| hook(result))).is_err() {
        tracing::warn!(hook = name, "hook panicked, ignoring");
    }
}

/// The `id` query parameter of `current_url`, else [`DEFAULT_ID`].
fn id_from_location(current_url: Option<&str>) -> String {
    current_url
        .and_then(|href| Url::parse(href).ok())
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| DEFAULT_ID.to_owned())
}

/// Load, evaluate and navigate.
///
/// # Errors
///
/// Returns [`AppLinkError::Loader`] when the loader fails and
/// [`AppLinkError::Config`] when the payload is not a valid rule document.
/// Navigation failures never surface here; they are recorded in
/// [`ResolveResult::error`].
pub async fn resolve(options: ResolveOptions) -> Result<ResolveResult, AppLinkError> {
    let id = options
        .id
        .clone()
        .unwrap_or_else(|| id_from_location(options.environment.current_url().as_deref()));

    let raw = options.loader.load(&id).await?;
    let doc = RuleDocument::from_value(&raw)?;

    let ctx = detect(&options.overrides, options.environment.as_ref());
    let evaluation = doc.evaluate(&ctx);
    let uris = select_uris(&evaluation);

    let base = ResolveResult {
        evaluation,
        deep_link: uris.deep_link,
        web: uris.web,
        fallback: uris.fallback,
        used: Used::None,
        error: None,
    };
    run_hook(options.on_before.as_ref(), &base, "on_before");

    let result = options.execute(base).await;
    tracing::info!(id = %id, used = %result.used, "resolved");
    run_hook(options.on_after.as_ref(), &result, "on_after");
    Ok(result)
}
