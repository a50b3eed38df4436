use chrono::{DateTime, Utc};
use rand::Rng;

use crate::env::Environment;
use crate::parse::{classify_user_agent, primary_language};
use crate::types::{Context, Os, RolloutKey};

const DEFAULT_LANG: &str = "en";

/// Caller-supplied facts that take precedence over detection.
///
/// Any field left `None` is detected from the [`Environment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverrides {
    pub os: Option<Os>,
    pub lang: Option<String>,
    pub now: Option<DateTime<Utc>>,
    /// Stable visitor identity for deterministic rollout bucketing.
    pub identity: Option<String>,
    /// Pins the rollout bucket outright, ignoring identity and seeds.
    pub rollout_bucket: Option<u8>,
}

impl ContextOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn os(mut self, os: Os) -> Self {
        self.os = Some(os);
        self
    }

    #[must_use]
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    #[must_use]
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    #[must_use]
    pub fn rollout_bucket(mut self, bucket: u8) -> Self {
        self.rollout_bucket = Some(bucket);
        self
    }
}

/// Derive the evaluation [`Context`] from overrides and the environment.
pub fn detect(overrides: &ContextOverrides, env: &dyn Environment) -> Context {
    let os = overrides
        .os
        .unwrap_or_else(|| env.user_agent().map_or(Os::Desktop, |ua| classify_user_agent(&ua)));

    let raw_lang = overrides.lang.clone().or_else(|| env.language());
    let lang = raw_lang
        .as_deref()
        .map_or_else(|| DEFAULT_LANG.to_owned(), |raw| match primary_language(raw) {
            Ok(lang) => lang,
            Err(e) => {
                tracing::debug!(error = %e, "using default language");
                DEFAULT_LANG.to_owned()
            }
        });

    let rollout = match (overrides.rollout_bucket, &overrides.identity) {
        (Some(bucket), _) => RolloutKey::Bucket(bucket.min(99)),
        (None, Some(identity)) => RolloutKey::Identity(identity.clone()),
        (None, None) => RolloutKey::Bucket(rand::thread_rng().gen_range(0..100)),
    };

    let now = overrides.now.unwrap_or_else(|| env.now());

    Context {
        os,
        lang,
        now,
        rollout,
    }
}
