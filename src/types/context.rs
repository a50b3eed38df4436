use chrono::{DateTime, Utc};

use super::Os;

/// Source of the rollout bucket for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutKey {
    /// A stable visitor identity. The bucket is the FNV-1a hash of the identity
    /// followed by the rule's seed, reduced modulo 100.
    Identity(String),
    /// A fixed bucket in `[0, 99]`, used for per-call random draws.
    Bucket(u8),
}

/// Runtime facts a rule document is evaluated against.
///
/// Built fresh for each resolution by [`detect`](crate::detect), or directly
/// in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub os: Os,
    /// Lowercase primary language subtag, e.g. `"es"`.
    pub lang: String,
    pub now: DateTime<Utc>,
    pub rollout: RolloutKey,
}

impl Context {
    /// A context with the current time and bucket 0.
    #[must_use]
    pub fn new(os: Os, lang: impl Into<String>) -> Self {
        Self {
            os,
            lang: lang.into().to_ascii_lowercase(),
            now: Utc::now(),
            rollout: RolloutKey::Bucket(0),
        }
    }

    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.rollout = RolloutKey::Identity(identity.into());
        self
    }

    /// Pin the rollout bucket. Values above 99 are clamped.
    #[must_use]
    pub fn with_bucket(mut self, bucket: u8) -> Self {
        self.rollout = RolloutKey::Bucket(bucket.min(99));
        self
    }

    /// The bucket in `[0, 99]` this context falls into for a rule with `seed`.
    #[must_use]
    pub fn rollout_bucket(&self, seed: Option<&str>) -> u8 {
        match &self.rollout {
            RolloutKey::Identity(identity) => crate::hash::bucket(identity, seed.unwrap_or("")),
            RolloutKey::Bucket(bucket) => *bucket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_is_lowercased() {
        let ctx = Context::new(Os::Desktop, "ES");
        assert_eq!(ctx.lang, "es");
    }

    #[test]
    fn fixed_bucket_ignores_seed() {
        let ctx = Context::new(Os::Ios, "en").with_bucket(42);
        assert_eq!(ctx.rollout_bucket(None), 42);
        assert_eq!(ctx.rollout_bucket(Some("promo")), 42);
    }

    #[test]
    fn fixed_bucket_is_clamped() {
        let ctx = Context::new(Os::Ios, "en").with_bucket(250);
        assert_eq!(ctx.rollout_bucket(None), 99);
    }

    #[test]
    fn identity_bucket_is_stable_per_seed() {
        let ctx = Context::new(Os::Android, "en").with_identity("userA");
        let a = ctx.rollout_bucket(Some("promo123"));
        assert_eq!(a, ctx.rollout_bucket(Some("promo123")));
        assert!(a < 100);
        assert_eq!(a, crate::hash::bucket("userA", "promo123"));
        assert_eq!(ctx.rollout_bucket(None), crate::hash::bucket("userA", ""));
    }
}
