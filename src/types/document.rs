use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::Context;
use super::error::ConfigError;
use super::evaluation::Evaluation;
use super::evaluation_report::EvaluationReport;
use super::rule::{DefaultRule, Rule};

/// Informational metadata carried alongside the rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

/// Builder for constructing a validated [`RuleDocument`] in code.
///
/// # Example
///
/// ```
/// use applink::{Condition, Os, RuleDocumentBuilder, Target};
///
/// let doc = RuleDocumentBuilder::new()
///     .rule(
///         Target::new().ios("app://home").web("https://a.com"),
///         |r| r.when(Condition::new().os([Os::Ios])),
///     )
///     .default_target(Target::new().web("https://default.com"))
///     .build()
///     .unwrap();
/// assert_eq!(doc.rules.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RuleDocumentBuilder {
    rules: Vec<Rule>,
    default: Option<DefaultRule>,
    meta: Option<Meta>,
}

impl RuleDocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Rules are matched in the order they are added.
    #[must_use]
    pub fn rule(mut self, target: super::Target, f: impl FnOnce(Rule) -> Rule) -> Self {
        self.rules.push(f(Rule::new(target)));
        self
    }

    #[must_use]
    pub fn default_target(mut self, target: super::Target) -> Self {
        self.default = Some(DefaultRule::new(target));
        self
    }

    #[must_use]
    pub fn default_rule(mut self, default: DefaultRule) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Validate and produce the document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document breaks any schema constraint.
    pub fn build(self) -> Result<RuleDocument, ConfigError> {
        let doc = RuleDocument {
            rules: self.rules,
            default: self.default,
            meta: self.meta,
        };
        crate::validate::validate(&doc)?;
        Ok(doc)
    }
}

/// An ordered rule list plus an optional default. Immutable once validated and
/// safe to share across threads behind `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl RuleDocument {
    /// Validate a JSON value (typically a loader payload) into a document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing every offending field path.
    pub fn from_value(raw: &serde_json::Value) -> Result<Self, ConfigError> {
        crate::validate::parse_document(raw)
    }

    /// Parse and validate JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON or schema violations.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let raw: serde_json::Value = serde_json::from_str(input)?;
        Self::from_value(&raw)
    }

    /// Read a JSON file and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`AppLinkError`](crate::AppLinkError) on I/O or validation failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::AppLinkError> {
        let input = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&input)?)
    }

    /// Select the first matching rule for `ctx`.
    ///
    /// See [`evaluate`](fn@crate::evaluate) for the matching semantics.
    pub fn evaluate(&self, ctx: &Context) -> Evaluation {
        crate::evaluate::evaluate(self, ctx)
    }

    /// Evaluate and also report, rule by rule, which condition rejected the context.
    pub fn evaluate_detailed(&self, ctx: &Context) -> EvaluationReport {
        crate::evaluate::evaluate_detailed(self, ctx)
    }
}

impl fmt::Display for RuleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleDocument({} rules, default: {})",
            self.rules.len(),
            if self.default.is_some() { "yes" } else { "no" },
        )?;
        if let Some(version) = self.meta.as_ref().and_then(|m| m.version.as_deref()) {
            write!(f, " v{version}")?;
        }
        Ok(())
    }
}
