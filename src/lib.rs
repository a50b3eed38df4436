//! Rule-driven deep-link routing.
//!
//! A [`RuleDocument`] maps visitor facts (OS, language, date, rollout bucket)
//! to a [`Target`]. [`evaluate`] picks the target for a [`Context`];
//! [`resolve`] loads rules, detects the context, and races the app deep link
//! against a web fallback.

mod detect;
mod env;
mod error;
mod evaluate;
pub mod hash;
mod loader;
pub mod parse;
mod resolve;
mod select;
mod settings;
mod types;
mod validate;

pub use detect::{ContextOverrides, detect};
pub use env::{
    Environment, FnNavigator, HeadlessEnvironment, NavigationError, NavigationMode, Navigator,
    Visibility,
};
pub use error::AppLinkError;
pub use evaluate::evaluate;
pub use loader::{FileLoader, FnLoader, LoaderError, RuleLoader, StaticLoader};
pub use resolve::{
    BACKSTOP_TIMEOUT, DEFAULT_ID, DEFAULT_TIMEOUT, ResolveOptions, ResolveResult, Used, resolve,
};
pub use select::{Action, ActionKind, Uris, decide_action, select_uris};
pub use settings::{ResolverSettings, SettingsError};
pub use types::{
    Condition, ConditionField, ConfigError, Context, DateRange, DefaultRule, Evaluation,
    EvaluationReport, Meta, NO_MATCH_REASON, Os, Rollout, RolloutKey, Rule, RuleDocument,
    RuleDocumentBuilder, RuleOutcome, SchemaIssue, Target,
};
