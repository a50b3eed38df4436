mod condition;
mod context;
mod document;
mod error;
mod evaluation;
mod evaluation_report;
mod os;
mod rule;
mod target;

pub use condition::{Condition, DateRange, Rollout};
pub use context::{Context, RolloutKey};
pub use document::{Meta, RuleDocument, RuleDocumentBuilder};
pub use error::{ConfigError, SchemaIssue};
pub use evaluation::{Evaluation, NO_MATCH_REASON};
pub use evaluation_report::{ConditionField, EvaluationReport, RuleOutcome};
pub use os::Os;
pub use rule::{DefaultRule, Rule};
pub use target::Target;
