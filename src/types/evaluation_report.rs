use std::fmt;
use std::time::Duration;

use super::evaluation::Evaluation;

/// The condition field that rejected a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionField {
    Os,
    Lang,
    DateRange,
    Rollout,
}

impl fmt::Display for ConditionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionField::Os => write!(f, "os"),
            ConditionField::Lang => write!(f, "lang"),
            ConditionField::DateRange => write!(f, "dateRange"),
            ConditionField::Rollout => write!(f, "rollout"),
        }
    }
}

/// What happened to one rule during a detailed evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Matched,
    Rejected(ConditionField),
    /// An earlier rule already matched.
    NotReached,
}

/// Detailed evaluation report returned by
/// [`RuleDocument::evaluate_detailed()`](super::RuleDocument::evaluate_detailed).
///
/// Contains the evaluation, the per-rule outcome in document order, and the
/// wall-clock duration of the evaluation.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    evaluation: Evaluation,
    outcomes: Vec<RuleOutcome>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(evaluation: Evaluation, outcomes: Vec<RuleOutcome>, duration: Duration) -> Self {
        Self {
            evaluation,
            outcomes,
            duration,
        }
    }

    /// Same as [`RuleDocument::evaluate()`](super::RuleDocument::evaluate).
    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// One entry per rule, in document order.
    #[must_use]
    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    /// Indices of rules rejected because of `field`.
    #[must_use]
    pub fn rejected_by(&self, field: ConditionField) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == RuleOutcome::Rejected(field))
            .map(|(i, _)| i)
            .collect()
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn into_evaluation(self) -> Evaluation {
        self.evaluation
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matched: {}", self.evaluation.matched_rule_index_signed())?;
        let rejected: Vec<String> = self
            .outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| match o {
                RuleOutcome::Rejected(field) => Some(format!("{i}:{field}")),
                _ => None,
            })
            .collect();
        write!(f, ", rejected: [{}]", rejected.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
