use std::time::Instant;

use chrono::SecondsFormat;

use crate::types::{
    Condition, ConditionField, Context, Evaluation, EvaluationReport, NO_MATCH_REASON, Rule,
    RuleDocument, RuleOutcome, Target,
};

/// Select the first rule of `doc` whose condition holds for `ctx`.
///
/// Rules are a priority list: they are checked in document order and the
/// first match wins. Within a condition every present field must hold:
///
/// - `os`: the context OS is listed;
/// - `lang`: the context language equals a listed tag, ignoring ASCII case;
/// - `dateRange`: `start <= now <= end`, a missing bound is open;
/// - `rollout`: the context's bucket for the rule's seed is below the percentage.
///
/// When nothing matches the default target is used; without a default the
/// target is empty and the reason is [`NO_MATCH_REASON`].
pub fn evaluate(doc: &RuleDocument, ctx: &Context) -> Evaluation {
    let matched = doc
        .rules
        .iter()
        .position(|rule| first_rejection(rule, ctx).is_none());
    let evaluation = build(doc, ctx, matched);
    tracing::debug!(
        os = %evaluation.os,
        lang = %evaluation.lang,
        matched = evaluation.matched_rule_index_signed(),
        "rules evaluated"
    );
    evaluation
}

pub(crate) fn evaluate_detailed(doc: &RuleDocument, ctx: &Context) -> EvaluationReport {
    let start = Instant::now();
    let mut outcomes = Vec::with_capacity(doc.rules.len());
    let mut matched = None;

    for (i, rule) in doc.rules.iter().enumerate() {
        if matched.is_some() {
            outcomes.push(RuleOutcome::NotReached);
            continue;
        }
        match first_rejection(rule, ctx) {
            None => {
                matched = Some(i);
                outcomes.push(RuleOutcome::Matched);
            }
            Some(field) => outcomes.push(RuleOutcome::Rejected(field)),
        }
    }

    let evaluation = build(doc, ctx, matched);
    EvaluationReport::new(evaluation, outcomes, start.elapsed())
}

fn build(doc: &RuleDocument, ctx: &Context, matched: Option<usize>) -> Evaluation {
    let (target, reason) = match matched {
        Some(i) => {
            let rule = &doc.rules[i];
            (rule.target.clone(), rule.reason.clone())
        }
        None => match &doc.default {
            Some(default) => (default.target.clone(), default.reason.clone()),
            None => (Target::default(), Some(NO_MATCH_REASON.to_owned())),
        },
    };

    Evaluation {
        os: ctx.os,
        lang: ctx.lang.clone(),
        now_iso: ctx.now.to_rfc3339_opts(SecondsFormat::Millis, true),
        matched_rule_index: matched,
        reason,
        target,
    }
}

/// The first condition field that rejects `ctx`, or `None` if the rule matches.
fn first_rejection(rule: &Rule, ctx: &Context) -> Option<ConditionField> {
    let condition = rule.condition.as_ref()?;
    check_condition(condition, ctx).err()
}

fn check_condition(condition: &Condition, ctx: &Context) -> Result<(), ConditionField> {
    if let Some(os) = &condition.os
        && !os.contains(&ctx.os)
    {
        return Err(ConditionField::Os);
    }
    if let Some(tags) = &condition.lang
        && !tags.iter().any(|t| t.eq_ignore_ascii_case(&ctx.lang))
    {
        return Err(ConditionField::Lang);
    }
    if let Some(range) = &condition.date_range
        && !range.contains(ctx.now)
    {
        return Err(ConditionField::DateRange);
    }
    if let Some(rollout) = &condition.rollout
        && !rollout.admits(ctx.rollout_bucket(rollout.seed.as_deref()))
    {
        return Err(ConditionField::Rollout);
    }
    Ok(())
}
