use chrono::DateTime;
use serde_json::{Map, Value};

use crate::{ConfigError, Condition, RuleDocument, SchemaIssue, Target};

const OS_NAMES: &[&str] = &["iOS", "Android", "Desktop"];
const TARGET_KEYS: &[(&str, Option<&str>)] = &[
    ("ios", Some("deepLinkIOS")),
    ("android", Some("deepLinkAndroid")),
    ("web", None),
    ("fallback", None),
];

/// Validate a raw payload and convert it into a [`RuleDocument`].
///
/// Shape errors are collected for the whole document before anything is
/// deserialized, so a single failure reports every offending path.
pub(crate) fn parse_document(raw: &Value) -> Result<RuleDocument, ConfigError> {
    let mut issues = Vec::new();
    check_shape(raw, &mut issues);
    if !issues.is_empty() {
        return Err(ConfigError::Invalid { issues });
    }

    let doc: RuleDocument = serde_json::from_value(raw.clone()).map_err(|e| {
        ConfigError::Invalid {
            issues: vec![SchemaIssue::new("$", e.to_string())],
        }
    })?;
    validate(&doc)?;
    Ok(doc)
}

/// Check the semantic constraints of an already-typed document.
pub(crate) fn validate(doc: &RuleDocument) -> Result<(), ConfigError> {
    let mut issues = Vec::new();

    if doc.rules.is_empty() && doc.default.is_none() {
        issues.push(SchemaIssue::new(
            "rules",
            "at least one rule or a default is required",
        ));
    }

    for (i, rule) in doc.rules.iter().enumerate() {
        check_target(&rule.target, &format!("rules.{i}.target"), &mut issues);
        if let Some(condition) = &rule.condition {
            check_condition(condition, &format!("rules.{i}.if"), &mut issues);
        }
    }
    if let Some(default) = &doc.default {
        check_target(&default.target, "default.target", &mut issues);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid { issues })
    }
}

fn check_target(target: &Target, path: &str, issues: &mut Vec<SchemaIssue>) {
    for (field, uri) in target.uris() {
        if let Err(e) = url::Url::parse(uri) {
            issues.push(SchemaIssue::new(
                format!("{path}.{field}"),
                format!("invalid URI '{uri}': {e}"),
            ));
        }
    }
}

fn check_condition(condition: &Condition, path: &str, issues: &mut Vec<SchemaIssue>) {
    if let Some(tags) = &condition.lang {
        for (j, tag) in tags.iter().enumerate() {
            if tag.trim().is_empty() {
                issues.push(SchemaIssue::new(
                    format!("{path}.lang.{j}"),
                    "language tag must not be empty",
                ));
            }
        }
    }
    if let Some(range) = &condition.date_range
        && let (Some(start), Some(end)) = (range.start, range.end)
        && start > end
    {
        issues.push(SchemaIssue::new(
            format!("{path}.dateRange"),
            "start must not be after end",
        ));
    }
    if let Some(rollout) = &condition.rollout
        && !(rollout.percentage.is_finite() && (0.0..=100.0).contains(&rollout.percentage))
    {
        issues.push(SchemaIssue::new(
            format!("{path}.rollout"),
            format!(
                "percentage must be within [0, 100], got {}",
                rollout.percentage
            ),
        ));
    }
}

// -- Shape checks on the raw JSON -------------------------------------------

fn check_shape(raw: &Value, issues: &mut Vec<SchemaIssue>) {
    let Some(root) = raw.as_object() else {
        issues.push(SchemaIssue::new("$", "expected an object"));
        return;
    };

    match root.get("rules") {
        None => {}
        Some(Value::Array(rules)) => {
            for (i, rule) in rules.iter().enumerate() {
                check_rule_shape(rule, &format!("rules.{i}"), issues);
            }
        }
        Some(_) => issues.push(SchemaIssue::new("rules", "expected an array")),
    }

    match root.get("default") {
        None | Some(Value::Null) => {}
        Some(Value::Object(default)) => {
            check_target_field(default, "default", issues);
            check_optional_string(default, "reason", "default", issues);
        }
        Some(_) => issues.push(SchemaIssue::new("default", "expected an object")),
    }

    match root.get("meta") {
        None | Some(Value::Null) => {}
        Some(Value::Object(meta)) => {
            check_optional_string(meta, "version", "meta", issues);
            check_optional_datetime(meta, "generatedAt", "meta", issues);
        }
        Some(_) => issues.push(SchemaIssue::new("meta", "expected an object")),
    }
}

fn check_rule_shape(rule: &Value, path: &str, issues: &mut Vec<SchemaIssue>) {
    let Some(rule) = rule.as_object() else {
        issues.push(SchemaIssue::new(path, "expected an object"));
        return;
    };
    check_target_field(rule, path, issues);
    check_optional_string(rule, "reason", path, issues);

    match rule.get("if") {
        None | Some(Value::Null) => {}
        Some(Value::Object(condition)) => {
            check_condition_shape(condition, &format!("{path}.if"), issues);
        }
        Some(_) => issues.push(SchemaIssue::new(format!("{path}.if"), "expected an object")),
    }
}

fn check_target_field(parent: &Map<String, Value>, path: &str, issues: &mut Vec<SchemaIssue>) {
    let path = format!("{path}.target");
    let Some(target) = parent.get("target") else {
        issues.push(SchemaIssue::new(path, "required"));
        return;
    };
    let Some(target) = target.as_object() else {
        issues.push(SchemaIssue::new(path, "expected an object"));
        return;
    };
    for (key, alias) in TARGET_KEYS {
        check_optional_string(target, key, &path, issues);
        if let Some(alias) = alias {
            check_optional_string(target, alias, &path, issues);
            if target.contains_key(*key) && target.contains_key(*alias) {
                issues.push(SchemaIssue::new(
                    format!("{path}.{alias}"),
                    format!("duplicates '{key}'"),
                ));
            }
        }
    }
}

fn check_condition_shape(
    condition: &Map<String, Value>,
    path: &str,
    issues: &mut Vec<SchemaIssue>,
) {
    match condition.get("os") {
        None | Some(Value::Null) => {}
        Some(Value::Array(names)) => {
            for (j, name) in names.iter().enumerate() {
                match name.as_str() {
                    Some(n) if OS_NAMES.contains(&n) => {}
                    _ => issues.push(SchemaIssue::new(
                        format!("{path}.os.{j}"),
                        format!("expected one of {}", OS_NAMES.join(", ")),
                    )),
                }
            }
        }
        Some(_) => issues.push(SchemaIssue::new(format!("{path}.os"), "expected an array")),
    }

    match condition.get("lang") {
        None | Some(Value::Null) => {}
        Some(Value::Array(tags)) => {
            for (j, tag) in tags.iter().enumerate() {
                if !tag.is_string() {
                    issues.push(SchemaIssue::new(
                        format!("{path}.lang.{j}"),
                        "expected a string",
                    ));
                }
            }
        }
        Some(_) => issues.push(SchemaIssue::new(format!("{path}.lang"), "expected an array")),
    }

    match condition.get("dateRange") {
        None | Some(Value::Null) => {}
        Some(Value::Object(range)) => {
            let range_path = format!("{path}.dateRange");
            check_optional_datetime(range, "start", &range_path, issues);
            check_optional_datetime(range, "end", &range_path, issues);
        }
        Some(_) => issues.push(SchemaIssue::new(
            format!("{path}.dateRange"),
            "expected an object",
        )),
    }

    let rollout_path = format!("{path}.rollout");
    match condition.get("rollout") {
        None | Some(Value::Null) | Some(Value::Number(_)) => {}
        Some(Value::Object(rollout)) => {
            if !rollout.get("percentage").is_some_and(Value::is_number) {
                issues.push(SchemaIssue::new(
                    format!("{rollout_path}.percentage"),
                    "expected a number",
                ));
            }
            check_optional_string(rollout, "seed", &rollout_path, issues);
        }
        Some(_) => issues.push(SchemaIssue::new(
            rollout_path,
            "expected a number or an object with 'percentage'",
        )),
    }
}

fn check_optional_string(
    parent: &Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<SchemaIssue>,
) {
    match parent.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => issues.push(SchemaIssue::new(format!("{path}.{key}"), "expected a string")),
    }
}

fn check_optional_datetime(
    parent: &Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<SchemaIssue>,
) {
    match parent.get(key) {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => {
            if DateTime::parse_from_rfc3339(s).is_err() {
                issues.push(SchemaIssue::new(
                    format!("{path}.{key}"),
                    format!("invalid RFC 3339 timestamp '{s}'"),
                ));
            }
        }
        Some(_) => issues.push(SchemaIssue::new(
            format!("{path}.{key}"),
            "expected an RFC 3339 timestamp string",
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn paths(err: &ConfigError) -> Vec<&str> {
        err.issues().iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn accepts_minimal_rule() {
        let doc = parse_document(&json!({"rules": [{"target": {"web": "https://a.com"}}]})).unwrap();
        assert_eq!(doc.rules.len(), 1);
    }

    #[test]
    fn accepts_default_only() {
        let doc = parse_document(&json!({"default": {"target": {"web": "https://a.com"}}})).unwrap();
        assert!(doc.rules.is_empty());
    }

    #[test]
    fn rejects_empty_rules_without_default() {
        let err = parse_document(&json!({"rules": []})).unwrap_err();
        assert_eq!(paths(&err), vec!["rules"]);
    }

    #[test]
    fn rejects_non_object_root() {
        let err = parse_document(&json!([1, 2])).unwrap_err();
        assert_eq!(paths(&err), vec!["$"]);
    }

    #[test]
    fn missing_target_is_reported() {
        let err = parse_document(&json!({"rules": [{"reason": "x"}]})).unwrap_err();
        assert_eq!(paths(&err), vec!["rules.0.target"]);
    }

    #[test]
    fn collects_every_shape_issue() {
        let err = parse_document(&json!({
            "rules": [
                {"if": {"os": ["Windows"], "lang": [1]}, "target": {"web": 5}},
                {"if": {"rollout": "half"}, "target": {}},
                {"if": {"dateRange": {"start": "yesterday"}}, "target": {}}
            ],
            "default": "nope"
        }))
        .unwrap_err();
        assert_eq!(
            paths(&err),
            vec![
                "rules.0.target.web",
                "rules.0.if.os.0",
                "rules.0.if.lang.0",
                "rules.1.if.rollout",
                "rules.2.if.dateRange.start",
                "default",
            ]
        );
    }

    #[test]
    fn malformed_uri_and_percentage() {
        let err = parse_document(&json!({
            "rules": [
                {"if": {"rollout": 150}, "target": {"web": "not a url"}},
                {"if": {"rollout": {"percentage": -1, "seed": "s"}}, "target": {"ios": "app://ok"}}
            ]
        }))
        .unwrap_err();
        assert_eq!(
            paths(&err),
            vec!["rules.0.target.web", "rules.0.if.rollout", "rules.1.if.rollout"]
        );
    }

    #[test]
    fn inverted_date_range() {
        let err = parse_document(&json!({
            "rules": [{
                "if": {"dateRange": {"start": "2025-12-31T00:00:00Z", "end": "2025-01-01T00:00:00Z"}},
                "target": {"web": "https://a.com"}
            }]
        }))
        .unwrap_err();
        assert_eq!(paths(&err), vec!["rules.0.if.dateRange"]);
    }

    #[test]
    fn duplicate_alias_rejected() {
        let err = parse_document(&json!({
            "rules": [{"target": {"ios": "app://a", "deepLinkIOS": "app://b"}}]
        }))
        .unwrap_err();
        assert_eq!(paths(&err), vec!["rules.0.target.deepLinkIOS"]);
    }

    #[test]
    fn empty_lang_tag_rejected() {
        let err = parse_document(&json!({
            "rules": [{"if": {"lang": ["es", " "]}, "target": {"web": "https://a.com"}}]
        }))
        .unwrap_err();
        assert_eq!(paths(&err), vec!["rules.0.if.lang.1"]);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let doc = parse_document(&json!({
            "version": 1,
            "rules": [{"target": {"web": "https://a.com", "extra": true}}]
        }))
        .unwrap();
        assert_eq!(doc.rules[0].target.web.as_deref(), Some("https://a.com"));
    }
}
