use std::fmt;

use serde::{Serialize, Serializer};

use super::{Os, Target};

/// Reason recorded when neither a rule nor a default applied.
pub const NO_MATCH_REASON: &str = "no-match";

/// The outcome of evaluating a [`RuleDocument`](super::RuleDocument) against a
/// [`Context`](super::Context).
///
/// Serializes with the index as `-1` when no rule matched, which is the shape
/// logging pipelines expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct Evaluation {
    pub os: Os,
    pub lang: String,
    #[serde(rename = "nowISO")]
    pub now_iso: String,
    #[serde(serialize_with = "serialize_index")]
    pub matched_rule_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub target: Target,
}

impl Evaluation {
    /// `true` if a rule (not the default) was selected.
    #[must_use]
    pub fn is_rule_match(&self) -> bool {
        self.matched_rule_index.is_some()
    }

    /// The matched index, or `-1` for the default / no-match path.
    #[must_use]
    pub fn matched_rule_index_signed(&self) -> i64 {
        self.matched_rule_index
            .and_then(|i| i64::try_from(i).ok())
            .unwrap_or(-1)
    }
}

fn serialize_index<S: Serializer>(index: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
    match index {
        Some(i) => s.serialize_u64(*i as u64),
        None => s.serialize_i64(-1),
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) -> rule {}",
            self.os,
            self.lang,
            self.matched_rule_index_signed()
        )?;
        if let Some(reason) = &self.reason {
            write!(f, " [{reason}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(index: Option<usize>) -> Evaluation {
        Evaluation {
            os: Os::Ios,
            lang: "en".into(),
            now_iso: "2025-08-09T00:00:00.000Z".into(),
            matched_rule_index: index,
            reason: Some("iOS users".into()),
            target: Target::new().ios("app://home"),
        }
    }

    #[test]
    fn signed_index() {
        assert_eq!(eval(Some(2)).matched_rule_index_signed(), 2);
        assert_eq!(eval(None).matched_rule_index_signed(), -1);
        assert!(eval(Some(0)).is_rule_match());
        assert!(!eval(None).is_rule_match());
    }

    #[test]
    fn serializes_missing_index_as_minus_one() {
        let json = serde_json::to_value(eval(None)).unwrap();
        assert_eq!(json["matchedRuleIndex"], -1);
        assert_eq!(json["nowISO"], "2025-08-09T00:00:00.000Z");
        assert_eq!(json["os"], "iOS");

        let json = serde_json::to_value(eval(Some(0))).unwrap();
        assert_eq!(json["matchedRuleIndex"], 0);
    }

    #[test]
    fn display() {
        assert_eq!(eval(Some(0)).to_string(), "iOS (en) -> rule 0 [iOS users]");
    }
}
