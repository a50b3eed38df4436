use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Os;

/// Constraints a [`Rule`](super::Rule) places on the [`Context`](super::Context).
///
/// All present fields must hold for the rule to match. An absent field imposes
/// no constraint, so a default `Condition` matches every context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Vec<Os>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout: Option<Rollout>,
}

impl Condition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn os(mut self, os: impl IntoIterator<Item = Os>) -> Self {
        self.os = Some(os.into_iter().collect());
        self
    }

    #[must_use]
    pub fn lang<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.lang = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    #[must_use]
    pub fn rollout(mut self, rollout: Rollout) -> Self {
        self.rollout = Some(rollout);
        self
    }
}

/// Inclusive time window. A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// `start <= now <= end`, both bounds inclusive.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| now >= start) && self.end.is_none_or(|end| now <= end)
    }
}

/// Percentage of rollout buckets admitted by a rule.
///
/// On the wire this is either a bare number (`"rollout": 25`) or an object
/// carrying a seed (`"rollout": {"percentage": 25, "seed": "promo"}`). The seed
/// is mixed into the identity hash so independent experiments do not select
/// the same users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RolloutRepr", into = "RolloutRepr")]
pub struct Rollout {
    pub percentage: f64,
    pub seed: Option<String>,
}

impl Rollout {
    #[must_use]
    pub fn new(percentage: f64) -> Self {
        Self {
            percentage,
            seed: None,
        }
    }

    #[must_use]
    pub fn seeded(percentage: f64, seed: impl Into<String>) -> Self {
        Self {
            percentage,
            seed: Some(seed.into()),
        }
    }

    /// A bucket in `[0, 100)` is admitted iff it is strictly below the percentage.
    #[must_use]
    pub fn admits(&self, bucket: u8) -> bool {
        f64::from(bucket) < self.percentage
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RolloutRepr {
    Percentage(f64),
    Seeded {
        percentage: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<String>,
    },
}

impl From<RolloutRepr> for Rollout {
    fn from(repr: RolloutRepr) -> Self {
        match repr {
            RolloutRepr::Percentage(percentage) => Rollout::new(percentage),
            RolloutRepr::Seeded { percentage, seed } => Rollout { percentage, seed },
        }
    }
}

impl From<Rollout> for RolloutRepr {
    fn from(rollout: Rollout) -> Self {
        match rollout.seed {
            None => RolloutRepr::Percentage(rollout.percentage),
            seed @ Some(_) => RolloutRepr::Seeded {
                percentage: rollout.percentage,
                seed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let range = DateRange::new(Some(at(2025, 1, 1)), Some(at(2025, 12, 31)));
        assert!(range.contains(at(2025, 1, 1)));
        assert!(range.contains(at(2025, 12, 31)));
        assert!(range.contains(at(2025, 6, 15)));
        assert!(!range.contains(at(2024, 12, 31)));
        assert!(!range.contains(at(2026, 1, 1)));
    }

    #[test]
    fn date_range_open_sides() {
        let from = DateRange::new(Some(at(2025, 1, 1)), None);
        assert!(from.contains(at(2999, 1, 1)));
        assert!(!from.contains(at(2024, 1, 1)));

        let until = DateRange::new(None, Some(at(2025, 1, 1)));
        assert!(until.contains(at(1970, 1, 2)));
        assert!(!until.contains(at(2025, 1, 2)));

        assert!(DateRange::default().contains(at(2025, 1, 1)));
    }

    #[test]
    fn rollout_edges() {
        assert!(!Rollout::new(0.0).admits(0));
        assert!(Rollout::new(100.0).admits(99));
        assert!(Rollout::new(50.0).admits(49));
        assert!(!Rollout::new(50.0).admits(50));
        assert!(Rollout::new(10.5).admits(10));
        assert!(!Rollout::new(10.5).admits(11));
    }

    #[test]
    fn rollout_bare_number() {
        let r: Rollout = serde_json::from_str("25").unwrap();
        assert_eq!(r, Rollout::new(25.0));
        assert_eq!(serde_json::to_string(&r).unwrap(), "25.0");
    }

    #[test]
    fn rollout_seeded_object() {
        let r: Rollout = serde_json::from_str(r#"{"percentage":50,"seed":"promo123"}"#).unwrap();
        assert_eq!(r, Rollout::seeded(50.0, "promo123"));

        let unseeded: Rollout = serde_json::from_str(r#"{"percentage":5}"#).unwrap();
        assert_eq!(unseeded.seed, None);
    }

    #[test]
    fn condition_wire_names() {
        let c: Condition = serde_json::from_str(
            r#"{"os":["iOS"],"lang":["es"],"dateRange":{"start":"2025-01-01T00:00:00Z"},"rollout":10}"#,
        )
        .unwrap();
        assert_eq!(c.os, Some(vec![Os::Ios]));
        assert_eq!(c.lang, Some(vec!["es".to_owned()]));
        assert_eq!(c.date_range.unwrap().start, Some(at(2025, 1, 1)));
        assert_eq!(c.rollout, Some(Rollout::new(10.0)));
    }
}
