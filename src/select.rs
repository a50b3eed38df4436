use std::fmt;

use crate::types::Evaluation;

/// The concrete URIs a resolution may navigate to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uris {
    /// The deep link for the evaluated OS; always `None` on Desktop.
    pub deep_link: Option<String>,
    pub web: Option<String>,
    /// The explicit fallback, else the web page.
    pub fallback: Option<String>,
}

/// Map an [`Evaluation`] to the URIs for its device class.
pub fn select_uris(evaluation: &Evaluation) -> Uris {
    let target = &evaluation.target;
    Uris {
        deep_link: target.deep_link_for(evaluation.os).map(str::to_owned),
        web: target.web.clone(),
        fallback: target.fallback_or_web().map(str::to_owned),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    DeepLink,
    Web,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::DeepLink => write!(f, "deeplink"),
            ActionKind::Web => write!(f, "web"),
        }
    }
}

/// A single actionable destination, e.g. for a button or a QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub url: String,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Prefer a non-blank deep link, then a non-blank web URL.
#[must_use]
pub fn decide_action(deep_link: Option<&str>, web: Option<&str>) -> Option<Action> {
    if let Some(url) = non_blank(deep_link) {
        return Some(Action {
            kind: ActionKind::DeepLink,
            url: url.to_owned(),
        });
    }
    non_blank(web).map(|url| Action {
        kind: ActionKind::Web,
        url: url.to_owned(),
    })
}
