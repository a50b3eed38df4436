use thiserror::Error;

/// Why a user-agent string or language tag could not be read.
///
/// The detector recovers from both: a malformed user agent is scanned raw
/// for device signatures, and an unreadable language falls back to `en`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unbalanced parentheses in user agent at byte {offset}")]
    Unbalanced { offset: usize },

    #[error("comments nested deeper than {limit} levels at byte {offset}")]
    CommentDepth { offset: usize, limit: usize },

    #[error("invalid language tag '{input}': {reason}")]
    Language { input: String, reason: String },

    #[error("locale '{input}' names no language")]
    NeutralLocale { input: String },
}
