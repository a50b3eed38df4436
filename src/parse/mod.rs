//! Text grammars for the environment facts the detector reads.

mod error;
mod language;
mod user_agent;

pub use error::ParseError;
pub use language::primary_language;
pub use user_agent::{MAX_COMMENT_DEPTH, UserAgent, classify_user_agent, parse_user_agent};
