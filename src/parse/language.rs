use winnow::combinator::{preceded, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{rest, take_while};

use super::ParseError;

/// Locale names that carry no language, as reported by minimal environments.
const NEUTRAL_LOCALES: &[&str] = &["c", "posix"];

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

/// `es-MX`, `en_US.UTF-8`, `en-US,en;q=0.9`: the primary subtag is the leading
/// run of ASCII letters; whatever follows (region, script, encoding, further
/// list entries) is ignored.
fn language_tag<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    terminated(
        preceded(ws, take_while(1..=8, |c: char| c.is_ascii_alphabetic())),
        rest,
    )
    .parse_next(input)
}

/// Extract the lowercase primary language subtag from a tag, locale name, or
/// `Accept-Language` style list.
///
/// # Errors
///
/// Returns [`ParseError`] if the input does not start with a language subtag
/// or names a neutral locale (`C`, `POSIX`).
pub fn primary_language(input: &str) -> Result<String, ParseError> {
    let primary = language_tag
        .parse(input)
        .map_err(|e| ParseError::Language {
            input: input.to_owned(),
            reason: e.inner().to_string(),
        })?
        .to_ascii_lowercase();
    if NEUTRAL_LOCALES.contains(&primary.as_str()) {
        return Err(ParseError::NeutralLocale {
            input: input.to_owned(),
        });
    }
    Ok(primary)
}
