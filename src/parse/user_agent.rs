use winnow::combinator::{alt, delimited, preceded, repeat, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::Os;

use super::ParseError;

const IOS_DEVICES: &[&str] = &["iPhone", "iPad", "iPod"];
const ANDROID: &str = "Android";

/// Deepest comment nesting the grammar will descend into.
pub const MAX_COMMENT_DEPTH: usize = 32;

/// A user-agent string split into product tokens and parenthesized comments.
///
/// `Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148`
/// yields products `["Mozilla/5.0", "Mobile/15E148"]` and one comment
/// `"iPhone; CPU iPhone OS 17_0 like Mac OS X"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent<'a> {
    pub products: Vec<&'a str>,
    pub comments: Vec<&'a str>,
}

impl UserAgent<'_> {
    /// iPhone/iPad/iPod signatures win over Android, anything else is Desktop.
    #[must_use]
    pub fn os(&self) -> Os {
        let segments = || {
            self.comments
                .iter()
                .flat_map(|c| c.split(';'))
                .chain(self.products.iter().copied())
                .map(str::trim)
        };
        if segments().any(|s| IOS_DEVICES.iter().any(|d| s.starts_with(d))) {
            Os::Ios
        } else if segments().any(|s| s.starts_with(ANDROID)) {
            Os::Android
        } else {
            Os::Desktop
        }
    }
}

enum Token<'a> {
    Product(&'a str),
    Comment(&'a str),
}

// -- Grammar ----------------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

fn comment<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited('(', comment_body, ')').parse_next(input)
}

fn comment_body<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    repeat::<_, _, (), _, _>(
        0..,
        alt((take_till(1.., ['(', ')']).void(), comment.void())),
    )
    .take()
    .parse_next(input)
}

fn product<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_till(1.., |c: char| c.is_whitespace() || c == '(' || c == ')').parse_next(input)
}

fn token<'i>(input: &mut &'i str) -> ModalResult<Token<'i>> {
    alt((comment.map(Token::Comment), product.map(Token::Product))).parse_next(input)
}

fn user_agent<'i>(input: &mut &'i str) -> ModalResult<Vec<Token<'i>>> {
    preceded(ws, repeat(0.., terminated(token, ws))).parse_next(input)
}

/// Byte offset of the first `(` that opens a comment deeper than
/// [`MAX_COMMENT_DEPTH`].
fn too_deep(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in input.char_indices() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_COMMENT_DEPTH {
                    return Some(offset);
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Split a user-agent string into products and comments.
///
/// # Errors
///
/// Returns [`ParseError::Unbalanced`] on unbalanced parentheses and
/// [`ParseError::CommentDepth`] when comments nest past
/// [`MAX_COMMENT_DEPTH`].
pub fn parse_user_agent(input: &str) -> Result<UserAgent<'_>, ParseError> {
    if let Some(offset) = too_deep(input) {
        return Err(ParseError::CommentDepth {
            offset,
            limit: MAX_COMMENT_DEPTH,
        });
    }
    let tokens = user_agent
        .parse(input)
        .map_err(|e| ParseError::Unbalanced { offset: e.offset() })?;
    let mut ua = UserAgent {
        products: Vec::new(),
        comments: Vec::new(),
    };
    for token in tokens {
        match token {
            Token::Product(p) => ua.products.push(p),
            Token::Comment(c) => ua.comments.push(c),
        }
    }
    Ok(ua)
}

/// Classify a user-agent string into an [`Os`].
///
/// Truncated or otherwise malformed strings are still classified by scanning
/// the raw text for device signatures.
#[must_use]
pub fn classify_user_agent(input: &str) -> Os {
    match parse_user_agent(input) {
        Ok(ua) => ua.os(),
        Err(e) => {
            tracing::debug!(error = %e, "falling back to raw user-agent scan");
            if IOS_DEVICES.iter().any(|d| input.contains(d)) {
                Os::Ios
            } else if input.contains(ANDROID) {
                Os::Android
            } else {
                Os::Desktop
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 \
        (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
    const ANDROID_PIXEL: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const MAC_DESKTOP: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn splits_products_and_comments() {
        let ua = parse_user_agent(IPHONE).unwrap();
        assert_eq!(ua.products[0], "Mozilla/5.0");
        assert_eq!(ua.comments[0], "iPhone; CPU iPhone OS 17_0 like Mac OS X");
        assert_eq!(ua.comments[1], "KHTML, like Gecko");
        assert_eq!(ua.products.last(), Some(&"Safari/604.1"));
    }

    #[test]
    fn nested_comments() {
        let ua = parse_user_agent("App/1.0 (outer (inner) tail)").unwrap();
        assert_eq!(ua.comments, vec!["outer (inner) tail"]);
    }

    #[test]
    fn classifies_known_agents() {
        assert_eq!(classify_user_agent(IPHONE), Os::Ios);
        assert_eq!(classify_user_agent(IPAD), Os::Ios);
        assert_eq!(classify_user_agent(ANDROID_PIXEL), Os::Android);
        assert_eq!(classify_user_agent(MAC_DESKTOP), Os::Desktop);
        assert_eq!(classify_user_agent(WINDOWS), Os::Desktop);
        assert_eq!(classify_user_agent(""), Os::Desktop);
    }

    #[test]
    fn ipod_and_bare_product_tokens() {
        assert_eq!(classify_user_agent("Mozilla/5.0 (iPod touch; CPU iPhone OS 12_5)"), Os::Ios);
        assert_eq!(classify_user_agent("okhttp/4.9 Android/13"), Os::Android);
    }

    #[test]
    fn unbalanced_input_is_an_error_but_still_classified() {
        let truncated = "Mozilla/5.0 (Linux; Android 14; Pix";
        assert!(parse_user_agent(truncated).is_err());
        assert_eq!(classify_user_agent(truncated), Os::Android);
    }

    #[test]
    fn nesting_at_the_limit_parses() {
        let depth = MAX_COMMENT_DEPTH;
        let ua = format!("App/1.0 {}x{} Android/14", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_user_agent(&ua).unwrap().comments.len(), 1);
        assert_eq!(classify_user_agent(&ua), Os::Android);
    }

    #[test]
    fn deep_nesting_is_rejected_without_recursing() {
        let ua = format!("Mozilla/5.0 {}", "(".repeat(8 * 1024));
        assert_eq!(
            parse_user_agent(&ua),
            Err(ParseError::CommentDepth {
                offset: 12 + MAX_COMMENT_DEPTH,
                limit: MAX_COMMENT_DEPTH,
            })
        );

        // Small stack, as on a tokio worker.
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || classify_user_agent(&format!("{ua} iPhone")))
            .unwrap();
        assert_eq!(handle.join().unwrap(), Os::Ios);
    }

    #[test]
    fn stray_close_is_unbalanced() {
        assert!(matches!(
            parse_user_agent("App/1.0 ) tail"),
            Err(ParseError::Unbalanced { offset }) if offset >= 8
        ));
    }
}
