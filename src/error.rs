use thiserror::Error;

use crate::loader::LoaderError;
use crate::types::ConfigError;

/// Unified error type covering rule loading, validation and I/O.
///
/// Returned by [`resolve()`](crate::resolve) and convenience methods like
/// [`RuleDocument::from_file()`](crate::RuleDocument::from_file).
#[derive(Debug, Error)]
pub enum AppLinkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_transparently() {
        let err: AppLinkError = LoaderError::NotFound { id: "promo".into() }.into();
        assert_eq!(err.to_string(), "no rules found for id 'promo'");
        assert!(matches!(err, AppLinkError::Loader(_)));

        let err: AppLinkError = std::io::Error::other("disk gone").into();
        assert_eq!(err.to_string(), "disk gone");
    }
}
