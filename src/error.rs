//! Error types for each stage of the relay.
//!
//! Every failure is handled at article granularity: the pipeline logs it,
//! records the stage that failed, and moves on to the next article. Only
//! [`ConfigError`] is fatal, and only at startup.

use thiserror::Error;

/// Failure while downloading the listing page or an article page.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// The article page does not have the layout the extractor expects.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StructureError {
    #[error("content container not found")]
    ContainerMissing,

    #[error("article heading not found inside content container")]
    HeadingMissing,
}

/// Failure reported by a translation backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// Worth retrying: rate limiting, server errors, network trouble.
    #[error("transient translation failure: {0}")]
    Transient(String),

    /// Retrying cannot help: no translation found, unsupported input.
    #[error("translation unavailable: {0}")]
    Permanent(String),
}

impl TranslateError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TranslateError::Transient(_))
    }
}

/// Failure while posting a chunk to the channel.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The messaging API accepted the request but refused the message.
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Invalid or missing startup configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required setting `{0}` is missing or empty")]
    Missing(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Why a single article could not be delivered.
#[derive(Error, Debug)]
pub enum ArticleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_error_classification() {
        assert!(TranslateError::Transient("429".into()).is_transient());
        assert!(!TranslateError::Permanent("not found".into()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let e = FetchError::Status {
            url: "https://example.com".into(),
            status: 503,
        };
        assert_eq!(e.to_string(), "https://example.com returned HTTP 503");

        let e = ConfigError::Missing("bot_token");
        assert_eq!(e.to_string(), "required setting `bot_token` is missing or empty");

        let e: ArticleError = StructureError::HeadingMissing.into();
        assert_eq!(
            e.to_string(),
            "article heading not found inside content container"
        );
    }
}
