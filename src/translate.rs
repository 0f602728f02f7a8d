//! Text translation with bounded retry and passthrough fallback.
//!
//! # Architecture
//!
//! - [`Translate`]: core trait, one text in, translated text out
//! - [`GoogleTranslate`]: the Google Translate mobile web endpoint
//! - [`RetryTranslate`]: decorator adding fixed-interval retry and the
//!   passthrough fallback to any [`Translate`] implementation
//!
//! # Retry Strategy
//!
//! - At most 3 attempts by default
//! - Fixed 2 second pause between attempts (none after the last)
//! - [`TranslateError::Permanent`] stops immediately
//! - When every attempt fails the original text is returned unchanged, so a
//!   translation problem never aborts an article

use crate::error::TranslateError;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Mobile web endpoint; returns a small HTML page with the result.
pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.google.com/m";

/// Longest input the web endpoint accepts, in characters.
pub const MAX_INPUT_CHARS: usize = 5000;

static RESULT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.result-container, div.t0").unwrap());

/// Something that can translate text into a target language.
pub trait Translate {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslateError>;
}

/// Google Translate backend with automatic source-language detection.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    client: Client,
    endpoint: String,
}

impl GoogleTranslate {
    /// Build a client against the public endpoint.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Timeout for every request
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: GOOGLE_TRANSLATE_URL.to_string(),
        })
    }

    /// Pull the translated text out of the endpoint's HTML response.
    fn parse_result(html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&RESULT)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Map an HTTP status to the retry class it belongs to.
fn classify_status(status: StatusCode) -> TranslateError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        TranslateError::Transient(format!("HTTP {status}"))
    } else {
        TranslateError::Permanent(format!("HTTP {status}"))
    }
}

impl Translate for GoogleTranslate {
    #[instrument(level = "debug", skip_all, fields(target_lang = %target_lang, chars = text.chars().count()))]
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslateError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(text.to_string());
        }
        let chars = trimmed.chars().count();
        if chars > MAX_INPUT_CHARS {
            return Err(TranslateError::Permanent(format!(
                "input of {chars} characters exceeds the {MAX_INPUT_CHARS} character limit"
            )));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("sl", "auto"), ("tl", target_lang), ("q", trimmed)])
            .send()
            .await
            .map_err(|e| TranslateError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranslateError::Transient(e.to_string()))?;

        Self::parse_result(&body)
            .ok_or_else(|| TranslateError::Permanent("no translation found in response".into()))
    }
}

/// Wrapper that retries any [`Translate`] implementation at a fixed interval
/// and falls back to the original text.
pub struct RetryTranslate<T> {
    inner: T,
    max_attempts: usize,
    backoff: Duration,
}

impl<T> RetryTranslate<T>
where
    T: Translate,
{
    /// Wrap `inner` with retries.
    ///
    /// # Arguments
    ///
    /// * `inner` - The backend to call
    /// * `max_attempts` - Total tries per text; values below 1 are treated as 1
    /// * `backoff` - Pause between consecutive attempts
    pub fn new(inner: T, max_attempts: usize, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Translate `text`, returning it unchanged if translation fails.
    ///
    /// Transient failures are retried until the attempts run out; a permanent
    /// failure stops at once.
    ///
    /// # Arguments
    ///
    /// * `text` - Source text, any language
    /// * `target_lang` - Language code such as `gu`
    ///
    /// # Returns
    ///
    /// The translation, or `text` itself when every attempt failed.
    #[instrument(level = "debug", skip_all, fields(target_lang = %target_lang))]
    pub async fn translate_or_original(&self, text: &str, target_lang: &str) -> String {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            match self.inner.translate(text, target_lang).await {
                Ok(translated) => {
                    debug!(attempt, "Translation succeeded");
                    return translated;
                }
                Err(e) if !e.is_transient() => {
                    warn!(attempt, error = %e, "Translation unavailable; using original text");
                    return text.to_string();
                }
                Err(e) if attempt >= self.max_attempts => {
                    error!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        error = %e,
                        "Translation exhausted retries; using original text"
                    );
                    return text.to_string();
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        delay = ?self.backoff,
                        error = %e,
                        "Translation attempt failed; backing off"
                    );
                    sleep(self.backoff).await;
                }
            }
        }
    }
}

impl<T> fmt::Debug for RetryTranslate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTranslate")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}
