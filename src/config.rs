//! Runtime configuration.
//!
//! Settings are resolved once at startup, in increasing precedence:
//! built-in defaults, the optional YAML file, then CLI flags and environment
//! variables. Credentials never come from the file and have no default.

use crate::assemble::{CHANNEL_LINK, MAX_MESSAGE_CHARS};
use crate::cli::Cli;
use crate::error::ConfigError;
use crate::scrapers::gktoday::LISTING_URL;
use crate::telegram::API_BASE;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Optional settings file. Every key may be omitted.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub listing_url: Option<String>,
    pub target_lang: Option<String>,
    pub listen_port: Option<u16>,
    pub fetch_timeout_secs: Option<u64>,
    pub max_chunk_len: Option<usize>,
    pub translate_attempts: Option<usize>,
    pub translate_backoff_secs: Option<u64>,
    pub channel_link: Option<String>,
    /// Bot API server, for a self-hosted Bot API deployment.
    pub telegram_api_base: Option<String>,
}

impl FileConfig {
    pub fn from_yaml(path: &str, yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let file = Self::from_yaml(path, &yaml)?;
        info!("Loaded config file");
        Ok(file)
    }
}

/// Fully resolved settings for one process.
#[derive(Clone)]
pub struct RelayConfig {
    pub bot_token: String,
    pub channel_id: String,
    pub listing_url: Url,
    pub target_lang: String,
    pub listen_port: u16,
    pub fetch_timeout: Duration,
    pub max_chunk_len: usize,
    pub translate_attempts: usize,
    pub translate_backoff: Duration,
    pub channel_link: String,
    pub telegram_api_base: String,
    pub once: bool,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bot_token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("listing_url", &self.listing_url.as_str())
            .field("target_lang", &self.target_lang)
            .field("listen_port", &self.listen_port)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("max_chunk_len", &self.max_chunk_len)
            .field("translate_attempts", &self.translate_attempts)
            .field("translate_backoff", &self.translate_backoff)
            .field("channel_link", &self.channel_link)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("once", &self.once)
            .finish()
    }
}

fn required(value: String, name: &'static str) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        Err(ConfigError::Missing(name))
    } else {
        Ok(value)
    }
}

impl RelayConfig {
    /// Merge CLI/environment values over the file and defaults, then validate.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let bot_token = required(cli.bot_token, "bot_token")?;
        let channel_id = required(cli.channel_id, "channel_id")?;

        let listing_raw = cli
            .listing_url
            .or(file.listing_url)
            .unwrap_or_else(|| LISTING_URL.to_string());
        let listing_url = Url::parse(&listing_raw).map_err(|e| ConfigError::Invalid {
            field: "listing_url",
            reason: e.to_string(),
        })?;

        let target_lang = required(
            cli.target_lang.or(file.target_lang).unwrap_or_else(|| "gu".to_string()),
            "target_lang",
        )?;

        let max_chunk_len = cli
            .max_chunk_len
            .or(file.max_chunk_len)
            .unwrap_or(MAX_MESSAGE_CHARS);
        if max_chunk_len == 0 {
            return Err(ConfigError::Invalid {
                field: "max_chunk_len",
                reason: "must be greater than zero".into(),
            });
        }

        let translate_attempts = file.translate_attempts.unwrap_or(3);
        if translate_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "translate_attempts",
                reason: "must be at least 1".into(),
            });
        }

        let telegram_api_base = file
            .telegram_api_base
            .unwrap_or_else(|| API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&telegram_api_base).map_err(|e| ConfigError::Invalid {
            field: "telegram_api_base",
            reason: e.to_string(),
        })?;

        Ok(Self {
            bot_token,
            channel_id,
            listing_url,
            target_lang,
            listen_port: cli.listen_port.or(file.listen_port).unwrap_or(8080),
            fetch_timeout: Duration::from_secs(
                cli.fetch_timeout_secs.or(file.fetch_timeout_secs).unwrap_or(30),
            ),
            max_chunk_len,
            translate_attempts,
            translate_backoff: Duration::from_secs(file.translate_backoff_secs.unwrap_or(2)),
            channel_link: file.channel_link.unwrap_or_else(|| CHANNEL_LINK.to_string()),
            telegram_api_base,
            once: cli.once,
        })
    }
}
