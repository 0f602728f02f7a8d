//! Command-line interface definitions for the relay.
//!
//! Every option can also come from the environment, which is how the
//! process is usually configured when it runs under a supervisor.

use clap::Parser;

/// Command-line arguments for the current-affairs relay.
///
/// # Examples
///
/// ```sh
/// # Credentials from the environment, everything else defaulted
/// TELEGRAM_BOT_TOKEN=123:abc TELEGRAM_CHANNEL_ID=@currentadda current_affairs_relay
///
/// # One run without keeping the liveness listener alive
/// current_affairs_relay --bot-token 123:abc --channel-id @currentadda --once
///
/// # Settings from a YAML file
/// current_affairs_relay -c relay.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Destination channel (`@name` or numeric id)
    #[arg(long, env = "TELEGRAM_CHANNEL_ID")]
    pub channel_id: String,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Listing page to scrape for article links
    #[arg(long, env = "LISTING_URL")]
    pub listing_url: Option<String>,

    /// Target language code for translations
    #[arg(long, env = "TARGET_LANG")]
    pub target_lang: Option<String>,

    /// Port for the liveness listener
    #[arg(long, env = "PORT")]
    pub listen_port: Option<u16>,

    /// Timeout for every page fetch, in seconds
    #[arg(long)]
    pub fetch_timeout_secs: Option<u64>,

    /// Maximum characters per delivered message
    #[arg(long)]
    pub max_chunk_len: Option<usize>,

    /// Exit after one run instead of keeping the liveness listener up
    #[arg(long)]
    pub once: bool,
}
