//! # Current Affairs Relay
//!
//! Scrapes a current-affairs listing page, translates each article, and
//! republishes the bilingual text to a Telegram channel.
//!
//! ## Usage
//!
//! ```sh
//! TELEGRAM_BOT_TOKEN=123:abc TELEGRAM_CHANNEL_ID=@currentadda current_affairs_relay
//! ```
//!
//! ## Architecture
//!
//! One sequential pipeline per run:
//! 1. **Locating**: collect article URLs from the listing page
//! 2. **Fetching** and **Extracting**: download each article, parse its blocks
//! 3. **Translating**: one call per block, falling back to the original text
//! 4. **Assembling**: bilingual body, split in two, footer, 4096-char chunks
//! 5. **Sending**: chunks go out strictly in order
//!
//! A liveness listener runs beside the pipeline on its own task and keeps the
//! process up after the run unless `--once` is given.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod assemble;
mod cli;
mod config;
mod error;
mod fetch;
mod liveness;
mod models;
mod pipeline;
mod scrapers;
mod telegram;
#[cfg(test)]
mod test_utils;
mod translate;
mod utils;

use assemble::MessageAssembler;
use cli::Cli;
use config::{FileConfig, RelayConfig};
use fetch::HttpFetcher;
use pipeline::DeliveryPipeline;
use scrapers::gktoday::{ArticleExtractor, ArticleLocator};
use telegram::TelegramSender;
use translate::{GoogleTranslate, RetryTranslate};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("current_affairs_relay starting up");

    // --- Configuration ---
    let args = Cli::parse();
    let file = match args.config.as_deref() {
        Some(path) => FileConfig::load(path).await?,
        None => FileConfig::default(),
    };
    let config = match RelayConfig::resolve(args, file) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    debug!(?config, "Resolved configuration");

    // --- Liveness listener, independent of the pipeline ---
    let listener = liveness::spawn(config.listen_port);

    // --- Pipeline ---
    let fetcher = HttpFetcher::new(config.fetch_timeout)?;
    let translator = RetryTranslate::new(
        GoogleTranslate::new(config.fetch_timeout)?,
        config.translate_attempts,
        config.translate_backoff,
    );
    let sender = TelegramSender::new(
        config.bot_token.clone(),
        config.telegram_api_base.clone(),
        config.fetch_timeout,
    )?;
    let pipeline = DeliveryPipeline::new(
        fetcher,
        ArticleLocator::new(config.listing_url.clone()),
        ArticleExtractor,
        translator,
        MessageAssembler::new(config.max_chunk_len, &config.channel_link),
        sender,
        config.channel_id.clone(),
        config.target_lang.clone(),
    );

    let summary = pipeline.run().await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        listing_failed = summary.listing_failed,
        located = summary.located,
        sent = summary.sent,
        failed = summary.failed,
        "Execution complete"
    );

    if config.once {
        listener.abort();
        return Ok(());
    }

    info!(port = config.listen_port, "Pipeline finished; liveness listener stays up");
    if let Err(e) = listener.await {
        error!(error = %e, "Liveness listener task ended unexpectedly");
    }
    Ok(())
}
