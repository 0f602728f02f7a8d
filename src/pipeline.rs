//! The delivery pipeline: locate → fetch → extract → translate → assemble →
//! send, one article at a time.
//!
//! Every collaborator is injected, so tests can swap the network-facing ones
//! ([`Fetch`], [`Translate`], [`Deliver`]) for in-memory doubles. A failure
//! in one article is logged and recorded in its [`ArticleOutcome`]; the next
//! article starts from [`Stage::Pending`] regardless.

use crate::assemble::MessageAssembler;
use crate::error::ArticleError;
use crate::fetch::Fetch;
use crate::models::{ArticleContent, ArticleReference, ContentBlock, Stage, TranslatedBlock, TranslatedPair};
use crate::scrapers::gktoday::{ArticleExtractor, ArticleLocator};
use crate::telegram::{Deliver, ParseMode};
use crate::translate::{RetryTranslate, Translate};
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// What happened to one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleOutcome {
    pub reference: ArticleReference,
    /// Last stage the article completed. `Sent` means fully delivered.
    pub reached: Stage,
    /// `Stage::Sent` on success, `Stage::Failed` otherwise.
    pub stage: Stage,
    pub chunks_sent: usize,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Whether the listing page itself could not be fetched.
    pub listing_failed: bool,
    pub located: usize,
    pub sent: usize,
    pub failed: usize,
    pub chunks_sent: usize,
}

impl RunSummary {
    fn from_outcomes(outcomes: &[ArticleOutcome]) -> Self {
        let sent = outcomes.iter().filter(|o| o.stage == Stage::Sent).count();
        Self {
            listing_failed: false,
            located: outcomes.len(),
            sent,
            failed: outcomes.len() - sent,
            chunks_sent: outcomes.iter().map(|o| o.chunks_sent).sum(),
        }
    }
}

#[derive(Debug)]
struct Progress {
    reached: Stage,
    chunks_sent: usize,
}

pub struct DeliveryPipeline<F, T, D> {
    fetcher: F,
    locator: ArticleLocator,
    extractor: ArticleExtractor,
    translator: RetryTranslate<T>,
    assembler: MessageAssembler,
    sender: D,
    channel_id: String,
    target_lang: String,
}

impl<F, T, D> DeliveryPipeline<F, T, D>
where
    F: Fetch,
    T: Translate,
    D: Deliver,
{
    /// Wire up a pipeline from its collaborators.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetches the listing page and every article page
    /// * `locator` - Finds article links on the listing page
    /// * `extractor` - Turns an article page into typed blocks
    /// * `translator` - Translates each text, falling back to the original
    /// * `assembler` - Builds bilingual chunks from the translated article
    /// * `sender` - Delivers each chunk to the channel
    /// * `channel_id` - Destination chat or `@channel` name
    /// * `target_lang` - Language code passed to the translator
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: F,
        locator: ArticleLocator,
        extractor: ArticleExtractor,
        translator: RetryTranslate<T>,
        assembler: MessageAssembler,
        sender: D,
        channel_id: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            locator,
            extractor,
            translator,
            assembler,
            sender,
            channel_id: channel_id.into(),
            target_lang: target_lang.into(),
        }
    }

    /// Locate articles on the listing page and deliver each in turn.
    ///
    /// Articles run strictly one after another. A failed article is logged
    /// and counted; it never stops the run.
    ///
    /// # Returns
    ///
    /// Totals for the run. `listing_failed` is set, and nothing is sent,
    /// when the listing page itself cannot be fetched or parsed.
    #[instrument(level = "info", skip_all, fields(listing = %self.locator.listing_url()))]
    pub async fn run(&self) -> RunSummary {
        let t0 = Instant::now();

        let references = match self.locator.locate(&self.fetcher).await {
            Ok(references) => references,
            Err(e) => {
                error!(error = %e, "Error fetching article URLs; skipping run");
                return RunSummary {
                    listing_failed: true,
                    ..RunSummary::default()
                };
            }
        };

        let outcomes: Vec<ArticleOutcome> = stream::iter(references)
            .then(|reference| async move { self.process_article(reference).await })
            .collect()
            .await;

        for outcome in outcomes.iter().filter(|o| o.stage == Stage::Failed) {
            warn!(
                url = %outcome.reference,
                reached = %outcome.reached,
                chunks_sent = outcome.chunks_sent,
                "Article not delivered"
            );
        }

        let summary = RunSummary::from_outcomes(&outcomes);
        info!(
            located = summary.located,
            sent = summary.sent,
            failed = summary.failed,
            chunks = summary.chunks_sent,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Run complete"
        );
        summary
    }

    /// Deliver one article, never propagating its failure.
    ///
    /// # Arguments
    ///
    /// * `reference` - URL of the article page
    ///
    /// # Returns
    ///
    /// The furthest stage reached, `Stage::Sent` or `Stage::Failed` as the
    /// final stage, and how many chunks went out before any failure.
    #[instrument(level = "info", skip_all, fields(url = %reference))]
    pub async fn process_article(&self, reference: ArticleReference) -> ArticleOutcome {
        info!("Scraping and sending");
        let mut progress = Progress {
            reached: Stage::Pending,
            chunks_sent: 0,
        };

        let stage = match self.deliver(&reference, &mut progress).await {
            Ok(()) => {
                info!(chunks = progress.chunks_sent, "Article delivered");
                Stage::Sent
            }
            Err(e) => {
                match &e {
                    ArticleError::Delivery(_) => error!(
                        reached = %progress.reached,
                        chunks_sent = progress.chunks_sent,
                        error = %e,
                        "Delivery failed; abandoning remaining chunks"
                    ),
                    _ => warn!(reached = %progress.reached, error = %e, "Skipping article"),
                }
                Stage::Failed
            }
        };

        ArticleOutcome {
            reference,
            reached: progress.reached,
            stage,
            chunks_sent: progress.chunks_sent,
        }
    }

    async fn deliver(&self, reference: &ArticleReference, progress: &mut Progress) -> Result<(), ArticleError> {
        let html = self.fetcher.fetch(&reference.url).await?;
        progress.reached = Stage::Fetched;

        let content = self.extractor.extract(&html)?;
        progress.reached = Stage::Extracted;
        info!(
            title = %truncate_for_log(&content.title, 120),
            blocks = content.blocks.len(),
            "Extracted article"
        );

        let (title, blocks) = self.translate_content(&content).await;
        progress.reached = Stage::Translated;

        let chunks = self.assembler.assemble(&title, &blocks);
        progress.reached = Stage::Assembled;

        for chunk in &chunks {
            debug!(index = progress.chunks_sent, chars = chunk.char_len(), "Sending chunk");
            self.sender
                .send(&self.channel_id, &chunk.text, ParseMode::Markdown)
                .await?;
            progress.chunks_sent += 1;
        }
        progress.reached = Stage::Sent;
        Ok(())
    }

    async fn pair(&self, text: &str) -> TranslatedPair {
        let translated = self.translator.translate_or_original(text, &self.target_lang).await;
        TranslatedPair::new(text, translated)
    }

    /// Translate the heading and every block, one call per text, in document
    /// order. The heading becomes the message title.
    async fn translate_content(&self, content: &ArticleContent) -> (TranslatedPair, Vec<TranslatedBlock>) {
        let mut title = TranslatedPair::new(content.title.as_str(), content.title.as_str());
        let mut blocks = Vec::with_capacity(content.blocks.len());

        for block in content.sequence() {
            let translated = match block {
                ContentBlock::Heading(text) => {
                    title = self.pair(&text).await;
                    continue;
                }
                ContentBlock::Paragraph(text) => TranslatedBlock::Paragraph(self.pair(&text).await),
                ContentBlock::SubHeading(text) => TranslatedBlock::SubHeading(self.pair(&text).await),
                ContentBlock::EmphasisBlock(text) => TranslatedBlock::EmphasisBlock(self.pair(&text).await),
                ContentBlock::ListBlock(items) => {
                    let mut pairs = Vec::with_capacity(items.len());
                    for item in &items {
                        pairs.push(self.pair(item).await);
                    }
                    TranslatedBlock::ListBlock(pairs)
                }
            };
            blocks.push(translated);
        }
        (title, blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{CHANNEL_LINK, MAX_MESSAGE_CHARS, promotion_footer};
    use crate::error::{DeliveryError, FetchError, TranslateError};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    const LISTING: &str = "https://news.test/current-affairs/";

    #[derive(Default)]
    struct Pages(HashMap<String, String>);

    impl Pages {
        fn with(mut self, url: &str, html: &str) -> Self {
            self.0.insert(url.to_string(), html.to_string());
            self
        }
    }

    impl Fetch for Pages {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.0.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// Upper-cases text; fails permanently on anything containing "untranslatable".
    struct Shout;

    impl Translate for Shout {
        async fn translate(&self, text: &str, _target_lang: &str) -> Result<String, TranslateError> {
            if text.contains("untranslatable") {
                Err(TranslateError::Permanent("not found".into()))
            } else {
                Ok(text.to_uppercase())
            }
        }
    }

    /// Records sent messages; rejects any text containing `reject_marker`.
    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(String, String)>>,
        reject_marker: Option<&'static str>,
    }

    impl Deliver for &Outbox {
        async fn send(&self, chat_id: &str, text: &str, _parse_mode: ParseMode) -> Result<(), DeliveryError> {
            if let Some(marker) = self.reject_marker {
                if text.contains(marker) {
                    return Err(DeliveryError::Rejected("Bad Request".into()));
                }
            }
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn listing(paths: &[&str]) -> String {
        paths
            .iter()
            .map(|p| format!(r#"<h1 id="list"><a href="{p}">x</a></h1>"#))
            .collect()
    }

    fn article(title: &str, body: &str) -> String {
        format!(
            r#"<div class="inside_post column content_width"><h1 id="list">{title}</h1>{body}<div class="prenext"><p>nav</p></div></div>"#
        )
    }

    fn pipeline<'a>(pages: Pages, outbox: &'a Outbox, max_chunk: usize) -> DeliveryPipeline<Pages, Shout, &'a Outbox> {
        DeliveryPipeline::new(
            pages,
            ArticleLocator::new(Url::parse(LISTING).unwrap()),
            ArticleExtractor,
            RetryTranslate::new(Shout, 3, Duration::ZERO),
            MessageAssembler::new(max_chunk, CHANNEL_LINK),
            outbox,
            "@channel",
            "gu",
        )
    }

    #[tokio::test]
    async fn test_run_delivers_articles_in_order() {
        let pages = Pages::default()
            .with(LISTING, &listing(&["/a/", "/b/"]))
            .with("https://news.test/a/", &article("Alpha", "<p>one</p>"))
            .with("https://news.test/b/", &article("Beta", "<p>two</p>"));
        let outbox = Outbox::default();

        let summary = pipeline(pages, &outbox, MAX_MESSAGE_CHARS).run().await;

        assert_eq!(
            summary,
            RunSummary {
                listing_failed: false,
                located: 2,
                sent: 2,
                failed: 0,
                chunks_sent: 4,
            }
        );
        let sent = outbox.sent.lock().unwrap();
        let footer = promotion_footer(CHANNEL_LINK);
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|(chat, _)| chat == "@channel"));
        // the body splits after the newline past its middle, leaving "\n" as part two
        assert_eq!(
            sent[0].1,
            format!("🌟 ALPHA\n\n🌟 Alpha\n\n🔸 ONE\n\n🔸 one\n{footer}")
        );
        assert_eq!(sent[1].1, format!("🌟 ALPHA\n\n🌟 Alpha\n\n\n{footer}"));
        assert!(sent[2].1.starts_with("🌟 BETA\n\n🌟 Beta\n\n"));
        assert!(sent[3].1.starts_with("🌟 BETA\n\n🌟 Beta\n\n"));
    }

    #[tokio::test]
    async fn test_broken_article_does_not_stop_run() {
        let pages = Pages::default()
            .with(LISTING, &listing(&["/missing/", "/bad/", "/good/"]))
            .with("https://news.test/bad/", "<div class=\"other\"></div>")
            .with("https://news.test/good/", &article("Good", "<p>fine</p>"));
        let outbox = Outbox::default();
        let pipeline = pipeline(pages, &outbox, MAX_MESSAGE_CHARS);

        let missing = pipeline
            .process_article(ArticleReference::new("https://news.test/missing/"))
            .await;
        assert_eq!((missing.reached, missing.stage), (Stage::Pending, Stage::Failed));

        let bad = pipeline
            .process_article(ArticleReference::new("https://news.test/bad/"))
            .await;
        assert_eq!((bad.reached, bad.stage), (Stage::Fetched, Stage::Failed));

        let summary = pipeline.run().await;
        assert_eq!((summary.located, summary.sent, summary.failed), (3, 1, 2));
        let sent = outbox.sent.lock().unwrap();
        assert!(!sent.is_empty());
        assert!(sent.iter().all(|(_, t)| t.starts_with("🌟 GOOD\n\n🌟 Good\n\n")));
    }

    #[tokio::test]
    async fn test_run_proceeds_when_liveness_port_is_taken() {
        let taken = std::net::TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = taken.local_addr().unwrap().port();
        let listener = crate::liveness::spawn(port);

        let pages = Pages::default()
            .with(LISTING, &listing(&["/a/"]))
            .with("https://news.test/a/", &article("Alpha", "<p>one</p>"));
        let outbox = Outbox::default();
        let summary = pipeline(pages, &outbox, MAX_MESSAGE_CHARS).run().await;

        assert_eq!((summary.located, summary.sent), (1, 1));
        assert!(!outbox.sent.lock().unwrap().is_empty());
        // the listener task gives up on the bind error instead of panicking
        tokio::time::timeout(Duration::from_secs(5), listener)
            .await
            .expect("listener task should finish")
            .expect("listener task should not panic");
        drop(taken);
    }

    #[tokio::test]
    async fn test_listing_failure_skips_run() {
        let outbox = Outbox::default();

        let summary = pipeline(Pages::default(), &outbox, MAX_MESSAGE_CHARS).run().await;

        assert!(summary.listing_failed);
        assert_eq!(summary.located, 0);
        assert!(outbox.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_untranslatable_text_passes_through() {
        let pages = Pages::default().with(
            "https://news.test/a/",
            &article("Title", "<p>untranslatable bit</p><ul><li>x</li></ul>"),
        );
        let outbox = Outbox::default();

        let outcome = pipeline(pages, &outbox, MAX_MESSAGE_CHARS)
            .process_article(ArticleReference::new("https://news.test/a/"))
            .await;

        assert_eq!(outcome.stage, Stage::Sent);
        let sent = outbox.sent.lock().unwrap();
        let text: String = sent.iter().map(|(_, t)| t.as_str()).collect();
        assert!(text.contains("🔸 untranslatable bit\n\n🔸 untranslatable bit\n"));
        assert!(text.contains("• X\n• x\n"));
    }

    #[tokio::test]
    async fn test_delivery_failure_abandons_remaining_chunks() {
        let pages = Pages::default().with(
            "https://news.test/a/",
            &article("Title", &format!("<p>{}</p><p>STOP</p>", "w".repeat(120))),
        );
        let outbox = Outbox {
            reject_marker: Some("STOP"),
            ..Outbox::default()
        };

        let outcome = pipeline(pages, &outbox, 100)
            .process_article(ArticleReference::new("https://news.test/a/"))
            .await;

        assert_eq!(outcome.stage, Stage::Failed);
        assert_eq!(outcome.reached, Stage::Assembled);
        let sent = outbox.sent.lock().unwrap();
        assert_eq!(outcome.chunks_sent, sent.len());
        assert!(sent.iter().all(|(_, t)| !t.contains("STOP")));
    }
}
