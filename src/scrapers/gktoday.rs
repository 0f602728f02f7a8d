//! GKToday current-affairs scraper.
//!
//! The listing page links each article from an `h1#list` heading. Article
//! pages keep their body in a single `div` with the class attribute
//! `inside_post column content_width`; the direct children of that `div` are
//! the body blocks, followed by a share widget and a `prenext` navigation bar.
//!
//! Class sentinels are compared as whole class lists (same tokens, same
//! order), never by "contains", so a stray extra class makes an element an
//! ordinary block again.

use crate::error::{FetchError, StructureError};
use crate::fetch::Fetch;
use crate::models::{ArticleContent, ArticleReference, ContentBlock};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// Default listing page.
pub const LISTING_URL: &str = "https://www.gktoday.in/current-affairs/";

/// Class attribute of the article body container.
pub const CONTAINER_CLASS: &str = "inside_post column content_width";

/// Class attribute of the share-button widget, skipped during extraction.
pub const SHARE_WIDGET_CLASS: &str =
    "sharethis-inline-share-buttons st-center st-has-labels st-inline-share-buttons st-animated";

/// Class attribute of the next/previous navigation bar; extraction stops here.
pub const NAVIGATION_CLASS: &str = "prenext";

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1#list").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static CONTAINER: Lazy<Selector> = Lazy::new(|| Selector::parse("div[class]").unwrap());
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());

/// True when the element's class attribute is exactly `sentinel`.
fn class_is(element: &ElementRef<'_>, sentinel: &str) -> bool {
    match element.value().attr("class") {
        Some(class) => class.split_whitespace().eq(sentinel.split_whitespace()),
        None => false,
    }
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Discovers article URLs on the listing page.
#[derive(Debug, Clone)]
pub struct ArticleLocator {
    listing_url: Url,
}

impl ArticleLocator {
    pub fn new(listing_url: Url) -> Self {
        Self { listing_url }
    }

    pub fn listing_url(&self) -> &Url {
        &self.listing_url
    }

    /// Fetch the listing page and return its article URLs in document order.
    ///
    /// An empty result is not an error.
    #[instrument(level = "info", skip_all, fields(listing = %self.listing_url))]
    pub async fn locate<F: Fetch>(&self, fetcher: &F) -> Result<Vec<ArticleReference>, FetchError> {
        let html = fetcher.fetch(self.listing_url.as_str()).await?;
        let references = self.parse_listing(&html);

        info!(count = references.len(), "Indexed article URLs");
        debug!(urls = ?references.iter().map(|r| r.url.as_str()).collect::<Vec<_>>(), "Article URLs");
        Ok(references)
    }

    /// Take the first link inside every `h1#list` heading.
    ///
    /// Headings whose first link has no usable `href` are skipped. Relative
    /// links are resolved against the listing URL.
    pub fn parse_listing(&self, html: &str) -> Vec<ArticleReference> {
        let document = Html::parse_document(html);

        document
            .select(&HEADING)
            .filter_map(|heading| heading.select(&LINK).next())
            .filter_map(|link| link.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .filter_map(|href| self.listing_url.join(href).ok())
            .map(|url| ArticleReference::new(url.to_string()))
            .collect()
    }
}

/// Turns one article page into its title and ordered content blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleExtractor;

impl ArticleExtractor {
    pub fn extract(&self, html: &str) -> Result<ArticleContent, StructureError> {
        let document = Html::parse_document(html);

        let container = document
            .select(&CONTAINER)
            .find(|el| el.value().name() == "div" && class_is(el, CONTAINER_CLASS))
            .ok_or(StructureError::ContainerMissing)?;

        let heading = container
            .select(&HEADING)
            .next()
            .ok_or(StructureError::HeadingMissing)?;

        let mut blocks = Vec::new();
        for child in container.children().filter_map(ElementRef::wrap) {
            if class_is(&child, SHARE_WIDGET_CLASS) {
                continue;
            }
            if class_is(&child, NAVIGATION_CLASS) {
                break;
            }

            let block = match child.value().name() {
                "p" => ContentBlock::Paragraph(text_of(&child)),
                "h2" => ContentBlock::SubHeading(text_of(&child)),
                "h4" => ContentBlock::EmphasisBlock(text_of(&child)),
                "ul" => ContentBlock::ListBlock(child.select(&LIST_ITEM).map(|li| text_of(&li)).collect()),
                _ => continue,
            };
            blocks.push(block);
        }

        let content = ArticleContent {
            title: text_of(&heading),
            blocks,
        };
        debug!(
            kinds = ?content.sequence().iter().map(ContentBlock::kind).collect::<Vec<_>>(),
            "Extracted article blocks"
        );
        Ok(content)
    }
}
