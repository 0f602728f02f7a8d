//! Data models flowing through the relay pipeline.
//!
//! This module defines the values passed between stages:
//! - [`ArticleReference`]: an article URL discovered on the listing page
//! - [`ContentBlock`]: one typed piece of article body text
//! - [`ArticleContent`]: the heading plus the ordered blocks of one article
//! - [`TranslatedPair`]: original text next to its translation
//! - [`MessageChunk`]: a bounded piece of an assembled message
//! - [`Stage`]: how far an article got through the pipeline
//!
//! Nothing here is mutated after construction.

use std::fmt;

/// A URL identifying one article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleReference {
    pub url: String,
}

impl ArticleReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl fmt::Display for ArticleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A typed piece of article text, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// The article title (`h1`).
    Heading(String),
    /// A `p` element.
    Paragraph(String),
    /// An `h2` element.
    SubHeading(String),
    /// An `h4` element.
    EmphasisBlock(String),
    /// A `ul` element; one string per `li`, in order.
    ListBlock(Vec<String>),
}

impl ContentBlock {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Heading(_) => "heading",
            ContentBlock::Paragraph(_) => "paragraph",
            ContentBlock::SubHeading(_) => "subheading",
            ContentBlock::EmphasisBlock(_) => "emphasis",
            ContentBlock::ListBlock(_) => "list",
        }
    }
}

/// Everything extracted from one article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    /// Text of the article heading, used as the message title.
    pub title: String,
    /// Body blocks in document order. The title is not repeated here.
    pub blocks: Vec<ContentBlock>,
}

impl ArticleContent {
    /// The full document-order sequence, heading first.
    pub fn sequence(&self) -> Vec<ContentBlock> {
        std::iter::once(ContentBlock::Heading(self.title.clone()))
            .chain(self.blocks.iter().cloned())
            .collect()
    }
}

/// Original text alongside its translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPair {
    pub original: String,
    pub translated: String,
}

impl TranslatedPair {
    pub fn new(original: impl Into<String>, translated: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            translated: translated.into(),
        }
    }
}

/// A translated body block. List blocks keep one pair per item.
///
/// The heading is carried separately as the message title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslatedBlock {
    Paragraph(TranslatedPair),
    SubHeading(TranslatedPair),
    EmphasisBlock(TranslatedPair),
    ListBlock(Vec<TranslatedPair>),
}

/// One deliverable slice of an assembled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChunk {
    pub text: String,
}

impl MessageChunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Pipeline progress for a single article.
///
/// Stages advance strictly in declaration order; `Failed` can follow any of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Fetched,
    Extracted,
    Translated,
    Assembled,
    Sent,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Pending => "pending",
            Stage::Fetched => "fetched",
            Stage::Extracted => "extracted",
            Stage::Translated => "translated",
            Stage::Assembled => "assembled",
            Stage::Sent => "sent",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}
