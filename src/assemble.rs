//! Bilingual message assembly.
//!
//! An article becomes one or two posts. Each post starts with the same
//! preamble (translated title, then original title), carries half of the
//! rendered body, and ends with the channel promotion footer. Posts longer
//! than the channel limit are cut into chunks.
//!
//! All lengths and cut points are counted in `char`s, never bytes, since the
//! translated half is mostly multi-byte script.

use crate::models::{MessageChunk, TranslatedBlock, TranslatedPair};

/// Largest message the channel accepts.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Channel link advertised in the footer.
pub const CHANNEL_LINK: &str = "https://telegram.me/currentadda";

const TITLE_MARKER: &str = "🌟";
const PARAGRAPH_MARKER: &str = "🔸";
const SUBHEADING_MARKER: &str = "🔹";
const EMPHASIS_MARKER: &str = "⚡";
const BULLET_MARKER: &str = "•";

/// Characters that may end the first half of a body.
const BOUNDARIES: [char; 4] = ['\n', '.', '!', '?'];

/// Build the promotion footer appended to every post.
pub fn promotion_footer(channel_link: &str) -> String {
    format!(
        "\n━━━━━━━━━━━━━━━━━━━━\n\
         🔥 **Stay Updated with the Latest News!** 🔥\n\
         Join our Telegram channel for:\n\
         📈 Latest Current Updates\n\
         📰 Breaking News\n\
         📚 In-Depth Articles\n\
         💡 GK \n\
         \n\
         👉 [**Join Our Telegram Channel**]({channel_link}) 👈\n\
         ━━━━━━━━━━━━━━━━━━━━\n"
    )
}

/// Translated title followed by the original, each on its own paragraph.
pub fn preamble(title: &TranslatedPair) -> String {
    format!(
        "{TITLE_MARKER} {}\n\n{TITLE_MARKER} {}\n\n",
        title.translated, title.original
    )
}

fn push_pair(body: &mut String, marker: &str, pair: &TranslatedPair) {
    body.push_str(&format!(
        "{marker} {}\n\n{marker} {}\n\n",
        pair.translated, pair.original
    ));
}

/// Render all blocks into one body, translation before original.
///
/// Paragraphs, sub-headings and emphasis blocks each get their own marker.
/// List items are rendered one bullet pair per item, in list order.
///
/// # Arguments
///
/// * `blocks` - Translated body blocks in document order
///
/// # Returns
///
/// The rendered body, before splitting or footers.
pub fn render_body(blocks: &[TranslatedBlock]) -> String {
    let mut body = String::new();
    for block in blocks {
        match block {
            TranslatedBlock::Paragraph(pair) => push_pair(&mut body, PARAGRAPH_MARKER, pair),
            TranslatedBlock::SubHeading(pair) => push_pair(&mut body, SUBHEADING_MARKER, pair),
            TranslatedBlock::EmphasisBlock(pair) => push_pair(&mut body, EMPHASIS_MARKER, pair),
            TranslatedBlock::ListBlock(items) => {
                for item in items {
                    body.push_str(&format!(
                        "{BULLET_MARKER} {}\n{BULLET_MARKER} {}\n",
                        item.translated, item.original
                    ));
                }
                body.push('\n');
            }
        }
    }
    body
}

/// Split `body` just after the first boundary character at or past its
/// middle.
///
/// Boundaries are `\n`, `.`, `!` and `?`. The middle is measured in
/// characters, not bytes.
///
/// # Arguments
///
/// * `body` - The rendered body to split
///
/// # Returns
///
/// `(first, second)` with `first + second == body`. Without a boundary at or
/// past the middle the whole body is `first` and `second` is empty.
pub fn split_in_two(body: &str) -> (&str, &str) {
    let mid = body.chars().count() / 2;
    let cut = body
        .char_indices()
        .skip(mid)
        .find(|(_, c)| BOUNDARIES.contains(c))
        .map(|(i, c)| i + c.len_utf8());

    match cut {
        Some(at) => body.split_at(at),
        None => (body, ""),
    }
}

/// Cut `message` into pieces of at most `max_chars` characters each.
///
/// # Arguments
///
/// * `message` - Text to cut
/// * `max_chars` - Chunk size in characters (values below 1 are treated as 1)
///
/// # Returns
///
/// `ceil(chars / max_chars)` chunks whose concatenation is `message`. Cuts
/// ignore words and sentences. An empty message yields no chunks.
pub fn split_message(message: &str, max_chars: usize) -> Vec<MessageChunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for c in message.chars() {
        current.push(c);
        count += 1;
        if count == max_chars {
            chunks.push(MessageChunk {
                text: std::mem::take(&mut current),
            });
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(MessageChunk { text: current });
    }
    chunks
}

/// Turns a translated article into ordered, deliverable chunks.
#[derive(Debug, Clone)]
pub struct MessageAssembler {
    max_chunk_chars: usize,
    footer: String,
}

impl Default for MessageAssembler {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_CHARS, CHANNEL_LINK)
    }
}

impl MessageAssembler {
    /// # Arguments
    ///
    /// * `max_chunk_chars` - Largest chunk to emit, in characters
    /// * `channel_link` - Link advertised in every footer
    pub fn new(max_chunk_chars: usize, channel_link: &str) -> Self {
        Self {
            max_chunk_chars,
            footer: promotion_footer(channel_link),
        }
    }

    /// Build the deliverable chunks for one article.
    ///
    /// # Arguments
    ///
    /// * `title` - The article heading and its translation
    /// * `blocks` - Translated body blocks in document order
    ///
    /// # Returns
    ///
    /// Chunks of the first post followed by chunks of the second. The second
    /// post exists only when the body split leaves a non-empty second half;
    /// both posts carry the same preamble and footer.
    pub fn assemble(&self, title: &TranslatedPair, blocks: &[TranslatedBlock]) -> Vec<MessageChunk> {
        let preamble = preamble(title);
        let body = render_body(blocks);
        let (first, second) = split_in_two(&body);

        let mut chunks = split_message(&format!("{preamble}{first}{}", self.footer), self.max_chunk_chars);
        if !second.is_empty() {
            chunks.extend(split_message(
                &format!("{preamble}{second}{}", self.footer),
                self.max_chunk_chars,
            ));
        }
        chunks
    }
}
