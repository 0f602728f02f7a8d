//! News source scrapers.
//!
//! A scraper has two halves:
//!
//! 1. **Locating**: discover article URLs on the source's listing page
//! 2. **Extracting**: turn one article page into typed content blocks
//!
//! | Source | Module | Listing | Body container |
//! |--------|--------|---------|----------------|
//! | GKToday current affairs | [`gktoday`] | `h1#list a` | `div.inside_post column content_width` |

pub mod gktoday;
