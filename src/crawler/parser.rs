//! HTML body cleaning
//!
//! Question, answer and forum post bodies arrive as HTML fragments. This
//! module turns them into plain text and pulls out the embedded blocks each
//! record keeps separately:
//! - Code (`<code>`)
//! - Quotes (`<blockquote>`)
//! - List items (`<li>`)
//! - Paragraphs (`<p>`)
//!
//! Whole pages (wiki package pages) are queried with CSS selectors.

use scraper::{ElementRef, Html, Selector};

/// Kinds of embedded blocks that can be extracted from a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    ListItem,
    Code,
    Quote,
    Paragraph,
}

impl BlockKind {
    fn selector(self) -> &'static str {
        match self {
            Self::ListItem => "li",
            Self::Code => "code",
            Self::Quote => "blockquote",
            Self::Paragraph => "p",
        }
    }
}

/// Turns marked-up text into what a record stores
pub trait BodyCleaner: Send + Sync {
    /// Plain text with tags stripped and entities decoded
    fn clean_text(&self, html: &str) -> String;

    /// Text of every block of `kind`, in document order
    fn extract_blocks(&self, html: &str, kind: BlockKind) -> Vec<String>;

    /// Trimmed, non-empty text of every element of a full page matching `selector`
    ///
    /// An invalid selector matches nothing.
    fn select_text(&self, html: &str, selector: &str) -> Vec<String>;
}

/// `BodyCleaner` backed by an HTML5 parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlCleaner;

impl BodyCleaner for HtmlCleaner {
    fn clean_text(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        element_text(fragment.root_element())
    }

    fn extract_blocks(&self, html: &str, kind: BlockKind) -> Vec<String> {
        let selector = match Selector::parse(kind.selector()) {
            Ok(selector) => selector,
            Err(_) => return Vec::new(),
        };

        let fragment = Html::parse_fragment(html);
        fragment
            .select(&selector)
            .map(|element| match kind {
                // Code keeps its own whitespace
                BlockKind::Code => element.text().collect::<String>(),
                _ => element_text(element),
            })
            .filter(|text| !text.trim().is_empty())
            .collect()
    }

    fn select_text(&self, html: &str, selector: &str) -> Vec<String> {
        let selector = match Selector::parse(selector) {
            Ok(selector) => selector,
            Err(_) => {
                tracing::debug!("Ignoring invalid selector");
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        document
            .select(&selector)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect()
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
