//! Readable text of a recipe page for the AI fallback.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Node, Selector};

pub const MIN_CONTENT_CHARS: usize = 100;
pub const MAX_CONTENT_CHARS: usize = 8000;

const SKIPPED_TAGS: [&str; 8] = [
    "script", "style", "nav", "footer", "header", "aside", "iframe", "noscript",
];

lazy_static! {
    static ref MAIN: Selector = Selector::parse("main").unwrap();
    static ref ARTICLE: Selector = Selector::parse("article").unwrap();
    static ref CONTENT_CLASS: Selector =
        Selector::parse("[class*='recipe'], [class*='content'], [class*='post']").unwrap();
    static ref BODY: Selector = Selector::parse("body").unwrap();
    static ref OG_IMAGE: Selector = Selector::parse("meta[property='og:image']").unwrap();
    static ref TWITTER_IMAGE: Selector = Selector::parse("meta[name='twitter:image']").unwrap();
}

/// Text of the most specific content container, one text run per line.
///
/// Returns `None` when fewer than [`MIN_CONTENT_CHARS`] remain; longer text
/// is cut at [`MAX_CONTENT_CHARS`].
pub fn extract_main_content(document: &Html) -> Option<String> {
    let root = [&*MAIN, &*ARTICLE, &*CONTENT_CLASS, &*BODY]
        .iter()
        .find_map(|selector| document.select(selector).find(|el| !is_skipped(*el)))
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    collect_text(root, &mut lines);
    let text = lines.join("\n");

    if text.chars().count() < MIN_CONTENT_CHARS {
        return None;
    }
    Some(text.chars().take(MAX_CONTENT_CHARS).collect())
}

/// `og:image`, else `twitter:image`.
pub fn meta_thumbnail(document: &Html) -> Option<String> {
    [&*OG_IMAGE, &*TWITTER_IMAGE].iter().find_map(|selector| {
        document
            .select(selector)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    })
}

fn collect_text(element: ElementRef, lines: &mut Vec<String>) {
    if SKIPPED_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    lines.push(text.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, lines);
                }
            }
            _ => {}
        }
    }
}

/// The element is, or sits inside, a tag whose text is dropped.
fn is_skipped(element: ElementRef) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| SKIPPED_TAGS.contains(&el.value().name()))
}
