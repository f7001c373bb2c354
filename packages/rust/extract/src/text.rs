//! Visible-text helpers.

use scraper::Html;

use enricher_shared::{EXCERPT_CHARS, EXCERPT_ELLIPSIS};

/// Elements whose text content never shows up on the rendered page.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Text nodes in document order, skipping anything inside [`HIDDEN_ELEMENTS`].
pub(crate) fn visible_text_nodes(doc: &Html) -> impl Iterator<Item = &str> {
    doc.root_element().descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        (!hidden).then_some(&**text)
    })
}

/// All visible text concatenated as-is, lower-cased. Used for tag detection.
pub(crate) fn lowercase_text(doc: &Html) -> String {
    visible_text_nodes(doc).collect::<String>().to_lowercase()
}

/// Trimmed text nodes joined by single spaces, cut to [`EXCERPT_CHARS`]
/// characters and suffixed with [`EXCERPT_ELLIPSIS`].
///
/// `None` when the page has no visible text at all.
pub(crate) fn excerpt(doc: &Html) -> Option<String> {
    let joined = visible_text_nodes(doc)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        return None;
    }

    let mut out: String = joined.chars().take(EXCERPT_CHARS).collect();
    out.push_str(EXCERPT_ELLIPSIS);
    Some(out)
}
