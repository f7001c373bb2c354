//! Structured signal extraction from fetched HTML.
//!
//! Extraction never fails: anything the document does not provide comes back
//! as `None` (or an empty set), never as an error or a placeholder string.
//!
//! - [`extract`]: signals for the primary source (meta, links, tags, preview)
//! - [`extract_site`]: the reduced signal set for a linked external site

mod text;

use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use enricher_shared::{RecordMeta, Vocabulary};

static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_SEL: LazyLock<Selector> = LazyLock::new(|| selector("meta"));
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| selector("img[src]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Everything the primary stage reads out of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSignals {
    /// `<title>` plus the recognised `<meta>` values.
    pub meta: RecordMeta,
    /// Absolute links to hosts other than the document's own.
    pub external_links: BTreeSet<String>,
    /// Vocabulary terms found in the visible text.
    pub detected_tags: BTreeSet<String>,
    /// Preview image: `og:image`, else the first `<img src>`.
    pub preview_image: Option<Url>,
}

/// The reduced signal set read from an external site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteSignals {
    pub title: Option<String>,
    /// `<meta name="description">`, trimmed.
    pub description: Option<String>,
    /// Every `<img src>` in document order, resolved to absolute http(s) URLs.
    pub image_candidates: Vec<Url>,
    /// Leading visible text with an ellipsis marker.
    pub text_excerpt: Option<String>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract primary-stage signals from `html`, fetched from `base_url`.
pub fn extract(html: &str, base_url: &Url, vocabulary: &Vocabulary) -> ParsedSignals {
    let doc = Html::parse_document(html);

    let mut meta = scan_meta(&doc);
    meta.title = extract_title(&doc);

    let signals = ParsedSignals {
        meta,
        external_links: external_links(&doc, base_url),
        detected_tags: detect_tags(&text::lowercase_text(&doc), vocabulary),
        preview_image: preview_image(&doc, base_url),
    };

    debug!(
        url = %base_url,
        links = signals.external_links.len(),
        tags = signals.detected_tags.len(),
        has_preview = signals.preview_image.is_some(),
        "extracted primary signals"
    );

    signals
}

/// Extract external-site signals from `html`, fetched from `base_url`.
pub fn extract_site(html: &str, base_url: &Url) -> SiteSignals {
    let doc = Html::parse_document(html);

    let description = doc
        .select(&META_SEL)
        .find(|el| el.value().attr("name") == Some("description"))
        .map(|el| content_of(&el).trim().to_string());

    let image_candidates = doc
        .select(&IMG_SEL)
        .filter_map(|el| el.value().attr("src"))
        .filter_map(|src| resolve_http(base_url, src))
        .collect();

    let signals = SiteSignals {
        title: extract_title(&doc),
        description,
        image_candidates,
        text_excerpt: text::excerpt(&doc),
    };

    debug!(
        url = %base_url,
        images = signals.image_candidates.len(),
        "extracted site signals"
    );

    signals
}

/// Literal, case-insensitive substring detection of vocabulary terms.
///
/// `lowercase_text` must already be lower-cased. There is no word-boundary
/// check: "render" matches inside "rendering" and "3d" inside "3dfx".
pub fn detect_tags(lowercase_text: &str, vocabulary: &Vocabulary) -> BTreeSet<String> {
    vocabulary
        .terms()
        .iter()
        .filter(|term| lowercase_text.contains(term.as_str()))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trimmed text of the first `<title>`; `None` if there is no such element.
fn extract_title(doc: &Html) -> Option<String> {
    doc.select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// `og:title`, `og:description` and `description`. The last match wins.
fn scan_meta(doc: &Html) -> RecordMeta {
    let mut meta = RecordMeta::default();

    for el in doc.select(&META_SEL) {
        let attrs = el.value();
        match (attrs.attr("property"), attrs.attr("name")) {
            (Some("og:title"), _) => meta.og_title = Some(content_of(&el)),
            (Some("og:description"), _) => meta.og_description = Some(content_of(&el)),
            (_, Some("description")) => meta.meta_description = Some(content_of(&el)),
            _ => {}
        }
    }

    meta
}

fn content_of(el: &ElementRef<'_>) -> String {
    el.value().attr("content").unwrap_or_default().to_string()
}

fn external_links(doc: &Html, base_url: &Url) -> BTreeSet<String> {
    let own_host = base_url.host_str();

    doc.select(&ANCHOR_SEL)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| {
            // Relative hrefs fail to parse on their own and are dropped here.
            match Url::parse(href) {
                Ok(url) => {
                    matches!(url.scheme(), "http" | "https")
                        && url.host_str().is_some()
                        && url.host_str() != own_host
                }
                Err(_) => false,
            }
        })
        .map(str::to_string)
        .collect()
}

fn preview_image(doc: &Html, base_url: &Url) -> Option<Url> {
    let og_image = doc
        .select(&META_SEL)
        .find(|el| el.value().attr("property") == Some("og:image"))
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .and_then(|content| resolve_http(base_url, content));

    og_image.or_else(|| {
        doc.select(&IMG_SEL)
            .filter_map(|el| el.value().attr("src"))
            .map(str::trim)
            .find(|src| !src.is_empty())
            .and_then(|src| resolve_http(base_url, src))
    })
}

/// Resolve `reference` against `base`, keeping only http(s) results.
fn resolve_http(base: &Url, reference: &str) -> Option<Url> {
    let resolved = base.join(reference.trim()).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
