//! Core domain types for enrichment records.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keyword terms detected in page text when no vocabulary is configured.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "3d",
    "reconstruction",
    "mesh",
    "image-to-3d",
    "glb",
    "upload image",
    "textured",
    "render",
];

/// Maximum number of images kept from an external site.
pub const MAX_SITE_IMAGES: usize = 5;

/// Number of visible-text characters kept in an external site excerpt.
pub const EXCERPT_CHARS: usize = 1000;

/// Marker appended to every external site excerpt.
pub const EXCERPT_ELLIPSIS: &str = "...";

static ENTRY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid entry id regex"));

// ---------------------------------------------------------------------------
// EntryId
// ---------------------------------------------------------------------------

/// Filesystem-safe key naming one catalog entry.
///
/// Every persisted path (record, markdown, assets) is derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = crate::EnricherError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if ENTRY_ID_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(crate::EnricherError::validation(format!(
                "invalid entry id '{s}': use letters, digits, '.', '_' or '-'"
            )))
        }
    }
}

impl TryFrom<String> for EntryId {
    type Error = crate::EnricherError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// The keyword set searched for in visible page text.
///
/// Terms are stored lower-cased; detection is literal substring containment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
}

impl Vocabulary {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_VOCABULARY)
    }
}

// ---------------------------------------------------------------------------
// EnrichmentRecord
// ---------------------------------------------------------------------------

/// The persisted enrichment state for one entry (`enriched_<id>.json`).
///
/// A record whose primary fetch failed carries only `source` and `error`;
/// `primary` is `None` in that case and nothing else is serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRecord {
    /// URL of the primary document.
    pub source: String,
    /// Fields produced by the primary stage.
    #[serde(flatten)]
    pub primary: Option<PrimaryFields>,
    /// Result of the follow-up pass over one external site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_site_data: Option<ExternalSiteData>,
    /// Terminal primary fetch failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichmentRecord {
    /// An empty record for a fresh run against `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// A short-circuited record: `{source, error}` and nothing else.
    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            primary: None,
            external_site_data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Signals collected from the primary document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryFields {
    // No `#[serde(default)]` on the required keys: an error record must
    // deserialize with `primary == None`.
    /// Absolute links pointing away from the source host.
    pub external_links: BTreeSet<String>,
    pub meta: RecordMeta,
    /// Vocabulary terms found in the visible text.
    pub detected_tags: BTreeSet<String>,
    pub image_saved: bool,
    /// Preview path relative to the output root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PrimaryFields {
    /// Mark the preview as saved. Keeps `imageSaved` and the path/url pair in step.
    pub fn set_image(&mut self, path: impl Into<String>, url: impl Into<String>) {
        self.image_saved = true;
        self.image_path = Some(path.into());
        self.image_url = Some(url.into());
    }

    pub fn clear_image(&mut self) {
        self.image_saved = false;
        self.image_path = None;
        self.image_url = None;
    }

    /// The saved preview as `(path, url)`, if any.
    pub fn saved_image(&self) -> Option<(&str, &str)> {
        if !self.image_saved {
            return None;
        }
        match (&self.image_path, &self.image_url) {
            (Some(path), Some(url)) => Some((path, url)),
            _ => None,
        }
    }
}

/// `<meta>`/`<title>` values. Each key is present only if detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

/// Reduced record for the external site linked from the primary source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSiteData {
    pub external_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_description: Option<String>,
    /// Markdown-relative paths of saved images, in save order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub site_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_text_excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExternalSiteData {
    /// A failed external pass: `{externalUrl, error}` only.
    pub fn failed(external_url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            external_url: external_url.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
