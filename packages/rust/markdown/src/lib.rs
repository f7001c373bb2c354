//! Markdown rendering of enrichment records.
//!
//! The primary document is always rendered in full and replaces the previous
//! file. External-site data is appended as a separate section so a follow-up
//! pass never rewrites what the primary stage produced.

mod cleanup;
mod labels;

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use tracing::{debug, instrument};
use url::Url;

use enricher_shared::{EnricherError, EnrichmentRecord, EntryId, ExternalSiteData, Result};

pub use labels::Labels;

use cleanup::{first_present, single_line};

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the primary document for `record`.
///
/// Returns `None` for a short-circuited record (top-level `error`): failed
/// primary enrichment produces no markdown.
pub fn render_primary(id: &EntryId, record: &EnrichmentRecord, labels: &Labels) -> Option<String> {
    if record.is_failed() {
        return None;
    }
    let primary = record.primary.as_ref()?;
    let meta = &primary.meta;

    let mut md = String::new();

    let heading = first_present([meta.og_title.as_deref(), meta.title.as_deref()])
        .unwrap_or_else(|| id.to_string());
    let _ = writeln!(md, "# {heading}\n");

    let _ = writeln!(
        md,
        "**{}:** [{}]({})\n",
        labels.source,
        source_label(&record.source),
        record.source
    );

    if !primary.detected_tags.is_empty() {
        let tags: Vec<&str> = primary.detected_tags.iter().map(String::as_str).collect();
        let _ = writeln!(md, "**{}:** {}\n", labels.tags, tags.join(", "));
    }

    if let Some(description) =
        first_present([meta.og_description.as_deref(), meta.meta_description.as_deref()])
    {
        let _ = writeln!(md, "## {}\n{description}\n", labels.description);
    }

    if !primary.external_links.is_empty() {
        let _ = writeln!(md, "## {}", labels.external_links);
        for link in &primary.external_links {
            let _ = writeln!(md, "- {link}");
        }
    }

    if let Some((path, _)) = primary.saved_image() {
        let _ = writeln!(md, "\n![{}](./{path})", labels.preview_alt);
    }

    Some(md)
}

/// Render the section appended for external-site data.
pub fn render_external_section(data: &ExternalSiteData, labels: &Labels) -> String {
    let mut md = String::from("\n\n---\n");
    let _ = writeln!(md, "## {}: {}", labels.external_site, data.external_url);

    if let Some(title) = first_present([data.site_title.as_deref()]) {
        let _ = writeln!(md, "**{}:** {title}\n", labels.site_title);
    }
    if let Some(description) = first_present([data.site_description.as_deref()]) {
        let _ = writeln!(md, "**{}:** {description}\n", labels.site_description);
    }
    if let Some(excerpt) = data.site_text_excerpt.as_deref().filter(|e| !e.is_empty()) {
        let _ = writeln!(md, "**{}:**\n{excerpt}\n", labels.site_excerpt);
    }
    if !data.site_images.is_empty() {
        let _ = writeln!(md, "**{}:**", labels.site_previews);
        for image in &data.site_images {
            let _ = writeln!(md, "![{}]({image})", labels.preview_alt);
        }
    }

    md
}

/// Primary document plus the external section, if the record has one.
///
/// Produces the same bytes as a primary write followed by an append.
pub fn render_document(id: &EntryId, record: &EnrichmentRecord, labels: &Labels) -> Option<String> {
    let mut md = render_primary(id, record, labels)?;
    if let Some(external) = &record.external_site_data {
        md.push_str(&render_external_section(external, labels));
    }
    Some(md)
}

// ---------------------------------------------------------------------------
// File output
// ---------------------------------------------------------------------------

/// Write `markdown` to `path`, replacing any existing file.
#[instrument(skip(markdown), fields(path = %path.display()))]
pub fn write_document(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EnricherError::io(parent, e))?;
    }
    std::fs::write(path, markdown).map_err(|e| EnricherError::io(path, e))?;
    debug!(bytes = markdown.len(), "wrote markdown");
    Ok(())
}

/// Append the external-site section for `data` to the markdown file at `path`.
#[instrument(skip(data, labels), fields(path = %path.display(), external_url = %data.external_url))]
pub fn append_external_section(path: &Path, data: &ExternalSiteData, labels: &Labels) -> Result<()> {
    let section = render_external_section(data, labels);

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| EnricherError::io(path, e))?;
    file.write_all(section.as_bytes())
        .map_err(|e| EnricherError::io(path, e))?;

    debug!(bytes = section.len(), "appended external section");
    Ok(())
}

/// Link text for the source line: the host, or the raw URL if it has none.
fn source_label(source: &str) -> String {
    Url::parse(source)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| single_line(source))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
