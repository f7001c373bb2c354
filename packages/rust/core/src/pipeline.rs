//! Per-entry enrichment run: primary source, then at most one external site.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use url::Url;

use enricher_fetch::{AssetDownloader, Fetcher};
use enricher_markdown::Labels;
use enricher_shared::{
    EnricherError, EnrichmentRecord, EntryId, EntryPaths, ExternalSiteData, PipelineConfig,
    PrimaryFields, Result,
};
use enricher_storage::RecordStore;

use crate::select::{markers_for, select_external_link};

// ---------------------------------------------------------------------------
// State and outcome
// ---------------------------------------------------------------------------

/// Stages of one enrichment run, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    PrimaryFetched,
    PrimaryExtracted,
    PrimaryImageResolved,
    PrimaryPersisted,
    ExternalSelected,
    ExternalFetched,
    ExternalExtracted,
    ExternalImagesResolved,
    ExternalPersisted,
    Done,
    Failed,
}

/// What happened to the external branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalOutcome {
    /// Disabled, or no link matched a marker.
    Skipped,
    /// External site enriched; `images` site images saved.
    Enriched { url: Url, images: usize },
    /// External fetch failed; recorded under `externalSiteData.error`.
    Failed { url: Url, error: String },
}

/// Result of one enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub id: EntryId,
    /// Path of the persisted JSON record.
    pub record_path: PathBuf,
    /// Path of the markdown document, if one was written.
    pub markdown_path: Option<PathBuf>,
    /// Every state reached, starting with [`PipelineState::Start`].
    pub states: Vec<PipelineState>,
    /// Primary fetch failure, if the run short-circuited.
    pub primary_error: Option<String>,
    pub external: ExternalOutcome,
    pub elapsed: Duration,
}

impl EnrichOutcome {
    pub fn is_failed(&self) -> bool {
        self.primary_error.is_some()
    }

    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Start)
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a run completes.
    fn done(&self, outcome: &EnrichOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _outcome: &EnrichOutcome) {}
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Runs the enrichment pipeline for single entries.
///
/// Only the enricher calls the fetcher, extractor, downloader, store and
/// renderer. Every stage is awaited before the next one starts.
#[derive(Debug)]
pub struct Enricher {
    fetcher: Fetcher,
    downloader: AssetDownloader,
    store: RecordStore,
    config: PipelineConfig,
    labels: &'static Labels,
}

impl Enricher {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.timeout_secs)?;
        let downloader = fetcher.asset_downloader();
        let store = RecordStore::new(config.output_root.clone());
        let labels = Labels::for_language(config.language);

        Ok(Self {
            fetcher,
            downloader,
            store,
            config,
            labels,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Enrich `id` from `source`, then follow one external link if enabled.
    ///
    /// A primary fetch failure is not an error: it is persisted as
    /// `{source, error}` and reported through [`EnrichOutcome::primary_error`].
    /// Only persistence failures are returned as `Err`.
    #[instrument(skip_all, fields(id = %id, source = %source))]
    pub async fn enrich(
        &self,
        id: &EntryId,
        source: &Url,
        extra_markers: &[String],
        progress: &dyn ProgressReporter,
    ) -> Result<EnrichOutcome> {
        let start = Instant::now();
        let paths = self.store.paths(id);
        let mut states = vec![PipelineState::Start];

        let previous = match self.store.load(id) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable previous record");
                None
            }
        };

        // --- Primary fetch ---
        progress.phase("Fetching source");
        let document = match self.fetcher.fetch(source).await {
            Ok(document) => document,
            Err(e) => {
                let error = e.to_string();
                warn!(%error, "primary fetch failed");
                let record_path = self
                    .store
                    .save(id, &EnrichmentRecord::failed(source.as_str(), error.clone()))?;
                states.push(PipelineState::Failed);

                let outcome = EnrichOutcome {
                    id: id.clone(),
                    record_path,
                    markdown_path: None,
                    states,
                    primary_error: Some(error),
                    external: ExternalOutcome::Skipped,
                    elapsed: start.elapsed(),
                };
                progress.done(&outcome);
                return Ok(outcome);
            }
        };
        states.push(PipelineState::PrimaryFetched);

        // --- Extraction ---
        progress.phase("Extracting signals");
        let signals = enricher_extract::extract(&document.body, source, &self.config.vocabulary);
        states.push(PipelineState::PrimaryExtracted);

        let mut primary = PrimaryFields {
            external_links: signals.external_links,
            meta: signals.meta,
            detected_tags: signals.detected_tags,
            ..PrimaryFields::default()
        };

        // --- Preview image ---
        if let Some(image_url) = &signals.preview_image {
            progress.phase("Saving preview image");
            let previous_primary = previous.as_ref().and_then(|r| r.primary.as_ref());
            self.resolve_preview(&paths, image_url, previous_primary, &mut primary)
                .await;
        }
        states.push(PipelineState::PrimaryImageResolved);

        // --- Persist primary ---
        progress.phase("Writing record");
        let mut record = EnrichmentRecord {
            source: source.to_string(),
            primary: Some(primary),
            ..EnrichmentRecord::default()
        };
        let record_path = self.store.save(id, &record)?;
        let markdown_path = self.write_primary_markdown(id, &paths, &record)?;
        states.push(PipelineState::PrimaryPersisted);

        info!(
            links = record.primary.as_ref().map_or(0, |p| p.external_links.len()),
            tags = record.primary.as_ref().map_or(0, |p| p.detected_tags.len()),
            "primary enrichment saved"
        );

        // --- External branch ---
        let external = if self.config.follow_external {
            let target = self.select_target(id, &record, extra_markers);
            match target {
                Some(url) => {
                    self.run_external(id, &paths, &mut record, url, progress, &mut states)
                        .await?
                }
                None => ExternalOutcome::Skipped,
            }
        } else {
            ExternalOutcome::Skipped
        };
        states.push(PipelineState::Done);

        let outcome = EnrichOutcome {
            id: id.clone(),
            record_path,
            markdown_path: Some(markdown_path),
            states,
            primary_error: None,
            external,
            elapsed: start.elapsed(),
        };
        progress.done(&outcome);
        Ok(outcome)
    }

    /// Re-run only the external branch against the stored record for `id`.
    ///
    /// The markdown document is re-rendered from the primary fields before the
    /// new external section is appended, so repeated passes do not stack
    /// sections. If no link matches, nothing is touched.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn enrich_external(
        &self,
        id: &EntryId,
        extra_markers: &[String],
        progress: &dyn ProgressReporter,
    ) -> Result<EnrichOutcome> {
        let start = Instant::now();
        let paths = self.store.paths(id);
        let mut states = vec![PipelineState::Start];

        let mut record = self.store.load(id)?.ok_or_else(|| {
            EnricherError::validation(format!("no enrichment record for '{id}'; run enrich first"))
        })?;

        let mut outcome = EnrichOutcome {
            id: id.clone(),
            record_path: paths.record(),
            markdown_path: None,
            states: Vec::new(),
            primary_error: record.error.clone(),
            external: ExternalOutcome::Skipped,
            elapsed: Duration::ZERO,
        };

        if record.is_failed() {
            info!("record has a primary error, nothing to follow");
        } else if let Some(url) = self.select_target(id, &record, extra_markers) {
            record.external_site_data = None;
            let markdown_path = self.write_primary_markdown(id, &paths, &record)?;
            outcome.external = self
                .run_external(id, &paths, &mut record, url, progress, &mut states)
                .await?;
            outcome.markdown_path = Some(markdown_path);
        } else {
            info!("no external link matched");
        }

        states.push(PipelineState::Done);
        outcome.states = states;
        outcome.elapsed = start.elapsed();
        progress.done(&outcome);
        Ok(outcome)
    }

    /// Reuse or download the preview image, updating `primary` on success.
    ///
    /// A preview already saved from the same URL is kept without a new
    /// request, as long as the file is still on disk.
    async fn resolve_preview(
        &self,
        paths: &EntryPaths,
        image_url: &Url,
        previous: Option<&PrimaryFields>,
        primary: &mut PrimaryFields,
    ) {
        let file_name = EntryPaths::preview_file_name(image_url);
        let dest = paths.asset(&file_name);
        let record_path = paths.asset_record_path(&file_name);

        let unchanged = previous
            .and_then(PrimaryFields::saved_image)
            .is_some_and(|(path, url)| path == record_path && url == image_url.as_str());

        if unchanged && dest.is_file() {
            debug!(path = %record_path, "preview unchanged, reusing saved file");
            primary.set_image(record_path, image_url.as_str());
        } else if self.downloader.download(image_url, &dest).await {
            primary.set_image(record_path, image_url.as_str());
        } else {
            primary.clear_image();
        }
    }

    fn select_target(
        &self,
        id: &EntryId,
        record: &EnrichmentRecord,
        extra_markers: &[String],
    ) -> Option<Url> {
        let primary = record.primary.as_ref()?;
        let markers = markers_for(&self.config, id, extra_markers);
        let target = select_external_link(&primary.external_links, &markers);
        debug!(?markers, target = ?target.as_ref().map(Url::as_str), "external selection");
        target
    }

    /// Fetch `url`, collect its signals and images, persist, append markdown.
    async fn run_external(
        &self,
        id: &EntryId,
        paths: &EntryPaths,
        record: &mut EnrichmentRecord,
        url: Url,
        progress: &dyn ProgressReporter,
        states: &mut Vec<PipelineState>,
    ) -> Result<ExternalOutcome> {
        states.push(PipelineState::ExternalSelected);
        info!(external_url = %url, "following external link");

        progress.phase("Fetching external site");
        let (data, outcome) = match self.fetcher.fetch(&url).await {
            Ok(document) => {
                states.push(PipelineState::ExternalFetched);

                let site = enricher_extract::extract_site(&document.body, &url);
                states.push(PipelineState::ExternalExtracted);

                progress.phase("Saving site images");
                let site_images = self
                    .downloader
                    .download_site_images(&site.image_candidates, paths)
                    .await;
                states.push(PipelineState::ExternalImagesResolved);

                let images = site_images.len();
                let data = ExternalSiteData {
                    external_url: url.to_string(),
                    site_title: site.title,
                    site_description: site.description,
                    site_images,
                    site_text_excerpt: site.text_excerpt,
                    error: None,
                };
                (data, ExternalOutcome::Enriched { url, images })
            }
            Err(e) => {
                let error = e.to_string();
                warn!(%error, "external fetch failed");
                states.push(PipelineState::Failed);
                (
                    ExternalSiteData::failed(url.as_str(), error.clone()),
                    ExternalOutcome::Failed { url, error },
                )
            }
        };

        progress.phase("Writing record");
        record.external_site_data = Some(data);
        self.store.save(id, record)?;
        if let Some(data) = &record.external_site_data {
            enricher_markdown::append_external_section(&paths.markdown(), data, self.labels)?;
        }
        states.push(PipelineState::ExternalPersisted);

        Ok(outcome)
    }

    /// Render and write the primary document, replacing any previous file.
    fn write_primary_markdown(
        &self,
        id: &EntryId,
        paths: &EntryPaths,
        record: &EnrichmentRecord,
    ) -> Result<PathBuf> {
        let path = paths.markdown();
        let markdown = enricher_markdown::render_primary(id, record, self.labels).ok_or_else(|| {
            EnricherError::validation(format!("record for '{id}' has no primary fields"))
        })?;
        enricher_markdown::write_document(&path, &markdown)?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("enricher-core-test-{}", uuid::Uuid::now_v7()))
    }

    fn test_config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            output_root: root.to_path_buf(),
            timeout_secs: 5,
            ..PipelineConfig::default()
        }
    }

    fn id(s: &str) -> EntryId {
        s.parse().unwrap()
    }

    fn html(body: String) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string(body)
    }

    fn png() -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "image/png")
            .set_body_bytes(vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3])
    }

    /// Base URL of `server` under a host name distinct from `127.0.0.1`, so
    /// links to it count as external from another mock server.
    fn external_base(server: &MockServer) -> String {
        server.uri().replace("127.0.0.1", "localhost")
    }

    /// Primary page on `primary`, linking to an external page on `external`.
    async fn mount_sites(primary: &MockServer, external: &MockServer) {
        let primary_html = format!(
            r#"<html><head>
<title>Widget page</title>
<meta property="og:title" content="Widget">
<meta property="og:image" content="{p}/img/preview.png">
</head><body>
<p>A textured mesh from one image.</p>
<a href="https://a.example/x">other</a>
<a href="{e}/widget">vendor site</a>
</body></html>"#,
            p = primary.uri(),
            e = external_base(external)
        );
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(html(primary_html))
            .mount(primary)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/preview.png"))
            .respond_with(png())
            .expect(1)
            .mount(primary)
            .await;

        let external_html = r#"<html><head>
<title>Vendor</title>
<meta name="description" content="Makes widgets">
</head><body><p>Vendor home</p><img src="/shot.png"></body></html>"#;
        Mock::given(method("GET"))
            .and(path("/widget"))
            .respond_with(html(external_html.to_string()))
            .mount(external)
            .await;
        Mock::given(method("GET"))
            .and(path("/shot.png"))
            .respond_with(png())
            .mount(external)
            .await;
    }

    fn external_marker(external: &MockServer) -> Vec<String> {
        vec![format!("{}/widget", external_base(external))]
    }

    fn page_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/page", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn full_run_persists_primary_and_external() {
        let primary = MockServer::start().await;
        let external = MockServer::start().await;
        mount_sites(&primary, &external).await;

        let root = temp_root();
        let enricher = Enricher::new(test_config(&root)).unwrap();
        let entry = id("widget");

        let outcome = enricher
            .enrich(&entry, &page_url(&primary), &external_marker(&external), &SilentProgress)
            .await
            .unwrap();

        assert!(!outcome.is_failed());
        assert_eq!(outcome.final_state(), PipelineState::Done);
        assert!(outcome.states.contains(&PipelineState::ExternalPersisted));
        assert!(matches!(outcome.external, ExternalOutcome::Enriched { images: 1, .. }));

        let record = enricher.store().load(&entry).unwrap().unwrap();
        let fields = record.primary.as_ref().unwrap();
        assert_eq!(fields.meta.og_title.as_deref(), Some("Widget"));
        assert!(fields.detected_tags.contains("mesh"));
        assert!(fields.detected_tags.contains("textured"));
        assert_eq!(
            fields.image_path.as_deref(),
            Some("assets/widget/preview.png")
        );
        assert!(root.join("assets/widget/preview.png").is_file());

        let site = record.external_site_data.as_ref().unwrap();
        assert_eq!(site.site_title.as_deref(), Some("Vendor"));
        assert_eq!(site.site_images, vec!["./assets/widget/site_image_1.png"]);
        assert!(root.join("assets/widget/site_image_1.png").is_file());

        let markdown = std::fs::read_to_string(root.join("enriched_widget.md")).unwrap();
        assert!(markdown.starts_with("# Widget\n"));
        assert!(markdown.contains("**Tags:** mesh, textured"));
        assert!(markdown.contains("\n---\n## External site: "));
        assert!(markdown.contains("![preview](./assets/widget/site_image_1.png)"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn rerun_is_idempotent_and_reuses_preview() {
        let primary = MockServer::start().await;
        let external = MockServer::start().await;
        mount_sites(&primary, &external).await;

        let root = temp_root();
        let enricher = Enricher::new(test_config(&root)).unwrap();
        let entry = id("widget");
        let markers = external_marker(&external);

        enricher
            .enrich(&entry, &page_url(&primary), &markers, &SilentProgress)
            .await
            .unwrap();
        let first_json = std::fs::read(root.join("enriched_widget.json")).unwrap();
        let first_md = std::fs::read(root.join("enriched_widget.md")).unwrap();

        enricher
            .enrich(&entry, &page_url(&primary), &markers, &SilentProgress)
            .await
            .unwrap();
        let second_json = std::fs::read(root.join("enriched_widget.json")).unwrap();
        let second_md = std::fs::read(root.join("enriched_widget.md")).unwrap();

        assert_eq!(first_json, second_json);
        assert_eq!(first_md, second_md);

        // `expect(1)` on the preview mock is verified here.
        primary.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn primary_failure_records_source_and_error_only() {
        let primary = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&primary)
            .await;

        let root = temp_root();
        let enricher = Enricher::new(test_config(&root)).unwrap();
        let entry = id("missing");

        let outcome = enricher
            .enrich(&entry, &page_url(&primary), &[], &SilentProgress)
            .await
            .unwrap();

        assert!(outcome.is_failed());
        assert_eq!(outcome.final_state(), PipelineState::Failed);
        assert!(outcome.markdown_path.is_none());
        assert!(!root.join("enriched_missing.md").exists());

        let raw = std::fs::read_to_string(root.join("enriched_missing.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["source"], page_url(&primary).as_str());
        assert!(obj["error"].as_str().unwrap().contains("404"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn external_failure_leaves_primary_fields_untouched() {
        let primary = MockServer::start().await;
        let external = MockServer::start().await;
        mount_sites(&primary, &external).await;

        let root = temp_root();
        let entry = id("widget");

        // Baseline without the external pass.
        let config = PipelineConfig {
            follow_external: false,
            ..test_config(&root)
        };
        let baseline = Enricher::new(config).unwrap();
        baseline
            .enrich(&entry, &page_url(&primary), &[], &SilentProgress)
            .await
            .unwrap();
        let before = baseline.store().load(&entry).unwrap().unwrap();

        external.reset().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&external)
            .await;

        let enricher = Enricher::new(test_config(&root)).unwrap();
        let outcome = enricher
            .enrich(&entry, &page_url(&primary), &external_marker(&external), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(outcome.final_state(), PipelineState::Done);
        assert!(matches!(outcome.external, ExternalOutcome::Failed { .. }));

        let after = enricher.store().load(&entry).unwrap().unwrap();
        assert_eq!(after.primary, before.primary);
        assert!(after.error.is_none());
        let site = after.external_site_data.unwrap();
        assert!(site.error.as_deref().unwrap().contains("503"));
        assert!(site.site_title.is_none());
        assert!(site.site_images.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn no_marker_match_skips_external_branch() {
        let primary = MockServer::start().await;
        let external = MockServer::start().await;
        mount_sites(&primary, &external).await;

        let root = temp_root();
        let config = PipelineConfig {
            external_markers: vec!["nothing-matches".into()],
            match_entry_id: false,
            ..test_config(&root)
        };
        let enricher = Enricher::new(config).unwrap();
        let entry = id("widget");

        let outcome = enricher
            .enrich(&entry, &page_url(&primary), &[], &SilentProgress)
            .await
            .unwrap();

        assert_eq!(outcome.external, ExternalOutcome::Skipped);
        assert!(!outcome.states.contains(&PipelineState::ExternalSelected));

        let raw = std::fs::read_to_string(root.join("enriched_widget.json")).unwrap();
        assert!(!raw.contains("externalSiteData"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn site_images_capped_at_five() {
        let primary = MockServer::start().await;
        let external = MockServer::start().await;

        let primary_html = format!(
            r#"<html><body><a href="{}/gallery">gallery</a></body></html>"#,
            external_base(&external)
        );
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(html(primary_html))
            .mount(&primary)
            .await;

        let imgs: String = (1..=8).map(|n| format!(r#"<img src="/i{n}.png">"#)).collect();
        Mock::given(method("GET"))
            .and(path("/gallery"))
            .respond_with(html(format!("<html><body>{imgs}</body></html>")))
            .mount(&external)
            .await;
        Mock::given(method("GET"))
            .respond_with(png())
            .mount(&external)
            .await;

        let root = temp_root();
        let enricher = Enricher::new(test_config(&root)).unwrap();
        let entry = id("gallery");

        enricher
            .enrich(&entry, &page_url(&primary), &["gallery".to_string()], &SilentProgress)
            .await
            .unwrap();

        let record = enricher.store().load(&entry).unwrap().unwrap();
        let site = record.external_site_data.unwrap();
        assert_eq!(site.site_images.len(), 5);
        assert_eq!(site.site_images[4], "./assets/gallery/site_image_5.png");
        assert!(!root.join("assets/gallery/site_image_6.png").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn enrich_external_requires_a_record() {
        let root = temp_root();
        let enricher = Enricher::new(test_config(&root)).unwrap();

        let err = enricher
            .enrich_external(&id("unknown"), &[], &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EnricherError::Validation { .. }));
    }

    #[tokio::test]
    async fn enrich_external_rewrites_the_section_once() {
        let primary = MockServer::start().await;
        let external = MockServer::start().await;
        mount_sites(&primary, &external).await;

        let root = temp_root();
        let entry = id("widget");
        let markers = external_marker(&external);
        let enricher = Enricher::new(test_config(&root)).unwrap();

        enricher
            .enrich(&entry, &page_url(&primary), &markers, &SilentProgress)
            .await
            .unwrap();
        let after_enrich = std::fs::read_to_string(root.join("enriched_widget.md")).unwrap();

        let outcome = enricher
            .enrich_external(&entry, &markers, &SilentProgress)
            .await
            .unwrap();
        assert!(matches!(outcome.external, ExternalOutcome::Enriched { .. }));

        let after_pass = std::fs::read_to_string(root.join("enriched_widget.md")).unwrap();
        assert_eq!(after_pass, after_enrich);
        assert_eq!(after_pass.matches("\n---\n").count(), 1);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn enrich_external_on_failed_record_does_nothing() {
        let root = temp_root();
        let enricher = Enricher::new(test_config(&root)).unwrap();
        let entry = id("broken");
        enricher
            .store()
            .save(&entry, &EnrichmentRecord::failed("https://x.example", "HTTP 500"))
            .unwrap();

        let outcome = enricher
            .enrich_external(&entry, &[], &SilentProgress)
            .await
            .unwrap();

        assert!(outcome.is_failed());
        assert_eq!(outcome.external, ExternalOutcome::Skipped);
        assert!(!root.join("enriched_broken.md").exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
