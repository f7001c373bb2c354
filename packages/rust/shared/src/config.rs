//! Application configuration for the enricher.
//!
//! User config lives at `~/.vault-enricher/enricher.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EnricherError, Result};
use crate::types::{DEFAULT_VOCABULARY, Vocabulary};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "enricher.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".vault-enricher";

// ---------------------------------------------------------------------------
// Config structs (matching enricher.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Extraction and external-site selection settings.
    #[serde(default)]
    pub enrichment: EnrichmentSettings,

    /// Markdown rendering settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Catalog entries enriched by `enricher batch`.
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory receiving records, markdown and assets.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_output_dir() -> String {
    "output".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    /// Keyword vocabulary for tag detection.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Substrings that qualify an external link for the follow-up pass.
    #[serde(default = "default_external_markers")]
    pub external_markers: Vec<String>,

    /// Also treat the entry identifier itself as a marker.
    #[serde(default = "default_true")]
    pub match_entry_id: bool,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            external_markers: default_external_markers(),
            match_entry_id: true,
        }
    }
}

fn default_keywords() -> Vec<String> {
    DEFAULT_VOCABULARY.iter().map(|s| (*s).to_string()).collect()
}
fn default_external_markers() -> Vec<String> {
    vec!["github.io".into()]
}
fn default_true() -> bool {
    true
}

/// Label language for rendered markdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderLanguage {
    #[default]
    En,
    Ru,
}

/// `[render]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub language: RenderLanguage,
}

/// `[[entries]]`: one catalog item to enrich.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Entry identifier (filesystem-safe).
    pub id: String,
    /// Primary source URL.
    pub url: String,
    /// Extra external-link markers for this entry only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory for all persisted output.
    pub output_root: PathBuf,
    /// Per-request HTTP timeout in seconds (must be > 0).
    pub timeout_secs: u64,
    /// Keyword vocabulary passed to the extractor.
    pub vocabulary: Vocabulary,
    /// Global external-link markers.
    pub external_markers: Vec<String>,
    /// Whether the entry identifier counts as a marker.
    pub match_entry_id: bool,
    /// Whether to run the external-site pass at all.
    pub follow_external: bool,
    /// Markdown label language.
    pub language: RenderLanguage,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_root: expand_home(&config.defaults.output_dir),
            timeout_secs: config.defaults.timeout_secs,
            vocabulary: Vocabulary::new(&config.enrichment.keywords),
            external_markers: config.enrichment.external_markers.clone(),
            match_entry_id: config.enrichment.match_entry_id,
            follow_external: true,
            language: config.render.language,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.vault-enricher/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| EnricherError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.vault-enricher/enricher.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EnricherError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        EnricherError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| EnricherError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| EnricherError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| EnricherError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

/// Reject settings the pipeline cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.defaults.timeout_secs == 0 {
        return Err(EnricherError::config(
            "defaults.timeout_secs must be greater than zero",
        ));
    }
    if config.enrichment.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(EnricherError::config(
            "enrichment.keywords must contain at least one term",
        ));
    }
    Ok(())
}
