//! Shared types, error model, and configuration for the vault enricher.
//!
//! This crate is the foundation depended on by all other enricher crates.
//! It provides:
//! - [`EnricherError`]: the unified error type
//! - Domain types ([`EnrichmentRecord`], [`ExternalSiteData`], [`EntryId`], [`Vocabulary`])
//! - Per-entry path derivation ([`EntryPaths`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogEntry, DefaultsConfig, EnrichmentSettings, PipelineConfig, RenderConfig,
    RenderLanguage, config_dir, config_file_path, expand_home, init_config, init_config_at,
    load_config, load_config_from, validate_config,
};
pub use error::{EnricherError, Result};
pub use paths::{EntryPaths, image_extension};
pub use types::{
    DEFAULT_VOCABULARY, EXCERPT_CHARS, EXCERPT_ELLIPSIS, EnrichmentRecord, EntryId,
    ExternalSiteData, MAX_SITE_IMAGES, PrimaryFields, RecordMeta, Vocabulary,
};
