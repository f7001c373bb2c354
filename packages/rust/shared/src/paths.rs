//! Path derivation for everything persisted per entry.
//!
//! The record store, the asset downloader and the renderer all go through
//! [`EntryPaths`] so the on-disk layout is defined in one place:
//!
//! ```text
//! <output_root>/
//! ├── enriched_<id>.json
//! ├── enriched_<id>.md
//! └── assets/<id>/
//!     ├── preview.<ext>
//!     └── site_image_<n>.<ext>
//! ```

use std::path::{Path, PathBuf};

use url::Url;

use crate::types::EntryId;

const ASSETS_DIR: &str = "assets";
const PREVIEW_STEM: &str = "preview";
const SITE_IMAGE_STEM: &str = "site_image";
const DEFAULT_IMAGE_EXT: &str = "jpg";
const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "avif", "bmp", "ico"];

/// All persisted locations for a single entry.
#[derive(Debug, Clone)]
pub struct EntryPaths {
    root: PathBuf,
    id: EntryId,
}

impl EntryPaths {
    pub fn new(output_root: impl Into<PathBuf>, id: &EntryId) -> Self {
        Self {
            root: output_root.into(),
            id: id.clone(),
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn output_root(&self) -> &Path {
        &self.root
    }

    pub fn record(&self) -> PathBuf {
        self.root.join(format!("enriched_{}.json", self.id))
    }

    pub fn markdown(&self) -> PathBuf {
        self.root.join(format!("enriched_{}.md", self.id))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(ASSETS_DIR).join(self.id.as_str())
    }

    pub fn preview_file_name(image_url: &Url) -> String {
        format!("{PREVIEW_STEM}.{}", image_extension(image_url))
    }

    pub fn site_image_file_name(n: usize, image_url: &Url) -> String {
        format!("{SITE_IMAGE_STEM}_{n}.{}", image_extension(image_url))
    }

    /// Absolute location of an asset file.
    pub fn asset(&self, file_name: &str) -> PathBuf {
        self.assets_dir().join(file_name)
    }

    /// Asset path relative to the output root, as stored in `imagePath`.
    pub fn asset_record_path(&self, file_name: &str) -> String {
        format!("{ASSETS_DIR}/{}/{file_name}", self.id)
    }

    /// Asset path as referenced from the entry's markdown file.
    pub fn asset_markdown_ref(&self, file_name: &str) -> String {
        format!("./{ASSETS_DIR}/{}/{file_name}", self.id)
    }
}

/// Image extension inferred from the URL path, falling back to `jpg`.
pub fn image_extension(image_url: &Url) -> &'static str {
    let last = image_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let ext = match last.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return DEFAULT_IMAGE_EXT,
    };

    IMAGE_EXTS
        .iter()
        .find(|known| **known == ext)
        .copied()
        .unwrap_or(DEFAULT_IMAGE_EXT)
}
