//! JSON record store.
//!
//! One pretty-printed `enriched_<id>.json` per entry under the output root.
//! The store overwrites whole files and never merges: callers load, mutate
//! and save.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use enricher_shared::{EnricherError, EnrichmentRecord, EntryId, EntryPaths, Result};

const RECORD_PREFIX: &str = "enriched_";
const RECORD_SUFFIX: &str = ".json";

/// File-backed store for [`EnrichmentRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// A store rooted at `output_root`. Nothing is created until the first save.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            root: output_root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persisted locations for `id`.
    pub fn paths(&self, id: &EntryId) -> EntryPaths {
        EntryPaths::new(&self.root, id)
    }

    /// Load the record for `id`, or `None` if it was never saved.
    pub fn load(&self, id: &EntryId) -> Result<Option<EnrichmentRecord>> {
        let path = self.paths(id).record();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| EnricherError::io(&path, e))?;
        let record = serde_json::from_str(&content).map_err(|e| {
            EnricherError::validation(format!("invalid record {}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), "loaded record");
        Ok(Some(record))
    }

    /// Overwrite the record for `id`. Returns the file path.
    ///
    /// Written to a temp file and renamed, so readers never see a torn record.
    #[instrument(skip_all, fields(id = %id))]
    pub fn save(&self, id: &EntryId, record: &EnrichmentRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root).map_err(|e| EnricherError::io(&self.root, e))?;

        let path = self.paths(id).record();
        let temp = self.root.join(format!(".{RECORD_PREFIX}{id}{RECORD_SUFFIX}.tmp"));

        let mut json = serde_json::to_string_pretty(record)
            .map_err(|e| EnricherError::Storage(format!("record serialization failed: {e}")))?;
        json.push('\n');

        std::fs::write(&temp, json).map_err(|e| EnricherError::io(&temp, e))?;
        std::fs::rename(&temp, &path).map_err(|e| EnricherError::io(&path, e))?;

        debug!(path = %path.display(), "saved record");
        Ok(path)
    }

    /// Identifiers of every stored record, sorted.
    pub fn list(&self) -> Result<Vec<EntryId>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.root).map_err(|e| EnricherError::io(&self.root, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EnricherError::io(&self.root, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(id) = name
                .strip_prefix(RECORD_PREFIX)
                .and_then(|rest| rest.strip_suffix(RECORD_SUFFIX))
            else {
                continue;
            };
            if let Ok(id) = id.parse::<EntryId>() {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enricher_shared::{ExternalSiteData, PrimaryFields};

    fn temp_store() -> (RecordStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("enricher-store-test-{}", uuid::Uuid::now_v7()));
        (RecordStore::new(&dir), dir)
    }

    fn id(s: &str) -> EntryId {
        s.parse().unwrap()
    }

    fn sample_record() -> EnrichmentRecord {
        let mut primary = PrimaryFields::default();
        primary.meta.title = Some("Модель Hunyuan3D".into());
        primary.external_links.insert("https://github.com/Tencent/Hunyuan3D-2".into());
        primary.detected_tags.insert("mesh".into());
        EnrichmentRecord {
            source: "https://huggingface.co/spaces/tencent/Hunyuan3D-2".into(),
            primary: Some(primary),
            ..EnrichmentRecord::default()
        }
    }

    #[test]
    fn load_missing_returns_none() {
        let (store, _dir) = temp_store();
        assert!(store.load(&id("nothing")).unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let (store, dir) = temp_store();
        let record = sample_record();

        let path = store.save(&id("hunyuan3d"), &record).unwrap();
        assert_eq!(path, dir.join("enriched_hunyuan3d.json"));

        let loaded = store.load(&id("hunyuan3d")).unwrap().expect("record");
        assert_eq!(loaded, record);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_is_pretty_and_keeps_non_ascii() {
        let (store, dir) = temp_store();
        let path = store.save(&id("ru"), &sample_record()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Модель Hunyuan3D"));
        assert!(!raw.contains("\\u"));
        assert!(raw.contains("\n  \"source\""));
        assert!(raw.ends_with("}\n"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_overwrites_without_merging() {
        let (store, dir) = temp_store();
        let key = id("widget");

        let mut record = sample_record();
        record.external_site_data = Some(ExternalSiteData::failed("https://vendor.io", "HTTP 500"));
        store.save(&key, &record).unwrap();

        let replacement = EnrichmentRecord::failed("https://site.example", "timed out");
        store.save(&key, &replacement).unwrap();

        let loaded = store.load(&key).unwrap().unwrap();
        assert_eq!(loaded, replacement);
        assert!(loaded.external_site_data.is_none());
        assert!(!dir.join(".enriched_widget.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_record_is_validation_error() {
        let (store, dir) = temp_store();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("enriched_bad.json"), "{ not json").unwrap();

        let err = store.load(&id("bad")).unwrap_err();
        assert!(matches!(err, EnricherError::Validation { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn list_returns_sorted_ids() {
        let (store, dir) = temp_store();
        assert!(store.list().unwrap().is_empty());

        store.save(&id("zeta"), &sample_record()).unwrap();
        store.save(&id("alpha"), &sample_record()).unwrap();
        std::fs::write(dir.join("enriched_alpha.md"), "# md").unwrap();
        std::fs::write(dir.join("notes.json"), "{}").unwrap();

        let ids = store.list().unwrap();
        assert_eq!(ids, vec![id("alpha"), id("zeta")]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_into_unwritable_root_is_io_error() {
        let (_, dir) = temp_store();
        std::fs::create_dir_all(dir.parent().unwrap()).unwrap();
        // A file where the root directory should be.
        std::fs::write(&dir, "occupied").unwrap();

        let store = RecordStore::new(&dir);
        let err = store.save(&id("x"), &sample_record()).unwrap_err();
        assert!(matches!(err, EnricherError::Io { .. }));

        let _ = std::fs::remove_file(&dir);
    }
}
