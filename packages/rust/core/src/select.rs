//! External-link selection.

use std::collections::BTreeSet;

use url::Url;

use enricher_shared::{EntryId, PipelineConfig};

/// Collect the markers used to pick an external link for `id`.
///
/// Global markers come first, then the per-entry ones, then the identifier
/// itself when `match_entry_id` is set. Blank markers are dropped, duplicates
/// removed.
pub fn markers_for(config: &PipelineConfig, id: &EntryId, extra: &[String]) -> Vec<String> {
    let entry_id = config.match_entry_id.then(|| id.as_str().to_string());

    let mut markers: Vec<String> = Vec::new();
    for marker in config.external_markers.iter().chain(extra).cloned().chain(entry_id) {
        let marker = marker.trim().to_lowercase();
        if !marker.is_empty() && !markers.contains(&marker) {
            markers.push(marker);
        }
    }
    markers
}

/// First link, in set order, containing any of `markers`.
///
/// Matching is a case-insensitive substring test. Links that do not parse as
/// absolute URLs are passed over.
pub fn select_external_link(links: &BTreeSet<String>, markers: &[String]) -> Option<Url> {
    links
        .iter()
        .filter(|link| {
            let lower = link.to_lowercase();
            markers.iter().any(|m| lower.contains(m.as_str()))
        })
        .find_map(|link| Url::parse(link).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn markers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn widget_scenario_selects_vendor_link() {
        let links = links(&["https://vendor.io/widget", "https://a.example/x"]);
        let picked = select_external_link(&links, &markers(&["vendor"])).unwrap();
        assert_eq!(picked.as_str(), "https://vendor.io/widget");
    }

    #[test]
    fn first_match_in_sorted_order_wins() {
        let links = links(&["https://z.github.io/", "https://b.github.io/", "https://m.example/"]);
        let picked = select_external_link(&links, &markers(&["github.io"])).unwrap();
        assert_eq!(picked.as_str(), "https://b.github.io/");
    }

    #[test]
    fn no_match_selects_nothing() {
        let links = links(&["https://a.example/x"]);
        assert!(select_external_link(&links, &markers(&["vendor"])).is_none());
        assert!(select_external_link(&links, &[]).is_none());
    }

    #[test]
    fn matching_ignores_case() {
        let links = links(&["https://Hunyuan3D.github.io/"]);
        assert!(select_external_link(&links, &markers(&["hunyuan3d"])).is_some());
    }

    #[test]
    fn markers_merge_config_extra_and_id() {
        let config = PipelineConfig::default();
        let id: EntryId = "Trellis".parse().unwrap();

        let all = markers_for(&config, &id, &markers(&["vendor", " ", "GitHub.io"]));
        assert_eq!(all, markers(&["github.io", "vendor", "trellis"]));

        let config = PipelineConfig {
            match_entry_id: false,
            external_markers: Vec::new(),
            ..PipelineConfig::default()
        };
        assert!(markers_for(&config, &id, &[]).is_empty());
    }
}
