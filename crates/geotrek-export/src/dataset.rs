//! JSON dataset loading
//!
//! A dataset is a snapshot of a network: its configuration, paths, features and the
//! ordered trek children. Entries that do not fit the network are skipped with a
//! warning so that one broken feature does not block a whole export.

use crate::error::{ExportError, Result};
use geotrek_core::{Config, Feature, FeatureStore, Geometry, OrderedChild, PathId};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct PathRecord {
    pub id: PathId,
    #[serde(default)]
    pub name: String,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub config: Config,
    pub paths: Vec<PathRecord>,
    pub features: Vec<Feature>,
    pub children: Vec<OrderedChild>,
}

impl Dataset {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ExportError::Dataset {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Build the in-memory store; `config` replaces the dataset configuration
    pub fn into_store(self, config: Config) -> FeatureStore {
        profiling::scope!("Dataset::into_store");
        let mut store = FeatureStore::new(config);

        for path in self.paths {
            if let Err(e) = store.add_path(path.id, path.name, path.geometry) {
                tracing::warn!("Skipping path {}: {}", path.id, e);
            }
        }
        for feature in self.features {
            let (id, kind) = (feature.id, feature.kind);
            if let Err(e) = store.add_feature(feature) {
                tracing::warn!("Skipping {} {}: {}", kind, id, e);
            }
        }
        for link in self.children {
            if let Err(e) = store.add_child(link.parent, link.child, link.order) {
                tracing::warn!(
                    "Skipping child {} of {}: {}",
                    link.child,
                    link.parent,
                    e
                );
            }
        }

        let info = store.info();
        tracing::debug!(
            "Loaded {} paths and {} features ({} deleted)",
            info.path_count,
            info.feature_count,
            info.deleted_count
        );
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotrek_core::{FeatureKind, SpatialStore};

    const DATASET: &str = r#"{
        "config": {"languages": ["en"], "default_language": "en"},
        "paths": [
            {"id": 1, "name": "Main", "geometry": {"srid": 2154, "shape": {"type": "LineString", "coordinates": [
                {"x": 700000.0, "y": 6600000.0, "z": 1000.0},
                {"x": 700100.0, "y": 6600000.0, "z": 1010.0}
            ]}}},
            {"id": 2, "name": "Broken", "geometry": {"srid": 2154, "shape": {"type": "LineString", "coordinates": [
                {"x": 700000.0, "y": 6600000.0}
            ]}}}
        ],
        "features": [
            {"id": 1, "kind": "trek",
             "placement": {"topology": [{"path": 1, "start": 0.0, "end": 1.0}]},
             "translations": {"name": {"en": "Loop"}},
             "publication": {"published": true, "by_language": {"en": true}}},
            {"id": 2, "kind": "trek",
             "placement": {"topology": [{"path": 1, "start": 0.5, "end": 0.5}]}},
            {"id": 3, "kind": "poi",
             "placement": {"topology": [{"path": 2, "start": 0.0, "end": 0.0}]}},
            {"id": 4, "kind": "city",
             "placement": {"geometry": {"srid": 4326, "shape": {"type": "Point", "coordinates": {"x": 3.0, "y": 46.5}}}}}
        ],
        "children": [
            {"parent": 1, "child": 2, "order": 0},
            {"parent": 2, "child": 1, "order": 0}
        ]
    }"#;

    #[test]
    fn test_load_skips_invalid_entries() {
        let dataset = Dataset::from_json(DATASET).unwrap();
        assert_eq!(dataset.config.default_language.as_str(), "en");
        let config = dataset.config.clone();
        let store = dataset.into_store(config);

        // Path 2 has a single vertex, POI 3 references it, city 4 is in the wrong SRID
        let info = store.info();
        assert_eq!(info.path_count, 1);
        assert_eq!(store.features_of_kind(FeatureKind::Trek).len(), 2);
        assert!(store.feature(3).is_none());
        assert!(store.feature(4).is_none());

        // The reverse link would be a cycle
        assert_eq!(store.children_ids(1), vec![2]);
        assert!(store.hierarchy().children_of(2).is_empty());
    }

    #[test]
    fn test_site_parent_loop_is_skipped() {
        let dataset = Dataset::from_json(
            r#"{"features": [
                {"id": 10, "kind": "site", "parent": 11},
                {"id": 11, "kind": "site", "parent": 10},
                {"id": 12, "kind": "site", "parent": 10}
            ]}"#,
        )
        .unwrap();
        let config = dataset.config.clone();
        let store = dataset.into_store(config);

        // 11 would close the loop; 10 keeps a dangling parent and becomes a root
        assert!(store.feature(11).is_none());
        assert_eq!(store.site_tree().traverse(), vec![(10, 0), (12, 1)]);
    }

    #[test]
    fn test_empty_dataset_uses_defaults() {
        let dataset = Dataset::from_json("{}").unwrap();
        assert_eq!(dataset.config, Config::default());
        assert!(dataset.paths.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = Dataset::load(Path::new("/nonexistent/dataset.json")).unwrap_err();
        assert!(matches!(err, ExportError::Dataset { .. }));
    }
}
