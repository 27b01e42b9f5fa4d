//! FeatureStore - In-memory spatial store for paths, features and their relations
//!
//! The store owns the path network, the features, the envelope index used by
//! intersection queries and the ordered hierarchy. Topology-anchored features are
//! re-indexed whenever a path they reference changes.

use crate::{
    Bbox, Config, CoreError, Feature, FeatureId, FeatureKind, Geometry, Hierarchy, Path, PathId,
    PathSource, Placement, Quadtree, Result, SiteTree, Srid, resolve,
};
use geo::Rect;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Read-only view of a spatial store, as used by queries and serializers
pub trait SpatialStore: PathSource {
    fn config(&self) -> &Config;

    fn feature(&self, id: FeatureId) -> Option<&Feature>;

    /// Ids of live features of `kind` whose envelope intersects `area`, ascending
    fn candidates(&self, kind: FeatureKind, area: Rect<f64>) -> Result<Vec<FeatureId>>;

    fn hierarchy(&self) -> &Hierarchy;

    /// Ids of every live feature of `kind`, ascending
    fn ids_of_kind(&self, kind: FeatureKind) -> Vec<FeatureId>;

    /// Current geometry of a feature in storage SRID, `None` when unplaced
    fn geometry_of(&self, feature: &Feature) -> Result<Option<Geometry>> {
        match &feature.placement {
            Placement::Unplaced => Ok(None),
            Placement::Topology(topology) => resolve(topology, self),
            Placement::Geometry(geometry) if geometry.is_empty() => Ok(None),
            Placement::Geometry(geometry) => Ok(Some(geometry.clone())),
        }
    }

    /// Published, live parents, ascending
    fn parent_ids(&self, id: FeatureId) -> Vec<FeatureId> {
        self.hierarchy()
            .parents_of(id)
            .into_iter()
            .filter(|&parent| self.is_visible_parent(parent))
            .collect()
    }

    /// Live children in itinerary order
    fn children_ids(&self, id: FeatureId) -> Vec<FeatureId> {
        self.hierarchy()
            .children_of(id)
            .into_iter()
            .filter(|&child| self.feature(child).is_some_and(Feature::is_live))
            .collect()
    }

    fn count_children(&self, id: FeatureId) -> usize {
        self.children_ids(id).len()
    }

    /// Previous sibling per published, live parent
    fn previous_ids(&self, id: FeatureId) -> BTreeMap<FeatureId, Option<FeatureId>> {
        let mut siblings = self.hierarchy().previous_sibling(id);
        siblings.retain(|&parent, _| self.is_visible_parent(parent));
        siblings
    }

    /// Next sibling per published, live parent
    fn next_ids(&self, id: FeatureId) -> BTreeMap<FeatureId, Option<FeatureId>> {
        let mut siblings = self.hierarchy().next_sibling(id);
        siblings.retain(|&parent, _| self.is_visible_parent(parent));
        siblings
    }

    fn is_visible_parent(&self, parent: FeatureId) -> bool {
        self.feature(parent)
            .is_some_and(|feature| feature.is_live() && feature.is_published(self.config()))
    }

    /// Tree of the live outdoor sites, named in the default language
    fn site_tree(&self) -> SiteTree {
        let name_language = &self.config().default_language;
        SiteTree::build(
            self.ids_of_kind(FeatureKind::Site)
                .into_iter()
                .filter_map(|id| self.feature(id))
                .map(|site| {
                    let name = site
                        .translations
                        .get("name", name_language)
                        .unwrap_or_default()
                        .to_string();
                    (site.id, site.parent, name)
                }),
        )
    }
}

/// Information about the store contents
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreInfo {
    /// Number of paths in the network
    pub path_count: usize,
    /// Number of live features
    pub feature_count: usize,
    /// Number of soft-deleted features
    pub deleted_count: usize,
    /// Total planar length of the network in map units
    pub network_length: f64,
}

/// In-memory spatial store
#[derive(Debug, Clone)]
pub struct FeatureStore {
    paths: HashMap<PathId, Arc<Path>>,
    features: BTreeMap<FeatureId, Feature>,
    /// Envelope index over live, placed features
    index: Quadtree,
    hierarchy: Hierarchy,
    config: Config,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl FeatureStore {
    /// Create an empty store with the given configuration
    pub fn new(config: Config) -> Self {
        let [min_x, min_y, max_x, max_y] = config.spatial_extent;
        let bounds = Rect::new(
            geo::Coord { x: min_x, y: min_y },
            geo::Coord { x: max_x, y: max_y },
        );
        Self {
            paths: HashMap::new(),
            features: BTreeMap::new(),
            index: Quadtree::new(bounds),
            hierarchy: Hierarchy::new(),
            config,
        }
    }

    /// Add a path to the network, or replace an existing one
    pub fn add_path(
        &mut self,
        id: PathId,
        name: impl Into<String>,
        geometry: Geometry,
    ) -> Result<Arc<Path>> {
        self.check_srid(geometry.srid)?;
        let path = Path::new(id, name, geometry)?;
        let replaced = self.paths.insert(id, path.clone()).is_some();
        if replaced {
            self.reindex_path_users(id)?;
        }
        Ok(path)
    }

    /// Change the geometry of an existing path
    ///
    /// Every feature whose topology references the path is re-indexed against the new
    /// geometry.
    pub fn update_path_geometry(&mut self, id: PathId, geometry: Geometry) -> Result<()> {
        let name = self
            .paths
            .get(&id)
            .ok_or(CoreError::UnknownPath(id))?
            .name()
            .to_string();
        self.add_path(id, name, geometry).map(|_| ())
    }

    /// Add a feature, or replace the feature with the same id
    ///
    /// The placement must be in the storage SRID and its topology must resolve
    /// against the current network.
    pub fn add_feature(&mut self, feature: Feature) -> Result<()> {
        if let Placement::Geometry(geometry) = &feature.placement {
            self.check_srid(geometry.srid)?;
        }
        if let Some(parent) = feature.parent {
            if feature.kind == FeatureKind::Site {
                if let Some(existing) = self.features.get(&parent) {
                    if existing.kind != FeatureKind::Site {
                        return Err(CoreError::UnknownFeature(parent));
                    }
                }
            }
            self.check_parent_link(feature.id, parent)?;
        }

        let envelope = self.envelope_of(&feature)?;
        let id = feature.id;
        let kind = feature.kind;
        let live = feature.is_live();
        self.features.insert(id, feature);

        match envelope {
            Some(envelope) if live => self.index.insert(id, kind, envelope),
            _ => {
                self.index.remove(id);
            }
        }
        Ok(())
    }

    /// Soft-delete a feature: it stays readable but leaves every query
    pub fn delete_feature(&mut self, id: FeatureId) -> Result<()> {
        let feature = self
            .features
            .get_mut(&id)
            .ok_or(CoreError::UnknownFeature(id))?;
        feature.deleted = true;
        self.index.remove(id);
        Ok(())
    }

    /// Live features of a kind, by ascending id
    pub fn features_of_kind(&self, kind: FeatureKind) -> Vec<&Feature> {
        self.features
            .values()
            .filter(|feature| feature.kind == kind && feature.is_live())
            .collect()
    }

    /// All stored features, deleted ones included
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// Attach `child` under `parent` in the ordered hierarchy
    pub fn add_child(&mut self, parent: FeatureId, child: FeatureId, order: i64) -> Result<()> {
        for id in [parent, child] {
            if !self.features.contains_key(&id) {
                return Err(CoreError::UnknownFeature(id));
            }
        }
        self.hierarchy.add_child(parent, child, order)
    }

    pub fn remove_child(&mut self, parent: FeatureId, child: FeatureId) -> bool {
        self.hierarchy.remove_child(parent, child)
    }

    /// Move a site under another site, or make it a root with `None`
    pub fn set_site_parent(&mut self, site: FeatureId, parent: Option<FeatureId>) -> Result<()> {
        if let Some(parent) = parent {
            match self.features.get(&parent) {
                Some(feature) if feature.kind == FeatureKind::Site => {}
                _ => return Err(CoreError::UnknownFeature(parent)),
            }
            self.check_parent_link(site, parent)?;
        }
        let feature = self
            .features
            .get_mut(&site)
            .ok_or(CoreError::UnknownFeature(site))?;
        feature.parent = parent;
        Ok(())
    }

    /// Reject a `parent` link that would make `child` its own ancestor
    ///
    /// Follows the stored links, including those pointing at features not loaded yet,
    /// so that loading sites out of order cannot close a loop.
    fn check_parent_link(&self, child: FeatureId, parent: FeatureId) -> Result<()> {
        let mut current = Some(parent);
        let mut steps = 0;
        while let Some(id) = current {
            if id == child || steps > self.features.len() {
                return Err(CoreError::CyclicHierarchy { parent, child });
            }
            steps += 1;
            current = self.features.get(&id).and_then(|feature| feature.parent);
        }
        Ok(())
    }

    /// Planar length of a feature's current geometry
    pub fn length_2d(&self, id: FeatureId) -> Result<f64> {
        Ok(self.placed_geometry(id)?.length_2d())
    }

    /// Draped length of a feature's current geometry
    pub fn length_3d(&self, id: FeatureId) -> Result<f64> {
        Ok(self.placed_geometry(id)?.length_3d())
    }

    /// Bounding box of a feature in storage SRID
    pub fn bbox(&self, id: FeatureId) -> Result<Bbox> {
        self.placed_geometry(id)?
            .bbox()
            .ok_or(CoreError::EmptyTopology)
    }

    /// Get information about the store
    pub fn info(&self) -> StoreInfo {
        let deleted_count = self.features.values().filter(|f| f.deleted).count();
        StoreInfo {
            path_count: self.paths.len(),
            feature_count: self.features.len() - deleted_count,
            deleted_count,
            network_length: self.paths.values().map(|path| path.length_2d()).sum(),
        }
    }

    fn placed_geometry(&self, id: FeatureId) -> Result<Geometry> {
        let feature = self
            .features
            .get(&id)
            .ok_or(CoreError::UnknownFeature(id))?;
        self.geometry_of(feature)?.ok_or(CoreError::EmptyTopology)
    }

    fn envelope_of(&self, feature: &Feature) -> Result<Option<Rect<f64>>> {
        Ok(self
            .geometry_of(feature)?
            .and_then(|geometry| geometry.envelope()))
    }

    fn check_srid(&self, srid: Srid) -> Result<()> {
        if srid != self.config.srid {
            return Err(CoreError::SridMismatch {
                expected: self.config.srid.0,
                found: srid.0,
            });
        }
        Ok(())
    }

    fn reindex_path_users(&mut self, path: PathId) -> Result<()> {
        let users: Vec<FeatureId> = self
            .features
            .values()
            .filter(|feature| feature.is_live())
            .filter(|feature| match &feature.placement {
                Placement::Topology(topology) => topology.references(path),
                _ => false,
            })
            .map(|feature| feature.id)
            .collect();

        tracing::debug!("Re-indexing {} features after path {} changed", users.len(), path);

        for id in users {
            let Some(feature) = self.features.get(&id) else {
                continue;
            };
            let kind = feature.kind;
            match self.envelope_of(feature)? {
                Some(envelope) => self.index.insert(id, kind, envelope),
                None => {
                    self.index.remove(id);
                }
            }
        }
        Ok(())
    }
}

impl PathSource for FeatureStore {
    fn path(&self, id: PathId) -> Option<Arc<Path>> {
        self.paths.get(&id).cloned()
    }

    fn srid(&self) -> Srid {
        self.config.srid
    }
}

impl SpatialStore for FeatureStore {
    fn config(&self) -> &Config {
        &self.config
    }

    fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    fn candidates(&self, kind: FeatureKind, area: Rect<f64>) -> Result<Vec<FeatureId>> {
        let (min, max) = (area.min(), area.max());
        if [min.x, min.y, max.x, max.y].iter().any(|v| v.is_nan()) {
            return Err(CoreError::IntersectionQueryFailure(format!(
                "invalid query envelope {:?}",
                area
            )));
        }
        Ok(self
            .index
            .query(Some(kind), area)
            .into_iter()
            .filter(|id| self.features.get(id).is_some_and(Feature::is_live))
            .collect())
    }

    fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    fn ids_of_kind(&self, kind: FeatureKind) -> Vec<FeatureId> {
        self.features_of_kind(kind)
            .into_iter()
            .map(|feature| feature.id)
            .collect()
    }
}
