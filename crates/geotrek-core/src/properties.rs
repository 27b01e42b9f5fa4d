//! Computed properties, declared per feature kind
//!
//! Each entry maps `(kind, name)` to a plain function over the store, so the set of
//! properties a kind exposes is fixed and visible in one place.

use crate::{
    Feature, FeatureId, FeatureKind, Geometry, Result, Shape, SpatialStore, intersecting,
    locate_point,
};
use std::collections::BTreeMap;

/// Value of a computed property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Related feature ids, in a meaningful order
    Ids(Vec<FeatureId>),
    /// One optional sibling per parent
    Siblings(BTreeMap<FeatureId, Option<FeatureId>>),
}

impl PropertyValue {
    pub fn ids(&self) -> &[FeatureId] {
        match self {
            PropertyValue::Ids(ids) => ids,
            PropertyValue::Siblings(_) => &[],
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Ids(ids) => serde_json::json!(ids),
            PropertyValue::Siblings(siblings) => serde_json::Value::Object(
                siblings
                    .iter()
                    .map(|(parent, sibling)| (parent.to_string(), serde_json::json!(sibling)))
                    .collect(),
            ),
        }
    }
}

/// Compute function of a property
pub type ComputeFn = fn(&dyn SpatialStore, &Feature) -> Result<PropertyValue>;

/// Static table of computed properties
#[derive(Clone, Default)]
pub struct PropertyRegistry {
    table: BTreeMap<(FeatureKind, &'static str), ComputeFn>,
}

impl std::fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.table.keys()).finish()
    }
}

/// Kinds that lie on the network or next to it and get the zoning shortcuts
const LOCATED_KINDS: [FeatureKind; 8] = [
    FeatureKind::Trek,
    FeatureKind::Poi,
    FeatureKind::Intervention,
    FeatureKind::Trail,
    FeatureKind::Infrastructure,
    FeatureKind::Signage,
    FeatureKind::TouristicContent,
    FeatureKind::TouristicEvent,
];

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The properties every Geotrek kind exposes
    pub fn standard() -> Self {
        let mut registry = Self::new();
        use FeatureKind::*;

        // Outdoor sites see everything they touch
        registry.register(Site, "sites", |s, f| nearby(s, f, Site));
        registry.register(Site, "treks", |s, f| nearby(s, f, Trek));
        registry.register(Site, "pois", |s, f| nearby(s, f, Poi));
        registry.register(Site, "trails", |s, f| nearby(s, f, Trail));
        registry.register(Site, "infrastructures", |s, f| nearby(s, f, Infrastructure));
        registry.register(Site, "signages", |s, f| nearby(s, f, Signage));
        registry.register(Site, "touristic_contents", |s, f| {
            nearby(s, f, TouristicContent)
        });
        registry.register(Site, "touristic_events", |s, f| nearby(s, f, TouristicEvent));
        registry.register(Site, "cities", |s, f| nearby(s, f, City));
        registry.register(Site, "published_cities", |s, f| published_nearby(s, f, City));
        registry.register(Site, "districts", |s, f| nearby(s, f, District));
        registry.register(Site, "published_districts", |s, f| {
            published_nearby(s, f, District)
        });
        registry.register(Site, "areas", |s, f| nearby(s, f, RestrictedArea));
        registry.register(Site, "published_areas", |s, f| {
            published_nearby(s, f, RestrictedArea)
        });
        registry.register(Site, "children", site_children);
        registry.register(Site, "published_children", published_site_children);

        for kind in LOCATED_KINDS {
            registry.register(kind, "sites", |s, f| nearby(s, f, Site));
            registry.register(kind, "cities", |s, f| nearby(s, f, City));
            registry.register(kind, "districts", |s, f| nearby(s, f, District));
        }

        registry.register(Trek, "pois", trek_pois);
        registry.register(Trek, "published_pois", published_trek_pois);
        registry.register(Trek, "children", |s, f| Ok(PropertyValue::Ids(s.children_ids(f.id))));
        registry.register(Trek, "parents", |s, f| Ok(PropertyValue::Ids(s.parent_ids(f.id))));
        registry.register(Trek, "previous", |s, f| {
            Ok(PropertyValue::Siblings(s.previous_ids(f.id)))
        });
        registry.register(Trek, "next", |s, f| Ok(PropertyValue::Siblings(s.next_ids(f.id))));

        registry
    }

    /// Declare a property, replacing any previous one with the same key
    pub fn register(&mut self, kind: FeatureKind, name: &'static str, compute: ComputeFn) {
        self.table.insert((kind, name), compute);
    }

    pub fn get(&self, kind: FeatureKind, name: &str) -> Option<ComputeFn> {
        self.table
            .iter()
            .find(|((k, n), _)| *k == kind && *n == name)
            .map(|(_, compute)| *compute)
    }

    /// Property names of a kind, sorted
    pub fn names(&self, kind: FeatureKind) -> Vec<&'static str> {
        self.table
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| *name)
            .collect()
    }

    /// Compute `name` for `feature`; `None` when the kind does not declare it
    pub fn compute(
        &self,
        store: &dyn SpatialStore,
        feature: &Feature,
        name: &str,
    ) -> Result<Option<PropertyValue>> {
        match self.get(feature.kind, name) {
            Some(compute) => compute(store, feature).map(Some),
            None => Ok(None),
        }
    }
}

/// Features of `kind` touching `feature`, by id
fn nearby(store: &dyn SpatialStore, feature: &Feature, kind: FeatureKind) -> Result<PropertyValue> {
    Ok(PropertyValue::Ids(
        intersecting(store, kind, feature, 0.0)?.ids()?,
    ))
}

fn published_nearby(
    store: &dyn SpatialStore,
    feature: &Feature,
    kind: FeatureKind,
) -> Result<PropertyValue> {
    let config = store.config();
    let ids = intersecting(store, kind, feature, 0.0)?
        .filter(|item| match item {
            Ok(found) => found.is_published(config),
            Err(_) => true,
        })
        .map(|item| item.map(|found| found.id))
        .collect::<Result<Vec<_>>>()?;
    Ok(PropertyValue::Ids(ids))
}

/// POIs within the configured margin, ordered along the trek
fn trek_pois(store: &dyn SpatialStore, trek: &Feature) -> Result<PropertyValue> {
    let margin = store.config().trek_poi_intersection_margin;
    let pois: Vec<&Feature> = intersecting(store, FeatureKind::Poi, trek, margin)?
        .collect::<Result<_>>()?;

    let line = match store.geometry_of(trek)? {
        Some(geometry) if matches!(geometry.shape, Shape::LineString(_)) => geometry,
        _ => return Ok(PropertyValue::Ids(pois.iter().map(|poi| poi.id).collect())),
    };

    let mut located = Vec::with_capacity(pois.len());
    for poi in pois {
        let fraction = match store.geometry_of(poi)? {
            Some(geometry) => match geometry.coords().first() {
                Some(first) => locate_point(&line, &Geometry::point(line.srid, first.x, first.y))?,
                None => 0.0,
            },
            None => 0.0,
        };
        located.push((fraction, poi.id));
    }
    located.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    Ok(PropertyValue::Ids(located.into_iter().map(|(_, id)| id).collect()))
}

fn published_trek_pois(store: &dyn SpatialStore, trek: &Feature) -> Result<PropertyValue> {
    let config = store.config();
    let ids = trek_pois(store, trek)?
        .ids()
        .iter()
        .copied()
        .filter(|&id| store.feature(id).is_some_and(|poi| poi.is_published(config)))
        .collect();
    Ok(PropertyValue::Ids(ids))
}

fn site_children(store: &dyn SpatialStore, site: &Feature) -> Result<PropertyValue> {
    Ok(PropertyValue::Ids(store.site_tree().children(site.id)))
}

fn published_site_children(store: &dyn SpatialStore, site: &Feature) -> Result<PropertyValue> {
    let config = store.config();
    let ids = store
        .site_tree()
        .children(site.id)
        .into_iter()
        .filter(|&id| store.feature(id).is_some_and(|child| child.is_published(config)))
        .collect();
    Ok(PropertyValue::Ids(ids))
}
