//! Nearest-feature queries: features of a kind lying within a distance of a reference
//!
//! Candidates come from the store's envelope index; exact tests run lazily as the
//! iterator is consumed. Each call re-queries the store.

use crate::{CoreError, Feature, FeatureId, FeatureKind, Geometry, Result, SpatialStore};
use geo::{Coord, Rect};

/// Lazy sequence of live features intersecting a buffered reference geometry,
/// by ascending id
pub struct Intersecting<'a, S: SpatialStore + ?Sized> {
    store: &'a S,
    reference: Option<Geometry>,
    distance: f64,
    candidates: std::vec::IntoIter<FeatureId>,
    exclude: Option<FeatureId>,
}

impl<'a, S: SpatialStore + ?Sized> Intersecting<'a, S> {
    fn empty(store: &'a S) -> Self {
        Self {
            store,
            reference: None,
            distance: 0.0,
            candidates: Vec::new().into_iter(),
            exclude: None,
        }
    }

    /// Collect every remaining item, stopping at the first error
    pub fn ids(self) -> Result<Vec<FeatureId>> {
        self.map(|feature| feature.map(|feature| feature.id)).collect()
    }
}

impl<'a, S: SpatialStore + ?Sized> Iterator for Intersecting<'a, S> {
    type Item = Result<&'a Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        let store: &'a S = self.store;
        let reference = self.reference.as_ref()?;
        for id in self.candidates.by_ref() {
            if Some(id) == self.exclude {
                continue;
            }
            let Some(feature) = store.feature(id) else {
                continue;
            };
            if !feature.is_live() {
                continue;
            }
            let geometry = match store.geometry_of(feature) {
                Ok(Some(geometry)) => geometry,
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            };
            match within(reference, &geometry, self.distance) {
                Ok(true) => return Some(Ok(feature)),
                Ok(false) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Exact test against the buffered reference
fn within(reference: &Geometry, geometry: &Geometry, distance: f64) -> Result<bool> {
    if distance > 0.0 {
        Ok(reference.distance(geometry)? <= distance)
    } else {
        reference.intersects(geometry)
    }
}

/// Live features of `kind` within `distance` of `reference`'s current geometry
///
/// The reference feature itself is never part of the result. An unplaced reference
/// intersects nothing.
pub fn intersecting<'a, S: SpatialStore + ?Sized>(
    store: &'a S,
    kind: FeatureKind,
    reference: &Feature,
    distance: f64,
) -> Result<Intersecting<'a, S>> {
    let Some(geometry) = store.geometry_of(reference)? else {
        return Ok(Intersecting::empty(store));
    };
    let mut results = intersecting_geometry(store, kind, &geometry, distance)?;
    results.exclude = Some(reference.id);
    Ok(results)
}

/// Live features of `kind` within `distance` of a raw geometry
///
/// The geometry is reprojected to the storage SRID when needed.
pub fn intersecting_geometry<'a, S: SpatialStore + ?Sized>(
    store: &'a S,
    kind: FeatureKind,
    reference: &Geometry,
    distance: f64,
) -> Result<Intersecting<'a, S>> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(CoreError::IntersectionQueryFailure(format!(
            "invalid buffer distance {}",
            distance
        )));
    }
    let reference = reference.transform(store.srid())?;
    let Some([min_x, min_y, max_x, max_y]) = reference.bbox() else {
        return Ok(Intersecting::empty(store));
    };

    let area = Rect::new(
        Coord {
            x: min_x - distance,
            y: min_y - distance,
        },
        Coord {
            x: max_x + distance,
            y: max_y + distance,
        },
    );
    let candidates = store.candidates(kind, area)?;

    Ok(Intersecting {
        store,
        reference: Some(reference),
        distance,
        candidates: candidates.into_iter(),
        exclude: None,
    })
}
