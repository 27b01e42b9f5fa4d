//! Topologies over the path network and their resolution into geometry
//!
//! A topology is an ordered list of `(path, start, end)` fractions. It is resolved
//! against the current path geometries on every read.

use crate::{Coord3, CoreError, Geometry, Path, PathId, Result, Shape, Srid};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A range of one path, as fractions of its 2D length
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TopologySegment {
    pub path: PathId,
    pub start: f64,
    pub end: f64,
}

impl TopologySegment {
    pub fn new(path: PathId, start: f64, end: f64) -> Self {
        Self { path, start, end }
    }

    /// Walked against the path direction
    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }
}

/// Ordered traversal of path segments
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Topology {
    segments: Vec<TopologySegment>,
}

impl Topology {
    /// Create a topology, checking fractions and point/line consistency
    pub fn new(segments: Vec<TopologySegment>) -> Result<Self> {
        let topology = Self { segments };
        topology.validate()?;
        Ok(topology)
    }

    /// A single offset point on a path
    pub fn point(path: PathId, fraction: f64) -> Result<Self> {
        Self::new(vec![TopologySegment::new(path, fraction, fraction)])
    }

    /// Whole paths walked in their own direction
    pub fn whole_paths(paths: &[PathId]) -> Self {
        Self {
            segments: paths
                .iter()
                .map(|&path| TopologySegment::new(path, 0.0, 1.0))
                .collect(),
        }
    }

    pub fn segments(&self) -> &[TopologySegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Exactly one segment with `start == end`
    pub fn is_point(&self) -> bool {
        matches!(self.segments.as_slice(), [segment] if segment.start == segment.end)
    }

    /// Referenced paths, in traversal order, without duplicates
    pub fn path_ids(&self) -> Vec<PathId> {
        let mut ids = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            if !ids.contains(&segment.path) {
                ids.push(segment.path);
            }
        }
        ids
    }

    pub fn references(&self, path: PathId) -> bool {
        self.segments.iter().any(|segment| segment.path == path)
    }

    fn validate(&self) -> Result<()> {
        for segment in &self.segments {
            for fraction in [segment.start, segment.end] {
                if !(0.0..=1.0).contains(&fraction) {
                    return Err(CoreError::InvalidTopology(format!(
                        "fraction {} on path {} is outside [0, 1]",
                        fraction, segment.path
                    )));
                }
            }
        }
        // A zero-length segment only makes sense as a point topology
        if self.segments.len() > 1
            && self
                .segments
                .iter()
                .any(|segment| segment.start == segment.end)
        {
            return Err(CoreError::InvalidTopology(
                "point topology must have exactly one segment".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read access to the current path geometries
pub trait PathSource {
    fn path(&self, id: PathId) -> Option<Arc<Path>>;

    /// Storage reference system of the paths
    fn srid(&self) -> Srid;
}

/// Resolve a topology into a concrete 3D geometry
///
/// # Returns
/// `None` for an empty topology, a point for a point topology, and a line string
/// otherwise. Repeated join vertices between consecutive slices are collapsed.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve<S: PathSource + ?Sized>(topology: &Topology, source: &S) -> Result<Option<Geometry>> {
    topology.validate()?;
    if topology.is_empty() {
        return Ok(None);
    }

    let srid = source.srid();
    let lookup = |id: PathId| -> Result<Arc<Path>> {
        let path = source.path(id).ok_or(CoreError::UnknownPath(id))?;
        if path.srid() != srid {
            return Err(CoreError::SridMismatch {
                expected: srid.0,
                found: path.srid().0,
            });
        }
        Ok(path)
    };

    if topology.is_point() {
        let segment = topology.segments[0];
        let path = lookup(segment.path)?;
        return Ok(Some(Geometry::new(
            srid,
            Shape::Point(path.interpolate(segment.start)),
        )));
    }

    let mut coords: Vec<Coord3> = Vec::new();
    for segment in &topology.segments {
        let path = lookup(segment.path)?;
        for coord in path.slice(segment.start, segment.end) {
            if coords.last() != Some(&coord) {
                coords.push(coord);
            }
        }
    }

    let shape = match coords.as_slice() {
        [single] => Shape::Point(*single),
        _ => Shape::LineString(coords),
    };
    Ok(Some(Geometry::new(srid, shape)))
}

/// Fraction of `line`'s 2D length at which `point` projects onto it
pub fn locate_point(line: &Geometry, point: &Geometry) -> Result<f64> {
    if line.srid != point.srid {
        return Err(CoreError::SridMismatch {
            expected: line.srid.0,
            found: point.srid.0,
        });
    }
    let target = match &point.shape {
        Shape::Point(coord) => *coord,
        other => {
            return Err(CoreError::InvalidGeometry(format!(
                "can only locate a point, got {:?}",
                other
            )));
        }
    };
    let path = Path::new(0, "", line.clone())?;
    Ok(path.locate(&target))
}
