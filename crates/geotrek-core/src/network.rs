//! Path storage for the trail network
//!
//! A `Path` is a directed line of the network. Its metadata (lengths, envelope and
//! cumulative planar distances) is computed once at construction; topologies slice
//! it by fraction of its 2D length.

use crate::{Coord3, CoreError, Geometry, Result, Shape, Srid};
use geo::{LineLocatePoint, LineString, Rect};
use std::sync::Arc;

/// Path identifier
pub type PathId = u64;

/// A directed, draped line segment of the trail network
#[derive(Clone, Debug)]
pub struct Path {
    id: PathId,
    name: String,
    srid: Srid,
    /// Vertices in traversal order, elevation included when known
    coords: Vec<Coord3>,
    /// Planar distance from the first vertex to each vertex
    cumulative: Vec<f64>,
    bounding_box: Rect<f64>,
    cached_length_2d: f64,
    cached_length_3d: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Path {
    /// Create a new path from a line string geometry
    ///
    /// # Returns
    /// An `Arc<Path>` on success, or an error if the geometry is not a line string
    /// with at least two vertices
    pub fn new(id: PathId, name: impl Into<String>, geometry: Geometry) -> Result<Arc<Self>> {
        let Geometry { srid, shape } = geometry;
        let coords = match shape {
            Shape::LineString(coords) => coords,
            other => {
                return Err(CoreError::InvalidGeometry(format!(
                    "path {} must be a line string, got {:?}",
                    id, other
                )));
            }
        };
        if coords.len() < 2 {
            return Err(CoreError::InvalidGeometry(format!(
                "path {} needs at least two vertices",
                id
            )));
        }
        if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(CoreError::InvalidGeometry(format!(
                "path {} has non-finite coordinates",
                id
            )));
        }

        let (cumulative, bounding_box, length_3d) = Self::compute_metadata(&coords);
        let length_2d = cumulative.last().copied().unwrap_or(0.0);

        Ok(Arc::new(Path {
            id,
            name: name.into(),
            srid,
            coords,
            cumulative,
            bounding_box,
            cached_length_2d: length_2d,
            cached_length_3d: length_3d,
        }))
    }

    /// Compute all metadata in a single pass over the vertices
    ///
    /// Returns (cumulative planar distances, bounding box, 3D length)
    fn compute_metadata(coords: &[Coord3]) -> (Vec<f64>, Rect<f64>, f64) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        let mut cumulative = Vec::with_capacity(coords.len());
        let mut walked = 0.0;
        let mut length_3d = 0.0;
        let mut prev: Option<&Coord3> = None;

        for coord in coords {
            min_x = min_x.min(coord.x);
            min_y = min_y.min(coord.y);
            max_x = max_x.max(coord.x);
            max_y = max_y.max(coord.y);

            if let Some(prev) = prev {
                walked += prev.distance_2d(coord);
                length_3d += prev.distance_3d(coord);
            }
            cumulative.push(walked);
            prev = Some(coord);
        }

        let bounding_box = Rect::new(
            geo::Coord { x: min_x, y: min_y },
            geo::Coord { x: max_x, y: max_y },
        );
        (cumulative, bounding_box, length_3d)
    }

    #[inline]
    pub fn id(&self) -> PathId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn srid(&self) -> Srid {
        self.srid
    }

    /// Vertices of the draped geometry
    #[inline]
    pub fn coords(&self) -> &[Coord3] {
        &self.coords
    }

    /// Get the bounding box in native units
    #[inline]
    pub fn bounding_box(&self) -> Rect<f64> {
        self.bounding_box
    }

    /// Planar length, cached during construction
    #[inline]
    pub fn length_2d(&self) -> f64 {
        self.cached_length_2d
    }

    /// Draped length, cached during construction
    #[inline]
    pub fn length_3d(&self) -> f64 {
        self.cached_length_3d
    }

    /// The path as a geometry value
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.srid, Shape::LineString(self.coords.clone()))
    }

    /// Interpolate the 3D position at `fraction` of the planar length
    ///
    /// Fractions 0 and 1 return the end vertices untouched. Elevation is interpolated
    /// between the bounding vertices when both carry one.
    pub fn interpolate(&self, fraction: f64) -> Coord3 {
        let last = self.coords.len() - 1;
        if fraction <= 0.0 {
            return self.coords[0];
        }
        if fraction >= 1.0 || self.cached_length_2d == 0.0 {
            return if fraction >= 1.0 {
                self.coords[last]
            } else {
                self.coords[0]
            };
        }

        let distance = fraction * self.cached_length_2d;
        // Segment i covers cumulative[i]..cumulative[i + 1]
        let i = self
            .cumulative
            .partition_point(|&walked| walked <= distance)
            .saturating_sub(1)
            .min(last - 1);

        let start = self.coords[i];
        let end = self.coords[i + 1];
        let segment_length = self.cumulative[i + 1] - self.cumulative[i];
        let t = if segment_length > 0.0 {
            (distance - self.cumulative[i]) / segment_length
        } else {
            0.0
        };

        let z = match (start.z, end.z) {
            (Some(a), Some(b)) => Some(a + t * (b - a)),
            (a, b) => a.or(b),
        };
        Coord3 {
            x: start.x + t * (end.x - start.x),
            y: start.y + t * (end.y - start.y),
            z,
        }
    }

    /// Vertices between two fractions, in the direction they are given
    ///
    /// `start > end` walks the path backwards. Equal fractions yield a single point.
    pub fn slice(&self, start: f64, end: f64) -> Vec<Coord3> {
        if start > end {
            let mut reversed = self.slice(end, start);
            reversed.reverse();
            return reversed;
        }

        let first = self.interpolate(start);
        if start == end {
            return vec![first];
        }

        let from = start * self.cached_length_2d;
        let to = end * self.cached_length_2d;

        let mut out = Vec::with_capacity(self.coords.len());
        out.push(first);
        for (coord, &walked) in self.coords.iter().zip(&self.cumulative) {
            if walked > from && walked < to {
                out.push(*coord);
            }
        }
        out.push(self.interpolate(end));
        out
    }

    /// Fraction of the planar length at which `point` projects onto the path
    pub fn locate(&self, point: &Coord3) -> f64 {
        if self.cached_length_2d == 0.0 {
            return 0.0;
        }
        let line: LineString<f64> = self.coords.iter().map(|c| (c.x, c.y)).collect();
        line.line_locate_point(&geo::Point::new(point.x, point.y))
            .map_or(0.0, |fraction| fraction.clamp(0.0, 1.0))
    }
}
