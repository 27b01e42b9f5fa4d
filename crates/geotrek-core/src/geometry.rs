//! SRID-tagged geometry values and the coordinate transform engine
//!
//! Geometries always carry their spatial reference system. Nothing here reprojects
//! implicitly: callers ask for [`transform`] and get a new value back.

use crate::{CoreError, Result, utils};
use geo::{Coord, Distance, Euclidean, Intersects, Rect};
use proj::Proj;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bounding box as `[minx, miny, maxx, maxy]`
pub type Bbox = [f64; 4];

/// Spatial reference system identifier (EPSG code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Srid(pub u32);

impl Srid {
    /// WGS84 longitude/latitude
    pub const WGS84: Srid = Srid(4326);
    /// Spherical Web Mercator
    pub const WEB_MERCATOR: Srid = Srid(3857);
    /// RGF93 / Lambert-93
    pub const LAMBERT_93: Srid = Srid(2154);
}

impl std::fmt::Display for Srid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// A coordinate with optional elevation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coord3 {
    pub x: f64,
    pub y: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub z: Option<f64>,
}

impl Coord3 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    #[inline]
    pub fn distance_2d(&self, other: &Coord3) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// 3D distance; a missing elevation on either side counts as flat
    #[inline]
    pub fn distance_3d(&self, other: &Coord3) -> f64 {
        let dz = match (self.z, other.z) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        };
        let planar = self.distance_2d(other);
        (planar * planar + dz * dz).sqrt()
    }

    #[inline]
    fn to_geo(self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// The shape of a geometry, independent of its reference system
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "coordinates"))]
pub enum Shape {
    Point(Coord3),
    LineString(Vec<Coord3>),
    Polygon {
        exterior: Vec<Coord3>,
        interiors: Vec<Vec<Coord3>>,
    },
    Collection(Vec<Shape>),
}

impl Shape {
    fn for_each_coord<F: FnMut(&Coord3)>(&self, f: &mut F) {
        match self {
            Shape::Point(c) => f(c),
            Shape::LineString(coords) => coords.iter().for_each(|c| f(c)),
            Shape::Polygon {
                exterior,
                interiors,
            } => {
                exterior.iter().for_each(|c| f(c));
                interiors.iter().flatten().for_each(|c| f(c));
            }
            Shape::Collection(shapes) => shapes.iter().for_each(|s| s.for_each_coord(f)),
        }
    }

    fn map_coords<F: FnMut(&Coord3) -> Coord3>(&self, f: &mut F) -> Shape {
        match self {
            Shape::Point(c) => Shape::Point(f(c)),
            Shape::LineString(coords) => Shape::LineString(coords.iter().map(|c| f(c)).collect()),
            Shape::Polygon {
                exterior,
                interiors,
            } => Shape::Polygon {
                exterior: exterior.iter().map(|c| f(c)).collect(),
                interiors: interiors
                    .iter()
                    .map(|ring| ring.iter().map(|c| f(c)).collect())
                    .collect(),
            },
            Shape::Collection(shapes) => {
                Shape::Collection(shapes.iter().map(|s| s.map_coords(f)).collect())
            }
        }
    }

    fn try_map_coords<F: FnMut(&Coord3) -> Result<Coord3>>(&self, f: &mut F) -> Result<Shape> {
        Ok(match self {
            Shape::Point(c) => Shape::Point(f(c)?),
            Shape::LineString(coords) => {
                Shape::LineString(coords.iter().map(|c| f(c)).collect::<Result<_>>()?)
            }
            Shape::Polygon {
                exterior,
                interiors,
            } => Shape::Polygon {
                exterior: exterior.iter().map(|c| f(c)).collect::<Result<_>>()?,
                interiors: interiors
                    .iter()
                    .map(|ring| ring.iter().map(|c| f(c)).collect::<Result<Vec<_>>>())
                    .collect::<Result<_>>()?,
            },
            Shape::Collection(shapes) => Shape::Collection(
                shapes
                    .iter()
                    .map(|s| s.try_map_coords(f))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    fn length_with(&self, metric: fn(&Coord3, &Coord3) -> f64) -> f64 {
        match self {
            Shape::LineString(coords) => coords.windows(2).map(|w| metric(&w[0], &w[1])).sum(),
            Shape::Collection(shapes) => shapes.iter().map(|s| s.length_with(metric)).sum(),
            // Areal and punctual shapes have no linear length
            Shape::Point(_) | Shape::Polygon { .. } => 0.0,
        }
    }

    /// Non-empty leaves of the shape as planar geometries, collections flattened
    fn geo_parts(&self, out: &mut Vec<geo::Geometry<f64>>) {
        match self {
            Shape::Collection(shapes) => shapes.iter().for_each(|s| s.geo_parts(out)),
            leaf if !leaf.is_empty() => out.push(leaf.to_geo()),
            _ => {}
        }
    }

    fn to_geo(&self) -> geo::Geometry<f64> {
        match self {
            Shape::Point(c) => geo::Geometry::Point(geo::Point(c.to_geo())),
            Shape::LineString(coords) => geo::Geometry::LineString(line_to_geo(coords)),
            Shape::Polygon {
                exterior,
                interiors,
            } => geo::Geometry::Polygon(geo::Polygon::new(
                line_to_geo(exterior),
                interiors.iter().map(|ring| line_to_geo(ring)).collect(),
            )),
            Shape::Collection(shapes) => geo::Geometry::GeometryCollection(
                geo::GeometryCollection::new_from(shapes.iter().map(Shape::to_geo).collect()),
            ),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Shape::Point(_) => false,
            Shape::LineString(coords) => coords.is_empty(),
            Shape::Polygon { exterior, .. } => exterior.is_empty(),
            Shape::Collection(shapes) => shapes.iter().all(Shape::is_empty),
        }
    }
}

fn line_to_geo(coords: &[Coord3]) -> geo::LineString<f64> {
    geo::LineString::new(coords.iter().map(|c| c.to_geo()).collect())
}

/// A shape in an explicit spatial reference system
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Geometry {
    pub srid: Srid,
    pub shape: Shape,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Geometry {
    pub fn new(srid: Srid, shape: Shape) -> Self {
        Self { srid, shape }
    }

    pub fn point(srid: Srid, x: f64, y: f64) -> Self {
        Self::new(srid, Shape::Point(Coord3::new(x, y)))
    }

    pub fn point_z(srid: Srid, x: f64, y: f64, z: f64) -> Self {
        Self::new(srid, Shape::Point(Coord3::with_z(x, y, z)))
    }

    /// Build a planar line string from `(x, y)` pairs
    pub fn line(srid: Srid, coords: &[(f64, f64)]) -> Self {
        Self::new(
            srid,
            Shape::LineString(coords.iter().map(|&(x, y)| Coord3::new(x, y)).collect()),
        )
    }

    /// Build a draped line string from `(x, y, z)` triples
    pub fn line_z(srid: Srid, coords: &[(f64, f64, f64)]) -> Self {
        Self::new(
            srid,
            Shape::LineString(
                coords
                    .iter()
                    .map(|&(x, y, z)| Coord3::with_z(x, y, z))
                    .collect(),
            ),
        )
    }

    /// Build a polygon without holes from `(x, y)` pairs; the ring is closed if needed
    pub fn polygon(srid: Srid, ring: &[(f64, f64)]) -> Self {
        let mut exterior: Vec<Coord3> = ring.iter().map(|&(x, y)| Coord3::new(x, y)).collect();
        if let (Some(first), Some(last)) = (exterior.first().copied(), exterior.last().copied()) {
            if first != last {
                exterior.push(first);
            }
        }
        Self::new(
            srid,
            Shape::Polygon {
                exterior,
                interiors: Vec::new(),
            },
        )
    }

    pub fn collection(srid: Srid, shapes: Vec<Shape>) -> Self {
        Self::new(srid, Shape::Collection(shapes))
    }

    /// Reproject into another reference system, leaving `self` untouched
    ///
    /// Any EPSG code known to PROJ is accepted. Elevations are carried unchanged.
    pub fn transform(&self, target: Srid) -> Result<Geometry> {
        if self.srid == target {
            return Ok(self.clone());
        }

        let projection = projection(self.srid, target)?;
        let shape = self.shape.try_map_coords(&mut |c: &Coord3| {
            let (x, y) = projection.convert((c.x, c.y)).map_err(|e| {
                CoreError::InvalidGeometry(format!(
                    "coordinate ({}, {}) cannot be projected to {}: {}",
                    c.x, c.y, target, e
                ))
            })?;
            if !x.is_finite() || !y.is_finite() {
                return Err(CoreError::InvalidGeometry(format!(
                    "coordinate ({}, {}) cannot be projected to {}",
                    c.x, c.y, target
                )));
            }
            Ok(Coord3 { x, y, z: c.z })
        })?;

        Ok(Geometry { srid: target, shape })
    }

    /// Copy with every ordinate rounded to `precision` decimal digits
    pub fn rounded(&self, precision: u32) -> Geometry {
        let shape = self.shape.map_coords(&mut |c: &Coord3| Coord3 {
            x: utils::round_to(c.x, precision),
            y: utils::round_to(c.y, precision),
            z: c.z.map(|z| utils::round_to(z, precision)),
        });
        Geometry {
            srid: self.srid,
            shape,
        }
    }

    /// Planar length in native units
    pub fn length_2d(&self) -> f64 {
        self.shape.length_with(Coord3::distance_2d)
    }

    /// Length along the draped curve
    pub fn length_3d(&self) -> f64 {
        self.shape.length_with(Coord3::distance_3d)
    }

    /// `[minx, miny, maxx, maxy]`, or `None` for an empty geometry
    pub fn bbox(&self) -> Option<Bbox> {
        let mut bbox: Option<Bbox> = None;
        self.shape.for_each_coord(&mut |c: &Coord3| {
            bbox = Some(match bbox {
                Some([min_x, min_y, max_x, max_y]) => [
                    min_x.min(c.x),
                    min_y.min(c.y),
                    max_x.max(c.x),
                    max_y.max(c.y),
                ],
                None => [c.x, c.y, c.x, c.y],
            });
        });
        bbox
    }

    /// Envelope as a `geo::Rect`, used by the spatial index
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.bbox().map(|[min_x, min_y, max_x, max_y]| {
            Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// All coordinates in traversal order
    pub fn coords(&self) -> Vec<Coord3> {
        let mut out = Vec::new();
        self.shape.for_each_coord(&mut |c: &Coord3| out.push(*c));
        out
    }

    /// Planar view of the geometry
    pub fn to_geo(&self) -> geo::Geometry<f64> {
        self.shape.to_geo()
    }

    /// Whether both geometries share at least one point (planar)
    pub fn intersects(&self, other: &Geometry) -> Result<bool> {
        if self.srid != other.srid {
            return Err(CoreError::SridMismatch {
                expected: self.srid.0,
                found: other.srid.0,
            });
        }
        if self.is_empty() || other.is_empty() {
            return Ok(false);
        }
        Ok(self.to_geo().intersects(&other.to_geo()))
    }

    /// Minimum planar distance between both geometries, zero when they intersect
    ///
    /// Infinite when either side is empty.
    pub fn distance(&self, other: &Geometry) -> Result<f64> {
        if self.intersects(other)? {
            return Ok(0.0);
        }
        let mut ours = Vec::new();
        let mut theirs = Vec::new();
        self.shape.geo_parts(&mut ours);
        other.shape.geo_parts(&mut theirs);

        let mut best = f64::INFINITY;
        for a in &ours {
            for b in &theirs {
                best = best.min(Euclidean.distance(a, b));
            }
        }
        Ok(best)
    }
}

/// Reproject a geometry into `target` without mutating the input
pub fn transform(geometry: &Geometry, target: Srid) -> Result<Geometry> {
    geometry.transform(target)
}

/// Planar length in the geometry's native units
pub fn length2d(geometry: &Geometry) -> f64 {
    geometry.length_2d()
}

/// Sum of the Euclidean 3D segment lengths
pub fn length3d(geometry: &Geometry) -> f64 {
    geometry.length_3d()
}

/// Round every bbox coordinate to `precision` decimal digits
///
/// Lossy; only meant for the serialization boundary.
pub fn simplify_bbox(bbox: Bbox, precision: u32) -> Bbox {
    bbox.map(|v| utils::round_to(v, precision))
}

/// Round a coordinate vector to `precision` decimal digits
pub fn simplify_coords(coords: &[f64], precision: u32) -> Vec<f64> {
    coords
        .iter()
        .map(|&v| utils::round_to(v, precision))
        .collect()
}

thread_local! {
    /// PROJ transformation objects are not `Send`; keep one per thread and SRID pair
    static PROJECTIONS: RefCell<HashMap<(Srid, Srid), Rc<Proj>>> = RefCell::new(HashMap::new());
}

fn projection(source: Srid, target: Srid) -> Result<Rc<Proj>> {
    PROJECTIONS.with(|cache| {
        if let Some(projection) = cache.borrow().get(&(source, target)) {
            return Ok(Rc::clone(projection));
        }

        let projection = Proj::new_known_crs(&source.to_string(), &target.to_string(), None)
            .map_err(|e| {
                // Name the side PROJ does not know
                let unknown = if Proj::new(&source.to_string()).is_err() {
                    source
                } else {
                    target
                };
                tracing::debug!("No transformation from {} to {}: {}", source, target, e);
                CoreError::InvalidSrid(unknown.0)
            })?;
        let projection = Rc::new(projection);
        cache
            .borrow_mut()
            .insert((source, target), Rc::clone(&projection));
        Ok(projection)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_transform_lambert_to_wgs84() {
        let native = Geometry::point(Srid::LAMBERT_93, 700000.0, 6600000.0);
        let api = transform(&native, Srid::WGS84).unwrap();

        assert_eq!(api.srid, Srid::WGS84);
        match api.shape {
            Shape::Point(c) => {
                assert_abs_diff_eq!(c.x, 3.0, epsilon = 1e-9);
                assert_abs_diff_eq!(c.y, 46.5, epsilon = 1e-9);
            }
            other => panic!("unexpected shape {:?}", other),
        }
        // The input is left untouched
        assert_eq!(native.srid, Srid::LAMBERT_93);
    }

    #[test]
    fn test_transform_keeps_elevation() {
        let line = Geometry::line_z(
            Srid::LAMBERT_93,
            &[(700000.0, 6600000.0, 100.0), (700100.0, 6600100.0, 150.0)],
        );
        let api = line.transform(Srid::WEB_MERCATOR).unwrap();
        let zs: Vec<_> = api.coords().iter().map(|c| c.z).collect();
        assert_eq!(zs, vec![Some(100.0), Some(150.0)]);
    }

    #[test]
    fn test_transform_roundtrip_through_lambert() {
        let paris = Geometry::point(Srid::WGS84, 2.3522, 48.8566);
        let native = paris.transform(Srid::LAMBERT_93).unwrap();
        let back = native.transform(Srid::WGS84).unwrap();
        match (paris.shape, back.shape) {
            (Shape::Point(a), Shape::Point(b)) => {
                assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
                assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
            }
            other => panic!("unexpected shapes {:?}", other),
        }
    }

    #[test]
    fn test_transform_other_epsg_codes() {
        // NTF (Paris) / Lambert zone II, still common in older French datasets
        let native = Geometry::point(Srid(27572), 600000.0, 2200000.0);
        let api = native.transform(Srid::WGS84).unwrap();
        match api.shape {
            Shape::Point(c) => {
                assert!((-5.0..10.0).contains(&c.x), "longitude {}", c.x);
                assert!((41.0..52.0).contains(&c.y), "latitude {}", c.y);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_transform_unknown_srid() {
        let point = Geometry::point(Srid(1), 1.0, 2.0);
        assert!(matches!(
            point.transform(Srid::WGS84),
            Err(CoreError::InvalidSrid(1))
        ));
        let point = Geometry::point(Srid::WGS84, 1.0, 2.0);
        assert!(matches!(
            point.transform(Srid(1)),
            Err(CoreError::InvalidSrid(1))
        ));
    }

    #[test]
    fn test_rounded_keeps_structure() {
        let polygon = Geometry::new(
            Srid::WGS84,
            Shape::Polygon {
                exterior: vec![
                    Coord3::with_z(3.123456789, 46.0, 1000.04),
                    Coord3::new(3.2, 46.1),
                    Coord3::new(3.0, 46.2),
                    Coord3::with_z(3.123456789, 46.0, 1000.04),
                ],
                interiors: vec![vec![Coord3::new(3.1000000001, 46.1)]],
            },
        );
        let rounded = polygon.rounded(1);
        assert_eq!(rounded.srid, Srid::WGS84);
        match rounded.shape {
            Shape::Polygon {
                exterior,
                interiors,
            } => {
                assert_eq!(exterior[0], Coord3::with_z(3.1, 46.0, 1000.0));
                assert_eq!(exterior.len(), 4);
                assert_eq!(interiors, vec![vec![Coord3::new(3.1, 46.1)]]);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_transform_same_srid_is_identity() {
        let line = Geometry::line(Srid::WGS84, &[(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(line.transform(Srid::WGS84).unwrap(), line);
    }

    #[test]
    fn test_lengths() {
        let flat = Geometry::line(Srid::LAMBERT_93, &[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]);
        assert_abs_diff_eq!(length2d(&flat), 11.0);
        assert_abs_diff_eq!(length3d(&flat), 11.0);

        let draped = Geometry::line_z(Srid::LAMBERT_93, &[(0.0, 0.0, 0.0), (3.0, 4.0, 12.0)]);
        assert_abs_diff_eq!(length2d(&draped), 5.0);
        assert_abs_diff_eq!(length3d(&draped), 13.0);
    }

    #[test]
    fn test_lengths_of_points_and_polygons() {
        let point = Geometry::point(Srid::LAMBERT_93, 1.0, 1.0);
        assert_eq!(point.length_2d(), 0.0);
        let square = Geometry::polygon(
            Srid::LAMBERT_93,
            &[(0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (3.0, 0.0)],
        );
        assert_eq!(square.length_3d(), 0.0);
    }

    #[test]
    fn test_bbox_and_rounding() {
        let line = Geometry::line(
            Srid::WGS84,
            &[(3.000000012, 46.49999996), (3.00141421, 46.5012345678)],
        );
        let bbox = line.bbox().unwrap();
        assert_eq!(
            simplify_bbox(bbox, 7),
            [3.0, 46.5, 3.0014142, 46.5012346]
        );
        assert_eq!(simplify_coords(&[1.123456789, 2.0], 7), vec![1.1234568, 2.0]);
    }

    #[test]
    fn test_empty_geometry_has_no_bbox() {
        let empty = Geometry::new(Srid::WGS84, Shape::LineString(Vec::new()));
        assert!(empty.bbox().is_none());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_polygon_is_closed() {
        let square = Geometry::polygon(Srid::LAMBERT_93, &[(0.0, 0.0), (0.0, 3.0), (3.0, 3.0)]);
        match square.shape {
            Shape::Polygon { exterior, .. } => {
                assert_eq!(exterior.len(), 4);
                assert_eq!(exterior.first(), exterior.last());
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_intersects_and_distance() {
        let square = Geometry::polygon(
            Srid::LAMBERT_93,
            &[(0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (3.0, 0.0)],
        );
        let inside = Geometry::point(Srid::LAMBERT_93, 1.0, 1.0);
        let outside = Geometry::point(Srid::LAMBERT_93, 6.0, 1.0);

        assert!(square.intersects(&inside).unwrap());
        assert!(!square.intersects(&outside).unwrap());
        assert_eq!(square.distance(&inside).unwrap(), 0.0);
        assert_abs_diff_eq!(square.distance(&outside).unwrap(), 3.0);

        let crossing = Geometry::line(Srid::LAMBERT_93, &[(-1.0, 5.0), (5.0, 5.0)]);
        assert_abs_diff_eq!(square.distance(&crossing).unwrap(), 2.0);
    }

    #[test]
    fn test_distance_to_collections_and_empty_shapes() {
        let collection = Geometry::collection(
            Srid::LAMBERT_93,
            vec![
                Shape::Point(Coord3::new(10.0, 0.0)),
                Shape::LineString(Vec::new()),
                Shape::LineString(vec![Coord3::new(0.0, 4.0), Coord3::new(0.0, 8.0)]),
            ],
        );
        let origin = Geometry::point(Srid::LAMBERT_93, 0.0, 0.0);
        assert_abs_diff_eq!(collection.distance(&origin).unwrap(), 4.0);

        let empty = Geometry::new(Srid::LAMBERT_93, Shape::LineString(Vec::new()));
        assert_eq!(empty.distance(&origin).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_intersects_rejects_mixed_srids() {
        let a = Geometry::point(Srid::LAMBERT_93, 1.0, 1.0);
        let b = Geometry::point(Srid::WGS84, 1.0, 1.0);
        assert!(matches!(
            a.intersects(&b),
            Err(CoreError::SridMismatch { .. })
        ));
    }

    #[test]
    fn test_collection_length_and_bbox() {
        let collection = Geometry::collection(
            Srid::LAMBERT_93,
            vec![
                Shape::Point(Coord3::new(10.0, 10.0)),
                Shape::LineString(vec![Coord3::new(0.0, 0.0), Coord3::new(0.0, 5.0)]),
            ],
        );
        assert_abs_diff_eq!(collection.length_2d(), 5.0);
        assert_eq!(collection.bbox(), Some([0.0, 0.0, 10.0, 10.0]));
    }

    proptest! {
        #[test]
        fn prop_length3d_dominates_length2d(
            vertices in prop::collection::vec(
                (-1000.0f64..1000.0, -1000.0f64..1000.0, 0.0f64..3000.0),
                2..20,
            )
        ) {
            let line = Geometry::line_z(Srid::LAMBERT_93, &vertices);
            prop_assert!(length3d(&line) + 1e-9 >= length2d(&line));
        }

        #[test]
        fn prop_constant_elevation_lengths_match(
            vertices in prop::collection::vec((-1000.0f64..1000.0, -1000.0f64..1000.0), 2..20),
            elevation in 0.0f64..3000.0,
        ) {
            let draped: Vec<_> = vertices.iter().map(|&(x, y)| (x, y, elevation)).collect();
            let line = Geometry::line_z(Srid::LAMBERT_93, &draped);
            prop_assert!((length3d(&line) - length2d(&line)).abs() < 1e-6);
        }
    }
}
