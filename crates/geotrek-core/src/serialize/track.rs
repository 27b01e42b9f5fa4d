//! GPX and KML track exports
//!
//! Line geometries become tracks, points become waypoints. Items without geometry are
//! dropped rather than written at the origin.

use super::{SerializeContext, xml::XmlOut};
use crate::{
    CoreError, Coord3, Feature, FeatureKind, Geometry, Result, Shape, SpatialStore, get_translated,
    utils,
};
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

/// A named geometry in WGS84, ready for a track file
#[derive(Debug, Clone, PartialEq)]
pub struct TrackItem {
    pub name: String,
    pub description: String,
    pub geometry: Option<Geometry>,
}

/// Items exported for `feature`: itself, then the published POIs along a trek
///
/// POIs are named "Type: Name" when they carry a type.
pub fn track_items(
    store: &dyn SpatialStore,
    feature: &Feature,
    ctx: &SerializeContext<'_>,
) -> Result<Vec<TrackItem>> {
    let mut items = vec![track_item(store, feature, ctx, None)?];
    if feature.kind == FeatureKind::Trek {
        if let Some(pois) = ctx.registry.compute(store, feature, "published_pois")? {
            for &id in pois.ids() {
                let Some(poi) = store.feature(id) else {
                    continue;
                };
                let kind = poi
                    .attribute("type")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string);
                items.push(track_item(store, poi, ctx, kind)?);
            }
        }
    }
    Ok(items)
}

fn track_item(
    store: &dyn SpatialStore,
    feature: &Feature,
    ctx: &SerializeContext<'_>,
    label: Option<String>,
) -> Result<TrackItem> {
    let config = store.config();
    let language = ctx.url_language(config);
    let name = get_translated("name", feature, language, config);
    let name = match label {
        Some(label) if !label.is_empty() => format!("{}: {}", label, name),
        _ => name,
    };
    let geometry = store
        .geometry_of(feature)?
        .map(|geometry| geometry.transform(crate::Srid::WGS84))
        .transpose()?;
    Ok(TrackItem {
        name,
        description: utils::strip_html(&get_translated("description", feature, language, config)),
        geometry,
    })
}

fn waypoint(c: &Coord3) -> Waypoint {
    let mut point = Waypoint::new(geo::Point::new(c.x, c.y));
    point.elevation = c.z;
    point
}

fn optional(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn collect_gpx(shape: &Shape, item: &TrackItem, track: &mut Track, waypoints: &mut Vec<Waypoint>) {
    match shape {
        Shape::Point(c) => {
            let mut point = waypoint(c);
            point.name = optional(&item.name);
            point.description = optional(&item.description);
            waypoints.push(point);
        }
        Shape::LineString(coords) | Shape::Polygon { exterior: coords, .. } => {
            let mut segment = TrackSegment::default();
            segment.points = coords.iter().map(waypoint).collect();
            track.segments.push(segment);
        }
        Shape::Collection(shapes) => {
            for shape in shapes {
                collect_gpx(shape, item, track, waypoints);
            }
        }
    }
}

/// GPX 1.1 document: one `<trk>` per linear item, one `<wpt>` per point
pub fn to_gpx(items: &[TrackItem]) -> Result<String> {
    let mut gpx = Gpx::default();
    gpx.version = GpxVersion::Gpx11;
    gpx.creator = Some("Geotrek".to_string());
    for item in items {
        let Some(geometry) = &item.geometry else {
            continue;
        };
        let mut track = Track::default();
        track.name = optional(&item.name);
        track.description = optional(&item.description);
        collect_gpx(&geometry.shape, item, &mut track, &mut gpx.waypoints);
        if !track.segments.is_empty() {
            gpx.tracks.push(track);
        }
    }

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| CoreError::Xml(e.to_string()))
}

fn kml_coordinates(coords: &[Coord3]) -> String {
    coords
        .iter()
        .map(|c| format!("{},{},{}", c.x, c.y, c.z.unwrap_or(0.0)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_kml_shape(out: &mut XmlOut, shape: &Shape) -> Result<()> {
    match shape {
        Shape::Point(c) => {
            out.open("Point", &[])?;
            out.element("coordinates", &[], &kml_coordinates(std::slice::from_ref(c)))?;
            out.close("Point")
        }
        Shape::LineString(coords) => {
            out.open("LineString", &[])?;
            out.element("coordinates", &[], &kml_coordinates(coords))?;
            out.close("LineString")
        }
        Shape::Polygon {
            exterior,
            interiors,
        } => {
            out.open("Polygon", &[])?;
            out.open("outerBoundaryIs", &[])?;
            out.open("LinearRing", &[])?;
            out.element("coordinates", &[], &kml_coordinates(exterior))?;
            out.close("LinearRing")?;
            out.close("outerBoundaryIs")?;
            for ring in interiors {
                out.open("innerBoundaryIs", &[])?;
                out.open("LinearRing", &[])?;
                out.element("coordinates", &[], &kml_coordinates(ring))?;
                out.close("LinearRing")?;
                out.close("innerBoundaryIs")?;
            }
            out.close("Polygon")
        }
        Shape::Collection(shapes) => {
            out.open("MultiGeometry", &[])?;
            for shape in shapes {
                write_kml_shape(out, shape)?;
            }
            out.close("MultiGeometry")
        }
    }
}

/// KML 2.2 document with one `Placemark` per placed item
pub fn to_kml(items: &[TrackItem]) -> Result<String> {
    let mut out = XmlOut::new("UTF-8")?;
    out.open("kml", &[("xmlns", "http://www.opengis.net/kml/2.2")])?;
    out.open("Document", &[])?;
    for item in items {
        let Some(geometry) = &item.geometry else {
            continue;
        };
        out.open("Placemark", &[])?;
        out.element("name", &[], &item.name)?;
        out.element("description", &[], &item.description)?;
        write_kml_shape(&mut out, &geometry.shape)?;
        out.close("Placemark")?;
    }
    out.close("Document")?;
    out.close("kml")?;
    out.finish()
}
