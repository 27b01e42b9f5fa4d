//! GeoJSON writer

use super::Record;
use crate::{Coord3, Geometry, Result, Shape};
use ::geojson::{Feature, FeatureCollection, JsonObject, feature::Id};

fn position(c: &Coord3) -> Vec<f64> {
    match c.z {
        Some(z) => vec![c.x, c.y, z],
        None => vec![c.x, c.y],
    }
}

fn shape_value(shape: &Shape) -> ::geojson::Value {
    match shape {
        Shape::Point(c) => ::geojson::Value::Point(position(c)),
        Shape::LineString(coords) => {
            ::geojson::Value::LineString(coords.iter().map(position).collect())
        }
        Shape::Polygon {
            exterior,
            interiors,
        } => ::geojson::Value::Polygon(
            std::iter::once(exterior)
                .chain(interiors)
                .map(|ring| ring.iter().map(position).collect())
                .collect(),
        ),
        Shape::Collection(shapes) => ::geojson::Value::GeometryCollection(
            shapes
                .iter()
                .map(|shape| ::geojson::Geometry::new(shape_value(shape)))
                .collect(),
        ),
    }
}

/// GeoJSON geometry object; Z is kept when present
pub fn geometry_value(geometry: &Geometry) -> ::geojson::Geometry {
    ::geojson::Geometry::new(shape_value(&geometry.shape))
}

fn feature_of(record: &Record) -> Feature {
    let properties: JsonObject = record
        .fields
        .iter()
        .filter(|(name, _)| name != "geometry")
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    Feature {
        bbox: record.bbox.map(|bbox| bbox.to_vec()),
        geometry: record.geometry.as_ref().map(geometry_value),
        id: Some(Id::Number(record.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// GeoJSON Feature with the record's rounded bbox
pub fn to_geojson(record: &Record) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(feature_of(record))?)
}

/// GeoJSON FeatureCollection
pub fn to_geojson_collection(records: &[Record]) -> Result<serde_json::Value> {
    let collection = FeatureCollection {
        bbox: None,
        features: records.iter().map(feature_of).collect(),
        foreign_members: None,
    };
    Ok(serde_json::to_value(collection)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{FieldSet, OriginalFiles, SerializeContext, project};
    use crate::{
        Config, Feature as GeoFeature, FeatureKind, FeatureStore, PropertyRegistry, SpatialStore, Srid,
        Topology,
    };

    fn create_test_store() -> FeatureStore {
        let mut store = FeatureStore::new(Config::default());
        store
            .add_path(
                1,
                "Sentier",
                Geometry::line_z(
                    Srid::LAMBERT_93,
                    &[
                        (700123.456, 6600321.987, 1200.0),
                        (701234.567, 6601987.654, 1350.0),
                    ],
                ),
            )
            .unwrap();
        store
            .add_feature(
                GeoFeature::new(1, FeatureKind::Trek).with_topology(Topology::whole_paths(&[1])),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_bbox_close_to_transformed_geometry() {
        let store = create_test_store();
        let registry = PropertyRegistry::standard();
        let ctx = SerializeContext::new(&registry, &OriginalFiles);
        let trek = store.feature(1).unwrap();
        let record = project(&store, trek, &FieldSet::only(["id"]), &ctx).unwrap();

        let exact = crate::SpatialStore::geometry_of(&store, trek)
            .unwrap()
            .unwrap()
            .transform(Srid::WGS84)
            .unwrap()
            .bbox()
            .unwrap();
        let json = to_geojson(&record).unwrap();
        let bbox = json["bbox"].as_array().unwrap();
        assert_eq!(bbox.len(), 4);
        for (rounded, exact) in bbox.iter().zip(exact) {
            assert!((rounded.as_f64().unwrap() - exact).abs() <= 5e-8);
        }
    }

    #[test]
    fn test_feature_layout() {
        let store = create_test_store();
        let registry = PropertyRegistry::standard();
        let ctx = SerializeContext::new(&registry, &OriginalFiles);
        let trek = store.feature(1).unwrap();
        let record = project(&store, trek, &FieldSet::only(["id", "geometry", "length_2d"]), &ctx)
            .unwrap();

        let json = to_geojson(&record).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["id"], 1);
        assert_eq!(json["geometry"]["type"], "LineString");
        assert_eq!(json["geometry"]["coordinates"][0].as_array().unwrap().len(), 3);
        assert!(json["properties"].get("geometry").is_none());
        assert!(json["properties"]["length_2d"].is_number());

        let collection = to_geojson_collection(&[record]).unwrap();
        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_polygon_with_hole() {
        let geometry = Geometry::new(
            Srid::WGS84,
            Shape::Polygon {
                exterior: vec![
                    Coord3::new(0.0, 0.0),
                    Coord3::new(0.0, 1.0),
                    Coord3::new(1.0, 1.0),
                    Coord3::new(0.0, 0.0),
                ],
                interiors: vec![vec![
                    Coord3::new(0.1, 0.2),
                    Coord3::new(0.1, 0.3),
                    Coord3::new(0.2, 0.3),
                    Coord3::new(0.1, 0.2),
                ]],
            },
        );
        let json = serde_json::to_value(geometry_value(&geometry)).unwrap();
        assert_eq!(json["type"], "Polygon");
        assert_eq!(json["coordinates"].as_array().unwrap().len(), 2);
    }
}
