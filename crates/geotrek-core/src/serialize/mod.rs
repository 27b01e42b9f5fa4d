//! Multi-format serialization of features
//!
//! [`project`] turns a feature into a [`Record`]; the writers in the submodules are
//! pure functions over records (or, for tracks and partner feeds, over features and
//! the store). [`serialize`] and [`serialize_many`] pick the writer for a [`Format`].

mod cirkwi;
mod geojson;
mod record;
mod tabular;
mod track;
mod xml;

pub use self::cirkwi::{circuits_xml, pois_xml, to_partner_xml};
pub use self::geojson::{geometry_value, to_geojson, to_geojson_collection};
pub use self::record::{OriginalFiles, Record, SerializeContext, ThumbnailProvider, project, track_url};
pub use self::tabular::{columns_of, to_tabular, write_csv};
pub use self::track::{TrackItem, to_gpx, to_kml, track_items};

use crate::{CoreError, Feature, FeatureKind, PropertyRegistry, Result, SpatialStore};
use std::str::FromStr;

const TREK_FIELDS: &[&str] = &[
    "id",
    "access",
    "accessibilities",
    "advice",
    "advised_parking",
    "altimetric_profile",
    "ambiance",
    "arrival",
    "ascent",
    "attachments",
    "children",
    "create_datetime",
    "departure",
    "descent",
    "description",
    "description_teaser",
    "difficulty",
    "disabled_infrastructure",
    "duration",
    "elevation_area_url",
    "elevation_svg_url",
    "external_id",
    "geometry",
    "gpx",
    "information_desks",
    "kml",
    "labels",
    "length_2d",
    "length_3d",
    "max_elevation",
    "min_elevation",
    "name",
    "networks",
    "next",
    "parents",
    "parking_location",
    "points_reference",
    "portal",
    "practice",
    "previous",
    "public_transport",
    "published",
    "reservation_system",
    "route",
    "second_external_id",
    "source",
    "structure",
    "themes",
    "thumbnail",
    "update_datetime",
    "url",
];

/// Extra fields of itineraries made of child treks
const TOUR_FIELDS: &[&str] = &["count_children", "steps"];

const POI_FIELDS: &[&str] = &[
    "id",
    "create_datetime",
    "description",
    "external_id",
    "geometry",
    "name",
    "pictures",
    "published",
    "type",
    "update_datetime",
    "url",
];

const SITE_FIELDS: &[&str] = &[
    "id",
    "geometry",
    "url",
    "structure",
    "name",
    "practice",
    "description",
    "description_teaser",
    "ambiance",
    "advice",
    "period",
    "labels",
    "themes",
    "portal",
    "source",
    "information_desks",
    "web_links",
    "eid",
    "orientation",
    "wind",
];

const SENSITIVE_AREA_FIELDS: &[&str] = &[
    "id",
    "contact",
    "create_datetime",
    "description",
    "elevation",
    "geometry",
    "info_url",
    "kml_url",
    "name",
    "period",
    "practices",
    "published",
    "species_id",
    "structure",
    "update_datetime",
    "url",
];

const ZONING_FIELDS: &[&str] = &["id", "geometry", "name", "published"];

/// Linear network objects: trails, interventions, equipment, tourism content
const LINEAR_FIELDS: &[&str] = &[
    "id",
    "create_datetime",
    "description",
    "geometry",
    "length_2d",
    "length_3d",
    "name",
    "published",
    "structure",
    "update_datetime",
    "url",
];

/// Default field list of a kind
pub fn default_fields(kind: FeatureKind) -> &'static [&'static str] {
    match kind {
        FeatureKind::Trek => TREK_FIELDS,
        FeatureKind::Poi => POI_FIELDS,
        FeatureKind::Site => SITE_FIELDS,
        FeatureKind::SensitiveArea => SENSITIVE_AREA_FIELDS,
        FeatureKind::City | FeatureKind::District | FeatureKind::RestrictedArea => ZONING_FIELDS,
        FeatureKind::Intervention
        | FeatureKind::Trail
        | FeatureKind::Infrastructure
        | FeatureKind::Signage
        | FeatureKind::TouristicContent
        | FeatureKind::TouristicEvent => LINEAR_FIELDS,
    }
}

/// Which fields a record carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSet {
    /// The kind's default fields
    #[default]
    Default,
    /// Trek defaults plus `count_children` and `steps`
    Tour,
    /// A caller-selected subset, in request order; unknown names are dropped
    Only(Vec<String>),
}

impl FieldSet {
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSet::Only(fields.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated `fields` parameter
    pub fn parse(fields: &str) -> Self {
        Self::only(
            fields
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty()),
        )
    }

    /// Resolved field names for `kind`
    pub fn names(&self, kind: FeatureKind, registry: &PropertyRegistry) -> Vec<String> {
        let defaults = default_fields(kind);
        let tour: &[&str] = if kind == FeatureKind::Trek {
            TOUR_FIELDS
        } else {
            &[]
        };
        match self {
            FieldSet::Default => defaults.iter().map(|name| name.to_string()).collect(),
            FieldSet::Tour => defaults
                .iter()
                .chain(tour)
                .map(|name| name.to_string())
                .collect(),
            FieldSet::Only(requested) => {
                let computed = registry.names(kind);
                let mut names: Vec<String> = Vec::with_capacity(requested.len());
                for name in requested {
                    let known = defaults.contains(&name.as_str())
                        || tour.contains(&name.as_str())
                        || computed.contains(&name.as_str());
                    if known && !names.contains(name) {
                        names.push(name.clone());
                    }
                }
                names
            }
        }
    }
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Structured map, for embedding in JSON responses
    Json,
    GeoJson,
    Csv,
    Gpx,
    Kml,
    /// Cirkwi partner feed
    Cirkwi,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::GeoJson => "geojson",
            Format::Csv => "csv",
            Format::Gpx => "gpx",
            Format::Kml => "kml",
            Format::Cirkwi => "xml",
        }
    }
}

impl FromStr for Format {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "geojson" => Ok(Format::GeoJson),
            "csv" => Ok(Format::Csv),
            "gpx" => Ok(Format::Gpx),
            "kml" => Ok(Format::Kml),
            "cirkwi" | "xml" => Ok(Format::Cirkwi),
            other => Err(CoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Serialized output: a structured map or encoded bytes
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Map(serde_json::Value),
    Bytes(Vec<u8>),
}

impl Output {
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Output::Map(value) => Ok(serde_json::to_vec_pretty(&value)?),
            Output::Bytes(bytes) => Ok(bytes),
        }
    }
}

/// Serialize a single feature
pub fn serialize(
    store: &dyn SpatialStore,
    feature: &Feature,
    format: Format,
    fields: &FieldSet,
    ctx: &SerializeContext<'_>,
) -> Result<Output> {
    match format {
        Format::Json => Ok(Output::Map(project(store, feature, fields, ctx)?.to_json())),
        Format::GeoJson => Ok(Output::Map(to_geojson(&project(store, feature, fields, ctx)?)?)),
        _ => serialize_many(store, &[feature], format, fields, ctx),
    }
}

/// Serialize a list of features into one document
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn serialize_many(
    store: &dyn SpatialStore,
    features: &[&Feature],
    format: Format,
    fields: &FieldSet,
    ctx: &SerializeContext<'_>,
) -> Result<Output> {
    match format {
        Format::Json => {
            let records = project_all(store, features, fields, ctx)?;
            Ok(Output::Map(serde_json::Value::Array(
                records.iter().map(Record::to_json).collect(),
            )))
        }
        Format::GeoJson => {
            let records = project_all(store, features, fields, ctx)?;
            Ok(Output::Map(to_geojson_collection(&records)?))
        }
        Format::Csv => {
            let records = project_all(store, features, fields, ctx)?;
            let columns = columns_of(&records);
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|record| to_tabular(record, &columns))
                .collect();
            let mut buffer = Vec::new();
            write_csv(&mut buffer, &columns, &rows)?;
            Ok(Output::Bytes(buffer))
        }
        Format::Gpx | Format::Kml => {
            let mut items = Vec::new();
            for feature in features {
                items.extend(track_items(store, feature, ctx)?);
            }
            let text = if format == Format::Gpx {
                to_gpx(&items)?
            } else {
                to_kml(&items)?
            };
            Ok(Output::Bytes(text.into_bytes()))
        }
        Format::Cirkwi => Ok(Output::Bytes(
            to_partner_xml(store, features, ctx)?.into_bytes(),
        )),
    }
}

fn project_all(
    store: &dyn SpatialStore,
    features: &[&Feature],
    fields: &FieldSet,
    ctx: &SerializeContext<'_>,
) -> Result<Vec<Record>> {
    features
        .iter()
        .map(|feature| project(store, feature, fields, ctx))
        .collect()
}
