//! Record projection: one feature resolved into API-ready fields
//!
//! Geometry is resolved from the current network, reprojected to the API SRID and
//! rounded. Every other field is computed from the feature, its translations, the
//! property registry or its scalar attributes. Pure format writers then consume records.

use super::{FieldSet, geojson::geometry_value};
use crate::{
    Attachment, Bbox, Config, CoreError, Feature, FeatureId, FeatureKind, Geometry, Language,
    PropertyRegistry, Result, SpatialStore, TrackFormat, simplify_bbox, simplify_coords,
    is_translated, translation_or_map, utils,
};
use serde_json::{Value, json};

/// Supplies thumbnail URLs for attachments
///
/// Thumbnails are decorative: a failure degrades the field, never the record.
pub trait ThumbnailProvider {
    fn thumbnail(&self, attachment: &Attachment) -> Result<String>;
}

/// Uses the attached file itself as its thumbnail
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalFiles;

impl ThumbnailProvider for OriginalFiles {
    fn thumbnail(&self, attachment: &Attachment) -> Result<String> {
        if attachment.file.is_empty() {
            return Err(CoreError::Media(format!(
                "attachment '{}' has no file",
                attachment.title
            )));
        }
        Ok(attachment.file.clone())
    }
}

/// Request-scoped serialization settings
#[derive(Clone, Copy)]
pub struct SerializeContext<'a> {
    /// Active language; `None` emits translated fields as per-language maps
    pub language: Option<&'a Language>,
    pub registry: &'a PropertyRegistry,
    pub thumbnails: &'a dyn ThumbnailProvider,
}

impl<'a> SerializeContext<'a> {
    pub fn new(registry: &'a PropertyRegistry, thumbnails: &'a dyn ThumbnailProvider) -> Self {
        Self {
            language: None,
            registry,
            thumbnails,
        }
    }

    pub fn with_language(mut self, language: &'a Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Language used in generated URLs and single-language outputs
    pub fn url_language<'c>(&self, config: &'c Config) -> &'c Language
    where
        'a: 'c,
    {
        self.language.unwrap_or(&config.default_language)
    }
}

/// A feature projected for output, geometry in the API SRID
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: FeatureId,
    pub kind: FeatureKind,
    /// Rounded API geometry, `None` when unplaced
    pub geometry: Option<Geometry>,
    /// Rounded API bbox, present for every placed feature
    pub bbox: Option<Bbox>,
    /// Requested fields in output order
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Structured map of every requested field
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}

/// Resolve `feature` and compute the fields selected by `fields`
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn project(
    store: &dyn SpatialStore,
    feature: &Feature,
    fields: &FieldSet,
    ctx: &SerializeContext<'_>,
) -> Result<Record> {
    let config = store.config();
    let native = store.geometry_of(feature)?;
    let api = native
        .as_ref()
        .map(|geometry| geometry.transform(config.api_srid))
        .transpose()?;
    let bbox = api
        .as_ref()
        .and_then(Geometry::bbox)
        .map(|bbox| simplify_bbox(bbox, config.precision));
    let geometry = api.map(|geometry| geometry.rounded(config.precision));

    let source = FieldSource {
        store,
        feature,
        native: native.as_ref(),
        geometry: geometry.as_ref(),
        ctx,
    };
    let names = fields.names(feature.kind, ctx.registry);
    let mut values = Vec::with_capacity(names.len());
    for name in names {
        let value = source.value(&name)?;
        values.push((name, value));
    }

    Ok(Record {
        id: feature.id,
        kind: feature.kind,
        geometry,
        bbox,
        fields: values,
    })
}

/// Absolute URL of a trek track export, with a slug of its name
pub fn track_url(
    config: &Config,
    language: &Language,
    feature: &Feature,
    format: TrackFormat,
) -> String {
    let name = crate::get_translated("name", feature, language, config);
    utils::build_url(
        &config.base_url,
        &format!(
            "/api/{}/treks/{}/{}.{}",
            language,
            feature.id,
            utils::slugify(&name),
            format.extension()
        ),
    )
}

struct FieldSource<'s> {
    store: &'s dyn SpatialStore,
    feature: &'s Feature,
    native: Option<&'s Geometry>,
    geometry: Option<&'s Geometry>,
    ctx: &'s SerializeContext<'s>,
}

impl FieldSource<'_> {
    fn value(&self, name: &str) -> Result<Value> {
        let feature = self.feature;
        let config = self.store.config();
        let language = self.ctx.url_language(config);

        let value = match name {
            "id" => json!(feature.id),
            "geometry" => match self.geometry {
                Some(geometry) => serde_json::to_value(geometry_value(geometry))?,
                None => Value::Null,
            },
            "url" => json!(utils::build_url(
                &config.base_url,
                &format!("/api/v2/{}/{}/", feature.kind.api_name(), feature.id)
            )),
            "published" => self.published(),
            "structure" => json!(feature.structure),
            "create_datetime" => json!(feature.date_insert.to_rfc3339()),
            "update_datetime" => json!(feature.date_update.to_rfc3339()),
            "length_2d" => self
                .native
                .map_or(Value::Null, |g| json!(utils::round_to(g.length_2d(), 1))),
            "length_3d" => self
                .native
                .map_or(Value::Null, |g| json!(utils::round_to(g.length_3d(), 1))),
            "thumbnail" => self.thumbnail(),
            "attachments" | "pictures" => Value::Array(
                feature
                    .pictures
                    .iter()
                    .map(|attachment| self.attachment(attachment))
                    .collect(),
            ),
            "gpx" => json!(track_url(config, language, feature, TrackFormat::Gpx)),
            "kml" => json!(track_url(config, language, feature, TrackFormat::Kml)),
            "kml_url" => json!(utils::build_url(
                &config.base_url,
                &format!("/api/{}/sensitiveareas/{}.kml", language, feature.id)
            )),
            "elevation_area_url" => self.trek_url("dem.json"),
            "elevation_svg_url" => self.trek_url("profile.svg"),
            "altimetric_profile" => self.trek_url("profile.json"),
            "parking_location" => self.parking_location()?,
            "count_children" => json!(self.store.count_children(feature.id)),
            "steps" => self.steps()?,
            "external_id" => feature.attribute("eid").cloned().unwrap_or(Value::Null),
            "second_external_id" => feature.attribute("eid2").cloned().unwrap_or(Value::Null),
            _ if is_translated(name) => {
                translation_or_map(name, feature, self.ctx.language, config)
            }
            _ => match self.ctx.registry.compute(self.store, feature, name)? {
                Some(property) => property.to_json(),
                None => match feature.relations.get(name) {
                    Some(labels) => json!(labels),
                    None => feature.attribute(name).cloned().unwrap_or(Value::Null),
                },
            },
        };
        Ok(value)
    }

    fn published(&self) -> Value {
        let feature = self.feature;
        let config = self.store.config();
        if feature.kind.is_zoning() || !config.published_by_lang {
            return json!(feature.publication.published);
        }
        match self.ctx.language {
            Some(language) => json!(feature.is_published_in(language, config)),
            None => Value::Object(
                config
                    .sorted_languages()
                    .into_iter()
                    .map(|language| {
                        let published = feature.is_published_in(&language, config);
                        (language.to_string(), json!(published))
                    })
                    .collect(),
            ),
        }
    }

    fn trek_url(&self, suffix: &str) -> Value {
        let config = self.store.config();
        json!(utils::build_url(
            &config.base_url,
            &format!(
                "/api/{}/treks/{}/{}",
                self.ctx.url_language(config),
                self.feature.id,
                suffix
            )
        ))
    }

    fn thumbnail(&self) -> Value {
        let config = self.store.config();
        match self.feature.pictures.iter().find(|picture| picture.is_image) {
            Some(picture) => json!({
                "author": picture.author,
                "title": picture.title,
                "legend": picture.legend,
                "url": utils::build_url(&config.base_url, &picture.file),
            }),
            None => json!({}),
        }
    }

    fn attachment(&self, attachment: &Attachment) -> Value {
        let config = self.store.config();
        let url = if !attachment.file.is_empty() {
            utils::build_url(&config.base_url, &attachment.file)
        } else if !attachment.video.is_empty() {
            attachment.video.clone()
        } else {
            attachment.link.clone()
        };
        let kind = if attachment.is_image || !attachment.link.is_empty() {
            "image"
        } else if !attachment.video.is_empty() {
            "video"
        } else {
            "file"
        };
        let thumbnail = match self.ctx.thumbnails.thumbnail(attachment) {
            Ok(thumbnail) => utils::build_url(&config.base_url, &thumbnail),
            Err(e) => {
                tracing::warn!(
                    "No thumbnail for attachment '{}' of feature {}: {}",
                    attachment.title,
                    self.feature.id,
                    e
                );
                String::new()
            }
        };
        json!({
            "author": attachment.author,
            "backend": video_backend(&attachment.video),
            "thumbnail": thumbnail,
            "legend": attachment.legend,
            "title": attachment.title,
            "url": url,
            "type": kind,
        })
    }

    /// Parking point stored as `[x, y]` in the storage SRID
    fn parking_location(&self) -> Result<Value> {
        let config = self.store.config();
        let Some(values) = self
            .feature
            .attribute("parking_location")
            .and_then(Value::as_array)
        else {
            return Ok(Value::Null);
        };
        let (Some(x), Some(y)) = (
            values.first().and_then(Value::as_f64),
            values.get(1).and_then(Value::as_f64),
        ) else {
            return Ok(Value::Null);
        };
        let point = Geometry::point(config.srid, x, y).transform(config.api_srid)?;
        let coords = point
            .coords()
            .first()
            .map(|c| simplify_coords(&[c.x, c.y], config.precision))
            .unwrap_or_default();
        Ok(json!(coords))
    }

    /// Child treks projected with the default trek fields
    fn steps(&self) -> Result<Value> {
        let mut steps = Vec::new();
        for child in self.store.children_ids(self.feature.id) {
            let Some(child) = self.store.feature(child) else {
                continue;
            };
            steps.push(project(self.store, child, &FieldSet::Default, self.ctx)?.to_json());
        }
        Ok(Value::Array(steps))
    }
}

fn video_backend(video: &str) -> &'static str {
    if video.is_empty() {
        ""
    } else if video.contains("youtube") || video.contains("youtu.be") {
        "Youtube"
    } else if video.contains("dailymotion") {
        "Dailymotion"
    } else if video.contains("vimeo") {
        "Vimeo"
    } else {
        ""
    }
}
