//! Domain features placed on the network or on raw geometries

use crate::{Config, Geometry, Language, Topology, Translations};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Feature identifier, unique across kinds
pub type FeatureId = u64;

/// Concrete feature variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum FeatureKind {
    Trek,
    Poi,
    Site,
    Intervention,
    Trail,
    Infrastructure,
    Signage,
    TouristicContent,
    TouristicEvent,
    City,
    District,
    RestrictedArea,
    SensitiveArea,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 13] = [
        FeatureKind::Trek,
        FeatureKind::Poi,
        FeatureKind::Site,
        FeatureKind::Intervention,
        FeatureKind::Trail,
        FeatureKind::Infrastructure,
        FeatureKind::Signage,
        FeatureKind::TouristicContent,
        FeatureKind::TouristicEvent,
        FeatureKind::City,
        FeatureKind::District,
        FeatureKind::RestrictedArea,
        FeatureKind::SensitiveArea,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Trek => "trek",
            FeatureKind::Poi => "poi",
            FeatureKind::Site => "site",
            FeatureKind::Intervention => "intervention",
            FeatureKind::Trail => "trail",
            FeatureKind::Infrastructure => "infrastructure",
            FeatureKind::Signage => "signage",
            FeatureKind::TouristicContent => "touristic_content",
            FeatureKind::TouristicEvent => "touristic_event",
            FeatureKind::City => "city",
            FeatureKind::District => "district",
            FeatureKind::RestrictedArea => "restricted_area",
            FeatureKind::SensitiveArea => "sensitive_area",
        }
    }

    /// Collection name used in API URLs
    pub fn api_name(self) -> &'static str {
        match self {
            FeatureKind::Trek => "treks",
            FeatureKind::Poi => "pois",
            FeatureKind::Site => "sites",
            FeatureKind::Intervention => "interventions",
            FeatureKind::Trail => "trails",
            FeatureKind::Infrastructure => "infrastructures",
            FeatureKind::Signage => "signages",
            FeatureKind::TouristicContent => "touristiccontents",
            FeatureKind::TouristicEvent => "touristicevents",
            FeatureKind::City => "cities",
            FeatureKind::District => "districts",
            FeatureKind::RestrictedArea => "restrictedareas",
            FeatureKind::SensitiveArea => "sensitiveareas",
        }
    }

    /// Zoning kinds carry a polygon and a single, language-independent publication flag
    pub fn is_zoning(self) -> bool {
        matches!(
            self,
            FeatureKind::City | FeatureKind::District | FeatureKind::RestrictedArea
        )
    }
}

impl std::str::FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.api_name() == s)
            .ok_or_else(|| format!("unknown feature kind '{}'", s))
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a feature lies: on the path network, on its own geometry, or nowhere yet
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Placement {
    #[default]
    Unplaced,
    Topology(Topology),
    Geometry(Geometry),
}

/// Publication state, globally and per language
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Publication {
    pub published: bool,
    pub by_language: BTreeMap<Language, bool>,
}

/// A picture or media file attached to a feature
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Attachment {
    pub file: String,
    pub video: String,
    pub link: String,
    pub author: String,
    pub title: String,
    pub legend: String,
    pub is_image: bool,
}

/// A feature with its placement, texts and relations
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    pub id: FeatureId,
    pub kind: FeatureKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub placement: Placement,
    #[cfg_attr(feature = "serde", serde(default))]
    pub structure: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub translations: Translations,
    /// Scalar attributes such as `duration`, `difficulty` or `type`
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Many-to-many labels such as `themes` or `networks`
    #[cfg_attr(feature = "serde", serde(default))]
    pub relations: BTreeMap<String, Vec<String>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub publication: Publication,
    #[cfg_attr(feature = "serde", serde(default = "epoch"))]
    pub date_insert: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default = "epoch"))]
    pub date_update: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub deleted: bool,
    /// Parent in the outdoor site tree
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent: Option<FeatureId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pictures: Vec<Attachment>,
}

#[cfg(feature = "serde")]
fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Feature {
    pub fn new(id: FeatureId, kind: FeatureKind) -> Self {
        Self {
            id,
            kind,
            placement: Placement::Unplaced,
            structure: String::new(),
            translations: Translations::new(),
            attributes: BTreeMap::new(),
            relations: BTreeMap::new(),
            publication: Publication::default(),
            date_insert: DateTime::UNIX_EPOCH,
            date_update: DateTime::UNIX_EPOCH,
            deleted: false,
            parent: None,
            pictures: Vec::new(),
        }
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.placement = Placement::Topology(topology);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.placement = Placement::Geometry(geometry);
        self
    }

    pub fn with_structure(mut self, structure: impl Into<String>) -> Self {
        self.structure = structure.into();
        self
    }

    pub fn with_translation(mut self, field: &str, language: &str, value: impl Into<String>) -> Self {
        self.translations.set(field, Language::new(language), value);
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_relation(mut self, name: &str, labels: &[&str]) -> Self {
        self.relations.insert(
            name.to_string(),
            labels.iter().map(|label| label.to_string()).collect(),
        );
        self
    }

    /// Mark as published, globally and in every given language
    pub fn published_in(mut self, languages: &[&str]) -> Self {
        self.publication.published = true;
        for language in languages {
            self.publication
                .by_language
                .insert(Language::new(*language), true);
        }
        self
    }

    pub fn with_dates(mut self, insert: DateTime<Utc>, update: DateTime<Utc>) -> Self {
        self.date_insert = insert;
        self.date_update = update;
        self
    }

    pub fn with_parent(mut self, parent: FeatureId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_picture(mut self, picture: Attachment) -> Self {
        self.pictures.push(picture);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// Numeric attribute, if present and numeric
    pub fn number(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(serde_json::Value::as_f64)
    }

    /// Labels of a many-to-many relation, empty when unset
    pub fn relation(&self, name: &str) -> &[String] {
        self.relations.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_placed(&self) -> bool {
        match &self.placement {
            Placement::Unplaced => false,
            Placement::Topology(topology) => !topology.is_empty(),
            Placement::Geometry(geometry) => !geometry.is_empty(),
        }
    }

    /// Published in `language`, or globally when publication is not tracked per language
    pub fn is_published_in(&self, language: &Language, config: &Config) -> bool {
        if config.published_by_lang && !self.kind.is_zoning() {
            self.publication
                .by_language
                .get(language)
                .copied()
                .unwrap_or(false)
        } else {
            self.publication.published
        }
    }

    /// Published in at least one language
    pub fn is_published(&self, config: &Config) -> bool {
        if config.published_by_lang && !self.kind.is_zoning() {
            config
                .languages
                .iter()
                .any(|language| self.is_published_in(language, config))
        } else {
            self.publication.published
        }
    }

    /// Sorted languages the feature is published in
    ///
    /// Without per-language publication, a published feature counts as published in
    /// every configured language.
    pub fn published_languages(&self, config: &Config) -> Vec<Language> {
        config
            .sorted_languages()
            .into_iter()
            .filter(|language| self.is_published_in(language, config))
            .collect()
    }

    /// Live features are not soft-deleted
    pub fn is_live(&self) -> bool {
        !self.deleted
    }
}
