//! Runtime settings shared by resolution, queries and serializers

use crate::{Language, Srid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which track export the partner feed links to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum TrackFormat {
    #[default]
    Gpx,
    Kml,
}

impl TrackFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TrackFormat::Gpx => "gpx",
            TrackFormat::Kml => "kml",
        }
    }
}

/// Configuration for a feature store and its serializers
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Config {
    /// Storage reference system of paths and raw geometries
    pub srid: Srid,

    /// Reference system served by the public API
    pub api_srid: Srid,

    /// Available content languages
    pub languages: Vec<Language>,

    /// Fallback language of translated fields
    pub default_language: Language,

    /// Decimal digits kept for coordinates and bboxes in API output
    pub precision: u32,

    /// Whether publication is tracked per language
    pub published_by_lang: bool,

    /// Buffer used when looking for POIs around a trek, in map units
    pub trek_poi_intersection_margin: f64,

    /// Prefix for absolute URLs in partner feeds
    pub base_url: String,

    /// Track file linked from partner feeds
    pub cirkwi_trace: TrackFormat,

    /// Area covered by the network as `[minx, miny, maxx, maxy]` in storage units
    pub spatial_extent: [f64; 4],
}

impl Default for Config {
    fn default() -> Self {
        let languages = vec![Language::new("fr"), Language::new("en")];
        Self {
            srid: Srid::LAMBERT_93,
            api_srid: Srid::WGS84,
            default_language: languages[0].clone(),
            languages,
            precision: 7,
            published_by_lang: true,
            trek_poi_intersection_margin: 500.0,
            base_url: String::new(),
            cirkwi_trace: TrackFormat::Gpx,
            spatial_extent: [105000.0, 6150000.0, 1100000.0, 7150000.0],
        }
    }
}

impl Config {
    /// Languages in which content is considered for publication, sorted
    pub fn sorted_languages(&self) -> Vec<Language> {
        let mut languages = self.languages.clone();
        languages.sort();
        languages.dedup();
        languages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.srid, Srid::LAMBERT_93);
        assert_eq!(config.api_srid, Srid::WGS84);
        assert_eq!(config.default_language.as_str(), "fr");
        assert_eq!(config.precision, 7);
        assert!(config.published_by_lang);
        assert_eq!(config.cirkwi_trace, TrackFormat::Gpx);
    }

    #[test]
    fn test_sorted_languages() {
        let config = Config {
            languages: vec![
                Language::new("it"),
                Language::new("en"),
                Language::new("fr"),
                Language::new("en"),
            ],
            ..Config::default()
        };
        let sorted: Vec<_> = config
            .sorted_languages()
            .iter()
            .map(|l| l.as_str().to_string())
            .collect();
        assert_eq!(sorted, vec!["en", "fr", "it"]);
    }

    #[test]
    fn test_track_extension() {
        assert_eq!(TrackFormat::Gpx.extension(), "gpx");
        assert_eq!(TrackFormat::Kml.extension(), "kml");
    }
}
