use clap::Parser;
use geotrek_core::serialize::{FieldSet, Format};
use geotrek_core::{Config, FeatureId, FeatureKind, Language, TrackFormat};
use std::path::PathBuf;

fn parse_format(value: &str) -> Result<Format, String> {
    value.parse::<Format>().map_err(|e| e.to_string())
}

fn parse_kind(value: &str) -> Result<FeatureKind, String> {
    value.parse::<FeatureKind>()
}

fn parse_track_format(value: &str) -> Result<TrackFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "gpx" => Ok(TrackFormat::Gpx),
        "kml" => Ok(TrackFormat::Kml),
        other => Err(format!("unknown track format '{}'", other)),
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Geotrek exporter - serialize the features of a JSON dataset
pub struct Settings {
    /// Dataset file with paths, features and ordered children
    #[clap(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Output format: json, geojson, csv, gpx, kml or cirkwi
    #[clap(short, long, default_value = "geojson", value_parser = parse_format)]
    pub format: Format,

    /// Only export features of this kind (e.g. trek, poi, site, treks, pois)
    #[clap(short, long, value_parser = parse_kind)]
    pub kind: Option<FeatureKind>,

    /// Only export the feature with this id
    #[clap(long)]
    pub id: Option<FeatureId>,

    /// Active language; translated fields become per-language maps when unset
    #[clap(short, long)]
    pub language: Option<String>,

    /// Comma-separated subset of fields to emit
    #[clap(long)]
    pub fields: Option<String>,

    /// Emit treks as tours, with their steps
    #[clap(long, default_value = "false")]
    pub tour: bool,

    /// Write to this file instead of stdout
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Prefix of absolute URLs
    #[clap(long)]
    pub base_url: Option<String>,

    /// Track file linked from the partner feed (gpx or kml)
    #[clap(long, value_parser = parse_track_format)]
    pub cirkwi_trace: Option<TrackFormat>,

    /// Buffer around treks when looking for their POIs, in map units
    #[clap(long)]
    pub trek_poi_margin: Option<f64>,

    /// Track publication globally instead of per language
    #[clap(long, default_value = "false")]
    pub global_publication: bool,
}

impl Settings {
    /// Apply command-line overrides on top of the dataset configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(trace) = self.cirkwi_trace {
            config.cirkwi_trace = trace;
        }
        if let Some(margin) = self.trek_poi_margin {
            config.trek_poi_intersection_margin = margin;
        }
        if self.global_publication {
            config.published_by_lang = false;
        }
    }

    pub fn language(&self) -> Option<Language> {
        self.language.as_deref().map(Language::new)
    }

    pub fn field_set(&self) -> FieldSet {
        match &self.fields {
            Some(fields) => FieldSet::parse(fields),
            None if self.tour => FieldSet::Tour,
            None => FieldSet::Default,
        }
    }
}
