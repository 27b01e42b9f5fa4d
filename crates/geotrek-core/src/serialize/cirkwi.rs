//! Cirkwi partner feed
//!
//! Circuits carry one `<information>` block per published language, their distance,
//! duration, a link to the track export and the published POIs along them.

use super::{SerializeContext, track_url, xml::XmlOut};
use crate::{
    Feature, FeatureKind, Language, Result, Shape, SpatialStore, Srid, get_translated, utils,
};

/// Complementary information blocks of a circuit, in feed order
const COMPLEMENTARY_FIELDS: [(&str, &str); 8] = [
    ("departure", "Departure"),
    ("arrival", "Arrival"),
    ("ambiance", "Ambiance"),
    ("access", "Access"),
    ("disabled_infrastructure", "Disabled infrastructure"),
    ("advised_parking", "Advised parking"),
    ("public_transport", "Public transport"),
    ("advice", "Advice"),
];

fn text(field: &str, feature: &Feature, language: &Language, store: &dyn SpatialStore) -> String {
    utils::strip_html(&get_translated(field, feature, language, store.config()))
}

fn is_exported(feature: &Feature, store: &dyn SpatialStore) -> bool {
    feature.is_live() && feature.is_published(store.config())
}

/// Feed for a list of features: circuits when any trek is given, POIs otherwise
///
/// Unpublished and deleted features are left out.
pub fn to_partner_xml(
    store: &dyn SpatialStore,
    features: &[&Feature],
    ctx: &SerializeContext<'_>,
) -> Result<String> {
    let treks: Vec<&Feature> = features
        .iter()
        .copied()
        .filter(|feature| feature.kind == FeatureKind::Trek)
        .collect();
    if treks.is_empty() {
        let pois: Vec<&Feature> = features
            .iter()
            .copied()
            .filter(|feature| feature.kind == FeatureKind::Poi)
            .collect();
        pois_xml(store, &pois)
    } else {
        circuits_xml(store, &treks, ctx)
    }
}

/// `<circuits version="2">` document
pub fn circuits_xml(
    store: &dyn SpatialStore,
    treks: &[&Feature],
    ctx: &SerializeContext<'_>,
) -> Result<String> {
    let mut out = XmlOut::new("utf8")?;
    out.open("circuits", &[("version", "2")])?;
    for trek in treks.iter().filter(|trek| is_exported(trek, store)) {
        write_circuit(&mut out, store, trek, ctx)?;
    }
    out.close("circuits")?;
    out.finish()
}

/// `<pois version="2">` document
pub fn pois_xml(store: &dyn SpatialStore, pois: &[&Feature]) -> Result<String> {
    let mut out = XmlOut::new("utf8")?;
    out.open("pois", &[("version", "2")])?;
    for poi in pois.iter().filter(|poi| is_exported(poi, store)) {
        write_poi(&mut out, store, poi)?;
    }
    out.close("pois")?;
    out.finish()
}

fn write_circuit(
    out: &mut XmlOut,
    store: &dyn SpatialStore,
    trek: &Feature,
    ctx: &SerializeContext<'_>,
) -> Result<()> {
    let config = store.config();
    let created = trek.date_insert.timestamp().to_string();
    let updated = trek.date_update.timestamp().to_string();
    let id = trek.id.to_string();
    out.open(
        "circuit",
        &[
            ("date_creation", &created),
            ("date_modification", &updated),
            ("id_circuit", &id),
        ],
    )?;

    out.open("informations", &[])?;
    for language in trek.published_languages(config) {
        out.open("information", &[("langue", language.as_str())])?;
        out.element("titre", &[], &text("name", trek, &language, store))?;
        let description = [
            text("description_teaser", trek, &language, store),
            text("description", trek, &language, store),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
        out.element("description", &[], &description)?;

        let complementary: Vec<(&str, String)> = COMPLEMENTARY_FIELDS
            .iter()
            .map(|(field, title)| (*title, text(field, trek, &language, store)))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        if !complementary.is_empty() {
            out.open("informations_complementaires", &[])?;
            for (title, value) in complementary {
                out.open("information_complementaire", &[])?;
                out.element("titre", &[], title)?;
                out.element("description", &[], &value)?;
                out.close("information_complementaire")?;
            }
            out.close("informations_complementaires")?;
        }
        out.close("information")?;
    }
    out.close("informations")?;

    if let Some(geometry) = store.geometry_of(trek)? {
        out.element("distance", &[], &format!("{:.0}", geometry.length_2d()))?;
    }

    out.open("locomotions", &[])?;
    match trek.number("duration") {
        Some(hours) => {
            let seconds = format!("{:.0}", hours * 3600.0);
            out.element("locomotion", &[("duree", &seconds)], "")?;
        }
        None => out.element("locomotion", &[], "")?,
    }
    out.close("locomotions")?;

    let trace = track_url(config, ctx.url_language(config), trek, config.cirkwi_trace);
    out.element("fichier_trace", &[("url", &trace)], "")?;

    let mut pois = Vec::new();
    if let Some(ids) = ctx.registry.compute(store, trek, "published_pois")? {
        for &id in ids.ids() {
            if let Some(poi) = store.feature(id).filter(|poi| poi.is_live()) {
                pois.push(poi);
            }
        }
    }
    if !pois.is_empty() {
        out.open("pois", &[])?;
        for poi in pois {
            write_poi(out, store, poi)?;
        }
        out.close("pois")?;
    }

    out.close("circuit")
}

fn write_poi(out: &mut XmlOut, store: &dyn SpatialStore, poi: &Feature) -> Result<()> {
    let config = store.config();
    let created = poi.date_insert.timestamp().to_string();
    let updated = poi.date_update.timestamp().to_string();
    let id = poi.id.to_string();
    out.open(
        "poi",
        &[
            ("date_creation", &created),
            ("date_modification", &updated),
            ("id_poi", &id),
        ],
    )?;

    out.open("informations", &[])?;
    for language in poi.published_languages(config) {
        out.open("information", &[("langue", language.as_str())])?;
        out.element("titre", &[], &text("name", poi, &language, store))?;
        out.element("description", &[], &text("description", poi, &language, store))?;
        out.close("information")?;
    }
    out.close("informations")?;

    let position = match store.geometry_of(poi)? {
        Some(geometry) => match geometry.transform(Srid::WGS84)?.shape {
            Shape::Point(c) => Some(c),
            shape => crate::Geometry::new(Srid::WGS84, shape).coords().first().copied(),
        },
        None => None,
    };
    if let Some(c) = position {
        out.open("adresse", &[])?;
        out.open("position", &[])?;
        out.element("lat", &[], &utils::format_decimal(utils::round_to(c.y, 7)))?;
        out.element("lng", &[], &utils::format_decimal(utils::round_to(c.x, 7)))?;
        out.close("position")?;
        out.close("adresse")?;
    }

    out.close("poi")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::OriginalFiles;
    use crate::{Config, FeatureStore, Geometry, PropertyRegistry, Topology};
    use chrono::{TimeZone, Utc};

    const X0: f64 = 700000.0;
    const Y0: f64 = 6600000.0;

    fn create_test_store(published_by_lang: bool) -> FeatureStore {
        let mut config = Config::default();
        config.languages = vec![Language::new("en"), Language::new("fr")];
        config.default_language = Language::new("en");
        config.base_url = "http://testserver".to_string();
        config.published_by_lang = published_by_lang;
        let mut store = FeatureStore::new(config);

        store
            .add_path(1, "Path", Geometry::line(Srid::LAMBERT_93, &[(X0, Y0), (X0 + 100.0, Y0 + 100.0)]))
            .unwrap();
        let creation = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        let update = Utc.with_ymd_and_hms(2014, 6, 1, 12, 0, 0).unwrap();

        store
            .add_feature(
                Feature::new(1, FeatureKind::Trek)
                    .with_topology(Topology::whole_paths(&[1]))
                    .with_translation("name", "en", "Trek")
                    .with_translation("description_teaser", "en", "<p>Description teaser</p>")
                    .with_translation("description", "en", "<p>Description</p>")
                    .with_translation("departure", "en", "Departure")
                    .with_translation("advice", "en", "Advice")
                    .with_attribute("duration", 1.5)
                    .with_dates(creation, update)
                    .published_in(&["en"]),
            )
            .unwrap();
        store
            .add_feature(
                Feature::new(2, FeatureKind::Poi)
                    .with_topology(Topology::point(1, 0.0).unwrap())
                    .with_translation("name", "en", "POI")
                    .with_translation("description", "en", "<p>Description</p>")
                    .with_dates(creation, update)
                    .published_in(&["en"]),
            )
            .unwrap();
        // Unpublished twins stay out of the feed
        store
            .add_feature(Feature::new(3, FeatureKind::Trek).with_topology(Topology::whole_paths(&[1])))
            .unwrap();
        store
            .add_feature(Feature::new(4, FeatureKind::Poi).with_topology(Topology::point(1, 0.5).unwrap()))
            .unwrap();
        store
    }

    #[test]
    fn test_single_circuit_with_single_poi() {
        let store = create_test_store(true);
        let registry = PropertyRegistry::standard();
        let language = Language::new("en");
        let ctx = SerializeContext::new(&registry, &OriginalFiles).with_language(&language);
        let features: Vec<&Feature> = store.features().collect();

        let xml = to_partner_xml(&store, &features, &ctx).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf8\"?>\n\
             <circuits version=\"2\">\
             <circuit date_creation=\"1388534400\" date_modification=\"1401624000\" id_circuit=\"1\">\
             <informations><information langue=\"en\">\
             <titre>Trek</titre>\
             <description>Description teaser\n\nDescription</description>\
             <informations_complementaires>\
             <information_complementaire><titre>Departure</titre><description>Departure</description></information_complementaire>\
             <information_complementaire><titre>Advice</titre><description>Advice</description></information_complementaire>\
             </informations_complementaires>\
             </information></informations>\
             <distance>141</distance>\
             <locomotions><locomotion duree=\"5400\"></locomotion></locomotions>\
             <fichier_trace url=\"http://testserver/api/en/treks/1/trek.gpx\"></fichier_trace>\
             <pois>\
             <poi date_creation=\"1388534400\" date_modification=\"1401624000\" id_poi=\"2\">\
             <informations><information langue=\"en\"><titre>POI</titre><description>Description</description></information></informations>\
             <adresse><position><lat>46.5</lat><lng>3.0</lng></position></adresse>\
             </poi>\
             </pois>\
             </circuit>\
             </circuits>"
        );
        assert_eq!(xml.matches("<circuit ").count(), 1);
        assert_eq!(xml.matches("<poi ").count(), 1);
    }

    #[test]
    fn test_pois_feed_without_per_language_publication() {
        let store = create_test_store(false);
        let registry = PropertyRegistry::standard();
        let ctx = SerializeContext::new(&registry, &OriginalFiles);
        let pois = store.features_of_kind(FeatureKind::Poi);

        let xml = to_partner_xml(&store, &pois, &ctx).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf8\"?>\n<pois version=\"2\">"));
        assert_eq!(xml.matches("<poi ").count(), 1);
        assert!(xml.contains("<information langue=\"en\"><titre>POI</titre>"));
        // Untranslated fields fall back to the default language
        assert!(xml.contains(
            "<information langue=\"fr\"><titre>POI</titre><description>Description</description>"
        ));
    }

    #[test]
    fn test_kml_trace_is_configurable() {
        let mut store = create_test_store(true);
        let mut config = store.config().clone();
        config.cirkwi_trace = crate::TrackFormat::Kml;
        let trek = store.feature(1).unwrap().clone();
        store = {
            let mut fresh = FeatureStore::new(config);
            fresh
                .add_path(1, "Path", Geometry::line(Srid::LAMBERT_93, &[(X0, Y0), (X0 + 100.0, Y0 + 100.0)]))
                .unwrap();
            fresh.add_feature(trek).unwrap();
            fresh
        };
        let registry = PropertyRegistry::standard();
        let ctx = SerializeContext::new(&registry, &OriginalFiles);
        let trek = store.feature(1).unwrap();
        let xml = circuits_xml(&store, &[trek], &ctx).unwrap();
        assert!(xml.contains("url=\"http://testserver/api/en/treks/1/trek.kml\""));
        assert!(!xml.contains("<pois>"));
    }
}
