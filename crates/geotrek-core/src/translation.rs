//! Translated text fields and their language resolution
//!
//! The language is always passed explicitly. A translated field that is empty in the
//! requested language falls back to the default language.

use crate::{Config, Feature};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A content language code such as `fr` or `en`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Language(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Language::new(code)
    }
}

/// Per-field, per-language text values
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Translations(BTreeMap<String, BTreeMap<Language, String>>);

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: &str, language: Language, value: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .insert(language, value.into());
    }

    /// Raw value, without any fallback
    pub fn get(&self, field: &str, language: &Language) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|values| values.get(language))
            .map(String::as_str)
    }

    /// Languages in which `field` has a non-empty value
    pub fn languages_of(&self, field: &str) -> Vec<&Language> {
        self.0
            .get(field)
            .map(|values| {
                values
                    .iter()
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(language, _)| language)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Every field resolved per language
///
/// All of them fall back to the configured default language when the requested
/// language has no value.
pub const TRANSLATED_FIELDS: &[&str] = &[
    "name",
    "departure",
    "arrival",
    "description",
    "description_teaser",
    "ambiance",
    "access",
    "disabled_infrastructure",
    "advised_parking",
    "public_transport",
    "advice",
    "gear",
    "accessibility_infrastructure",
    "practical_info",
    "contact",
    "email",
    "website",
    "ratings_description",
];

/// Whether `field` is resolved per language
pub fn is_translated(field: &str) -> bool {
    TRANSLATED_FIELDS.contains(&field)
}

/// Value of `field` in `language`, or in the default language when empty
///
/// Fields outside [`TRANSLATED_FIELDS`] are read as stored, without fallback.
pub fn get_translated(
    field: &str,
    feature: &Feature,
    language: &Language,
    config: &Config,
) -> String {
    let translations = &feature.translations;
    match translations.get(field, language) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ if is_translated(field) => translations
            .get(field, &config.default_language)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// The value in the active language, or a `{language: value}` map of all configured
/// languages when there is no active language
pub fn translation_or_map(
    field: &str,
    feature: &Feature,
    language: Option<&Language>,
    config: &Config,
) -> serde_json::Value {
    match language {
        Some(language) => serde_json::Value::String(get_translated(field, feature, language, config)),
        None => {
            let map = config
                .sorted_languages()
                .into_iter()
                .map(|language| {
                    let value = feature
                        .translations
                        .get(field, &language)
                        .unwrap_or_default()
                        .to_string();
                    (language.to_string(), serde_json::Value::String(value))
                })
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureKind;
    use serde_json::json;

    fn create_test_feature() -> Feature {
        Feature::new(1, FeatureKind::Trek)
            .with_translation("name", "fr", "Col de la Croix")
            .with_translation("name", "en", "")
            .with_translation("description", "fr", "Une belle montée")
            .with_translation("departure", "en", "Parking")
    }

    #[test]
    fn test_requested_language_wins() {
        let config = Config::default();
        let feature = create_test_feature();
        assert_eq!(
            get_translated("departure", &feature, &Language::new("en"), &config),
            "Parking"
        );
    }

    #[test]
    fn test_name_falls_back_to_default_language() {
        let config = Config::default();
        let feature = create_test_feature();
        assert_eq!(
            get_translated("name", &feature, &Language::new("en"), &config),
            "Col de la Croix"
        );
    }

    #[test]
    fn test_every_translated_field_falls_back() {
        let config = Config::default();
        let feature = create_test_feature()
            .with_translation("advice", "fr", "Prévoir de l'eau")
            .with_translation("website", "fr", "https://example.org");
        let english = Language::new("en");
        assert_eq!(
            get_translated("description", &feature, &english, &config),
            "Une belle montée"
        );
        assert_eq!(
            get_translated("advice", &feature, &english, &config),
            "Prévoir de l'eau"
        );
        assert_eq!(
            get_translated("website", &feature, &english, &config),
            "https://example.org"
        );
        // Nothing in either language
        assert_eq!(get_translated("ambiance", &feature, &english, &config), "");
    }

    #[test]
    fn test_unknown_field_is_empty() {
        let config = Config::default();
        let feature = create_test_feature();
        assert!(!is_translated("not_a_field"));
        assert_eq!(
            get_translated("not_a_field", &feature, &Language::new("fr"), &config),
            ""
        );
    }

    #[test]
    fn test_translation_or_map() {
        let config = Config::default();
        let feature = create_test_feature();

        let single = translation_or_map("name", &feature, Some(&Language::new("fr")), &config);
        assert_eq!(single, json!("Col de la Croix"));

        let all = translation_or_map("name", &feature, None, &config);
        assert_eq!(all, json!({"en": "", "fr": "Col de la Croix"}));
    }

    #[test]
    fn test_languages_of() {
        let feature = create_test_feature();
        let languages: Vec<_> = feature
            .translations
            .languages_of("name")
            .into_iter()
            .map(Language::as_str)
            .collect();
        assert_eq!(languages, vec!["fr"]);
    }
}
