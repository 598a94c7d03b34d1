use std::collections::HashMap;
use std::sync::OnceLock;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/calmform_messages_generated.rs"));
}

pub const REQUIRED_KEY: &str = "form.required";
pub const EMAIL_KEY: &str = "form.email";
pub const PHONE_KEY: &str = "form.phone";
pub const DEFAULT_KEY: &str = "form.default";

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub enum Locale {
    #[default]
    System,
    Tag(String),
}

impl From<String> for Locale {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("system") {
            return Self::System;
        }
        Self::Tag(value.trim().to_string())
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

/// Looks up built-in message text for one locale.
#[derive(Clone, Debug, Default)]
pub struct Translator {
    locale: Locale,
}

impl Translator {
    pub fn new(locale: impl Into<Locale>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn default_locale(&self) -> &'static str {
        catalog().default_locale
    }

    pub fn resolved_locale(&self) -> &'static str {
        catalog().resolve_locale(self.requested_locale().as_deref())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Translated text for `key`, falling back to the default locale and
    /// then to the key itself.
    pub fn t(&self, key: &str) -> String {
        self.lookup(key)
            .or_else(|| catalog().lookup(catalog().default_locale, key))
            .unwrap_or(key)
            .to_string()
    }

    fn requested_locale(&self) -> Option<String> {
        match &self.locale {
            Locale::System => system_locale(),
            Locale::Tag(tag) => Some(tag.clone()),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        catalog().lookup(self.resolved_locale(), key)
    }
}

#[cfg(feature = "i18n")]
fn system_locale() -> Option<String> {
    sys_locale::get_locale()
}

#[cfg(not(feature = "i18n"))]
fn system_locale() -> Option<String> {
    None
}

fn catalog() -> &'static MessageCatalog {
    static CATALOG: OnceLock<MessageCatalog> = OnceLock::new();
    CATALOG.get_or_init(MessageCatalog::load)
}

struct MessageCatalog {
    default_locale: &'static str,
    locales: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    normalized_locale_lookup: HashMap<String, &'static str>,
    language_lookup: HashMap<String, &'static str>,
}

impl MessageCatalog {
    fn load() -> Self {
        let mut locales = HashMap::new();
        let mut normalized_locale_lookup = HashMap::new();
        let mut language_lookup = HashMap::new();

        for (locale, entries) in generated::LOCALES.iter().copied() {
            let normalized = normalize_locale_tag(locale);
            normalized_locale_lookup.insert(normalized.clone(), locale);

            let language = normalized.split('-').next().unwrap_or_default().to_string();
            language_lookup.entry(language).or_insert(locale);

            locales.insert(locale, entries.iter().copied().collect::<HashMap<_, _>>());
        }

        if !locales.contains_key(generated::DEFAULT_LOCALE) {
            locales.insert(generated::DEFAULT_LOCALE, HashMap::new());
            normalized_locale_lookup.insert(
                normalize_locale_tag(generated::DEFAULT_LOCALE),
                generated::DEFAULT_LOCALE,
            );
        }

        Self {
            default_locale: generated::DEFAULT_LOCALE,
            locales,
            normalized_locale_lookup,
            language_lookup,
        }
    }

    fn resolve_locale(&self, requested: Option<&str>) -> &'static str {
        let Some(requested) = requested else {
            return self.default_locale;
        };

        let normalized = normalize_locale_tag(requested);
        if let Some(locale) = self.normalized_locale_lookup.get(&normalized) {
            return locale;
        }

        let language = normalized.split('-').next().unwrap_or_default();
        if let Some(locale) = self.language_lookup.get(language) {
            return locale;
        }

        self.default_locale
    }

    fn lookup(&self, locale: &'static str, key: &str) -> Option<&'static str> {
        self.locales
            .get(locale)
            .and_then(|entries| entries.get(key).copied())
    }
}

fn normalize_locale_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    let without_encoding = trimmed.split('.').next().unwrap_or(trimmed);
    let without_variant = without_encoding
        .split('@')
        .next()
        .unwrap_or(without_encoding);
    without_variant
        .replace('_', "-")
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_translation_shows_key() {
        let translator = Translator::new("en");
        assert_eq!(translator.t("form.unknown"), "form.unknown");
    }

    #[test]
    fn supports_locale_tag_normalization() {
        let translator = Translator::new("fr_FR.UTF-8");
        assert_eq!(translator.resolved_locale(), "fr");
        assert_eq!(translator.t(REQUIRED_KEY), "Ce champ est obligatoire");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let translator = Translator::new("de-DE");
        assert_eq!(translator.resolved_locale(), translator.default_locale());
        assert_eq!(translator.t(EMAIL_KEY), "Invalid email");
    }

    #[test]
    fn system_keyword_maps_to_system_locale() {
        assert_eq!(Locale::from(" System "), Locale::System);
        assert_eq!(Locale::from("en-US"), Locale::Tag("en-US".into()));
    }

    #[test]
    fn every_locale_defines_builtin_keys() {
        for tag in ["en", "fr"] {
            let translator = Translator::new(tag);
            for key in [REQUIRED_KEY, EMAIL_KEY, PHONE_KEY, DEFAULT_KEY] {
                assert!(translator.has_key(key), "{tag} is missing {key}");
            }
        }
    }
}
