// Translation capability
//
// The core never hardcodes user-facing language. It asks a `Translator` for a
// catalog key plus named parameters, and for the plural category of a count.
// `CatalogTranslator` is the stock implementation backed by a flat JSON map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Named template parameters
pub type Params = Vec<(&'static str, String)>;

/// CLDR-style plural category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluralCategory {
    One,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::One => "one",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

/// Languages with known plural rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Uk,
    Ru,
}

impl Locale {
    /// Parse a language tag such as `uk`, `uk-UA` or `en_US`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = tag
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match lang.as_str() {
            "en" => Some(Locale::En),
            "uk" => Some(Locale::Uk),
            "ru" => Some(Locale::Ru),
            _ => None,
        }
    }

    pub fn plural_category(&self, n: u64) -> PluralCategory {
        match self {
            Locale::En => {
                if n == 1 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            // East Slavic integer rules
            Locale::Uk | Locale::Ru => {
                let mod10 = n % 10;
                let mod100 = n % 100;
                if mod10 == 1 && mod100 != 11 {
                    PluralCategory::One
                } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
                    PluralCategory::Few
                } else {
                    PluralCategory::Many
                }
            }
        }
    }
}

/// The external templating collaborator.
pub trait Translator: Send + Sync {
    /// Render `key` with `{name}` placeholders replaced from `params`.
    fn translate(&self, key: &str, params: &Params) -> String;

    /// Whether the catalog has an entry for `key`
    fn has_key(&self, key: &str) -> bool;

    fn plural_category(&self, n: u64) -> PluralCategory;
}

/// Replace `{name}` placeholders. Unknown placeholders are left as-is.
///
/// Substituted values are never scanned again, so a value that itself looks
/// like a placeholder is rendered literally.
pub fn interpolate(template: &str, params: &Params) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail[1..].find(['{', '}']).map(|i| i + 1) else {
            break;
        };
        if tail.as_bytes()[end] == b'{' {
            // Stray brace: emit it and rescan from the next one
            out.push_str(&tail[..end]);
            rest = &tail[end..];
            continue;
        }
        let name = &tail[1..end];
        match params.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Flat key → template catalog for one locale.
///
/// Missing keys render as the key itself so gaps are visible but harmless.
#[derive(Debug, Clone, Default)]
pub struct CatalogTranslator {
    locale: Locale,
    entries: HashMap<String, String>,
}

impl CatalogTranslator {
    pub fn new(locale: Locale, entries: HashMap<String, String>) -> Self {
        Self { locale, entries }
    }

    /// Load a catalog from a JSON object of string values.
    pub fn from_json(locale: Locale, json: &str) -> Result<Self, ConfigError> {
        let entries: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| ConfigError::Catalog(e.to_string()))?;
        Ok(Self::new(locale, entries))
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add or override one entry
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.entries.insert(key.into(), template.into());
    }
}

impl Translator for CatalogTranslator {
    fn translate(&self, key: &str, params: &Params) -> String {
        match self.entries.get(key) {
            Some(template) => interpolate(template, params),
            None => key.to_string(),
        }
    }

    fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn plural_category(&self, n: u64) -> PluralCategory {
        self.locale.plural_category(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_plural_rules() {
        assert_eq!(Locale::En.plural_category(1), PluralCategory::One);
        assert_eq!(Locale::En.plural_category(0), PluralCategory::Other);
        assert_eq!(Locale::En.plural_category(2), PluralCategory::Other);
        assert_eq!(Locale::En.plural_category(21), PluralCategory::Other);
    }

    #[test]
    fn test_east_slavic_plural_rules() {
        let uk = Locale::Uk;
        assert_eq!(uk.plural_category(1), PluralCategory::One);
        assert_eq!(uk.plural_category(21), PluralCategory::One);
        assert_eq!(uk.plural_category(11), PluralCategory::Many);
        assert_eq!(uk.plural_category(2), PluralCategory::Few);
        assert_eq!(uk.plural_category(24), PluralCategory::Few);
        assert_eq!(uk.plural_category(12), PluralCategory::Many);
        assert_eq!(uk.plural_category(5), PluralCategory::Many);
        assert_eq!(uk.plural_category(0), PluralCategory::Many);
        assert_eq!(uk.plural_category(111), PluralCategory::Many);
    }

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("uk-UA"), Some(Locale::Uk));
        assert_eq!(Locale::from_tag("en_US.UTF-8"), Some(Locale::En));
        assert_eq!(Locale::from_tag("RU"), Some(Locale::Ru));
        assert_eq!(Locale::from_tag("fr"), None);
    }

    #[test]
    fn test_translate_interpolates() {
        let catalog = CatalogTranslator::from_json(
            Locale::En,
            r#"{"notification.like": "{sender} liked your post"}"#,
        )
        .unwrap();

        let text = catalog.translate("notification.like", &vec![("sender", "Ann".into())]);
        assert_eq!(text, "Ann liked your post");
    }

    #[test]
    fn test_interpolate_does_not_expand_values() {
        let params: Params = vec![
            ("sender", "{message}".into()),
            ("message", "private text".into()),
        ];
        assert_eq!(
            interpolate("{sender} liked your post", &params),
            "{message} liked your post"
        );
        assert_eq!(
            interpolate("{message} from {sender}", &params),
            "private text from {message}"
        );
    }

    #[test]
    fn test_interpolate_leaves_unknown_and_stray_braces() {
        let params: Params = vec![("count", "3".into())];
        assert_eq!(interpolate("{count} new {items}", &params), "3 new {items}");
        assert_eq!(interpolate("a { b {count}", &params), "a { b 3");
        assert_eq!(interpolate("open {count", &params), "open {count");
        assert_eq!(interpolate("}{count}{", &params), "}3{");
    }

    #[test]
    fn test_missing_key_renders_key() {
        let catalog = CatalogTranslator::default();
        assert_eq!(catalog.translate("toast.auth_error.message", &vec![]), "toast.auth_error.message");
        assert!(!catalog.has_key("toast.auth_error.message"));
    }

    #[test]
    fn test_invalid_catalog_is_config_error() {
        let err = CatalogTranslator::from_json(Locale::En, "[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Catalog(_)));
    }
}
