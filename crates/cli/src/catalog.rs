// Bundled translation catalogs

use anyhow::{bail, Context, Result};
use pulse_core::{CatalogTranslator, Locale};

const EN: &str = include_str!("../catalog/en.json");
const UK: &str = include_str!("../catalog/uk.json");

/// Load the catalog for a language tag such as `en` or `uk-UA`.
pub fn load(tag: &str) -> Result<CatalogTranslator> {
    let locale = Locale::from_tag(tag).with_context(|| format!("Unknown locale '{}'", tag))?;
    let source = match locale {
        Locale::En => EN,
        Locale::Uk => UK,
        Locale::Ru => bail!("No bundled catalog for locale '{}'", tag),
    };
    CatalogTranslator::from_json(locale, source)
        .with_context(|| format!("Failed to load catalog for '{}'", tag))
}
