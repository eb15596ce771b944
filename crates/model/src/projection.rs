//! Locale projection.
//!
//! A localized resource stores every field as `locale → field → value`.
//! Projection reduces that store to one effective value per field by walking
//! a [`LocaleChain`]: the requested locale first, then its fallbacks, and
//! finally (for payloads transmitted for a single locale) the transmitted
//! locale itself. The first locale holding a non-null value for a field wins.
//!
//! Projection never fails and never mutates the store; a field no locale in
//! the chain has a value for is simply absent from the result.

use crate::resource::{LocaleInfo, LocalizedFields};
use crate::value::FieldValue;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::instrument;

/// Locale assumed when nothing else is configured.
pub const DEFAULT_LOCALE: &str = "en-US";

/// One effective value per field name.
pub type Projection<'a> = BTreeMap<&'a str, &'a FieldValue>;

/// Ordered locale codes to read field values from, most preferred first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleChain(Vec<String>);
impl LocaleChain {
    /// A chain of one locale with no fallbacks.
    pub fn new(locale: impl Into<String>) -> Self {
        Self(vec![locale.into()])
    }

    /// Builds a chain from codes in preference order, dropping repeats.
    /// An empty iterator yields the [`DEFAULT_LOCALE`] chain.
    pub fn from_codes(codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut chain: Vec<String> = Vec::new();
        for code in codes.into_iter().map(Into::into) {
            if !chain.contains(&code) {
                chain.push(code);
            }
        }
        match chain.is_empty() {
            true => Self::default(),
            false => Self(chain),
        }
    }

    /// The locale that was asked for.
    pub fn requested(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
impl Default for LocaleChain {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

/// The locales of a space and the fallback graph between them.
///
/// Built from locale resources, a space's `locales` list, or configuration;
/// the core only ever receives the [`LocaleChain`]s it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSpace {
    default: String,
    fallbacks: HashMap<String, Option<String>>,
}
impl LocaleSpace {
    pub fn new(default: impl Into<String>) -> Self {
        let default = default.into();
        Self { fallbacks: HashMap::from([(default.clone(), None)]), default }
    }

    /// Adds (or redefines) a locale and its fallback.
    pub fn with_locale(mut self, code: impl Into<String>, fallback: Option<impl Into<String>>) -> Self {
        self.fallbacks.insert(code.into(), fallback.map(Into::into));
        self
    }

    /// Builds a space from locale definitions. The locale flagged `default`
    /// wins; otherwise the first definition, otherwise [`DEFAULT_LOCALE`].
    pub fn from_locales<'a>(locales: impl IntoIterator<Item = &'a LocaleInfo>) -> Self {
        let locales: Vec<&LocaleInfo> = locales.into_iter().collect();
        let default = locales
            .iter()
            .find(|locale| locale.default)
            .or(locales.first())
            .map_or(DEFAULT_LOCALE, |locale| locale.code.as_str());
        locales.iter().fold(Self::new(default), |space, locale| {
            space.with_locale(locale.code.as_str(), locale.fallback_code.as_deref())
        })
    }

    pub fn default_locale(&self) -> &str {
        &self.default
    }

    pub fn contains(&self, code: &str) -> bool {
        self.fallbacks.contains_key(code)
    }

    /// The fallback chain starting at `code`.
    ///
    /// Follows fallback codes until a locale without one. A fallback cycle
    /// is cut at the first repeated locale. Unknown codes produce a chain of
    /// just themselves.
    #[instrument(level = "trace", skip(self))]
    pub fn chain(&self, code: &str) -> LocaleChain {
        let mut chain = vec![code.to_string()];
        let mut seen = HashSet::from([code]);
        let mut current = code;
        while let Some(Some(next)) = self.fallbacks.get(current) {
            if !seen.insert(next.as_str()) {
                tracing::warn!(locale = code, fallback = %next, "Locale fallback cycle detected; truncating chain");
                break;
            }
            chain.push(next.clone());
            current = next;
        }
        LocaleChain(chain)
    }

    /// The chain of the space's default locale.
    pub fn default_chain(&self) -> LocaleChain {
        self.chain(&self.default)
    }
}
impl Default for LocaleSpace {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE)
    }
}

/// Projects every field of `fields` through `chain`.
///
/// `transmitted` is the single locale a non-localized payload was sent in
/// (its `sys.locale`); it is consulted after every locale of the chain, so
/// such payloads project under any requested locale.
pub fn project<'a>(fields: &'a LocalizedFields, transmitted: Option<&str>, chain: &LocaleChain) -> Projection<'a> {
    let mut names: Vec<&'a str> = fields.values().flat_map(|map| map.keys().map(String::as_str)).collect();
    names.sort_unstable();
    names.dedup();
    names
        .into_iter()
        .filter_map(|name| project_field(fields, transmitted, chain, name).map(|value| (name, value)))
        .collect()
}

/// Projects a single field through `chain`; see [`project`].
pub fn project_field<'a>(
    fields: &'a LocalizedFields,
    transmitted: Option<&str>,
    chain: &LocaleChain,
    name: &str,
) -> Option<&'a FieldValue> {
    chain
        .iter()
        .chain(transmitted)
        .filter_map(|locale| fields.get(locale)?.get(name))
        .find(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn make_fields(values: &[(&str, &str, &str)]) -> LocalizedFields {
        let mut fields = LocalizedFields::new();
        for (locale, name, value) in values {
            fields.entry(locale.to_string()).or_default().insert(name.to_string(), (*value).into());
        }
        fields
    }

    fn make_space() -> LocaleSpace {
        LocaleSpace::new("en-US")
            .with_locale("de-DE", Some("en-US"))
            .with_locale("de-AT", Some("de-DE"))
            .with_locale("tlh", None::<String>)
    }

    #[rstest]
    #[case("en-US", &["en-US"])]
    #[case("de-DE", &["de-DE", "en-US"])]
    #[case("de-AT", &["de-AT", "de-DE", "en-US"])]
    #[case("tlh", &["tlh"])]
    #[case("fr-FR", &["fr-FR"])]
    fn test_fallback_chains(#[case] code: &str, #[case] expected: &[&str]) {
        let chain = make_space().chain(code);
        assert_eq!(chain.iter().collect::<Vec<_>>(), expected);
        assert_eq!(chain.requested(), code);
    }

    #[test]
    fn test_fallback_cycle_is_cut() {
        let space = LocaleSpace::new("a").with_locale("a", Some("b")).with_locale("b", Some("a"));
        assert_eq!(space.chain("a").iter().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_space_from_locale_definitions() {
        let locales = [LocaleInfo::new("tlh").with_fallback("en-US"), LocaleInfo::new("en-US").as_default()];
        let space = LocaleSpace::from_locales(&locales);
        assert_eq!(space.default_locale(), "en-US");
        assert_eq!(space.chain("tlh").iter().collect::<Vec<_>>(), ["tlh", "en-US"]);
        assert_eq!(LocaleSpace::from_locales([]).default_locale(), DEFAULT_LOCALE);
    }

    #[test]
    fn test_falls_back_to_default_locale_value() {
        let fields = make_fields(&[("en-US", "color", "rainbow")]);
        let chain = make_space().chain("de-DE");
        assert_eq!(project_field(&fields, None, &chain, "color").and_then(FieldValue::as_str), Some("rainbow"));
    }

    #[test]
    fn test_absent_locale_without_fallback_is_missing() {
        let fields = make_fields(&[("en-US", "color", "rainbow")]);
        let projection = project(&fields, None, &LocaleChain::new("tlh"));
        assert!(projection.is_empty());
    }

    #[test]
    fn test_prefers_requested_locale_per_field() {
        let fields = make_fields(&[
            ("en-US", "name", "Nyan Cat"),
            ("en-US", "color", "rainbow"),
            ("tlh", "name", "Nyan vIghro'"),
        ]);
        let chain = LocaleChain::from_codes(["tlh", "en-US"]);
        let projection = project(&fields, None, &chain);
        assert_eq!(projection["name"].as_str(), Some("Nyan vIghro'"));
        assert_eq!(projection["color"].as_str(), Some("rainbow"));
    }

    #[test]
    fn test_non_localized_payload_projects_under_any_locale() {
        let fields = make_fields(&[("de-DE", "name", "Katze")]);
        for requested in ["de-DE", "en-US", "tlh"] {
            let value = project_field(&fields, Some("de-DE"), &LocaleChain::new(requested), "name");
            assert_eq!(value.and_then(FieldValue::as_str), Some("Katze"));
        }
    }

    #[test]
    fn test_null_values_fall_through() {
        let mut fields = make_fields(&[("en-US", "bestFriend", "fallback")]);
        fields.entry("de-DE".to_string()).or_default().insert("bestFriend".to_string(), FieldValue::Null);
        let chain = make_space().chain("de-DE");
        assert_eq!(project_field(&fields, None, &chain, "bestFriend").and_then(FieldValue::as_str), Some("fallback"));
        assert!(project_field(&fields, None, &LocaleChain::new("de-DE"), "bestFriend").is_none());
    }

    #[test]
    fn test_projection_is_idempotent() {
        let fields = make_fields(&[("en-US", "a", "1"), ("tlh", "b", "2")]);
        let chain = LocaleChain::from_codes(["tlh", "en-US"]);
        let before = fields.clone();
        assert_eq!(project(&fields, None, &chain), project(&fields, None, &chain));
        assert_eq!(fields, before);
    }

    #[test]
    fn test_chain_from_codes_dedups() {
        let chain = LocaleChain::from_codes(["de-DE", "en-US", "de-DE"]);
        assert_eq!(chain.iter().collect::<Vec<_>>(), ["de-DE", "en-US"]);
        assert_eq!(LocaleChain::from_codes(Vec::<String>::new()), LocaleChain::default());
    }
}
