//! Layered configuration for weft.
//!
//! Values are merged from, in increasing priority:
//! 1. built-in defaults,
//! 2. a configuration file (YAML, TOML or JSON, picked by extension),
//! 3. environment variables prefixed with `WEFT_`, with `__` separating
//!    nested keys (e.g. `WEFT_SYNC__MAX_PAGES=10`).
//!
//! Decoding never reads configuration itself. Callers turn a [`Config`] into
//! a [`LocaleSpace`] and pass the chains it produces explicitly.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::instrument;
use weft_model::{DEFAULT_LOCALE, LocaleSpace};

/// Prefix of environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "WEFT_";
/// File name looked up in the platform configuration directory.
pub const CONFIG_FILE: &str = "weft.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locale requested when the caller doesn't name one.
    pub default_locale: String,
    /// Known locales and their fallbacks.
    pub locales: Vec<LocaleConfig>,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub code: String,
    #[serde(default)]
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on pages fetched per sync run.
    pub max_pages: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
            locales: Vec::new(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    /// `<platform config dir>/weft.yaml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "weft").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Builds the layered provider without extracting it. `path` overrides
    /// [`default_path`](Self::default_path); a file that doesn't exist
    /// contributes nothing.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(&path)),
                Some("toml") => figment.merge(Toml::file(&path)),
                Some("json") => figment.merge(Json::file(&path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.clone())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads and validates the configuration.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::extract(&Self::figment(path)?)?;
        tracing::debug!(
            default_locale = %config.default_locale,
            locales = config.locales.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Extracts and validates a configuration from any provider.
    pub fn extract(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects locale graphs that can't produce a well-formed fallback chain:
    /// empty or duplicate codes, and fallback cycles.
    pub fn validate(&self) -> Result<()> {
        if self.default_locale.is_empty() {
            exn::bail!(ErrorKind::Invalid("default_locale must not be empty".to_string()));
        }
        let mut fallbacks: HashMap<&str, Option<&str>> = HashMap::new();
        for locale in &self.locales {
            if locale.code.is_empty() {
                exn::bail!(ErrorKind::Invalid("locale code must not be empty".to_string()));
            }
            if fallbacks.insert(&locale.code, locale.fallback.as_deref()).is_some() {
                exn::bail!(ErrorKind::Invalid(format!("locale '{}' is defined twice", locale.code)));
            }
        }
        for start in fallbacks.keys() {
            let mut seen = HashSet::from([*start]);
            let mut current = *start;
            while let Some(&Some(next)) = fallbacks.get(current) {
                if !seen.insert(next) {
                    exn::bail!(ErrorKind::Invalid(format!("locale fallback cycle through '{start}'")));
                }
                current = next;
            }
        }
        Ok(())
    }

    /// The locale graph described by this configuration.
    pub fn locale_space(&self) -> LocaleSpace {
        self.locales.iter().fold(LocaleSpace::new(self.default_locale.as_str()), |space, locale| {
            space.with_locale(locale.code.as_str(), locale.fallback.as_deref())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[rstest]
    #[case(".yaml", "default_locale: de-DE\nlocales:\n  - code: de-DE\n    fallback: en-US\n  - code: en-US\nsync:\n  max_pages: 5\n")]
    #[case(".yml", "default_locale: de-DE\nlocales: [{code: de-DE, fallback: en-US}, {code: en-US}]\nsync: {max_pages: 5}\n")]
    #[case(".toml", "default_locale = \"de-DE\"\n[[locales]]\ncode = \"de-DE\"\nfallback = \"en-US\"\n[[locales]]\ncode = \"en-US\"\n[sync]\nmax_pages = 5\n")]
    #[case(".json", r#"{"default_locale": "de-DE", "locales": [{"code": "de-DE", "fallback": "en-US"}, {"code": "en-US"}], "sync": {"max_pages": 5}}"#)]
    fn test_loads_every_format(#[case] suffix: &str, #[case] contents: &str) {
        let file = write_config(suffix, contents);
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.default_locale, "de-DE");
        assert_eq!(config.sync.max_pages, Some(5));
        let space = config.locale_space();
        assert_eq!(space.default_locale(), "de-DE");
        assert_eq!(space.default_chain().iter().collect::<Vec<_>>(), ["de-DE", "en-US"]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = Config::extract(&Config::figment(Some(path.as_path())).unwrap()).unwrap();
        assert_eq!(config.default_locale, DEFAULT_LOCALE);
        assert!(config.locales.is_empty());
        assert_eq!(config.locale_space(), LocaleSpace::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::figment(Some(Path::new("weft.ini"))).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(PathBuf::from("weft.ini")));
    }

    #[test]
    fn test_wrong_shape_fails_to_load() {
        let file = write_config(".yaml", "sync:\n  max_pages: lots\n");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert_eq!(*err, ErrorKind::Load);
    }

    #[rstest]
    #[case("default_locale: ''\n")]
    #[case("locales:\n  - code: ''\n")]
    #[case("locales:\n  - code: tlh\n  - code: tlh\n")]
    #[case("locales:\n  - code: a\n    fallback: b\n  - code: b\n    fallback: a\n")]
    fn test_invalid_locale_graph(#[case] contents: &str) {
        let file = write_config(".yaml", contents);
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)), "{err:?}");
    }
}
