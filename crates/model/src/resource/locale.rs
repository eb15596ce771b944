use super::Identifiable;
use crate::error::{ErrorKind, Result};
use crate::sys::Sys;
use exn::ResultExt;
use serde::Deserialize;
use serde_json::Value;

/// A locale enabled in a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub sys: Sys,
    pub info: LocaleInfo,
}

/// Locale definition as it appears both in locale resources and in the
/// `locales` list of a space.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleInfo {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Exactly one locale of a space is the default.
    #[serde(default)]
    pub default: bool,
    /// Locale to read from when this one has no value for a field.
    #[serde(default)]
    pub fallback_code: Option<String>,
}
impl LocaleInfo {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into(), name: None, default: false, fallback_code: None }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_code = Some(fallback.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }
}

impl Locale {
    pub fn from_node(sys: Sys, node: &Value) -> Result<Self> {
        let info = LocaleInfo::deserialize(node).or_raise(|| ErrorKind::MalformedPayload("Locale"))?;
        Ok(Self { sys, info })
    }

    pub fn code(&self) -> &str {
        &self.info.code
    }
}
impl Identifiable for Locale {
    fn sys(&self) -> &Sys {
        &self.sys
    }
}
