use crate::error::{ErrorKind, Result};
use crate::kind::{ResourceKey, ResourceType};
use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// System metadata carried by every resource under its `sys` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sys {
    pub id: String,
    pub kind: ResourceType,
    /// Present when the payload was transmitted for exactly one locale; its
    /// `fields` are then `name → value` rather than `name → locale → value`.
    pub locale: Option<String>,
    pub revision: Option<u64>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    /// ID of the space the resource belongs to.
    pub space: Option<String>,
    /// ID of an entry's content type.
    pub content_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSys {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    locale: Option<String>,
    revision: Option<u64>,
    created_at: Option<String>,
    updated_at: Option<String>,
    space: Option<RawLink>,
    content_type: Option<RawLink>,
}

#[derive(Deserialize)]
struct RawLink {
    sys: RawLinkSys,
}

#[derive(Deserialize)]
struct RawLinkSys {
    id: Option<String>,
}

impl Sys {
    pub fn new(kind: ResourceType, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            locale: None,
            revision: None,
            created_at: None,
            updated_at: None,
            space: None,
            content_type: None,
        }
    }

    /// Reads the `sys` block of a raw resource node.
    ///
    /// A missing `sys`, `sys.id` or `sys.type` is a malformed payload. A type
    /// that isn't modelled raises [`ErrorKind::UnknownType`] so callers can
    /// choose to skip the node instead of failing.
    pub fn from_node(node: &Value) -> Result<Self> {
        let sys = node.get("sys").ok_or_raise(|| ErrorKind::MalformedPayload("sys"))?;
        let raw = RawSys::deserialize(sys).or_raise(|| ErrorKind::MalformedPayload("sys"))?;
        let id = raw.id.filter(|id| !id.is_empty()).ok_or_raise(|| ErrorKind::MalformedPayload("sys.id"))?;
        let kind = raw.kind.ok_or_raise(|| ErrorKind::MalformedPayload("sys.type"))?.parse::<ResourceType>()?;
        Ok(Self {
            id,
            kind,
            locale: raw.locale,
            revision: raw.revision,
            created_at: timestamp(raw.created_at, "sys.createdAt")?,
            updated_at: timestamp(raw.updated_at, "sys.updatedAt")?,
            space: raw.space.and_then(|link| link.sys.id),
            content_type: raw.content_type.and_then(|link| link.sys.id),
        })
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind, self.id.clone())
    }
}

fn timestamp(value: Option<String>, field: &'static str) -> Result<Option<OffsetDateTime>> {
    value
        .map(|s| OffsetDateTime::parse(&s, &Rfc3339).or_raise(|| ErrorKind::MalformedPayload(field)))
        .transpose()
}
