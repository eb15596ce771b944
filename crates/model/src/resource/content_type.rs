use super::Identifiable;
use crate::error::{ErrorKind, Result};
use crate::sys::Sys;
use exn::ResultExt;
use serde::Deserialize;
use serde_json::Value;

/// The schema entries of one kind are validated and interpreted against.
///
/// Content types are referenced by entries; they never embed entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentType {
    pub sys: Sys,
    pub name: Option<String>,
    pub description: Option<String>,
    /// ID of the field used as the entry's title in listings.
    pub display_field: Option<String>,
    pub fields: Vec<ContentTypeField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeField {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// `Symbol`, `Text`, `Integer`, `Number`, `Date`, `Boolean`, `Object`,
    /// `Location`, `Link` or `Array`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Target type for `Link` fields.
    #[serde(default)]
    pub link_type: Option<String>,
    /// Element schema for `Array` fields.
    #[serde(default)]
    pub items: Option<FieldItems>,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub omitted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldItems {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub link_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Body {
    name: Option<String>,
    description: Option<String>,
    display_field: Option<String>,
    #[serde(default)]
    fields: Vec<ContentTypeField>,
}

impl ContentType {
    pub fn from_node(sys: Sys, node: &Value) -> Result<Self> {
        let body = Body::deserialize(node).or_raise(|| ErrorKind::MalformedPayload("ContentType"))?;
        Ok(Self {
            sys,
            name: body.name,
            description: body.description,
            display_field: body.display_field,
            fields: body.fields,
        })
    }

    pub fn field(&self, id: &str) -> Option<&ContentTypeField> {
        self.fields.iter().find(|field| field.id == id)
    }

    /// Returns `true` when the field holds links (directly or as an array).
    pub fn is_link_field(&self, id: &str) -> bool {
        self.field(id).is_some_and(|field| {
            field.kind == "Link" || field.items.as_ref().is_some_and(|items| items.kind == "Link")
        })
    }
}
impl Identifiable for ContentType {
    fn sys(&self) -> &Sys {
        &self.sys
    }
}
