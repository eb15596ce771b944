use crate::error::{ErrorKind, Result};
use crate::kind::{ResourceKey, ResourceType};
use exn::ResultExt;
use serde::Deserialize;
use serde_json::Value;

/// A server-reported reason a linked resource could not be included, e.g.
/// because the target is unpublished.
///
/// Array errors are surfaced on the decoded array; they never take part in
/// the resource graph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArrayError {
    /// `sys.id` of the error, e.g. `notResolvable`.
    #[serde(rename = "sys", deserialize_with = "sys_id")]
    pub id: String,
    pub details: ErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    /// What failed to resolve; `Link` for unresolvable links.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

fn sys_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    struct ErrorSys {
        #[serde(default)]
        id: String,
    }
    Ok(ErrorSys::deserialize(deserializer)?.id)
}

impl ArrayError {
    pub fn from_node(node: &Value) -> Result<Self> {
        Self::deserialize(node).or_raise(|| ErrorKind::MalformedPayload("errors"))
    }

    /// The resource this error says is unavailable, when it describes a link
    /// to a modelled resource type.
    pub fn link_key(&self) -> Option<ResourceKey> {
        if self.details.kind != "Link" {
            return None;
        }
        let link_type = self.details.link_type.as_deref()?.parse::<ResourceType>().ok()?;
        Some(ResourceKey::new(link_type, self.details.id.clone()?))
    }
}
