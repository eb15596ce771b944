use crate::error::{ErrorKind, Result};
use crate::kind::{ResourceKey, ResourceType};
use exn::OptionExt;
use serde_json::Value;

/// A link placeholder found in raw field data:
/// `{"sys": {"type": "Link", "linkType": "Entry", "id": "..."}}`.
///
/// Links are transient. The resolver replaces every one it finds with a
/// [`Handle`](crate::Handle) into the resource graph (or drops it), so a
/// `Link` never survives into decoded output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub link_type: ResourceType,
    pub id: String,
}
impl Link {
    /// Inspects a raw value for a link marker.
    ///
    /// Returns `None` when the value is not a link at all, and `Some(Err(_))`
    /// when it is tagged as a link but doesn't say what it points to.
    ///
    /// ```
    /// use serde_json::json;
    /// use weft_model::{Link, ResourceType};
    ///
    /// let raw = json!({"sys": {"type": "Link", "linkType": "Asset", "id": "logo"}});
    /// let link = Link::detect(&raw).unwrap().unwrap();
    /// assert_eq!(link.link_type, ResourceType::Asset);
    /// assert!(Link::detect(&json!({"title": "not a link"})).is_none());
    /// ```
    pub fn detect(value: &Value) -> Option<Result<Link>> {
        let sys = value.as_object()?.get("sys")?.as_object()?;
        if sys.get("type").and_then(Value::as_str) != Some("Link") {
            return None;
        }
        Some(Self::from_sys(sys))
    }

    fn from_sys(sys: &serde_json::Map<String, Value>) -> Result<Link> {
        let link_type = sys
            .get("linkType")
            .and_then(Value::as_str)
            .ok_or_raise(|| ErrorKind::MalformedPayload("sys.linkType"))?
            .parse::<ResourceType>()?;
        let id = sys
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_raise(|| ErrorKind::MalformedPayload("sys.id"))?;
        Ok(Link { link_type, id: id.to_string() })
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.link_type, self.id.clone())
    }
}
