use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// The `sys.type` tag of an identifiable resource.
///
/// `Array` and `Link` also appear as `sys.type` values on the wire, but they
/// are envelopes and placeholders rather than resources, so they are not
/// represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Entry,
    Asset,
    ContentType,
    Space,
    Locale,
    /// A server-reported failure to include a linked resource (`"error"`).
    ArrayError,
    DeletedEntry,
    DeletedAsset,
}
impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Asset => "Asset",
            Self::ContentType => "ContentType",
            Self::Space => "Space",
            Self::Locale => "Locale",
            Self::ArrayError => "error",
            Self::DeletedEntry => "DeletedEntry",
            Self::DeletedAsset => "DeletedAsset",
        }
    }

    /// The resource type a delete marker removes, if this is a delete marker.
    ///
    /// ```
    /// use weft_model::ResourceType;
    /// assert_eq!(ResourceType::DeletedAsset.deletion_target(), Some(ResourceType::Asset));
    /// assert_eq!(ResourceType::Entry.deletion_target(), None);
    /// ```
    pub fn deletion_target(&self) -> Option<ResourceType> {
        match self {
            Self::DeletedEntry => Some(Self::Entry),
            Self::DeletedAsset => Some(Self::Asset),
            _ => None,
        }
    }
}
impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
impl FromStr for ResourceType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Entry" => Self::Entry,
            "Asset" => Self::Asset,
            "ContentType" => Self::ContentType,
            "Space" => Self::Space,
            "Locale" => Self::Locale,
            "error" | "Error" => Self::ArrayError,
            "DeletedEntry" => Self::DeletedEntry,
            "DeletedAsset" => Self::DeletedAsset,
            other => exn::bail!(ErrorKind::UnknownType(other.to_string())),
        })
    }
}

/// The `(type, id)` pair every registered resource is reachable by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub kind: ResourceType,
    pub id: String,
}
impl ResourceKey {
    pub fn new(kind: ResourceType, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}
impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
impl<S: Into<String>> From<(ResourceType, S)> for ResourceKey {
    fn from((kind, id): (ResourceType, S)) -> Self {
        Self::new(kind, id)
    }
}
