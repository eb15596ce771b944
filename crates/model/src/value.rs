use serde_json::Number;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Identity of a resource inside one resource graph.
///
/// Handles are only meaningful for the graph that issued them. Two fields
/// referencing the same resource hold equal handles, which is what makes
/// cycles (`a.bestFriend.bestFriend == a`) cheap to express and to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);
impl Handle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

/// A resolved field value.
///
/// The variant is decided once, while decoding; nothing downstream inspects
/// the raw JSON shape again.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// An explicit `null`, or a single link that could not be resolved.
    Null,
    Scalar(Scalar),
    Sequence(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
    /// A single resolved link.
    Link(Handle),
    /// An array of resolved links. May be shorter than the raw payload's
    /// array: inaccessible targets are omitted rather than nulled.
    Links(Vec<Handle>),
}
impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar(Scalar::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Scalar(Scalar::Number(n)) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Parses a string value as an RFC 3339 timestamp.
    pub fn as_datetime(&self) -> Option<OffsetDateTime> {
        self.as_str().and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
    }

    pub fn as_sequence(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Sequence(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key of a [`Map`](Self::Map) value.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    pub fn as_link(&self) -> Option<Handle> {
        match self {
            Self::Link(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_links(&self) -> Option<&[Handle]> {
        match self {
            Self::Links(handles) => Some(handles),
            _ => None,
        }
    }

    /// Rewrites every handle in this value (recursively) through `f`.
    ///
    /// A single link mapped to `None` becomes [`Null`](Self::Null); elements
    /// of a link array mapped to `None` are removed from the array.
    pub fn relink(&mut self, f: &mut impl FnMut(Handle) -> Option<Handle>) {
        match self {
            Self::Link(handle) => match f(*handle) {
                Some(target) => *handle = target,
                None => *self = Self::Null,
            },
            Self::Links(handles) => *handles = handles.iter().filter_map(|h| f(*h)).collect(),
            Self::Sequence(values) => values.iter_mut().for_each(|v| v.relink(f)),
            Self::Map(map) => map.values_mut().for_each(|v| v.relink(f)),
            Self::Null | Self::Scalar(_) => {},
        }
    }
}
impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::String(value.to_string()))
    }
}
impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::String(value))
    }
}
impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}
impl From<Number> for FieldValue {
    fn from(value: Number) -> Self {
        Self::Scalar(Scalar::Number(value))
    }
}
impl From<Handle> for FieldValue {
    fn from(handle: Handle) -> Self {
        Self::Link(handle)
    }
}
