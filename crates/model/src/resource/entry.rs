use super::{Identifiable, LocalizedFields, Localized};
use crate::sys::Sys;
use crate::value::Handle;

/// A content entry: an instance of a [`ContentType`](super::ContentType).
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub sys: Sys,
    /// The entry's content type, when it is part of the same graph.
    pub content_type: Option<Handle>,
    pub fields: LocalizedFields,
}
impl Entry {
    pub fn new(sys: Sys) -> Self {
        Self { sys, content_type: None, fields: LocalizedFields::new() }
    }

    /// ID of the entry's content type; known even when the content type
    /// itself was never transmitted.
    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.content_type.as_deref()
    }
}
impl Identifiable for Entry {
    fn sys(&self) -> &Sys {
        &self.sys
    }
}
impl Localized for Entry {
    fn raw_fields(&self) -> &LocalizedFields {
        &self.fields
    }
}
