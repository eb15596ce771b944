//! Resource payload types.
//!
//! [`Resource`] is a closed variant over everything a page can register in
//! its graph. Capabilities shared between variants are traits rather than a
//! hierarchy: every resource is [`Identifiable`], and entries and assets are
//! independently [`Localized`].

mod array_error;
mod asset;
mod content_type;
mod deleted;
mod entry;
mod locale;
mod space;

pub use self::array_error::{ArrayError, ErrorDetails};
pub use self::asset::{Asset, AssetFile, ImageDimensions};
pub use self::content_type::{ContentType, ContentTypeField, FieldItems};
pub use self::deleted::Deleted;
pub use self::entry::Entry;
pub use self::locale::{Locale, LocaleInfo};
pub use self::space::Space;
use crate::kind::{ResourceKey, ResourceType};
use crate::projection::{LocaleChain, Projection, project, project_field};
use crate::sys::Sys;
use crate::value::{FieldValue, Handle};
use std::collections::BTreeMap;

/// Field name to value, for one locale.
pub type FieldMap = BTreeMap<String, FieldValue>;
/// Locale code to [`FieldMap`]; the unprojected store of a localized resource.
pub type LocalizedFields = BTreeMap<String, FieldMap>;

/// Anything addressable by `(type, id)`.
pub trait Identifiable {
    fn sys(&self) -> &Sys;

    fn id(&self) -> &str {
        &self.sys().id
    }

    fn kind(&self) -> ResourceType {
        self.sys().kind
    }

    fn key(&self) -> ResourceKey {
        self.sys().key()
    }
}

/// A resource whose fields are stored per locale and read through a
/// [`LocaleChain`].
pub trait Localized: Identifiable {
    /// The unprojected `locale → field → value` store, for diagnostics.
    fn raw_fields(&self) -> &LocalizedFields;

    /// The single locale the payload was transmitted in, if it was
    /// transmitted for one locale only.
    fn locale(&self) -> Option<&str> {
        self.sys().locale.as_deref()
    }

    /// Every field's effective value under `chain`. See [`project`].
    fn project(&self, chain: &LocaleChain) -> Projection<'_> {
        project(self.raw_fields(), self.locale(), chain)
    }

    /// One field's effective value under `chain`. See [`project_field`].
    fn field(&self, name: &str, chain: &LocaleChain) -> Option<&FieldValue> {
        project_field(self.raw_fields(), self.locale(), chain, name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Entry(Entry),
    Asset(Asset),
    ContentType(ContentType),
    Locale(Locale),
    Space(Space),
    Deleted(Deleted),
}
impl Resource {
    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Self::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn as_content_type(&self) -> Option<&ContentType> {
        match self {
            Self::ContentType(content_type) => Some(content_type),
            _ => None,
        }
    }

    pub fn as_locale(&self) -> Option<&Locale> {
        match self {
            Self::Locale(locale) => Some(locale),
            _ => None,
        }
    }

    pub fn as_localized(&self) -> Option<&dyn Localized> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    /// Rewrites every handle this resource holds through `f`, as described
    /// by [`FieldValue::relink`]. An entry whose content type maps to `None`
    /// keeps its content type ID but loses the handle.
    pub fn relink(&mut self, f: &mut impl FnMut(Handle) -> Option<Handle>) {
        let fields = match self {
            Self::Entry(entry) => {
                entry.content_type = entry.content_type.and_then(&mut *f);
                &mut entry.fields
            },
            Self::Asset(asset) => &mut asset.fields,
            Self::ContentType(_) | Self::Locale(_) | Self::Space(_) | Self::Deleted(_) => return,
        };
        for value in fields.values_mut().flat_map(|map| map.values_mut()) {
            value.relink(f);
        }
    }
}
impl Identifiable for Resource {
    fn sys(&self) -> &Sys {
        match self {
            Self::Entry(entry) => entry.sys(),
            Self::Asset(asset) => asset.sys(),
            Self::ContentType(content_type) => content_type.sys(),
            Self::Locale(locale) => locale.sys(),
            Self::Space(space) => space.sys(),
            Self::Deleted(deleted) => deleted.sys(),
        }
    }
}
impl From<Entry> for Resource {
    fn from(entry: Entry) -> Self {
        Self::Entry(entry)
    }
}
impl From<Asset> for Resource {
    fn from(asset: Asset) -> Self {
        Self::Asset(asset)
    }
}
impl From<ContentType> for Resource {
    fn from(content_type: ContentType) -> Self {
        Self::ContentType(content_type)
    }
}
impl From<Locale> for Resource {
    fn from(locale: Locale) -> Self {
        Self::Locale(locale)
    }
}
impl From<Space> for Resource {
    fn from(space: Space) -> Self {
        Self::Space(space)
    }
}
impl From<Deleted> for Resource {
    fn from(deleted: Deleted) -> Self {
        Self::Deleted(deleted)
    }
}
