//! Resource model for content delivery payloads.
//!
//! Everything a decoded response page is made of lives here: the identifying
//! [`Sys`] block every resource carries, the closed [`Resource`] variant over
//! the payload kinds (entries, assets, content types, locales, spaces and
//! deletion markers), the [`FieldValue`] union fields are resolved into, and
//! the locale projection that picks one effective value per field.
//!
//! Link resolution and array assembly are not performed here; see the
//! `weft-decode` crate. This crate only defines the shapes they produce.

pub mod error;
mod kind;
mod link;
mod projection;
pub mod resource;
mod sys;
mod value;

pub use crate::kind::{ResourceKey, ResourceType};
pub use crate::link::Link;
pub use crate::projection::{DEFAULT_LOCALE, LocaleChain, LocaleSpace, Projection, project, project_field};
pub use crate::resource::{Identifiable, Localized, Resource};
pub use crate::sys::Sys;
pub use crate::value::{FieldValue, Handle, Scalar};
