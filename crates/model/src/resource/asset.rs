use super::{Identifiable, LocalizedFields, Localized};
use crate::projection::LocaleChain;
use crate::sys::Sys;
use crate::value::FieldValue;

/// A binary asset (image, document, video) and its per-locale metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub sys: Sys,
    pub fields: LocalizedFields,
}

/// Projected `file` metadata of an [`Asset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub url: String,
    pub file_name: Option<String>,
    /// MIME type.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    pub image: Option<ImageDimensions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u64,
    pub height: u64,
}

impl Asset {
    pub fn new(sys: Sys) -> Self {
        Self { sys, fields: LocalizedFields::new() }
    }

    pub fn title(&self, chain: &LocaleChain) -> Option<&str> {
        self.field("title", chain).and_then(FieldValue::as_str)
    }

    pub fn description(&self, chain: &LocaleChain) -> Option<&str> {
        self.field("description", chain).and_then(FieldValue::as_str)
    }

    /// The asset's file metadata under `chain`. `None` when no `file` value
    /// is visible or it has no `url` (e.g. an upload that was never
    /// processed).
    pub fn file(&self, chain: &LocaleChain) -> Option<AssetFile> {
        let file = self.field("file", chain)?;
        let url = file.get("url").and_then(FieldValue::as_str)?;
        let details = file.get("details");
        let image = details.and_then(|d| d.get("image")).and_then(|image| {
            Some(ImageDimensions {
                width: image.get("width")?.as_u64()?,
                height: image.get("height")?.as_u64()?,
            })
        });
        Some(AssetFile {
            url: url.to_string(),
            file_name: file.get("fileName").and_then(FieldValue::as_str).map(str::to_string),
            content_type: file.get("contentType").and_then(FieldValue::as_str).map(str::to_string),
            size: details.and_then(|d| d.get("size")).and_then(FieldValue::as_u64),
            image,
        })
    }
}
impl Identifiable for Asset {
    fn sys(&self) -> &Sys {
        &self.sys
    }
}
impl Localized for Asset {
    fn raw_fields(&self) -> &LocalizedFields {
        &self.fields
    }
}
