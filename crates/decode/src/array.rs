//! Array assembly: one raw page in, one [`ResourceArray`] out.

use crate::error::{ErrorKind, Result};
use crate::registry::Registry;
use crate::resolve::Resolver;
use exn::{OptionExt, ResultExt};
use serde_json::Value;
use std::collections::HashSet;
use tracing::instrument;
use weft_model::resource::{ArrayError, Asset, ContentType, Entry};
use weft_model::{FieldValue, Handle, Resource, ResourceKey, ResourceType};

/// The decoded result of one page.
///
/// `items` are the page's direct hits only. Resources that were transmitted
/// solely because something links to them (`includes`) are reachable through
/// links and through the [`entries`](Self::entries)/[`assets`](Self::assets)
/// views, but never appear in `items`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceArray {
    registry: Registry,
    items: Vec<Handle>,
    errors: Vec<ArrayError>,
    skip: u64,
    limit: u64,
    total: u64,
}
impl ResourceArray {
    /// Builds an array over an already-populated registry. `total` defaults
    /// to the number of items; see [`with_pagination`](Self::with_pagination).
    pub fn new(registry: Registry, items: Vec<Handle>) -> Self {
        let total = u64::try_from(items.len()).unwrap_or(u64::MAX);
        Self { registry, items, errors: Vec::new(), skip: 0, limit: 0, total }
    }

    pub fn with_pagination(mut self, skip: u64, limit: u64, total: u64) -> Self {
        self.skip = skip;
        self.limit = limit;
        self.total = total;
        self
    }

    pub fn with_errors(mut self, errors: Vec<ArrayError>) -> Self {
        self.errors = errors;
        self
    }

    /// Handles of the page's top-level resources, in payload order.
    pub fn items(&self) -> &[Handle] {
        &self.items
    }

    /// The resources behind [`items`](Self::items).
    pub fn item_resources(&self) -> impl Iterator<Item = &Resource> {
        self.items.iter().filter_map(|handle| self.registry.get(*handle))
    }

    pub fn get(&self, handle: Handle) -> Option<&Resource> {
        self.registry.get(handle)
    }

    /// Follows a [`Link`](FieldValue::Link) value to its resource.
    pub fn follow(&self, value: &FieldValue) -> Option<&Resource> {
        self.get(value.as_link()?)
    }

    /// Follows every handle of a [`Links`](FieldValue::Links) value.
    pub fn follow_all(&self, value: &FieldValue) -> Vec<&Resource> {
        value.as_links().unwrap_or_default().iter().filter_map(|handle| self.get(*handle)).collect()
    }

    pub fn lookup(&self, kind: ResourceType, id: &str) -> Option<Handle> {
        self.registry.lookup(kind, id)
    }

    /// Every entry of the page, items and includes alike.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.registry.iter().filter_map(|(_, resource)| resource.as_entry())
    }

    /// Every asset of the page, items and includes alike.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.registry.iter().filter_map(|(_, resource)| resource.as_asset())
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.get(self.lookup(ResourceType::Entry, id)?)?.as_entry()
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.get(self.lookup(ResourceType::Asset, id)?)?.as_asset()
    }

    /// The content type of `entry`, if it was part of the same graph.
    pub fn content_type_of(&self, entry: &Entry) -> Option<&ContentType> {
        self.get(entry.content_type?)?.as_content_type()
    }

    /// The single top-level item of type `kind` with the given `id`.
    ///
    /// Unlike every other lookup, absence here is an error: the caller asked
    /// for exactly one named resource.
    pub fn one(&self, kind: ResourceType, id: &str) -> Result<Handle> {
        self.lookup(kind, id)
            .filter(|handle| self.items.contains(handle))
            .ok_or_raise(|| ErrorKind::NotFound { id: id.to_string(), kind })
    }

    pub fn errors(&self) -> &[ArrayError] {
        &self.errors
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Server-reported number of matches across all pages.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Raw page sections, borrowed from the parsed document.
pub(crate) struct Page<'a> {
    pub items: &'a [Value],
    pub includes: Vec<&'a Value>,
    pub errors: Vec<ArrayError>,
}
impl<'a> Page<'a> {
    /// Splits a raw page into its sections, validating their shapes.
    pub fn parse(page: &'a Value) -> Result<Self> {
        let page = page.as_object().ok_or_raise(|| ErrorKind::MalformedPayload("page"))?;
        if let Some(kind) = page.get("sys").and_then(|sys| sys.get("type")) {
            if kind.as_str() != Some("Array") {
                exn::bail!(ErrorKind::MalformedPayload("sys.type"));
            }
        }
        let items = match page.get("items") {
            Some(items) => items.as_array().ok_or_raise(|| ErrorKind::MalformedPayload("items"))?.as_slice(),
            None => &[],
        };
        let mut includes = Vec::new();
        if let Some(sections) = page.get("includes") {
            let sections = sections.as_object().ok_or_raise(|| ErrorKind::MalformedPayload("includes"))?;
            for section in sections.values() {
                includes.extend(section.as_array().ok_or_raise(|| ErrorKind::MalformedPayload("includes"))?);
            }
        }
        let errors = match page.get("errors") {
            Some(errors) => errors
                .as_array()
                .ok_or_raise(|| ErrorKind::MalformedPayload("errors"))?
                .iter()
                .map(|node| ArrayError::from_node(node).or_raise(|| ErrorKind::MalformedPayload("errors")))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(Self { items, includes, errors })
    }

    /// Keys the server reported as unresolvable links.
    pub fn unavailable(&self) -> HashSet<ResourceKey> {
        self.errors.iter().filter_map(ArrayError::link_key).collect()
    }
}

fn pagination(page: &Value, field: &'static str) -> Result<Option<u64>> {
    match page.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_raise(|| ErrorKind::MalformedPayload(field)),
    }
}

/// Decodes one raw page into a [`ResourceArray`].
///
/// Errors are read first so the resolver can drop links the server reported
/// as unresolvable; then every `items` and `includes` node is resolved into a
/// fresh registry, and finally links to targets that never arrived are
/// nulled. Only a page violating the transport contract fails.
///
/// Missing `skip`/`limit` default to zero and a missing `total` to the number
/// of items (sync pages carry none of them).
#[instrument(skip(page), fields(items, includes, errors, total))]
pub fn decode(page: &Value) -> Result<ResourceArray> {
    let parsed = Page::parse(page)?;
    let unavailable = parsed.unavailable();
    let mut registry = Registry::new();
    registry.begin_pass();
    let mut resolver = Resolver::new(&mut registry, &unavailable);
    let mut items = Vec::with_capacity(parsed.items.len());
    for node in parsed.items {
        if let Some(handle) = resolver.resolve(node).or_raise(|| ErrorKind::MalformedPayload("items"))? {
            items.push(handle);
        }
    }
    for node in &parsed.includes {
        resolver.resolve(node).or_raise(|| ErrorKind::MalformedPayload("includes"))?;
    }
    registry.seal();

    let skip = pagination(page, "skip")?.unwrap_or(0);
    let limit = pagination(page, "limit")?.unwrap_or(0);
    let total = pagination(page, "total")?.unwrap_or(u64::try_from(items.len()).unwrap_or(u64::MAX));
    let span = tracing::Span::current();
    span.record("items", items.len());
    span.record("includes", parsed.includes.len());
    span.record("errors", parsed.errors.len());
    span.record("total", total);
    Ok(ResourceArray::new(registry, items).with_pagination(skip, limit, total).with_errors(parsed.errors))
}

/// Decodes a page that was requested for exactly one resource, returning
/// the decoded array and the handle of that resource.
///
/// Raises [`ErrorKind::NotFound`] when the page's items don't contain it.
#[instrument(skip(page))]
pub fn fetch_one(page: &Value, kind: ResourceType, id: &str) -> Result<(ResourceArray, Handle)> {
    let array = decode(page)?;
    let handle = array.one(kind, id)?;
    Ok((array, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use weft_model::{Identifiable, LocaleChain, LocaleSpace, Localized};

    fn link(kind: &str, id: &str) -> Value {
        json!({"sys": {"type": "Link", "linkType": kind, "id": id}})
    }

    fn cat(id: &str, name: &str, best_friend: &str) -> Value {
        json!({
            "sys": {
                "type": "Entry", "id": id, "locale": "en-US",
                "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "cat"}}
            },
            "fields": {"name": name, "bestFriend": link("Entry", best_friend), "image": link("Asset", id)}
        })
    }

    fn image(id: &str) -> Value {
        json!({
            "sys": {"type": "Asset", "id": id, "locale": "en-US"},
            "fields": {"title": id, "file": {"url": format!("//images.example.net/{id}.png")}}
        })
    }

    fn cats_page() -> Value {
        json!({
            "sys": {"type": "Array"},
            "skip": 0, "limit": 1, "total": 3,
            "items": [cat("nyancat", "Nyan Cat", "happycat")],
            "includes": {
                "Entry": [cat("happycat", "Happy Cat", "nyancat")],
                "Asset": [image("nyancat"), image("happycat")]
            }
        })
    }

    #[test]
    fn test_cycle_resolves_to_same_handles() {
        let array = decode(&cats_page()).unwrap();
        let chain = LocaleChain::default();
        let nyancat = array.one(ResourceType::Entry, "nyancat").unwrap();
        let happycat = array.lookup(ResourceType::Entry, "happycat").unwrap();

        let friend = array.get(nyancat).unwrap().as_entry().unwrap().field("bestFriend", &chain).unwrap();
        assert_eq!(friend.as_link(), Some(happycat));
        let back = array.follow(friend).unwrap().as_entry().unwrap().field("bestFriend", &chain).unwrap();
        assert_eq!(back.as_link(), Some(nyancat));
    }

    #[test]
    fn test_items_exclude_includes() {
        let array = decode(&cats_page()).unwrap();
        assert_eq!(array.items().len(), 1);
        assert_eq!(array.item_resources().map(Identifiable::id).collect::<Vec<_>>(), ["nyancat"]);
        assert_eq!(array.entries().map(Identifiable::id).collect::<Vec<_>>(), ["nyancat", "happycat"]);
        assert_eq!(array.assets().count(), 2);
        assert!(array.asset("happycat").is_some());
    }

    #[test]
    fn test_pagination_passthrough() {
        let array = decode(&cats_page()).unwrap();
        assert_eq!((array.skip(), array.limit(), array.total()), (0, 1, 3));

        let bare = decode(&json!({"items": [image("a"), image("b")]})).unwrap();
        assert_eq!((bare.skip(), bare.limit(), bare.total()), (0, 0, 2));
    }

    #[test]
    fn test_unresolved_link_is_absent() {
        let page = json!({"items": [cat("nyancat", "Nyan Cat", "grumpycat")]});
        let array = decode(&page).unwrap();
        let entry = array.entry("nyancat").unwrap();
        let chain = LocaleChain::default();
        assert!(entry.field("bestFriend", &chain).is_none());
        assert!(entry.field("image", &chain).is_none());
        assert_eq!(entry.field("name", &chain).and_then(FieldValue::as_str), Some("Nyan Cat"));
        // The content type never arrived either.
        assert_eq!(entry.content_type, None);
        assert!(array.content_type_of(entry).is_none());
    }

    #[test]
    fn test_error_flagged_link_dropped_and_reported() {
        let friends = json!({
            "sys": {"type": "Entry", "id": "friends", "locale": "en-US"},
            "fields": {"members": [link("Entry", "happycat"), link("Entry", "nyancat")]}
        });
        let page = json!({
            "items": [cat("nyancat", "Nyan Cat", "happycat"), friends],
            "includes": {"Entry": [cat("happycat", "Happy Cat", "nyancat")]},
            "errors": [{
                "sys": {"id": "notResolvable", "type": "error"},
                "details": {"type": "Link", "linkType": "Entry", "id": "happycat"}
            }]
        });
        let array = decode(&page).unwrap();
        let chain = LocaleChain::default();
        let entry = array.entry("nyancat").unwrap();
        assert!(entry.field("bestFriend", &chain).is_none());

        let nyancat = array.lookup(ResourceType::Entry, "nyancat").unwrap();
        let members = array.entry("friends").unwrap().field("members", &chain);
        assert_eq!(members, Some(&FieldValue::Links(vec![nyancat])));

        assert_eq!(array.errors().len(), 1);
        let error = &array.errors()[0];
        assert_eq!(error.id, "notResolvable");
        assert_eq!(error.details.kind, "Link");
        assert_eq!(error.details.link_type.as_deref(), Some("Entry"));
        assert_eq!(error.details.id.as_deref(), Some("happycat"));
    }

    #[test]
    fn test_error_record_among_items_is_skipped() {
        let page = json!({
            "items": [image("nyancat"), {"sys": {"type": "error", "id": "notResolvable"}}],
            "includes": {"Entry": [{"sys": {"type": "Tag", "id": "cats"}}]}
        });
        let array = decode(&page).unwrap();
        assert_eq!(array.item_resources().map(Identifiable::id).collect::<Vec<_>>(), ["nyancat"]);
        assert!(array.errors().is_empty());
    }

    #[test]
    fn test_entry_without_fields() {
        let page = json!({"items": [{"sys": {"type": "Entry", "id": "entryNoFields", "locale": "en-US"}}]});
        let array = decode(&page).unwrap();
        let entry = array.entry("entryNoFields").unwrap();
        assert!(entry.project(&LocaleChain::default()).is_empty());
    }

    #[test]
    fn test_link_arrays_and_ordering() {
        let page = json!({
            "items": [{
                "sys": {"type": "Entry", "id": "gallery", "locale": "en-US"},
                "fields": {
                    "images": [link("Asset", "one"), link("Asset", "two")],
                    "related": [link("Entry", "first"), link("Entry", "second")]
                }
            }],
            "includes": {
                "Entry": [
                    {"sys": {"type": "Entry", "id": "first", "locale": "en-US"}, "fields": {}},
                    {"sys": {"type": "Entry", "id": "second", "locale": "en-US"}, "fields": {}}
                ],
                "Asset": [image("one"), image("two")]
            }
        });
        let array = decode(&page).unwrap();
        let chain = LocaleChain::default();
        let gallery = array.entry("gallery").unwrap();
        let images = array.follow_all(gallery.field("images", &chain).unwrap());
        assert_eq!(images.iter().map(|r| r.id()).collect::<Vec<_>>(), ["one", "two"]);
        assert_eq!(array.assets().count(), 2);
        assert_eq!(array.entries().map(Identifiable::id).collect::<Vec<_>>(), ["gallery", "first", "second"]);
        assert_eq!(array.asset("two").unwrap().title(&chain), Some("two"));
    }

    #[test]
    fn test_fetch_one_not_found() {
        let err = fetch_one(&json!({"items": []}), ResourceType::Entry, "foo").unwrap_err();
        assert_eq!(err.to_string(), "Could not find id 'foo' of type 'Entry'.");

        // Present only as an include is still not found.
        let err = fetch_one(&cats_page(), ResourceType::Entry, "happycat").unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound { id, .. } if id == "happycat"));

        let (array, handle) = fetch_one(&cats_page(), ResourceType::Entry, "nyancat").unwrap();
        assert_eq!(array.get(handle).unwrap().id(), "nyancat");
    }

    #[test]
    fn test_content_type_linked() {
        let mut page = cats_page();
        page["includes"]["ContentType"] = json!([{
            "sys": {"type": "ContentType", "id": "cat"},
            "name": "Cat",
            "displayField": "name",
            "fields": [{"id": "name", "name": "Name", "type": "Text"}]
        }]);
        let array = decode(&page).unwrap();
        let entry = array.entry("nyancat").unwrap();
        let content_type = array.content_type_of(entry).unwrap();
        assert_eq!(content_type.name.as_deref(), Some("Cat"));
        assert_eq!(content_type.display_field.as_deref(), Some("name"));
    }

    #[rstest]
    #[case(json!([]), "page")]
    #[case(json!({"sys": {"type": "Entry"}, "items": []}), "sys.type")]
    #[case(json!({"items": {}}), "items")]
    #[case(json!({"items": [], "includes": []}), "includes")]
    #[case(json!({"items": [], "includes": {"Entry": {}}}), "includes")]
    #[case(json!({"items": [], "errors": {}}), "errors")]
    #[case(json!({"items": [], "total": "many"}), "total")]
    #[case(json!({"items": [{"sys": {"type": "Entry"}}]}), "items")]
    fn test_malformed_pages(#[case] page: Value, #[case] section: &str) {
        let err = decode(&page).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedPayload(s) if *s == section), "{err}");
    }

    #[test]
    fn test_locales_page_builds_locale_space() {
        let page = json!({
            "sys": {"type": "Array"},
            "total": 2, "skip": 0, "limit": 1000,
            "items": [
                {"sys": {"type": "Locale", "id": "1"}, "code": "en-US", "name": "English", "default": true},
                {"sys": {"type": "Locale", "id": "2"}, "code": "tlh", "name": "Klingon", "fallbackCode": "en-US"}
            ]
        });
        let array = decode(&page).unwrap();
        let locales: Vec<_> = array.item_resources().filter_map(Resource::as_locale).map(|l| &l.info).collect();
        let space = LocaleSpace::from_locales(locales);
        assert_eq!(space.default_locale(), "en-US");

        let nyancat = decode(&json!({"items": [{
            "sys": {"type": "Asset", "id": "nyancat"},
            "fields": {"title": {"en-US": "Nyan Cat"}}
        }]}))
        .unwrap();
        let localized = nyancat.item_resources().next().and_then(Resource::as_localized).unwrap();
        let title = localized.field("title", &space.chain("tlh")).and_then(FieldValue::as_str);
        assert_eq!(title, Some("Nyan Cat"));
    }

    #[test]
    fn test_decode_is_deterministic() {
        assert_eq!(decode(&cats_page()).unwrap(), decode(&cats_page()).unwrap());
    }
}
