//! Link resolution: turning raw resource nodes into registered resources.

use crate::registry::Registry;
use exn::OptionExt;
use serde_json::Value;
use std::collections::HashSet;
use tracing::instrument;
use weft_model::error::{ErrorKind as ModelErrorKind, Result as ModelResult};
use weft_model::resource::{Asset, ContentType, Deleted, Entry, Locale, LocalizedFields, Space};
use weft_model::{FieldValue, Handle, Link, Resource, ResourceKey, ResourceType, Scalar, Sys};

/// Resolves raw nodes into a [`Registry`].
///
/// Population is supply-driven (whichever node arrives is registered) and
/// dereferencing is demand-driven (a link registers a placeholder for its
/// target), so the order nodes are fed in never changes the result.
pub struct Resolver<'a> {
    registry: &'a mut Registry,
    unavailable: &'a HashSet<ResourceKey>,
}
impl<'a> Resolver<'a> {
    /// `unavailable` holds the keys the page's `errors` section reported as
    /// unresolvable; links to them are dropped instead of registered.
    pub fn new(registry: &'a mut Registry, unavailable: &'a HashSet<ResourceKey>) -> Self {
        Self { registry, unavailable }
    }

    /// Registers and populates the resource described by `node`.
    ///
    /// Returns `Ok(None)` for nodes of a type that isn't modelled; they are
    /// skipped rather than failing the page.
    pub fn resolve(&mut self, node: &Value) -> ModelResult<Option<Handle>> {
        match Self::check(node)? {
            Some(sys) => self.resolve_checked(sys, node).map(Some),
            None => Ok(None),
        }
    }

    /// Validates `node` without touching any registry.
    ///
    /// Everything that can make [`resolve`](Self::resolve) fail is checked
    /// here, so a caller can vet a whole page before mutating shared state.
    /// Returns `Ok(None)` (with a warning) for nodes that would be skipped.
    pub fn check(node: &Value) -> ModelResult<Option<Sys>> {
        let sys = match Sys::from_node(node) {
            Ok(sys) => sys,
            Err(e) if matches!(&*e, ModelErrorKind::UnknownType(_)) => {
                tracing::warn!(error = %*e, "Skipping resource of unsupported type");
                return Ok(None);
            },
            Err(e) => return Err(e),
        };
        match sys.kind {
            ResourceType::Entry | ResourceType::Asset => check_fields(&sys, node)?,
            ResourceType::ContentType => {
                ContentType::from_node(sys.clone(), node)?;
            },
            ResourceType::Locale => {
                Locale::from_node(sys.clone(), node)?;
            },
            ResourceType::Space => {
                Space::from_node(sys.clone(), node)?;
            },
            ResourceType::DeletedEntry | ResourceType::DeletedAsset => {},
            ResourceType::ArrayError => {
                tracing::warn!(id = %sys.id, "Skipping error record outside the errors section");
                return Ok(None);
            },
        }
        Ok(Some(sys))
    }

    /// [`resolve`](Self::resolve) for a node that already passed
    /// [`check`](Self::check).
    #[instrument(level = "trace", skip_all, fields(id = %sys.id, kind = %sys.kind))]
    pub fn resolve_checked(&mut self, sys: Sys, node: &Value) -> ModelResult<Handle> {
        // Register before descending into fields, so a self-reference
        // resolves to this very slot.
        let handle = self.registry.register(sys.key());
        let resource = self.resource(sys, node)?;
        self.registry.populate(handle, resource);
        Ok(handle)
    }

    fn resource(&mut self, sys: Sys, node: &Value) -> ModelResult<Resource> {
        Ok(match sys.kind {
            ResourceType::Entry => {
                let fields = self.fields(&sys, node);
                let content_type = sys
                    .content_type
                    .as_ref()
                    .map(|id| self.registry.register(ResourceKey::new(ResourceType::ContentType, id.as_str())));
                Entry { sys, content_type, fields }.into()
            },
            ResourceType::Asset => {
                let fields = self.fields(&sys, node);
                Asset { sys, fields }.into()
            },
            ResourceType::ContentType => ContentType::from_node(sys, node)?.into(),
            ResourceType::Locale => Locale::from_node(sys, node)?.into(),
            ResourceType::Space => Space::from_node(sys, node)?.into(),
            ResourceType::DeletedEntry | ResourceType::DeletedAsset => Deleted { sys }.into(),
            ResourceType::ArrayError => exn::bail!(ModelErrorKind::UnknownType(sys.kind.to_string())),
        })
    }

    /// Reads `fields` into the per-locale store. The shape was verified by
    /// [`check_fields`]; anything else is skipped.
    ///
    /// A payload with `sys.locale` carries `name → value` for that locale;
    /// otherwise `fields` is `name → locale → value`.
    fn fields(&mut self, sys: &Sys, node: &Value) -> LocalizedFields {
        let mut localized = LocalizedFields::new();
        let Some(raw) = node.get("fields").and_then(Value::as_object) else {
            return localized;
        };
        match &sys.locale {
            Some(locale) => {
                let fields = localized.entry(locale.clone()).or_default();
                for (name, value) in raw {
                    fields.insert(name.clone(), self.value(value));
                }
            },
            None => {
                for (name, per_locale) in raw {
                    for (locale, value) in per_locale.as_object().into_iter().flatten() {
                        let value = self.value(value);
                        localized.entry(locale.clone()).or_default().insert(name.clone(), value);
                    }
                }
            },
        }
        localized
    }

    fn value(&mut self, raw: &Value) -> FieldValue {
        match raw {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => FieldValue::Scalar(Scalar::Number(n.clone())),
            Value::String(s) => FieldValue::Scalar(Scalar::String(s.clone())),
            Value::Array(values) if !values.is_empty() && values.iter().all(|v| Link::detect(v).is_some()) => {
                FieldValue::Links(values.iter().filter_map(|v| self.link(v)).collect())
            },
            Value::Array(values) => FieldValue::Sequence(values.iter().map(|v| self.value(v)).collect()),
            Value::Object(map) => match Link::detect(raw) {
                Some(_) => self.link(raw).map_or(FieldValue::Null, FieldValue::Link),
                None => FieldValue::Map(map.iter().map(|(k, v)| (k.clone(), self.value(v))).collect()),
            },
        }
    }

    /// Resolves a raw link marker to a (possibly placeholder) handle.
    fn link(&mut self, raw: &Value) -> Option<Handle> {
        let link = match Link::detect(raw)? {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!(error = %*e, "Dropping link without a resolvable target");
                return None;
            },
        };
        let key = link.key();
        if self.unavailable.contains(&key) {
            tracing::debug!(link = %key, "Dropping link reported as unresolvable");
            return None;
        }
        Some(self.registry.register(key))
    }
}

/// `fields` must be an object, and without `sys.locale` every field must be
/// a `locale → value` object.
fn check_fields(sys: &Sys, node: &Value) -> ModelResult<()> {
    let Some(raw) = node.get("fields") else {
        return Ok(());
    };
    let raw = raw.as_object().ok_or_raise(|| ModelErrorKind::MalformedPayload("fields"))?;
    if sys.locale.is_none() && raw.values().any(|per_locale| !per_locale.is_object()) {
        exn::bail!(ModelErrorKind::MalformedPayload("fields"));
    }
    Ok(())
}
