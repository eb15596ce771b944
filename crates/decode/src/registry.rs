//! Deduplicated, arena-style store of resources keyed by `(type, id)`.
//!
//! Links are resolved on demand: referencing a key that hasn't arrived yet
//! registers a placeholder slot and hands out its [`Handle`]. When the node
//! for that key is supplied later, the slot is populated in place, so every
//! handle taken earlier (including a node's handle to itself) stays valid.
//! This is what lets cyclic graphs be built in a single pass.

use std::collections::HashMap;
use weft_model::{Handle, Identifiable, Resource, ResourceKey, ResourceType};

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Placeholder(ResourceKey),
    /// `position` indexes the slot's entry in [`Registry::order`].
    Populated { resource: Resource, pass: u64, position: usize },
}

/// Resource store for one decode (or one sync session).
///
/// Registry operations never fail: absence is an expected outcome, reported
/// as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    slots: Vec<Slot>,
    index: HashMap<ResourceKey, Handle>,
    /// Populated handles in order of first appearance. Removal leaves a
    /// `None` hole so that no other entry has to move.
    order: Vec<Option<Handle>>,
    live: usize,
    pass: u64,
}
impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new population pass.
    ///
    /// Within one pass the first node supplied for a key wins, so a
    /// partially-resolved cycle is never overwritten by a repeat of the same
    /// node. A later pass may replace it (sync updates).
    pub fn begin_pass(&mut self) {
        self.pass += 1;
    }

    /// Returns the handle for `key`, registering a placeholder if the key has
    /// never been seen. Idempotent.
    pub fn register(&mut self, key: ResourceKey) -> Handle {
        if let Some(handle) = self.index.get(&key) {
            return *handle;
        }
        let handle = Handle::new(self.slots.len());
        self.slots.push(Slot::Placeholder(key.clone()));
        self.index.insert(key, handle);
        handle
    }

    /// Fills the slot behind `handle` with `resource`.
    ///
    /// Returns `false` (leaving the slot unchanged) when the slot was already
    /// populated during the current pass.
    pub fn populate(&mut self, handle: Handle, resource: Resource) -> bool {
        let pass = self.pass;
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        match slot {
            Slot::Populated { pass: populated, .. } if *populated == pass => false,
            Slot::Populated { position, .. } => {
                *slot = Slot::Populated { resource, pass, position: *position };
                true
            },
            Slot::Placeholder(_) => {
                *slot = Slot::Populated { resource, pass, position: self.order.len() };
                self.order.push(Some(handle));
                self.live += 1;
                true
            },
        }
    }

    /// Removes the resource registered under `key`, turning its slot back
    /// into a placeholder. Returns `false` if nothing was populated there.
    ///
    /// The key stays registered: handles are never reclaimed, so a later
    /// insert under the same key gets the same handle back.
    pub fn remove(&mut self, key: &ResourceKey) -> bool {
        let Some(handle) = self.index.get(key).copied() else {
            return false;
        };
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        let Slot::Populated { position, .. } = *slot else {
            return false;
        };
        *slot = Slot::Placeholder(key.clone());
        if let Some(entry) = self.order.get_mut(position) {
            *entry = None;
        }
        self.live -= 1;
        true
    }

    /// The resource behind `handle`; `None` for placeholders.
    pub fn get(&self, handle: Handle) -> Option<&Resource> {
        match self.slots.get(handle.index())? {
            Slot::Populated { resource, .. } => Some(resource),
            Slot::Placeholder(_) => None,
        }
    }

    /// Handle of the populated resource registered under `(kind, id)`.
    pub fn lookup(&self, kind: ResourceType, id: &str) -> Option<Handle> {
        let handle = *self.index.get(&ResourceKey::new(kind, id))?;
        self.get(handle).map(|_| handle)
    }

    /// Populated resources in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Resource)> {
        self.order.iter().flatten().filter_map(|handle| self.get(*handle).map(|resource| (*handle, resource)))
    }

    /// Number of populated resources.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Keys still waiting for a node.
    pub fn placeholders(&self) -> impl Iterator<Item = &ResourceKey> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Placeholder(key) => Some(key),
            Slot::Populated { .. } => None,
        })
    }

    /// Resolves or nulls every remaining placeholder reference.
    ///
    /// Afterwards every handle held by a populated resource points at a
    /// populated slot: single links to placeholders become null, and
    /// placeholders are dropped from link arrays.
    pub fn seal(&mut self) {
        let populated: Vec<bool> = self.slots.iter().map(|slot| matches!(slot, Slot::Populated { .. })).collect();
        let mut keep = |handle: Handle| populated[handle.index()].then_some(handle);
        for slot in &mut self.slots {
            if let Slot::Populated { resource, .. } = slot {
                resource.relink(&mut keep);
            }
        }
        let dangling = self.slots.len() - self.live;
        if dangling > 0 {
            tracing::debug!(dangling, "Sealed registry with unresolved links");
        }
    }

    /// Supplies `resource` under its own key: registers and populates in one
    /// step. Returns its handle.
    pub fn insert(&mut self, resource: Resource) -> Handle {
        let handle = self.register(resource.key());
        self.populate(handle, resource);
        handle
    }
}
