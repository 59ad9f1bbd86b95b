// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry.
//!
//! ## Overview
//!
//! [`ListenerMap`] maps an event type to the ordered entries registered for
//! it. Insertion order is invocation order within a phase.
//!
//! ## Removal
//!
//! Removing an entry drops it from the map and flags it as removed. The
//! dispatcher iterates over a snapshot of the entries, so an entry removed
//! while a dispatch is in flight is skipped rather than invoked, and entries
//! added in flight only run on later dispatches.
//!
//! ## Absence
//!
//! Every operation on an unknown type, listener, or key is a no-op that
//! returns `false`, `0`, `None`, or an empty list.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use crate::listener::{Listener, ListenerKey, ListenerRecord};
use crate::types::{EventType, ListenFlags, Scope, TargetId};

/// A registered listener. Only the registry hands these out, and only to the dispatcher.
pub(crate) struct Entry<P> {
    key: ListenerKey,
    listener: Listener<P>,
    scope: Option<Scope>,
    flags: Cell<ListenFlags>,
    removed: Cell<bool>,
}

impl<P> Entry<P> {
    pub(crate) fn key(&self) -> &ListenerKey {
        &self.key
    }

    pub(crate) fn listener(&self) -> &Listener<P> {
        &self.listener
    }

    pub(crate) fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub(crate) fn is_capture(&self) -> bool {
        self.flags.get().contains(ListenFlags::CAPTURE)
    }

    pub(crate) fn is_once(&self) -> bool {
        self.flags.get().contains(ListenFlags::ONCE)
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.removed.get()
    }

    fn matches(&self, listener: &Listener<P>, capture: bool, scope: Option<&Scope>) -> bool {
        self.listener.ptr_eq(listener)
            && self.is_capture() == capture
            && Scope::same(self.scope.as_ref(), scope)
    }

    fn record(&self) -> ListenerRecord<P> {
        ListenerRecord {
            key: self.key.clone(),
            flags: self.flags.get(),
            listener: self.listener.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// Per-type listener registry owned by one event target.
pub struct ListenerMap<P = ()> {
    owner: TargetId,
    listeners: BTreeMap<EventType, Vec<Rc<Entry<P>>>>,
    next_serial: u64,
}

impl<P> ListenerMap<P> {
    /// Create an empty registry whose keys are tagged with `owner`.
    pub fn new(owner: TargetId) -> Self {
        Self {
            owner,
            listeners: BTreeMap::new(),
            next_serial: 0,
        }
    }

    /// The target id stamped on keys issued by this registry.
    pub fn owner(&self) -> TargetId {
        self.owner
    }

    /// Number of event types with at least one entry.
    pub fn type_count(&self) -> usize {
        self.listeners.len()
    }

    /// Total number of entries across all types.
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Returns true if no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Register `listener` for `event_type`.
    ///
    /// If the same `(listener, capture, scope)` is already registered for the
    /// type, no entry is added and the existing key is returned. Registering a
    /// non-`once` duplicate of a `once` entry makes that entry permanent.
    pub fn add(
        &mut self,
        event_type: impl Into<EventType>,
        listener: &Listener<P>,
        once: bool,
        capture: bool,
        scope: Option<&Scope>,
    ) -> ListenerKey {
        let event_type = event_type.into();
        let entries = self.listeners.entry(event_type.clone()).or_default();
        if let Some(existing) = entries
            .iter()
            .find(|e| e.matches(listener, capture, scope))
        {
            if !once {
                existing
                    .flags
                    .set(existing.flags.get().difference(ListenFlags::ONCE));
            }
            return existing.key.clone();
        }

        let key = ListenerKey {
            target: self.owner,
            event_type,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        entries.push(Rc::new(Entry {
            key: key.clone(),
            listener: listener.clone(),
            scope: scope.cloned(),
            flags: Cell::new(ListenFlags::new(capture, once)),
            removed: Cell::new(false),
        }));
        key
    }

    /// Remove the entry matching `(listener, capture, scope)` for `event_type`.
    pub fn remove(
        &mut self,
        event_type: &str,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> bool {
        self.take(event_type, listener, capture, scope).is_some()
    }

    /// Remove the entry identified by `key`.
    ///
    /// Keys issued by another registry, or already removed, return `false`.
    pub fn remove_by_key(&mut self, key: &ListenerKey) -> bool {
        self.take_by_key(key).is_some()
    }

    /// Remove all entries, or only those of `event_type`. Returns the number removed.
    pub fn remove_all(&mut self, event_type: Option<&str>) -> usize {
        self.take_all(event_type).len()
    }

    /// Unlink the matching entry and hand it back, flagged as removed.
    ///
    /// Dropping the returned entry may run callback destructors that reenter
    /// the owning target; release any borrow of the registry first.
    pub(crate) fn take(
        &mut self,
        event_type: &str,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> Option<Rc<Entry<P>>> {
        let entries = self.listeners.get_mut(event_type)?;
        let index = entries
            .iter()
            .position(|e| e.matches(listener, capture, scope))?;
        let entry = entries.remove(index);
        entry.removed.set(true);
        if entries.is_empty() {
            self.listeners.remove(event_type);
        }
        Some(entry)
    }

    pub(crate) fn take_by_key(&mut self, key: &ListenerKey) -> Option<Rc<Entry<P>>> {
        if key.target != self.owner {
            return None;
        }
        let entries = self.listeners.get_mut(key.event_type.as_str())?;
        let index = entries.iter().position(|e| e.key.serial == key.serial)?;
        let entry = entries.remove(index);
        entry.removed.set(true);
        if entries.is_empty() {
            self.listeners.remove(key.event_type.as_str());
        }
        Some(entry)
    }

    pub(crate) fn take_all(&mut self, event_type: Option<&str>) -> Vec<Rc<Entry<P>>> {
        let taken: Vec<_> = match event_type {
            Some(ty) => self.listeners.remove(ty).unwrap_or_default(),
            None => core::mem::take(&mut self.listeners)
                .into_values()
                .flatten()
                .collect(),
        };
        for entry in &taken {
            entry.removed.set(true);
        }
        taken
    }

    /// Snapshot of the entries for `event_type` in the given pass, in registration order.
    pub fn get_listeners(&self, event_type: &str, capture: bool) -> Vec<ListenerRecord<P>> {
        self.listeners
            .get(event_type)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| !e.is_removed() && e.is_capture() == capture)
                    .map(|e| e.record())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Key of the entry matching `(listener, capture, scope)`, if registered.
    pub fn get_listener(
        &self,
        event_type: &str,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> Option<ListenerKey> {
        self.listeners
            .get(event_type)?
            .iter()
            .find(|e| !e.is_removed() && e.matches(listener, capture, scope))
            .map(|e| e.key.clone())
    }

    /// Whether any entry matches the optional type and pass filters.
    pub fn has_listener(&self, event_type: Option<&str>, capture: Option<bool>) -> bool {
        let pass_matches = |e: &Rc<Entry<P>>| {
            !e.is_removed() && capture.is_none_or(|capture| e.is_capture() == capture)
        };
        match event_type {
            Some(ty) => self
                .listeners
                .get(ty)
                .is_some_and(|entries| entries.iter().any(pass_matches)),
            None => self
                .listeners
                .values()
                .any(|entries| entries.iter().any(pass_matches)),
        }
    }

    /// Shared handles to the entries of `event_type`, or `None` if the type has none.
    pub(crate) fn snapshot(&self, event_type: &str) -> Option<Vec<Rc<Entry<P>>>> {
        self.listeners.get(event_type).cloned()
    }
}

impl<P> fmt::Debug for ListenerMap<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerMap")
            .field("owner", &self.owner)
            .field("types", &self.listeners.keys().collect::<Vec<_>>())
            .field("len", &self.len())
            .finish()
    }
}
