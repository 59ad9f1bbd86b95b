// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event target implementation.
//!
//! ## Overview
//!
//! An [`EventTarget`] owns one [`ListenerMap`], an optional non-owning link to
//! a parent target, and an optional substitute "actual target". Dispatch walks
//! the parent links and runs listeners capture → target → bubble.
//!
//! ## Dispatch order
//!
//! For a chain `A` (root) → `B` → `C`, dispatching on `C` runs:
//!
//! 1. capture listeners of `A`, then `B` (outermost first);
//! 2. capture listeners of `C`, then bubble listeners of `C`;
//! 3. bubble listeners of `B`, then `A`.
//!
//! [`Event::stop_propagation`] ends the walk after the current target's
//! listeners for the current pass. The return value is `false` if any listener
//! returned [`Outcome::Cancel`] (or `false`) or called
//! [`Event::prevent_default`]; neither of those stops propagation.
//!
//! ## Ownership
//!
//! Handles are cheap `Rc` clones. A child never keeps its parent alive; once
//! the last handle to a parent is dropped, the child behaves as a root.
//!
//! ## Reentrancy
//!
//! No borrow of the target is held while a listener runs, so listeners may
//! listen, unlisten, dispatch, reparent, or dispose freely.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::event::Event;
use crate::listener::{Listener, ListenerKey, ListenerRecord};
use crate::registry::ListenerMap;
use crate::types::{EventType, MAX_ANCESTORS, Outcome, Phase, Scope, TargetId};

struct Inner<P> {
    id: TargetId,
    state: RefCell<State<P>>,
}

struct State<P> {
    // `None` once disposed.
    listeners: Option<ListenerMap<P>>,
    parent: Option<WeakEventTarget<P>>,
    actual_target: Option<WeakEventTarget<P>>,
}

/// Hierarchical event dispatcher.
///
/// ## Usage
///
/// - Construct with [`EventTarget::new`]; link into a hierarchy with
///   [`EventTarget::set_parent`].
/// - Register with [`EventTarget::listen`] / [`EventTarget::listen_once`] and
///   remove with [`EventTarget::unlisten`] or [`EventTarget::unlisten_by_key`].
/// - Call [`EventTarget::dispatch`] with a type name or a pre-built [`Event`].
/// - Call [`EventTarget::dispose`] to tear down; later `listen`/`dispatch`
///   calls fail with [`Error::Disposed`].
///
/// ```
/// use understory_event_target::listener::Listener;
/// use understory_event_target::target::EventTarget;
///
/// let root: EventTarget = EventTarget::new();
/// let leaf: EventTarget = EventTarget::new();
/// leaf.set_parent(Some(&root));
///
/// let seen = std::rc::Rc::new(std::cell::Cell::new(0));
/// let count = seen.clone();
/// let l = Listener::new(move |_event, _scope| count.set(count.get() + 1));
/// root.listen("change", &l, false, None).unwrap();
///
/// assert!(leaf.dispatch("change").unwrap());
/// assert_eq!(seen.get(), 1);
/// ```
pub struct EventTarget<P = ()> {
    inner: Rc<Inner<P>>,
}

/// Non-owning handle to an [`EventTarget`].
pub struct WeakEventTarget<P = ()> {
    inner: Weak<Inner<P>>,
}

impl<P> EventTarget<P> {
    /// Create a target with an empty registry, no parent, and itself as actual target.
    pub fn new() -> Self {
        let id = TargetId::next();
        Self {
            inner: Rc::new(Inner {
                id,
                state: RefCell::new(State {
                    listeners: Some(ListenerMap::new(id)),
                    parent: None,
                    actual_target: None,
                }),
            }),
        }
    }

    /// Identity of this target.
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// Returns true if both handles refer to the same target.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a non-owning handle.
    pub fn downgrade(&self) -> WeakEventTarget<P> {
        WeakEventTarget {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether [`EventTarget::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        self.inner.state.borrow().listeners.is_none()
    }

    /// The parent target, if set and still alive.
    pub fn parent(&self) -> Option<Self> {
        self.inner
            .state
            .borrow()
            .parent
            .as_ref()
            .and_then(WeakEventTarget::upgrade)
    }

    /// Set or clear the parent link. The parent is not kept alive by the child.
    ///
    /// Ignored on a disposed target.
    pub fn set_parent(&self, parent: Option<&Self>) {
        let mut state = self.inner.state.borrow_mut();
        if state.listeners.is_none() {
            warn!(target_id = %self.id(), "ignoring set_parent on disposed event target");
            return;
        }
        state.parent = parent.map(Self::downgrade);
    }

    /// The target used as `event.target` and whose listeners run in the target phase.
    ///
    /// Defaults to `self`.
    pub fn actual_target(&self) -> Self {
        self.inner
            .state
            .borrow()
            .actual_target
            .as_ref()
            .and_then(WeakEventTarget::upgrade)
            .unwrap_or_else(|| self.clone())
    }

    /// Substitute the target used for the target phase; `None` restores `self`.
    ///
    /// The ancestor chain is still taken from `self`. This supports delegation,
    /// where a wrapper dispatches on behalf of another target.
    pub fn set_actual_target(&self, target: Option<&Self>) {
        self.inner.state.borrow_mut().actual_target = target.map(Self::downgrade);
    }

    /// Register `listener` for `event_type` in the capture or bubble pass.
    ///
    /// Re-registering the same `(listener, capture, scope)` returns the
    /// existing key without adding an entry.
    pub fn listen(
        &self,
        event_type: impl Into<EventType>,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> Result<ListenerKey> {
        self.add_listener(event_type.into(), listener, false, capture, scope)
    }

    /// Like [`EventTarget::listen`], but the entry is removed right before its
    /// first invocation.
    pub fn listen_once(
        &self,
        event_type: impl Into<EventType>,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> Result<ListenerKey> {
        self.add_listener(event_type.into(), listener, true, capture, scope)
    }

    fn add_listener(
        &self,
        event_type: EventType,
        listener: &Listener<P>,
        once: bool,
        capture: bool,
        scope: Option<&Scope>,
    ) -> Result<ListenerKey> {
        let mut state = self.inner.state.borrow_mut();
        let Some(listeners) = state.listeners.as_mut() else {
            warn!(target_id = %self.id(), %event_type, "listen on disposed event target");
            return Err(Error::Disposed { target: self.id() });
        };
        let key = listeners.add(event_type, listener, once, capture, scope);
        debug!(
            target_id = %self.id(),
            event_type = %key.event_type(),
            capture,
            once,
            "listener registered"
        );
        Ok(key)
    }

    /// Remove the entry matching `(listener, capture, scope)`.
    pub fn unlisten(
        &self,
        event_type: &str,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> bool {
        // The removed entry drops after the borrow is released.
        let removed = self
            .with_listeners_mut(|m| m.take(event_type, listener, capture, scope))
            .flatten();
        removed.is_some()
    }

    /// Remove the entry registered under `key`.
    pub fn unlisten_by_key(&self, key: &ListenerKey) -> bool {
        let removed = self
            .with_listeners_mut(|m| m.take_by_key(key))
            .flatten();
        removed.is_some()
    }

    /// Remove all entries, or those of one type. Returns the count removed.
    ///
    /// Safe to call after disposal, returning `0`.
    pub fn remove_all_listeners(&self, event_type: Option<&str>) -> usize {
        let removed = self
            .with_listeners_mut(|m| m.take_all(event_type))
            .unwrap_or_default();
        removed.len()
    }

    /// Snapshot of the entries for `event_type` in the given pass.
    pub fn get_listeners(&self, event_type: &str, capture: bool) -> Vec<ListenerRecord<P>> {
        self.with_listeners(|m| m.get_listeners(event_type, capture))
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
        self.with_listeners(|m| m.get_listener(event_type, listener, capture, scope))
            .flatten()
    }

    /// Whether any entry matches the optional type and pass filters.
    pub fn has_listener(&self, event_type: Option<&str>, capture: Option<bool>) -> bool {
        self.with_listeners(|m| m.has_listener(event_type, capture))
            .unwrap_or(false)
    }

    fn with_listeners<R>(&self, f: impl FnOnce(&ListenerMap<P>) -> R) -> Option<R> {
        self.inner.state.borrow().listeners.as_ref().map(f)
    }

    fn with_listeners_mut<R>(&self, f: impl FnOnce(&mut ListenerMap<P>) -> R) -> Option<R> {
        self.inner.state.borrow_mut().listeners.as_mut().map(f)
    }

    /// Ancestors from the direct parent up to the root.
    ///
    /// Fails with [`Error::CycleDetected`] if more than [`MAX_ANCESTORS`]
    /// links are found.
    pub fn ancestors(&self) -> Result<Vec<Self>> {
        let mut out = Vec::new();
        let mut cursor = self.parent();
        while let Some(ancestor) = cursor {
            if out.len() == MAX_ANCESTORS {
                error!(
                    target_id = %self.id(),
                    limit = MAX_ANCESTORS,
                    "ancestor chain exceeds limit; parent links form a cycle"
                );
                return Err(Error::CycleDetected {
                    target: self.id(),
                    limit: MAX_ANCESTORS,
                });
            }
            cursor = ancestor.parent();
            out.push(ancestor);
        }
        Ok(out)
    }

    /// Dispatch an event, returning `false` if any listener canceled it.
    ///
    /// Accepts a type name (`&str`, `String`, [`EventType`]) when the
    /// payload has a default, or a pre-built [`Event`]. Fails with
    /// [`Error::Disposed`] after disposal, [`Error::CycleDetected`] on a parent
    /// cycle, and [`Error::Listener`] when a callback returns an error.
    pub fn dispatch(&self, event: impl Into<Event<P>>) -> Result<bool> {
        self.dispatch_event(event.into()).map(|(not_canceled, _)| not_canceled)
    }

    /// Like [`EventTarget::dispatch`], also handing back the record for inspection.
    pub fn dispatch_event(&self, mut event: Event<P>) -> Result<(bool, Event<P>)> {
        if self.is_disposed() {
            warn!(
                target_id = %self.id(),
                event_type = %event.event_type(),
                "dispatch on disposed event target"
            );
            return Err(Error::Disposed { target: self.id() });
        }
        let ancestors = self.ancestors()?;
        let target = self.actual_target();
        event.default_target(&target);
        let event_type = event.event_type().clone();
        trace!(
            target_id = %target.id(),
            %event_type,
            ancestors = ancestors.len(),
            "dispatching event"
        );

        let mut not_canceled = true;

        for ancestor in ancestors.iter().rev() {
            if event.is_propagation_stopped() {
                break;
            }
            event.enter(ancestor, Phase::Capture);
            not_canceled =
                ancestor.fire_listeners(event_type.as_str(), true, &mut event)? && not_canceled;
        }

        if !event.is_propagation_stopped() {
            event.enter(&target, Phase::Target);
            not_canceled =
                target.fire_listeners(event_type.as_str(), true, &mut event)? && not_canceled;
            if !event.is_propagation_stopped() {
                not_canceled = target.fire_listeners(event_type.as_str(), false, &mut event)?
                    && not_canceled;
            }
        }

        for ancestor in &ancestors {
            if event.is_propagation_stopped() {
                break;
            }
            event.enter(ancestor, Phase::Bubble);
            not_canceled =
                ancestor.fire_listeners(event_type.as_str(), false, &mut event)? && not_canceled;
        }

        trace!(
            target_id = %target.id(),
            %event_type,
            not_canceled,
            propagation_stopped = event.is_propagation_stopped(),
            "dispatch finished"
        );
        Ok((not_canceled, event))
    }

    /// Run this target's listeners for one pass, without walking ancestors.
    ///
    /// Returns `true` straight away if no entries exist for the type. Otherwise
    /// returns `false` if a listener returned [`Outcome::Cancel`] or the event
    /// is default-prevented.
    pub fn fire_listeners(
        &self,
        event_type: &str,
        capture: bool,
        event: &mut Event<P>,
    ) -> Result<bool> {
        // Release the borrow before running callbacks.
        let Some(entries) = self
            .with_listeners(|m| m.snapshot(event_type))
            .flatten()
        else {
            return Ok(true);
        };

        let mut not_canceled = true;
        for entry in &entries {
            if entry.is_removed() || entry.is_capture() != capture {
                continue;
            }
            if entry.is_once() {
                self.unlisten_by_key(entry.key());
            }
            let outcome = entry
                .listener()
                .call(event, entry.scope())
                .map_err(|source| Error::Listener {
                    event_type: event.event_type().clone(),
                    source,
                })?;
            not_canceled = outcome == Outcome::Continue && not_canceled;
        }
        Ok(not_canceled && !event.is_default_prevented())
    }

    /// Remove every listener and drop the parent link. Idempotent.
    ///
    /// Afterwards `listen`, `listen_once`, and `dispatch` fail with
    /// [`Error::Disposed`]; queries and removals return empty results.
    pub fn dispose(&self) {
        let mut listeners = {
            let mut state = self.inner.state.borrow_mut();
            let Some(listeners) = state.listeners.take() else {
                return;
            };
            state.parent = None;
            state.actual_target = None;
            listeners
        };
        // Callbacks may own handles whose drop reenters this target.
        let removed = listeners.remove_all(None);
        debug!(target_id = %self.id(), removed, "event target disposed");
    }
}

impl<P> Default for EventTarget<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for EventTarget<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P> fmt::Debug for EventTarget<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EventTarget");
        s.field("id", &self.id());
        if let Ok(state) = self.inner.state.try_borrow() {
            s.field("disposed", &state.listeners.is_none());
        }
        s.finish_non_exhaustive()
    }
}

impl<P> WeakEventTarget<P> {
    /// Upgrade to a strong handle if the target is still alive.
    pub fn upgrade(&self) -> Option<EventTarget<P>> {
        self.inner.upgrade().map(|inner| EventTarget { inner })
    }
}

impl<P> Clone for WeakEventTarget<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<P> fmt::Debug for WeakEventTarget<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEventTarget")
            .field("id", &self.upgrade().map(|t| t.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use core::cell::Cell;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str) -> Listener {
        let log = Rc::clone(log);
        Listener::new(move |e: &mut Event, _| {
            log.borrow_mut()
                .push(alloc::format!("{label}:{:?}", e.phase().unwrap()));
        })
    }

    fn chain() -> (EventTarget, EventTarget, EventTarget) {
        let a = EventTarget::new();
        let b = EventTarget::new();
        let c = EventTarget::new();
        b.set_parent(Some(&a));
        c.set_parent(Some(&b));
        (a, b, c)
    }

    #[test]
    fn capture_target_bubble_order() {
        let (a, b, c) = chain();
        let log = Log::default();
        for (t, name) in [(&a, "A"), (&b, "B"), (&c, "C")] {
            t.listen("x", &recorder(&log, name), true, None).unwrap();
            t.listen("x", &recorder(&log, name), false, None).unwrap();
        }
        assert!(c.dispatch("x").unwrap());
        assert_eq!(
            *log.borrow(),
            vec![
                "A:Capture",
                "B:Capture",
                "C:Target",
                "C:Target",
                "B:Bubble",
                "A:Bubble"
            ]
        );
    }

    #[test]
    fn capture_listeners_on_target_run_before_bubble_listeners() {
        let t: EventTarget = EventTarget::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        let o2 = Rc::clone(&order);
        // Registered bubble first; capture still runs first.
        t.listen("x", &Listener::new(move |_, _| o1.borrow_mut().push("bubble")), false, None)
            .unwrap();
        t.listen("x", &Listener::new(move |_, _| o2.borrow_mut().push("capture")), true, None)
            .unwrap();
        t.dispatch("x").unwrap();
        assert_eq!(*order.borrow(), vec!["capture", "bubble"]);
    }

    #[test]
    fn no_listeners_returns_true() {
        let (_a, _b, c) = chain();
        assert!(c.dispatch("nothing").unwrap());
    }

    #[test]
    fn stop_propagation_at_ancestor_capture() {
        let (a, b, c) = chain();
        let log = Log::default();
        a.listen("x", &recorder(&log, "A"), true, None).unwrap();
        let stopper = {
            let log = Rc::clone(&log);
            Listener::new(move |e: &mut Event, _| {
                log.borrow_mut().push("B-stop".into());
                e.stop_propagation();
                e.prevent_default();
            })
        };
        b.listen("x", &stopper, true, None).unwrap();
        b.listen("x", &recorder(&log, "B"), false, None).unwrap();
        c.listen("x", &recorder(&log, "C"), true, None).unwrap();
        c.listen("x", &recorder(&log, "C"), false, None).unwrap();
        a.listen("x", &recorder(&log, "A"), false, None).unwrap();

        assert!(!c.dispatch("x").unwrap());
        assert_eq!(*log.borrow(), vec!["A:Capture", "B-stop"]);
    }

    #[test]
    fn returning_false_cancels_without_stopping() {
        let (a, _b, c) = chain();
        let log = Log::default();
        c.listen("x", &Listener::new(|_, _| false), false, None)
            .unwrap();
        a.listen("x", &recorder(&log, "A"), false, None).unwrap();
        assert!(!c.dispatch("x").unwrap());
        assert_eq!(*log.borrow(), vec!["A:Bubble"]);
    }

    #[test]
    fn prevent_default_without_stop_still_bubbles() {
        let (a, _b, c) = chain();
        let log = Log::default();
        c.listen("x", &Listener::new(|e: &mut Event, _| e.prevent_default()), false, None)
            .unwrap();
        a.listen("x", &recorder(&log, "A"), false, None).unwrap();
        let (not_canceled, event) = c.dispatch_event(Event::new("x")).unwrap();
        assert!(!not_canceled);
        assert!(event.is_default_prevented());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn stop_propagation_still_runs_same_target_siblings() {
        let t: EventTarget = EventTarget::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        t.listen("x", &Listener::new(|e: &mut Event, _| e.stop_propagation()), false, None)
            .unwrap();
        t.listen("x", &Listener::new(move |_, _| h.set(h.get() + 1)), false, None)
            .unwrap();
        t.dispatch("x").unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn listen_once_fires_once() {
        let t: EventTarget = EventTarget::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        t.listen_once("x", &Listener::new(move |_, _| h.set(h.get() + 1)), false, None)
            .unwrap();
        t.dispatch("x").unwrap();
        t.dispatch("x").unwrap();
        assert_eq!(hits.get(), 1);
        assert!(!t.has_listener(Some("x"), None));
    }

    #[test]
    fn listen_once_is_removed_before_reentrant_dispatch() {
        let t: EventTarget = EventTarget::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let weak = t.downgrade();
        t.listen_once(
            "x",
            &Listener::new(move |_, _| {
                h.set(h.get() + 1);
                if let Some(t) = weak.upgrade() {
                    t.dispatch("x").unwrap();
                }
            }),
            false,
            None,
        )
        .unwrap();
        t.dispatch("x").unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn duplicate_registration_invokes_once() {
        let t: EventTarget = EventTarget::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let l = Listener::new(move |_, _| h.set(h.get() + 1));
        let k1 = t.listen("x", &l, false, None).unwrap();
        let k2 = t.listen("x", &l, false, None).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(t.get_listeners("x", false).len(), 1);
        t.dispatch("x").unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn sibling_removed_in_flight_is_skipped_and_added_is_deferred() {
        let t: EventTarget = EventTarget::new();
        let log = Log::default();
        let victim = recorder(&log, "victim");
        let late = recorder(&log, "late");
        let remover = {
            let weak = t.downgrade();
            let victim = victim.clone();
            let late = late.clone();
            Listener::new(move |_: &mut Event, _| {
                let t = weak.upgrade().unwrap();
                t.unlisten("x", &victim, false, None);
                t.listen("x", &late, false, None).unwrap();
            })
        };
        t.listen("x", &remover, false, None).unwrap();
        t.listen("x", &victim, false, None).unwrap();
        t.dispatch("x").unwrap();
        assert!(log.borrow().is_empty());
        t.dispatch("x").unwrap();
        assert_eq!(*log.borrow(), vec!["late:Target"]);
    }

    #[test]
    fn parent_cycle_is_detected() {
        let a: EventTarget = EventTarget::new();
        let b: EventTarget = EventTarget::new();
        a.set_parent(Some(&b));
        b.set_parent(Some(&a));
        assert!(matches!(
            a.dispatch("x"),
            Err(Error::CycleDetected { limit: MAX_ANCESTORS, .. })
        ));
        assert!(matches!(b.dispatch("x"), Err(Error::CycleDetected { .. })));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let a: EventTarget = EventTarget::new();
        a.set_parent(Some(&a));
        assert!(matches!(a.dispatch("x"), Err(Error::CycleDetected { .. })));
    }

    #[test]
    fn long_acyclic_chain_within_limit_dispatches() {
        let nodes: Vec<EventTarget> = (0..=MAX_ANCESTORS).map(|_| EventTarget::new()).collect();
        for pair in nodes.windows(2) {
            pair[1].set_parent(Some(&pair[0]));
        }
        let leaf = nodes.last().unwrap();
        assert_eq!(leaf.ancestors().unwrap().len(), MAX_ANCESTORS);
        assert!(leaf.dispatch("x").unwrap());

        let deeper = EventTarget::new();
        deeper.set_parent(Some(leaf));
        assert!(matches!(
            deeper.dispatch("x"),
            Err(Error::CycleDetected { .. })
        ));
    }

    #[test]
    fn dropped_parent_ends_the_chain() {
        let child: EventTarget = EventTarget::new();
        {
            let parent = EventTarget::new();
            child.set_parent(Some(&parent));
            assert!(child.parent().is_some());
        }
        assert!(child.parent().is_none());
        assert!(child.dispatch("x").unwrap());
    }

    #[test]
    fn dispose_clears_and_rejects() {
        let (a, b, _c) = chain();
        let l = Listener::new(|_, _| ());
        b.listen("x", &l, false, None).unwrap();
        b.dispose();
        b.dispose();
        assert!(b.is_disposed());
        assert!(b.get_listeners("x", false).is_empty());
        assert!(!b.has_listener(None, None));
        assert!(b.parent().is_none());
        assert_eq!(b.remove_all_listeners(None), 0);
        assert!(!b.unlisten("x", &l, false, None));
        assert!(matches!(
            b.listen("x", &l, false, None),
            Err(Error::Disposed { .. })
        ));
        assert!(matches!(
            b.listen_once("x", &l, false, None),
            Err(Error::Disposed { .. })
        ));
        assert!(matches!(b.dispatch("x"), Err(Error::Disposed { .. })));
        b.set_parent(Some(&a));
        assert!(b.parent().is_none());
    }

    /// Unlistens its own key when the owning callback is dropped.
    struct UnlistenOnDrop {
        target: WeakEventTarget,
        key: Rc<RefCell<Option<ListenerKey>>>,
        dropped: Rc<Cell<bool>>,
    }

    impl Drop for UnlistenOnDrop {
        fn drop(&mut self) {
            if let (Some(t), Some(key)) = (self.target.upgrade(), self.key.borrow().as_ref()) {
                assert!(!t.unlisten_by_key(key));
                assert!(!t.has_listener(Some(key.event_type().as_str()), None));
            }
            self.dropped.set(true);
        }
    }

    /// Registers a listener whose only handle lives in `t`'s registry.
    fn self_unlistening(
        t: &EventTarget,
        event_type: &'static str,
        capture: bool,
    ) -> (ListenerKey, Rc<Cell<bool>>) {
        let key = Rc::new(RefCell::new(None));
        let dropped = Rc::new(Cell::new(false));
        let guard = UnlistenOnDrop {
            target: t.downgrade(),
            key: Rc::clone(&key),
            dropped: Rc::clone(&dropped),
        };
        let l = Listener::new(move |_, _| {
            let _guard = &guard;
        });
        let issued = t.listen(event_type, &l, capture, None).unwrap();
        *key.borrow_mut() = Some(issued.clone());
        (issued, dropped)
    }

    #[test]
    fn removal_tolerates_reentrant_callback_drop() {
        let t: EventTarget = EventTarget::new();

        let (key, dropped) = self_unlistening(&t, "x", false);
        assert!(!dropped.get());
        assert!(t.unlisten_by_key(&key));
        assert!(dropped.get());

        let (_, dropped) = self_unlistening(&t, "x", true);
        assert_eq!(t.remove_all_listeners(Some("x")), 1);
        assert!(dropped.get());

        let (_, first) = self_unlistening(&t, "x", false);
        let (_, second) = self_unlistening(&t, "y", false);
        assert_eq!(t.remove_all_listeners(None), 2);
        assert!(first.get() && second.get());

        let (_, dropped) = self_unlistening(&t, "x", false);
        t.dispose();
        assert!(dropped.get());
    }

    #[test]
    fn once_entry_dropped_after_dispatch_may_reenter() {
        let t: EventTarget = EventTarget::new();
        let key = Rc::new(RefCell::new(None));
        let dropped = Rc::new(Cell::new(false));
        let guard = UnlistenOnDrop {
            target: t.downgrade(),
            key: Rc::clone(&key),
            dropped: Rc::clone(&dropped),
        };
        let l = Listener::new(move |_, _| {
            let _guard = &guard;
        });
        *key.borrow_mut() = Some(t.listen_once("x", &l, false, None).unwrap());
        drop(l);
        assert!(t.dispatch("x").unwrap());
        assert!(dropped.get());
        assert!(!t.has_listener(None, None));
    }

    #[test]
    fn disposed_ancestor_is_passed_through() {
        let (a, b, c) = chain();
        let log = Log::default();
        b.listen("x", &recorder(&log, "B"), false, None).unwrap();
        a.listen("x", &recorder(&log, "A"), false, None).unwrap();
        b.dispose();
        // `b` lost its parent link on disposal, so the chain stops there.
        assert!(c.dispatch("x").unwrap());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn dispose_during_dispatch_skips_remaining_listeners() {
        let t: EventTarget = EventTarget::new();
        let hits = Rc::new(Cell::new(0));
        let weak = t.downgrade();
        t.listen(
            "x",
            &Listener::new(move |_, _| {
                if let Some(t) = weak.upgrade() {
                    t.dispose();
                }
            }),
            false,
            None,
        )
        .unwrap();
        let h = Rc::clone(&hits);
        t.listen("x", &Listener::new(move |_, _| h.set(h.get() + 1)), false, None)
            .unwrap();
        assert!(t.dispatch("x").unwrap());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn event_targets_are_set_during_dispatch() {
        let (a, _b, c) = chain();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let l = Listener::new(move |e: &mut Event, _| {
            s.borrow_mut().push((
                e.target().map(EventTarget::id),
                e.current_target().map(EventTarget::id),
            ));
        });
        a.listen("x", &l, true, None).unwrap();
        c.listen("x", &l, false, None).unwrap();
        c.dispatch("x").unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![(Some(c.id()), Some(a.id())), (Some(c.id()), Some(c.id()))]
        );
    }

    #[test]
    fn prebuilt_event_keeps_its_target() {
        let t: EventTarget = EventTarget::new();
        let other: EventTarget = EventTarget::new();
        let (_, event) = t.dispatch_event(Event::new("x").with_target(&other)).unwrap();
        assert!(event.target().unwrap().ptr_eq(&other));
    }

    #[test]
    fn actual_target_substitution() {
        let parent: EventTarget = EventTarget::new();
        let wrapper: EventTarget = EventTarget::new();
        let inner: EventTarget = EventTarget::new();
        wrapper.set_parent(Some(&parent));
        wrapper.set_actual_target(Some(&inner));
        assert!(wrapper.actual_target().ptr_eq(&inner));

        let log = Log::default();
        inner.listen("x", &recorder(&log, "inner"), false, None).unwrap();
        wrapper.listen("x", &recorder(&log, "wrapper"), false, None).unwrap();
        parent.listen("x", &recorder(&log, "parent"), false, None).unwrap();
        let (_, event) = wrapper.dispatch_event(Event::new("x")).unwrap();
        assert!(event.target().unwrap().ptr_eq(&inner));
        assert_eq!(*log.borrow(), vec!["inner:Target", "parent:Bubble"]);

        wrapper.set_actual_target(None);
        assert!(wrapper.actual_target().ptr_eq(&wrapper));
    }

    #[test]
    fn scope_is_passed_to_callback() {
        let t: EventTarget = EventTarget::new();
        let seen = Rc::new(Cell::new(0_u32));
        let s = Rc::clone(&seen);
        let l = Listener::new(move |_, scope: Option<&Scope>| {
            s.set(*scope.and_then(Scope::downcast_ref::<u32>).unwrap());
        });
        let scope = Scope::new(42_u32);
        t.listen("x", &l, false, Some(&scope)).unwrap();
        t.dispatch("x").unwrap();
        assert_eq!(seen.get(), 42);
        assert!(!t.unlisten("x", &l, false, None));
        assert!(t.unlisten("x", &l, false, Some(&scope)));
    }

    #[test]
    fn listener_error_aborts_dispatch() {
        let (a, _b, c) = chain();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        c.listen(
            "save",
            &Listener::new(|_, _| -> core::result::Result<(), Box<dyn core::error::Error>> {
                Err("disk full".into())
            }),
            false,
            None,
        )
        .unwrap();
        a.listen("save", &Listener::new(move |_, _| h.set(h.get() + 1)), false, None)
            .unwrap();
        let err = c.dispatch("save").unwrap_err();
        assert!(matches!(err, Error::Listener { ref event_type, .. } if event_type.as_str() == "save"));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn unlisten_by_key_and_has_listener() {
        let t: EventTarget = EventTarget::new();
        let key = t.listen("x", &Listener::new(|_, _| ()), true, None).unwrap();
        assert!(t.has_listener(Some("x"), Some(true)));
        assert!(!t.has_listener(Some("x"), Some(false)));
        assert!(t.unlisten_by_key(&key));
        assert!(!t.unlisten_by_key(&key));
        assert!(!t.has_listener(None, None));
    }

    #[test]
    fn keys_from_other_targets_are_ignored() {
        let a: EventTarget = EventTarget::new();
        let b: EventTarget = EventTarget::new();
        let l = Listener::new(|_, _| ());
        let key = a.listen("x", &l, false, None).unwrap();
        b.listen("x", &l, false, None).unwrap();
        assert!(!b.unlisten_by_key(&key));
        assert!(b.has_listener(Some("x"), None));
        assert_eq!(key.target(), a.id());
    }

    #[test]
    fn runtime_type_names_listen_and_dispatch() {
        let t: EventTarget = EventTarget::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let l = Listener::new(move |_, _| h.set(h.get() + 1));
        let name = String::from("resize");
        t.listen(name.as_str(), &l, false, None).unwrap();
        assert!(t.dispatch(name.as_str()).unwrap());
        assert!(t.dispatch("resize").unwrap());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn fire_listeners_runs_one_pass_only() {
        let t: EventTarget = EventTarget::new();
        let log = Log::default();
        t.listen("x", &recorder(&log, "cap"), true, None).unwrap();
        t.listen("x", &recorder(&log, "bub"), false, None).unwrap();
        let mut e = Event::new("x");
        e.enter(&t, Phase::Bubble);
        assert!(t.fire_listeners("x", false, &mut e).unwrap());
        assert_eq!(*log.borrow(), vec!["bub:Bubble"]);
    }

    #[test]
    fn fire_listeners_without_entries_ignores_prevented_flag() {
        let t: EventTarget = EventTarget::new();
        let mut e: Event = Event::new("x");
        e.prevent_default();
        assert!(t.fire_listeners("x", false, &mut e).unwrap());
        t.listen("x", &Listener::new(|_, _| ()), true, None).unwrap();
        assert!(!t.fire_listeners("x", false, &mut e).unwrap());
    }
}
