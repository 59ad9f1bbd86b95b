// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition seam for types that expose event capability.
//!
//! Embed an [`EventTarget`] in your type and implement [`Listenable`] by
//! returning it; the provided methods delegate to the embedded target.
//!
//! ```
//! use understory_event_target::listenable::Listenable;
//! use understory_event_target::listener::Listener;
//! use understory_event_target::target::EventTarget;
//!
//! struct Slider {
//!     value: std::cell::Cell<u32>,
//!     events: EventTarget,
//! }
//!
//! impl Listenable for Slider {
//!     fn event_target(&self) -> &EventTarget {
//!         &self.events
//!     }
//! }
//!
//! impl Slider {
//!     fn set_value(&self, value: u32) {
//!         self.value.set(value);
//!         self.dispatch("change").unwrap();
//!     }
//! }
//!
//! let slider = Slider { value: 0.into(), events: EventTarget::new() };
//! slider.listen("change", &Listener::new(|_, _| ()), false, None).unwrap();
//! slider.set_value(3);
//! ```

use alloc::vec::Vec;

use crate::error::Result;
use crate::event::Event;
use crate::listener::{Listener, ListenerKey, ListenerRecord};
use crate::target::EventTarget;
use crate::types::{EventType, Scope};

/// A type that owns an [`EventTarget`] and exposes its listener API.
pub trait Listenable<P = ()> {
    /// The embedded event target.
    fn event_target(&self) -> &EventTarget<P>;

    /// See [`EventTarget::listen`].
    fn listen(
        &self,
        event_type: impl Into<EventType>,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> Result<ListenerKey> {
        self.event_target()
            .listen(event_type, listener, capture, scope)
    }

    /// See [`EventTarget::listen_once`].
    fn listen_once(
        &self,
        event_type: impl Into<EventType>,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> Result<ListenerKey> {
        self.event_target()
            .listen_once(event_type, listener, capture, scope)
    }

    /// See [`EventTarget::unlisten`].
    fn unlisten(
        &self,
        event_type: &str,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> bool {
        self.event_target()
            .unlisten(event_type, listener, capture, scope)
    }

    /// See [`EventTarget::unlisten_by_key`].
    fn unlisten_by_key(&self, key: &ListenerKey) -> bool {
        self.event_target().unlisten_by_key(key)
    }

    /// See [`EventTarget::remove_all_listeners`].
    fn remove_all_listeners(&self, event_type: Option<&str>) -> usize {
        self.event_target().remove_all_listeners(event_type)
    }

    /// See [`EventTarget::get_listeners`].
    fn get_listeners(&self, event_type: &str, capture: bool) -> Vec<ListenerRecord<P>> {
        self.event_target().get_listeners(event_type, capture)
    }

    /// See [`EventTarget::get_listener`].
    fn get_listener(
        &self,
        event_type: &str,
        listener: &Listener<P>,
        capture: bool,
        scope: Option<&Scope>,
    ) -> Option<ListenerKey> {
        self.event_target()
            .get_listener(event_type, listener, capture, scope)
    }

    /// See [`EventTarget::has_listener`].
    fn has_listener(&self, event_type: Option<&str>, capture: Option<bool>) -> bool {
        self.event_target().has_listener(event_type, capture)
    }

    /// The embedded target's parent. See [`EventTarget::parent`].
    fn parent(&self) -> Option<EventTarget<P>> {
        self.event_target().parent()
    }

    /// See [`EventTarget::dispatch`].
    fn dispatch(&self, event: impl Into<Event<P>>) -> Result<bool> {
        self.event_target().dispatch(event)
    }

    /// See [`EventTarget::fire_listeners`].
    fn fire_listeners(
        &self,
        event_type: &str,
        capture: bool,
        event: &mut Event<P>,
    ) -> Result<bool> {
        self.event_target()
            .fire_listeners(event_type, capture, event)
    }
}

impl<P> Listenable<P> for EventTarget<P> {
    fn event_target(&self) -> &EventTarget<P> {
        self
    }
}
