// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event record carried through one dispatch.
//!
//! A record is created per [`EventTarget::dispatch`](crate::target::EventTarget::dispatch)
//! call, either from a bare type name or from a pre-built [`Event`]. Listeners
//! mutate it only through [`Event::stop_propagation`] and
//! [`Event::prevent_default`]; the dispatcher owns the `target`,
//! `current_target`, and `phase` fields.

use alloc::string::String;
use core::fmt;

use crate::target::EventTarget;
use crate::types::{EventType, Phase};

/// An event being dispatched, with a typed payload `P`.
pub struct Event<P = ()> {
    event_type: EventType,
    target: Option<EventTarget<P>>,
    current_target: Option<EventTarget<P>>,
    phase: Option<Phase>,
    propagation_stopped: bool,
    default_prevented: bool,
    payload: P,
}

impl<P: Default> Event<P> {
    /// Create an event of the given type with a default payload.
    pub fn new(event_type: impl Into<EventType>) -> Self {
        Self::with_payload(event_type, P::default())
    }
}

impl<P> Event<P> {
    /// Create an event of the given type carrying `payload`.
    pub fn with_payload(event_type: impl Into<EventType>, payload: P) -> Self {
        Self {
            event_type: event_type.into(),
            target: None,
            current_target: None,
            phase: None,
            propagation_stopped: false,
            default_prevented: false,
            payload,
        }
    }

    /// Set the target up front. Unset targets default to the dispatching target.
    pub fn with_target(mut self, target: &EventTarget<P>) -> Self {
        self.target = Some(target.clone());
        self
    }

    /// The event type.
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// The target the event was dispatched to.
    pub fn target(&self) -> Option<&EventTarget<P>> {
        self.target.as_ref()
    }

    /// The target whose listeners are currently running.
    pub fn current_target(&self) -> Option<&EventTarget<P>> {
        self.current_target.as_ref()
    }

    /// The phase of the listeners currently running, `None` before dispatch.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Stop propagation: no further targets or phases run for this dispatch.
    ///
    /// Listeners already snapshotted for the current target and phase still run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Mark the event canceled; dispatch then returns `false`.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether [`Event::stop_propagation`] was called.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Whether [`Event::prevent_default`] was called.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Mutably borrow the payload.
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Consume the record, returning its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }

    pub(crate) fn default_target(&mut self, target: &EventTarget<P>) {
        if self.target.is_none() {
            self.target = Some(target.clone());
        }
    }

    pub(crate) fn enter(&mut self, current: &EventTarget<P>, phase: Phase) {
        self.current_target = Some(current.clone());
        self.phase = Some(phase);
    }
}

impl<P: Default> From<&str> for Event<P> {
    fn from(event_type: &str) -> Self {
        Self::new(event_type)
    }
}

impl<P: Default> From<String> for Event<P> {
    fn from(event_type: String) -> Self {
        Self::new(event_type)
    }
}

impl<P: Default> From<EventType> for Event<P> {
    fn from(event_type: EventType) -> Self {
        Self::new(event_type)
    }
}

impl<P: fmt::Debug> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("target", &self.target.as_ref().map(EventTarget::id))
            .field(
                "current_target",
                &self.current_target.as_ref().map(EventTarget::id),
            )
            .field("phase", &self.phase)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("default_prevented", &self.default_prevented)
            .field("payload", &self.payload)
            .finish()
    }
}
