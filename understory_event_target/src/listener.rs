// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener handles, registration keys, and read-only listener records.
//!
//! ## Identity
//!
//! A [`Listener`] is a shared handle to a callback. Registration and removal
//! compare handles by identity, so keep a clone of the handle you registered
//! if you want to [`unlisten`](crate::target::EventTarget::unlisten) it later,
//! or hold on to the returned [`ListenerKey`].
//!
//! ## Return values
//!
//! Callbacks may return anything implementing [`IntoOutcome`]:
//! `()`, `bool` (where `false` means cancel), [`Outcome`], or a `Result` of
//! those. An `Err` aborts the dispatch and surfaces as
//! [`Error::Listener`](crate::error::Error::Listener).
//!
//! ```
//! use understory_event_target::listener::Listener;
//! use understory_event_target::target::EventTarget;
//!
//! let target: EventTarget = EventTarget::new();
//! let veto = Listener::new(|_event, _scope| false);
//! target.listen("submit", &veto, false, None).unwrap();
//! assert_eq!(target.dispatch("submit").unwrap(), false);
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use crate::event::Event;
use crate::types::{EventType, ListenFlags, Outcome, Scope, TargetId};

/// Error type a listener callback may return.
pub type ListenerError = Box<dyn core::error::Error + 'static>;

type Callback<P> = dyn Fn(&mut Event<P>, Option<&Scope>) -> Result<Outcome, ListenerError>;

/// Conversion from a callback's return value into an [`Outcome`].
pub trait IntoOutcome {
    /// Convert into an outcome, or the error that aborts the dispatch.
    fn into_outcome(self) -> Result<Outcome, ListenerError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, ListenerError> {
        Ok(Outcome::Continue)
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Result<Outcome, ListenerError> {
        Ok(if self {
            Outcome::Continue
        } else {
            Outcome::Cancel
        })
    }
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, ListenerError> {
        Ok(self)
    }
}

impl<T: IntoOutcome, E: Into<ListenerError>> IntoOutcome for Result<T, E> {
    fn into_outcome(self) -> Result<Outcome, ListenerError> {
        self.map_err(Into::into)?.into_outcome()
    }
}

/// Shared, clonable handle to a listener callback.
pub struct Listener<P = ()> {
    callback: Rc<Callback<P>>,
}

impl<P: 'static> Listener<P> {
    /// Wrap a callback.
    ///
    /// The callback receives the event record and the scope supplied at
    /// registration time, if any.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&mut Event<P>, Option<&Scope>) -> R + 'static,
        R: IntoOutcome,
    {
        let callback: Rc<Callback<P>> =
            Rc::new(move |event: &mut Event<P>, scope: Option<&Scope>| {
                f(event, scope).into_outcome()
            });
        Self { callback }
    }
}

impl<P> Listener<P> {
    /// Returns true if both handles refer to the same callback.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }

    pub(crate) fn call(
        &self,
        event: &mut Event<P>,
        scope: Option<&Scope>,
    ) -> Result<Outcome, ListenerError> {
        (self.callback)(event, scope)
    }
}

impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

/// Opaque key returned by registration, usable for removal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    pub(crate) target: TargetId,
    pub(crate) event_type: EventType,
    pub(crate) serial: u64,
}

impl ListenerKey {
    /// The target the listener was registered on.
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// The event type the listener was registered for.
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }
}

/// Read-only snapshot of a registered listener.
///
/// Returned by [`ListenerMap::get_listeners`](crate::registry::ListenerMap::get_listeners).
/// Holding a record does not keep the registration alive.
pub struct ListenerRecord<P = ()> {
    pub(crate) key: ListenerKey,
    pub(crate) flags: ListenFlags,
    pub(crate) listener: Listener<P>,
    pub(crate) scope: Option<Scope>,
}

impl<P> ListenerRecord<P> {
    /// Key of the registration.
    pub fn key(&self) -> &ListenerKey {
        &self.key
    }

    /// Event type of the registration.
    pub fn event_type(&self) -> &EventType {
        &self.key.event_type
    }

    /// Registration flags at snapshot time.
    pub fn flags(&self) -> ListenFlags {
        self.flags
    }

    /// Whether the listener runs in the capture pass.
    pub fn is_capture(&self) -> bool {
        self.flags.contains(ListenFlags::CAPTURE)
    }

    /// Whether the listener is removed on first invocation.
    pub fn is_once(&self) -> bool {
        self.flags.contains(ListenFlags::ONCE)
    }

    /// The registered callback handle.
    pub fn listener(&self) -> &Listener<P> {
        &self.listener
    }

    /// The scope supplied at registration.
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }
}

impl<P> Clone for ListenerRecord<P> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            flags: self.flags,
            listener: self.listener.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<P> fmt::Debug for ListenerRecord<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("key", &self.key)
            .field("flags", &self.flags)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
