// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the event target: event types, phases, outcomes, flags, scopes, and ids.
//!
//! ## Overview
//!
//! These types describe the listener protocol and its inputs/outputs.
//! They are referenced by the [`registry`](crate::registry) and the
//! [`target`](crate::target) dispatcher, and used by downstream toolkits.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;
use core::borrow::Borrow;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Upper bound on the number of ancestors collected for one dispatch.
///
/// A longer parent chain can only come from a reference cycle, so
/// [`EventTarget::dispatch`](crate::target::EventTarget::dispatch) fails with
/// [`Error::CycleDetected`](crate::error::Error::CycleDetected) instead of
/// walking it.
pub const MAX_ANCESTORS: usize = 1000;

/// Name of an event, used as the registry key.
///
/// Names built with [`EventType::from_static`] are stored without allocating;
/// conversions from `&str` and `String` own their text.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    /// Create an event type from a static string without allocating.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// The event type as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self(Cow::Owned(String::from(name)))
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&Self> for EventType {
    fn from(ty: &Self) -> Self {
        ty.clone()
    }
}

impl AsRef<str> for EventType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// Ord on `Cow<str>` follows `str`, so map lookups by `&str` are consistent.
impl Borrow<str> for EventType {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phases of event propagation.
///
/// Recorded on the [`Event`](crate::event::Event) while its listeners run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Root-to-parent traversal, running capture listeners.
    Capture,
    /// The dispatch target itself, running capture then bubble listeners.
    Target,
    /// Parent-to-root traversal, running bubble listeners.
    Bubble,
}

/// Listener outcome contributing to the dispatch return value.
///
/// `Cancel` only affects the value returned by
/// [`EventTarget::dispatch`](crate::target::EventTarget::dispatch); it does not
/// stop propagation. Use [`Event::stop_propagation`](crate::event::Event::stop_propagation)
/// for that.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Outcome {
    /// Keep the default action.
    #[default]
    Continue,
    /// Signal cancellation, equivalent to a handler returning `false`.
    Cancel,
}

bitflags::bitflags! {
    /// Registration flags of a listener entry.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct ListenFlags: u8 {
        /// Run during the capture pass instead of the bubble pass.
        const CAPTURE = 1 << 0;
        /// Remove the entry right before its first invocation.
        const ONCE = 1 << 1;
    }
}

impl ListenFlags {
    pub(crate) fn new(capture: bool, once: bool) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::CAPTURE, capture);
        flags.set(Self::ONCE, once);
        flags
    }
}

/// Invocation scope captured at registration and passed to the listener at call time.
///
/// Scopes compare by identity: two clones of the same `Scope` are equal, two
/// scopes built from equal values are not.
#[derive(Clone)]
pub struct Scope(Rc<dyn Any>);

impl Scope {
    /// Wrap a value as a listener scope.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Borrow the scope value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Returns true if both handles refer to the same scope value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    pub(crate) fn same(a: Option<&Self>, b: Option<&Self>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scope")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Process-unique identity of an [`EventTarget`](crate::target::EventTarget).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(u64);

impl TargetId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
