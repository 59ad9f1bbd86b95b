// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Event Target: a deterministic, `no_std` hierarchical event dispatcher.
//!
//! ## Overview
//!
//! An [`EventTarget`](crate::target::EventTarget) owns a per-type listener registry and an optional
//! link to a parent target. Dispatching an event walks the parent links and runs listeners
//! capture → target → bubble, the same propagation model a DOM uses, without any DOM.
//!
//! ## Listeners
//!
//! A [`Listener`](crate::listener::Listener) is a shared handle to a callback taking the
//! [`Event`](crate::event::Event) record and the optional [`Scope`](crate::types::Scope) supplied
//! at registration. Registration is idempotent per `(listener, capture, scope)` and returns a
//! [`ListenerKey`](crate::listener::ListenerKey) for removal.
//! [`listen_once`](crate::target::EventTarget::listen_once) entries are removed right before they run.
//!
//! ## Propagation and cancellation
//!
//! - [`Event::stop_propagation`](crate::event::Event::stop_propagation) ends the walk after the
//!   current target's listeners for the current pass.
//! - [`Event::prevent_default`](crate::event::Event::prevent_default), or a callback returning
//!   `false` / [`Outcome::Cancel`](crate::types::Outcome::Cancel), makes
//!   [`dispatch`](crate::target::EventTarget::dispatch) return `false` but does not stop propagation.
//!
//! ## Hierarchy
//!
//! Parent links are non-owning and set explicitly with
//! [`set_parent`](crate::target::EventTarget::set_parent). Chains longer than
//! [`MAX_ANCESTORS`](crate::types::MAX_ANCESTORS) are treated as cycles and fail with
//! [`Error::CycleDetected`](crate::error::Error::CycleDetected).
//!
//! ## Composition
//!
//! Types that need event capability embed an `EventTarget` and implement
//! [`Listenable`](crate::listenable::Listenable) to expose the listener API.
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_event_target::event::Event;
//! use understory_event_target::listener::Listener;
//! use understory_event_target::target::EventTarget;
//!
//! let window: EventTarget = EventTarget::new();
//! let button: EventTarget = EventTarget::new();
//! button.set_parent(Some(&window));
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let l = log.clone();
//! let record = Listener::new(move |e: &mut Event, _| l.borrow_mut().push(e.phase()));
//! window.listen("click", &record, true, None).unwrap();
//! window.listen("click", &record, false, None).unwrap();
//! button.listen("click", &record, false, None).unwrap();
//!
//! assert!(button.dispatch("click").unwrap());
//! use understory_event_target::types::Phase::*;
//! assert_eq!(*log.borrow(), vec![Some(Capture), Some(Target), Some(Bubble)]);
//! ```
//!
//! ## Features
//!
//! This crate is `no_std` and uses `alloc`. Enable `std` to turn on `std`
//! support in `tracing` and `thiserror`. Diagnostics are emitted through
//! `tracing`; install a subscriber in the host application to see them.

#![no_std]

extern crate alloc;

pub mod error;
pub mod event;
pub mod listenable;
pub mod listener;
pub mod registry;
pub mod target;
pub mod types;

pub use error::{Error, Result};
