// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by the event target.
//!
//! Absence is never an error: removing an unknown listener or querying an
//! unknown type yields `false`, `0`, `None`, or an empty list.

use thiserror::Error;

use crate::listener::ListenerError;
use crate::types::{EventType, TargetId};

/// Result alias for fallible event target operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Event target errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The target was disposed; `listen`, `listen_once`, and `dispatch` are rejected.
    #[error("event target {target} is disposed")]
    Disposed {
        /// The disposed target.
        target: TargetId,
    },

    /// Walking parent links exceeded the ancestor cap.
    #[error("ancestor chain of event target {target} exceeds {limit} entries (parent cycle)")]
    CycleDetected {
        /// The target whose dispatch was aborted.
        target: TargetId,
        /// The cap that was exceeded.
        limit: usize,
    },

    /// A listener callback returned an error; remaining listeners were not run.
    #[error("listener for `{event_type}` failed")]
    Listener {
        /// Type of the event being dispatched.
        event_type: EventType,
        /// The error returned by the callback.
        #[source]
        source: ListenerError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::string::ToString;
    use core::error::Error as _;

    #[test]
    fn display_mentions_target() {
        let id = TargetId::next();
        let err = Error::Disposed { target: id };
        assert_eq!(err.to_string(), alloc::format!("event target {id} is disposed"));
    }

    #[test]
    fn listener_error_keeps_source() {
        let err = Error::Listener {
            event_type: EventType::from("save"),
            source: Box::from("disk full"),
        };
        assert_eq!(err.to_string(), "listener for `save` failed");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
    }
}
