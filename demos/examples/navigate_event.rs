// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed event payloads.
//!
//! A history-style `navigate` event carries the new token and whether the
//! change came from browser-like navigation. A `Router` type embeds an
//! `EventTarget` and exposes it through `Listenable`; listeners veto
//! navigation by returning `false` and a one-shot listener logs the first hit.
//!
//! Run:
//! - `cargo run -p understory_demos --example navigate_event`

use std::cell::RefCell;

use understory_event_target::event::Event;
use understory_event_target::listenable::Listenable;
use understory_event_target::listener::Listener;
use understory_event_target::target::EventTarget;
use understory_event_target::types::EventType;

const NAVIGATE: EventType = EventType::from_static("navigate");

#[derive(Clone, Debug, Default)]
struct Navigate {
    token: String,
    is_navigation: bool,
}

struct Router {
    token: RefCell<String>,
    events: EventTarget<Navigate>,
}

impl Listenable<Navigate> for Router {
    fn event_target(&self) -> &EventTarget<Navigate> {
        &self.events
    }
}

impl Router {
    fn new() -> Self {
        Self {
            token: RefCell::new(String::new()),
            events: EventTarget::new(),
        }
    }

    /// Move to `token` unless a listener cancels; returns whether it moved.
    fn set_token(&self, token: &str, is_navigation: bool) -> bool {
        let event = Event::with_payload(
            NAVIGATE,
            Navigate {
                token: token.to_owned(),
                is_navigation,
            },
        );
        let (proceed, event) = self.events.dispatch_event(event).unwrap();
        if proceed {
            *self.token.borrow_mut() = event.into_payload().token;
        }
        proceed
    }
}

fn main() {
    understory_demos::init_logging();

    let router = Router::new();

    let guard = Listener::new(|e: &mut Event<Navigate>, _| {
        let blocked = e.payload().token.starts_with("admin");
        if blocked {
            tracing::info!(token = %e.payload().token, "navigation blocked");
        }
        !blocked
    });
    router.listen(NAVIGATE, &guard, false, None).unwrap();

    let first = Listener::new(|e: &mut Event<Navigate>, _| {
        println!("  first navigation: {:?}", e.payload());
    });
    router.listen_once(NAVIGATE, &first, false, None).unwrap();

    for (token, is_navigation) in [("home", false), ("admin/users", true), ("about", true)] {
        let moved = router.set_token(token, is_navigation);
        println!(
            "  set_token({token:?}) -> moved={moved}, current={:?}",
            router.token.borrow()
        );
    }
}
