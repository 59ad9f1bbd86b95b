// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event target basics.
//!
//! This minimal example links three targets into a chain, registers a capture
//! and a bubble listener on each, and prints the capture → target → bubble order.
//! It then stops propagation halfway down and shows the effect.
//!
//! Run:
//! - `cargo run -p understory_demos --example event_target_basics`

use understory_event_target::event::Event;
use understory_event_target::listener::Listener;
use understory_event_target::target::EventTarget;
use understory_event_target::types::Scope;

fn main() {
    understory_demos::init_logging();

    let window: EventTarget = EventTarget::new();
    let panel: EventTarget = EventTarget::new();
    let button: EventTarget = EventTarget::new();
    panel.set_parent(Some(&window));
    button.set_parent(Some(&panel));

    // One callback, told apart by the scope supplied at registration.
    let print = Listener::new(|e: &mut Event, scope: Option<&Scope>| {
        let name = scope
            .and_then(Scope::downcast_ref::<&'static str>)
            .copied()
            .unwrap_or("?");
        println!("  {:<8} {:?}", name, e.phase().unwrap());
    });
    for (target, name) in [(&window, "window"), (&panel, "panel"), (&button, "button")] {
        let scope = Scope::new(name);
        target.listen("click", &print, true, Some(&scope)).unwrap();
        target.listen("click", &print, false, Some(&scope)).unwrap();
    }

    println!("== Dispatch (capture → target → bubble) ==");
    let not_canceled = button.dispatch("click").unwrap();
    println!("  not canceled: {not_canceled}");

    // The panel swallows clicks during capture.
    let swallow = Listener::new(|e: &mut Event, _| {
        e.stop_propagation();
        e.prevent_default();
    });
    panel.listen("click", &swallow, true, None).unwrap();

    println!("== Dispatch with propagation stopped at panel ==");
    let not_canceled = button.dispatch("click").unwrap();
    println!("  not canceled: {not_canceled}");

    button.dispose();
    println!("== Dispatch after dispose ==");
    match button.dispatch("click") {
        Ok(v) => println!("  unexpected: {v}"),
        Err(err) => println!("  error: {err}"),
    }
}
