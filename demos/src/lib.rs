// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared setup for the Understory event target demos.

/// Install a `tracing` subscriber for the demo binaries.
///
/// `RUST_LOG` overrides the default filter, e.g. `RUST_LOG=understory_event_target=trace`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("info,understory_event_target=debug")
        });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
