//! Process-wide logging setup (spec.md §9: "injected logging trait or
//! process-wide logger initialised once"). Every crate in the workspace
//! logs through `tracing::{debug,info,warn,error}` call sites; nothing
//! below this crate owns a global subscriber.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a process-wide `tracing` subscriber, reading the `RUST_LOG`
/// environment variable for filtering (default `info`). Safe to call more
/// than once; only the first call takes effect.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}
