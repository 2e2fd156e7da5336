//! Tracing initialization for embedding services.
//!
//! The library logs through `tracing` spans; the db layer uses the `log`
//! facade. `init` installs a subscriber covering both so a host service
//! gets one coherent stream. Call it once at startup; repeated calls are
//! no-ops.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber with an `RUST_LOG`-style filter,
/// defaulting to `info` for this crate. Safe to call more than once.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Bridge `log` records (db layer, dependencies) into tracing.
    let _ = tracing_log::LogTracer::init();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// `init` with the crate-level default filter.
pub fn init_default() {
    init("cvintake=info");
}
