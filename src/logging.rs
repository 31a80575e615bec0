//! Tracing setup for binaries and tests that embed this library.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a `tracing` subscriber that reads its filter from `RUST_LOG`,
/// defaulting to `info`.
///
/// Does nothing if a global subscriber has already been set, so it is safe
/// to call from multiple tests.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}
