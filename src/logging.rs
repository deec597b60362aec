//! Tracing bootstrap for the CLI binary, reading `LOGLEVEL` the way the
//! source's `logconfig.py` reads it for the stdlib `logging` module.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. Safe to call once per
/// process; subsequent calls are a no-op if a subscriber is already set.
pub fn init() {
    let filter = EnvFilter::try_from_env("LOGLEVEL")
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("static fallback filter always parses");

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
