//! Diagnostic logging.
//!
//! Events go to stderr through `tracing-subscriber`. `RUST_LOG` takes
//! precedence; otherwise only warnings are shown, or everything from debug
//! up with `--verbose`.

use std::io;

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber; later calls are no-ops
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
