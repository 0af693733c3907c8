use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static TRACING_INIT: Once = Once::new();

/// Installs the stderr subscriber. Standard output is reserved for script
/// errors, so nothing here ever writes to it.
///
/// Filter with `RUST_LOG`, e.g. `RUST_LOG=script_canvas=debug`. Defaults to `warn`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
