// 📝 Logging - tracing subscriber for the CLI
//
// Level comes from RUST_LOG, falling back to info for this crate.
// Output goes to stderr so report text on stdout stays clean.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "building_reconcile=info";

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("building_reconcile=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
