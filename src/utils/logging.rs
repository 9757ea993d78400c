//! Diagnostic logging to stderr. The report itself goes to stdout.

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level`; with neither set only warnings and errors
/// are shown. Calling this twice is harmless.
pub fn init(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LEVEL)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
