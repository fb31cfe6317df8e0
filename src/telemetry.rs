use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber on stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this
/// again after a subscriber is installed is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}
