//! Log subscriber setup.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a `-v` count.
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` replaces the filter chosen by `-v` when it is set.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
