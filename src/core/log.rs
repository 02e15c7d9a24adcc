use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber on stderr.
///
/// `RUST_LOG` takes precedence. Otherwise only warnings are shown, or debug output
/// from this crate when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let directives = if verbose { "warn,stockpulse=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    fmt()
        .pretty()
        .without_time()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
