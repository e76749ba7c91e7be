use tracing_subscriber::{fmt, EnvFilter};

/// Initialize structured logging with environment filter.
/// Set VN_LOG=debug (or trace, info, warn, error) for verbosity control.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Same, with a configurable fallback filter for when VN_LOG is unset.
pub fn init_logging_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_env("VN_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}
