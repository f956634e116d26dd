use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PAGECRAFT_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global subscriber. Filter directives come from
/// `PAGECRAFT_LOG`, then `RUST_LOG`, then default to `info`. Calling this
/// twice is harmless.
pub fn init() {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
