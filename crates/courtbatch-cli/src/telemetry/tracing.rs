//! Tracing initialization and configuration.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the tracing subscriber for structured logging.
///
/// The filter comes from `RUST_LOG`. If not set, defaults to `info`, or
/// `debug` when `debug` is set.
///
/// ```bash
/// RUST_LOG=debug courtbatch scrape ...
/// RUST_LOG=courtbatch_runtime::wait=debug,courtbatch_opendal=warn courtbatch scrape ...
/// ```
pub(super) fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let env_filter = create_env_filter(debug)?;
    let fmt_layer = create_fmt_layer();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

/// Creates an environment filter for tracing.
fn create_env_filter(debug: bool) -> anyhow::Result<EnvFilter> {
    let default = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))
}

/// Creates a formatted tracing layer.
fn create_fmt_layer() -> fmt::Layer<tracing_subscriber::Registry> {
    fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
}
