//! Structured JSON logging shared by both Lambda binaries.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "info";

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
///
/// CloudWatch stamps every line, so the formatter omits its own timestamp.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_target(false)
                .with_ansi(false)
                .without_time(),
        )
        .try_init();
}
