use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize structured logging.
/// Emits JSON to stdout; `RUST_LOG` controls the level.
pub fn init_telemetry() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    // The `log` records from LoggerMiddleware and actix's Logger are bridged
    // by tracing-subscriber's default `tracing-log` feature.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .init();
}
