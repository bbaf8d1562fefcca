use tracing_log::LogTracer;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "docenrich=info,docenrich_server=info,tower_http=info";

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Emit one JSON object per event instead of human readable lines.
    pub json_format: bool,
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub default_filter: Option<String>,
}

/// Installs the global subscriber and routes `log` records through it.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging(config: &LoggingConfig) {
    let _ = LogTracer::init();

    let default_filter = config.default_filter.as_deref().unwrap_or(DEFAULT_FILTER);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = if config.json_format {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_timer(SystemTime)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_timer(SystemTime)
            .with_target(true)
            .with_ansi(true)
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
