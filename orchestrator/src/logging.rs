use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;

const LOG_ENV: &str = "SUMMLE_LOG";

/// Sets up the global subscriber.
/// Directives are read from `SUMMLE_LOG` (e.g., `SUMMLE_LOG=orchestrator=debug`), `info` otherwise.
/// Spans of the puzzles being processed are shown as progress spinners.
pub fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV.to_string())
        .from_env_lossy();

    let indicatif_layer = tracing_indicatif::IndicatifLayer::new();

    let fmt_layer = fmt::layer()
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_span_events(FmtSpan::ENTER);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(indicatif_layer)
        .init();
}
