use envconf::keys::{APP_ENV, LOG_LEVEL};
use envconf::settings::{is_development, is_production};
use envconf::{LogLevel, ResolvedConfig};
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Log level from the resolved `LOG_LEVEL`; an unusable value falls back to
/// DEBUG in development and INFO elsewhere
pub fn log_level_for(config: &ResolvedConfig) -> LogLevel {
    let app_env = config.value(APP_ENV);
    config.value(LOG_LEVEL).parse().unwrap_or(if is_development(&app_env) {
        LogLevel::Debug
    } else {
        LogLevel::Info
    })
}

/// Subscriber for the start-up phase, before `LOG_LEVEL` has been resolved.
/// Only `RUST_LOG` can raise it above WARN. Output goes to stderr.
pub fn bootstrap_subscriber() -> impl Subscriber + Send + Sync {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

/// Install the global subscriber. `RUST_LOG` overrides the resolved level;
/// production gets JSON lines. Output goes to stderr.
pub fn init_logging(config: &ResolvedConfig) {
    let level = log_level_for(config);
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level.as_tracing_level()).into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if is_production(&config.value(APP_ENV)) {
        builder.json().init();
    } else {
        builder.init();
    }
}
