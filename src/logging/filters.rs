use tracing_subscriber::EnvFilter;

use super::LoggingConfig;

/// `RUST_LOG`, если задан, иначе уровень из конфигурации.
pub(crate) fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}
