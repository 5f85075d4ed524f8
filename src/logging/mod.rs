//! Консольное логирование на `tracing-subscriber`.
//!
//! Библиотека сама subscriber не ставит: вызовите [`init_logging`] в
//! приложении или подключите собственный.

pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zevent_error::{BusError, ResultExt, ZeventResult};

/// Устанавливает глобальный subscriber.
///
/// Повторный вызов не паникует, а возвращает `BusError::LoggingInit`.
pub fn init_logging(config: LoggingConfig) -> ZeventResult<()> {
    config.validate().context("validating logging config")?;

    let filter = filters::build_filter(&config);
    let layer = formatter::build_layer(&config);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| BusError::LoggingInit {
            reason: err.to_string(),
        })?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = ?config.format,
        "logging initialized"
    );
    Ok(())
}
