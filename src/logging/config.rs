use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use zevent_error::{ensure, BusError, ZeventResult};

/// Формат строк лога.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Настройки консольного логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Директива фильтра: `info`, `zevent=trace,warn` и т.п.
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            with_ansi: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(
        mut self,
        level: impl Into<String>,
    ) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(
        mut self,
        format: LogFormat,
    ) -> Self {
        self.format = format;
        self
    }

    /// Проверяет, что `level` — корректная директива `EnvFilter`.
    pub fn validate(&self) -> ZeventResult<()> {
        ensure!(
            !self.level.trim().is_empty(),
            BusError::InvalidConfig {
                field: "level".to_string(),
                reason: "log level is empty".to_string(),
            }
        );
        if let Err(err) = EnvFilter::try_new(&self.level) {
            return Err(BusError::InvalidConfig {
                field: "level".to_string(),
                reason: err.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
