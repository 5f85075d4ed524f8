use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки реестра событий.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Обработчик запаниковал во время доставки
    HandlerPanicked {
        channel: String,
        handler_id: u64,
        message: String,
    },
    /// Подписка promise была снята раньше, чем пришло событие или ошибка
    PromiseAbandoned { channel: String },
    /// Некорректное значение в конфигурации
    InvalidConfig { field: String, reason: String },
    /// Не удалось собрать конфигурацию из источников
    ConfigLoad { reason: String },
    /// Не удалось установить глобальный tracing subscriber
    LoggingInit { reason: String },
}

impl std::fmt::Display for BusError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::HandlerPanicked {
                channel,
                handler_id,
                message,
            } => write!(
                f,
                "handler #{handler_id} panicked on channel '{channel}': {message}"
            ),
            Self::PromiseAbandoned { channel } => {
                write!(f, "promise abandoned on channel '{channel}'")
            }
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid config value for '{field}': {reason}")
            }
            Self::ConfigLoad { reason } => write!(f, "failed to load config: {reason}"),
            Self::LoggingInit { reason } => write!(f, "failed to init logging: {reason}"),
        }
    }
}

impl std::error::Error for BusError {}

impl ErrorExt for BusError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerPanicked { .. } => StatusCode::HandlerPanicked,
            Self::PromiseAbandoned { .. } => StatusCode::Abandoned,
            Self::InvalidConfig { .. } => StatusCode::InvalidConfig,
            Self::ConfigLoad { .. } => StatusCode::ConfigLoad,
            Self::LoggingInit { .. } => StatusCode::LoggingInit,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::HandlerPanicked { channel, .. } => format!("handler failed on '{channel}'"),
            _ => self.to_string(),
        }
    }
}
