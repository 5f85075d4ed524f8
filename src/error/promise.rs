use std::sync::Arc;

use thiserror::Error;
use zevent_error::{BusError, StackError};

/// Чем закончилось ожидание promise, если не значением.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromiseError<E> {
    /// На канал пришла ошибка раньше, чем событие.
    #[error("promise rejected")]
    Rejected(E),

    /// Подписка снята (`off_all`, `destroy`, удаление шины) до того, как
    /// что-либо пришло.
    #[error("promise abandoned on channel '{channel}'")]
    Abandoned { channel: Arc<str> },
}

impl<E> PromiseError<E> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Значение отказа, если promise был отклонён.
    pub fn into_reason(self) -> Option<E> {
        match self {
            Self::Rejected(reason) => Some(reason),
            Self::Abandoned { .. } => None,
        }
    }
}

impl From<PromiseError<StackError>> for StackError {
    fn from(err: PromiseError<StackError>) -> Self {
        match err {
            PromiseError::Rejected(reason) => reason,
            PromiseError::Abandoned { channel } => StackError::new(BusError::PromiseAbandoned {
                channel: channel.to_string(),
            }),
        }
    }
}
