use std::{fmt, panic::Location, sync::Arc};

use crate::{ErrorExt, StatusCode};

/// Ошибка с цепочкой контекстов.
///
/// Корневая ошибка и контексты лежат за `Arc`, поэтому `StackError`
/// дёшево клонируется. Это важно для канала ошибок: одно и то же значение
/// передаётся каждому error-обработчику и в отклонённые promise.
#[derive(Clone)]
pub struct StackError {
    inner: Arc<dyn ErrorExt>,
    contexts: Arc<Vec<ErrorContext>>,
}

/// Контекст ошибки с местом вызова.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub message: String,
    pub location: Option<&'static Location<'static>>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StackError {
    #[track_caller]
    pub fn new<E: ErrorExt>(err: E) -> Self {
        Self {
            inner: Arc::new(err),
            contexts: Arc::new(Vec::new()),
        }
    }

    /// Добавляет контекст, запоминая место вызова.
    #[track_caller]
    pub fn context(
        mut self,
        msg: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.contexts).push(ErrorContext {
            message: msg.into(),
            location: Some(Location::caller()),
        });
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    pub fn client_message(&self) -> String {
        self.inner.client_message()
    }

    pub fn contexts(&self) -> &[ErrorContext] {
        &self.contexts
    }

    /// Попытка downcast корневой ошибки к конкретному типу.
    pub fn downcast_ref<T: ErrorExt>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    fn format_contexts(&self) -> Vec<String> {
        self.contexts
            .iter()
            .map(|ctx| match ctx.location {
                Some(loc) => format!("{} ({}:{})", ctx.message, loc.file(), loc.line()),
                None => ctx.message.clone(),
            })
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StackError
////////////////////////////////////////////////////////////////////////////////

impl fmt::Debug for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut debug = f.debug_struct("StackError");
        debug.field("inner", &self.inner.to_string());
        debug.field("status_code", &self.status_code());
        if !self.contexts.is_empty() {
            debug.field("contexts", &self.format_contexts());
        }
        debug.finish()
    }
}

impl fmt::Display for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.contexts.is_empty() {
            return write!(f, "{}", self.inner);
        }
        let contexts: Vec<&str> = self.contexts.iter().map(|c| c.message.as_str()).collect();
        write!(f, "{}: {}", contexts.join(" → "), self.inner)
    }
}

impl std::error::Error for StackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl<E: ErrorExt> From<E> for StackError {
    #[track_caller]
    fn from(e: E) -> Self {
        StackError::new(e)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BusError;

    #[test]
    fn test_context_chain() {
        let err = BusError::PromiseAbandoned {
            channel: "jobs".to_string(),
        };
        let stack = StackError::new(err)
            .context("waiting for job result")
            .context("worker loop");

        assert_eq!(stack.contexts().len(), 2);
        assert_eq!(stack.contexts()[0].message, "waiting for job result");
        assert!(stack.contexts()[0].location.is_some());
        assert_eq!(stack.status_code(), StatusCode::Abandoned);
    }

    #[test]
    fn test_downcast() {
        let stack = StackError::new(BusError::InvalidConfig {
            field: "faults".to_string(),
            reason: "unknown policy".to_string(),
        });
        assert!(stack.downcast_ref::<BusError>().is_some());
    }

    /// Тест проверяет, что клоны разделяют корневую ошибку, а контекст,
    /// добавленный к клону, не попадает в оригинал.
    #[test]
    fn test_clone_is_independent() {
        let original = StackError::new(BusError::PromiseAbandoned {
            channel: "a".to_string(),
        });
        let extended = original.clone().context("extra");
        assert!(original.contexts().is_empty());
        assert_eq!(extended.contexts().len(), 1);
        assert_eq!(original.to_string(), "promise abandoned on channel 'a'");
        assert_eq!(
            extended.to_string(),
            "extra: promise abandoned on channel 'a'"
        );
    }
}
