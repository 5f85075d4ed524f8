use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок реестра (object-safe).
///
/// Даёт единый способ узнать код статуса и безопасное для вызывающей
/// стороны сообщение, а также выполнить downcast к конкретному типу через
/// [`ErrorExt::as_any`].
pub trait ErrorExt: Error + Send + Sync + 'static {
    fn status_code(&self) -> StatusCode;

    /// Возвращает ошибку как [`Any`] для downcast.
    fn as_any(&self) -> &dyn Any;

    /// Короткое сообщение без внутренних деталей. По умолчанию совпадает с
    /// `Display`.
    fn client_message(&self) -> String {
        self.to_string()
    }
}
