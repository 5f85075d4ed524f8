use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Счётчик идентификаторов обработчиков. Общий на процесс, поэтому
/// `HandlerId` уникален между всеми экземплярами `EventBus`.
static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Идентичность обработчика.
///
/// Выдаётся при создании [`Handler`] и переживает его клонирование:
/// два клона одного `Handler` считаются одним и тем же обработчиком.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Обработчик событий канала: `Fn(&A) -> R` плюс [`HandlerId`].
///
/// Замыкание, переданное в [`EventBus::on`](crate::EventBus::on), каждый
/// раз становится новым обработчиком. Чтобы зарегистрировать *тот же*
/// обработчик повторно (или снять его по ссылке), создайте `Handler` явно и
/// передавайте его клоны.
pub struct Handler<A, R = ()> {
    id: HandlerId,
    func: Arc<dyn Fn(&A) -> R + Send + Sync>,
}

impl<A, R> Handler<A, R> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        Self {
            id: HandlerId::next(),
            func: Arc::new(func),
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Вызывает обработчик напрямую, минуя реестр.
    pub fn call(
        &self,
        args: &A,
    ) -> R {
        (self.func)(args)
    }
}

impl<A, R> Clone for Handler<A, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Arc::clone(&self.func),
        }
    }
}

impl<A, R> fmt::Debug for Handler<A, R> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id).finish()
    }
}

impl<A, R, F> From<F> for Handler<A, R>
where
    F: Fn(&A) -> R + Send + Sync + 'static,
{
    fn from(func: F) -> Self {
        Self::new(func)
    }
}

impl<A, R> From<&Handler<A, R>> for HandlerId {
    fn from(handler: &Handler<A, R>) -> Self {
        handler.id
    }
}

/// Обработчик канала ошибок. Получает единственное значение сбоя.
pub struct ErrorHandler<E> {
    func: Arc<dyn Fn(&E) + Send + Sync>,
}

impl<E> ErrorHandler<E> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    pub fn call(
        &self,
        reason: &E,
    ) {
        (self.func)(reason)
    }
}

impl<E> Clone for ErrorHandler<E> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<E> fmt::Debug for ErrorHandler<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("ErrorHandler")
    }
}

impl<E, F> From<F> for ErrorHandler<E>
where
    F: Fn(&E) + Send + Sync + 'static,
{
    fn from(func: F) -> Self {
        Self::new(func)
    }
}
