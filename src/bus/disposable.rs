use std::{fmt, sync::Arc};

use parking_lot::Mutex;

use super::HandlerId;

type Release = Box<dyn FnOnce(&str) -> bool + Send>;

/// Одноразовая capability на снятие подписки.
///
/// Выдаётся `on`/`once` и снимает ровно ту запись, для которой была выдана.
/// Повторный `dispose` безопасен и ничего не делает. `Drop` подписку не
/// снимает: брошенный `Disposable` оставляет обработчик зарегистрированным.
///
/// Реестр удерживается через `Weak`, поэтому `Disposable` может пережить
/// сам `EventBus`.
pub struct Disposable {
    channel: Arc<str>,
    handler_id: HandlerId,
    release: Mutex<Option<Release>>,
}

impl Disposable {
    pub(crate) fn new<F>(
        channel: Arc<str>,
        handler_id: HandlerId,
        release: F,
    ) -> Self
    where
        F: FnOnce(&str) -> bool + Send + 'static,
    {
        Self {
            channel,
            handler_id,
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Снимает подписку.
    ///
    /// Возвращает `true` только на том вызове, который действительно удалил
    /// запись. `false` — если подписка уже снята (`off`, `off_all`,
    /// `destroy`, сработавший `once` или предыдущий `dispose`).
    pub fn dispose(&self) -> bool {
        match self.release.lock().take() {
            Some(release) => release(&self.channel),
            None => false,
        }
    }

    /// Был ли уже вызван `dispose`.
    pub fn is_disposed(&self) -> bool {
        self.release.lock().is_none()
    }

    pub fn channel(&self) -> &Arc<str> {
        &self.channel
    }

    pub fn handler_id(&self) -> HandlerId {
        self.handler_id
    }
}

impl fmt::Debug for Disposable {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("channel", &self.channel)
            .field("handler_id", &self.handler_id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl From<&Disposable> for HandlerId {
    fn from(disposable: &Disposable) -> Self {
        disposable.handler_id
    }
}
