use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use dashmap::DashMap;

use super::{ErrorHandler, Handler};

/// Карта подписок: имя канала → записи в порядке регистрации.
pub(crate) type ChannelMap<A, R, E> = DashMap<Arc<str>, Vec<Entry<A, R, E>>>;

/// Состояние записи, общее для карты, снимков доставки и `Disposable`.
#[derive(Debug)]
pub(crate) struct EntryState {
    once: bool,
    retired: AtomicBool,
}

impl EntryState {
    pub(crate) fn new(once: bool) -> Self {
        Self {
            once,
            retired: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_once(&self) -> bool {
        self.once
    }

    /// Помечает запись снятой. `true` только для вызова, который снял её
    /// первым.
    pub(crate) fn retire(&self) -> bool {
        !self.retired.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

/// Запись канала: обработчик, необязательный error-обработчик и состояние.
pub(crate) struct Entry<A, R, E> {
    pub(crate) handler: Handler<A, R>,
    pub(crate) on_error: Option<ErrorHandler<E>>,
    pub(crate) state: Arc<EntryState>,
}

impl<A, R, E> Clone for Entry<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            on_error: self.on_error.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

/// Удаляет из канала запись с данным состоянием (по указателю).
///
/// Канал остаётся в карте даже пустым.
pub(crate) fn remove_state<A, R, E>(
    channels: &ChannelMap<A, R, E>,
    channel: &str,
    state: &Arc<EntryState>,
) -> bool {
    let Some(mut entries) = channels.get_mut(channel) else {
        return false;
    };
    let before = entries.len();
    entries.retain(|entry| !Arc::ptr_eq(&entry.state, state));
    before != entries.len()
}
