use std::{fmt, sync::Arc};

use dashmap::DashMap;
use tracing::debug;
use zevent_error::StackError;

use super::{
    entry::{remove_state, ChannelMap, Entry, EntryState},
    BusCounters, BusStats, Disposable, ErrorHandler, Handler, HandlerId,
};
use crate::{config::DuplicatePolicy, Args, BusConfig, Payload};

/// Реестр каналов с синхронной fan-out доставкой.
///
/// - `A`: аргументы одного вызова (по умолчанию динамический [`Args`]);
/// - `R`: результат обработчика (по умолчанию [`Payload`]);
/// - `E`: значение сбоя для канала ошибок (по умолчанию [`StackError`]).
///
/// Обработчики вызываются в потоке вызывающего, в порядке регистрации.
/// Во время вызова обработчика шина не держит блокировок, поэтому
/// обработчик может подписываться, отписываться и публиковать в ту же шину.
pub struct EventBus<A = Args, R = Payload, E = StackError> {
    pub(crate) channels: Arc<ChannelMap<A, R, E>>,
    pub(crate) config: BusConfig,
    pub(crate) counters: BusCounters,
}

impl<A, R, E> EventBus<A, R, E>
where
    A: 'static,
    R: 'static,
    E: 'static,
{
    /// Создаёт пустую шину с конфигурацией по умолчанию.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            config,
            counters: BusCounters::default(),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn stats(&self) -> BusStats {
        self.counters.snapshot()
    }

    // -------------------------------------------------------------------------
    //  Подписка
    // -------------------------------------------------------------------------

    /// Регистрирует обработчик на канале. Канал создаётся при первом
    /// обращении.
    pub fn on<F>(
        &self,
        channel: &str,
        handler: F,
    ) -> Disposable
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.attach(channel, Handler::new(handler), None, false)
    }

    /// Как [`on`](Self::on), плюс обработчик для [`error`](Self::error).
    pub fn on_with_error<F, G>(
        &self,
        channel: &str,
        handler: F,
        on_error: G,
    ) -> Disposable
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
        G: Fn(&E) + Send + Sync + 'static,
    {
        self.attach(
            channel,
            Handler::new(handler),
            Some(ErrorHandler::new(on_error)),
            false,
        )
    }

    /// Регистрирует уже созданный [`Handler`], сохраняя его идентичность.
    ///
    /// При [`DuplicatePolicy::Collapse`] повторная регистрация того же
    /// обработчика на том же канале не создаёт новую запись: возвращается
    /// `Disposable` для существующей.
    /// Флаг одноразовости и `on_error` существующей записи при этом
    /// сохраняются, переданные значения игнорируются.
    pub fn on_handler(
        &self,
        channel: &str,
        handler: &Handler<A, R>,
        on_error: Option<ErrorHandler<E>>,
    ) -> Disposable {
        self.attach(channel, handler.clone(), on_error, false)
    }

    /// Одноразовая подписка.
    ///
    /// Запись снимается с канала до вызова обработчика, поэтому повторная
    /// публикация в тот же канал изнутри обработчика его уже не увидит.
    pub fn once<F>(
        &self,
        channel: &str,
        handler: F,
    ) -> Disposable
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.attach(channel, Handler::new(handler), None, true)
    }

    /// Одноразовая подписка с error-обработчиком. Что бы ни сработало
    /// первым, снимается вся запись.
    pub fn once_with_error<F, G>(
        &self,
        channel: &str,
        handler: F,
        on_error: G,
    ) -> Disposable
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
        G: Fn(&E) + Send + Sync + 'static,
    {
        self.attach(
            channel,
            Handler::new(handler),
            Some(ErrorHandler::new(on_error)),
            true,
        )
    }

    /// Одноразовая подписка готового [`Handler`]. Если этот обработчик уже
    /// зарегистрирован на канале при [`DuplicatePolicy::Collapse`],
    /// возвращается `Disposable` существующей записи без изменения её
    /// режима, см. [`on_handler`](Self::on_handler).
    pub fn once_handler(
        &self,
        channel: &str,
        handler: &Handler<A, R>,
        on_error: Option<ErrorHandler<E>>,
    ) -> Disposable {
        self.attach(channel, handler.clone(), on_error, true)
    }

    /// Снимает обработчик с канала по идентичности.
    ///
    /// Возвращает `true`, если что-то было удалено. Неизвестный канал или
    /// обработчик — не ошибка.
    pub fn off(
        &self,
        channel: &str,
        handler: impl Into<HandlerId>,
    ) -> bool {
        let id = handler.into();
        let removed = match self.channels.get_mut(channel) {
            Some(mut entries) => {
                let before = entries.len();
                entries.retain(|entry| {
                    if entry.handler.id() != id {
                        return true;
                    }
                    entry.state.retire();
                    false
                });
                before - entries.len()
            }
            None => 0,
        };

        if removed > 0 {
            debug!(channel, handler_id = %id, removed, "handler unsubscribed");
        }
        removed > 0
    }

    /// Очищает канал, оставляя его в карте пустым.
    pub fn off_all(
        &self,
        channel: &str,
    ) {
        if let Some(mut entries) = self.channels.get_mut(channel) {
            for entry in entries.iter() {
                entry.state.retire();
            }
            let cleared = entries.len();
            entries.clear();
            debug!(channel, cleared, "channel cleared");
        }
    }

    /// Возвращает шину в исходное пустое состояние.
    pub fn destroy(&self) {
        for channel in self.channels.iter() {
            for entry in channel.value() {
                entry.state.retire();
            }
        }
        let channels = self.channels.len();
        self.channels.clear();
        self.counters.reset();
        debug!(channels, "event bus destroyed");
    }

    // -------------------------------------------------------------------------
    //  Псевдонимы
    // -------------------------------------------------------------------------

    /// Псевдоним [`on`](Self::on).
    pub fn subscribe<F>(
        &self,
        channel: &str,
        handler: F,
    ) -> Disposable
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.on(channel, handler)
    }

    /// Псевдоним [`off`](Self::off).
    pub fn unsubscribe(
        &self,
        channel: &str,
        handler: impl Into<HandlerId>,
    ) -> bool {
        self.off(channel, handler)
    }

    // -------------------------------------------------------------------------
    //  Инспекция
    // -------------------------------------------------------------------------

    /// Был ли канал создан (в том числе если сейчас он пуст).
    pub fn has_channel(
        &self,
        channel: &str,
    ) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn handler_count(
        &self,
        channel: &str,
    ) -> usize {
        self.channels
            .get(channel)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Имена всех созданных каналов, отсортированные.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    // -------------------------------------------------------------------------
    //  Внутреннее
    // -------------------------------------------------------------------------

    pub(crate) fn attach(
        &self,
        channel: &str,
        handler: Handler<A, R>,
        on_error: Option<ErrorHandler<E>>,
        once: bool,
    ) -> Disposable {
        let id = handler.id();

        // Disposable держит тот же Arc<str>, что и ключ карты.
        let mut entries = self.channels.entry(Arc::from(channel)).or_default();
        let key = Arc::clone(entries.key());
        let existing = match self.config.duplicates {
            DuplicatePolicy::Collapse => entries
                .iter()
                .find(|entry| entry.handler.id() == id)
                .map(|entry| Arc::clone(&entry.state)),
            DuplicatePolicy::Allow => None,
        };

        let state = match existing {
            Some(state) => {
                let handlers = entries.len();
                drop(entries);
                // Запись остаётся прежней: её `once` и error-обработчик
                // не меняются.
                debug!(
                    channel = %key,
                    handler_id = %id,
                    handlers,
                    once = state.is_once(),
                    requested_once = once,
                    on_error_ignored = on_error.is_some(),
                    "handler already subscribed, registration collapsed"
                );
                state
            }
            None => {
                let state = Arc::new(EntryState::new(once));
                entries.push(Entry {
                    handler,
                    on_error,
                    state: Arc::clone(&state),
                });
                let handlers = entries.len();
                drop(entries);
                debug!(
                    channel = %key,
                    handler_id = %id,
                    handlers,
                    once,
                    "handler subscribed"
                );
                state
            }
        };

        let weak = Arc::downgrade(&self.channels);
        Disposable::new(key, id, move |channel| {
            if !state.retire() {
                return false;
            }
            if let Some(channels) = weak.upgrade() {
                remove_state(&channels, channel, &state);
            }
            true
        })
    }
}

impl<A, R, E> Default for EventBus<A, R, E>
where
    A: 'static,
    R: 'static,
    E: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, E> fmt::Debug for EventBus<A, R, E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.len())
            .field("config", &self.config)
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}
