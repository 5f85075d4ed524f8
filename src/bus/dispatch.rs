use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use rustc_hash::FxHashMap;
use tracing::{debug, error, trace};
use zevent_error::{BusError, StackError};

use super::{
    entry::{remove_state, Entry},
    BusCounters, EventBus, HandlerId,
};
use crate::config::FaultPolicy;

impl<A, R, E> EventBus<A, R, E>
where
    A: 'static,
    R: 'static,
    E: 'static,
{
    /// Вызывает все обработчики канала в порядке регистрации. Результаты
    /// отбрасываются.
    ///
    /// Паника обработчика при [`FaultPolicy::Propagate`] уходит
    /// вызывающему и прерывает доставку остальным.
    pub fn emit(
        &self,
        channel: &str,
        args: A,
    ) {
        BusCounters::bump(&self.counters.emits);
        let entries = self.snapshot(channel);
        trace!(channel, handlers = entries.len(), "emit");

        for entry in &entries {
            if self.claim(channel, entry) {
                self.invoke(channel, entry.handler.id(), || entry.handler.call(&args));
            }
        }
    }

    /// Псевдоним [`emit`](Self::emit).
    pub fn publish(
        &self,
        channel: &str,
        args: A,
    ) {
        self.emit(channel, args)
    }

    /// Как `emit`, но собирает результаты в порядке регистрации.
    pub fn gather(
        &self,
        channel: &str,
        args: A,
    ) -> Vec<R> {
        BusCounters::bump(&self.counters.emits);
        let entries = self.snapshot(channel);
        trace!(channel, handlers = entries.len(), "gather");

        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            if !self.claim(channel, entry) {
                continue;
            }
            if let Some(result) =
                self.invoke(channel, entry.handler.id(), || entry.handler.call(&args))
            {
                results.push(result);
            }
        }
        results
    }

    /// Как `gather`, но результаты ключуются идентичностью обработчика.
    pub fn gather_map(
        &self,
        channel: &str,
        args: A,
    ) -> FxHashMap<HandlerId, R> {
        BusCounters::bump(&self.counters.emits);
        let entries = self.snapshot(channel);
        trace!(channel, handlers = entries.len(), "gather_map");

        let mut results = FxHashMap::default();
        for entry in &entries {
            if !self.claim(channel, entry) {
                continue;
            }
            let id = entry.handler.id();
            if let Some(result) = self.invoke(channel, id, || entry.handler.call(&args)) {
                results.insert(id, result);
            }
        }
        results
    }

    /// Как `gather`, но паника каждого обработчика перехватывается при любой
    /// [`FaultPolicy`] и возвращается на его позиции как
    /// [`BusError::HandlerPanicked`].
    pub fn try_gather(
        &self,
        channel: &str,
        args: A,
    ) -> Vec<Result<R, StackError>> {
        BusCounters::bump(&self.counters.emits);
        let entries = self.snapshot(channel);
        trace!(channel, handlers = entries.len(), "try_gather");

        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            if self.claim(channel, entry) {
                let id = entry.handler.id();
                results.push(self.guarded(channel, id, || entry.handler.call(&args)));
            }
        }
        results
    }

    /// Передаёт `reason` только error-обработчикам канала. Записи без
    /// error-обработчика пропускаются; если не нашлось ни одного, сигнал
    /// молча отбрасывается.
    pub fn error(
        &self,
        channel: &str,
        reason: E,
    ) {
        BusCounters::bump(&self.counters.errors);
        let entries = self.snapshot(channel);

        let mut reached = 0usize;
        for entry in &entries {
            let Some(on_error) = &entry.on_error else {
                continue;
            };
            if !self.claim(channel, entry) {
                continue;
            }
            reached += 1;
            self.invoke(channel, entry.handler.id(), || on_error.call(&reason));
        }

        if reached == 0 {
            BusCounters::bump(&self.counters.dropped_errors);
            debug!(channel, "error signal dropped: no error handlers");
        } else {
            trace!(channel, reached, "error delivered");
        }
    }

    // -------------------------------------------------------------------------
    //  Внутреннее
    // -------------------------------------------------------------------------

    /// Копия записей канала. Блокировка карты отпускается до вызова
    /// обработчиков.
    fn snapshot(
        &self,
        channel: &str,
    ) -> Vec<Entry<A, R, E>> {
        self.channels
            .get(channel)
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }

    /// Решает, вызывать ли запись в текущем проходе.
    ///
    /// Одноразовая запись захватывается атомарно и снимается с канала до
    /// вызова; обычная пропускается, если её сняли во время прохода.
    fn claim(
        &self,
        channel: &str,
        entry: &Entry<A, R, E>,
    ) -> bool {
        if !entry.state.is_once() {
            return !entry.state.is_retired();
        }
        if !entry.state.retire() {
            return false;
        }
        remove_state(&self.channels, channel, &entry.state);
        true
    }

    fn invoke<T>(
        &self,
        channel: &str,
        id: HandlerId,
        call: impl FnOnce() -> T,
    ) -> Option<T> {
        if self.config.trace_dispatch {
            trace!(channel, handler_id = %id, "invoking handler");
        }
        match self.config.faults {
            FaultPolicy::Propagate => Some(call()),
            FaultPolicy::Isolate => self.guarded(channel, id, call).ok(),
        }
    }

    fn guarded<T>(
        &self,
        channel: &str,
        id: HandlerId,
        call: impl FnOnce() -> T,
    ) -> Result<T, StackError> {
        panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| {
            BusCounters::bump(&self.counters.faults);
            let message = panic_message(payload.as_ref());
            error!(channel, handler_id = %id, panic = %message, "handler panicked");
            StackError::new(BusError::HandlerPanicked {
                channel: channel.to_string(),
                handler_id: id.as_u64(),
                message,
            })
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use zevent_error::StatusCode;

    use super::*;
    use crate::{bus::Handler, BusConfig};

    fn isolated<A: 'static, R: 'static>() -> EventBus<A, R, String> {
        EventBus::with_config(BusConfig::default().with_faults(FaultPolicy::Isolate))
    }

    /// Тест проверяет порядок вызова и передачу аргументов.
    #[test]
    fn test_emit_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus: EventBus<(i32, i32), ()> = EventBus::new();
        for name in ["h1", "h2", "h3"] {
            let log = log.clone();
            bus.on("ping", move |(a, b): &(i32, i32)| {
                log.lock().unwrap().push((name, *a, *b));
            });
        }

        bus.emit("ping", (1, 2));
        assert_eq!(
            *log.lock().unwrap(),
            vec![("h1", 1, 2), ("h2", 1, 2), ("h3", 1, 2)]
        );
        assert_eq!(bus.stats().emit_count, 1);
    }

    #[test]
    fn test_emit_unknown_channel_is_noop() {
        let bus: EventBus<i32, i32> = EventBus::new();
        bus.emit("nothing", 1);
        assert!(bus.gather("nothing", 1).is_empty());
        assert!(bus.gather_map("nothing", 1).is_empty());
        assert!(!bus.has_channel("nothing"));
    }

    #[test]
    fn test_gather_and_gather_map() {
        let bus: EventBus<(), &'static str> = EventBus::new();
        let d1 = bus.on("q", |_| "r1");
        let d2 = bus.on("q", |_| "r2");
        let d3 = bus.on("q", |_| "r3");

        assert_eq!(bus.gather("q", ()), vec!["r1", "r2", "r3"]);

        let map = bus.gather_map("q", ());
        assert_eq!(map.len(), 3);
        assert_eq!(map[&d1.handler_id()], "r1");
        assert_eq!(map[&d2.handler_id()], "r2");
        assert_eq!(map[&d3.handler_id()], "r3");
    }

    /// Тест проверяет, что `error` вызывает только error-обработчики.
    #[test]
    fn test_error_reaches_only_error_handlers() {
        let successes = Arc::new(AtomicUsize::new(0));
        let reasons = Arc::new(Mutex::new(Vec::new()));
        let bus: EventBus<(), (), String> = EventBus::new();

        let s = successes.clone();
        bus.on("job", move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        let r = reasons.clone();
        bus.on_with_error(
            "job",
            |_| (),
            move |reason: &String| r.lock().unwrap().push(reason.clone()),
        );

        bus.error("job", "disk full".to_string());
        assert_eq!(successes.load(Ordering::SeqCst), 0);
        assert_eq!(*reasons.lock().unwrap(), vec!["disk full".to_string()]);
        assert_eq!(bus.stats().dropped_errors, 0);
    }

    #[test]
    fn test_error_without_handlers_is_dropped() {
        let bus: EventBus<(), (), String> = EventBus::new();
        bus.on("job", |_| ());
        bus.error("job", "ignored".to_string());
        bus.error("missing", "ignored".to_string());
        let stats = bus.stats();
        assert_eq!(stats.error_count, 2);
        assert_eq!(stats.dropped_errors, 2);
    }

    /// Тест проверяет, что одноразовый обработчик срабатывает один раз.
    #[test]
    fn test_once_fires_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let bus: EventBus<&'static str, ()> = EventBus::new();
        let s = seen.clone();
        let d = bus.once("x", move |v: &&'static str| s.lock().unwrap().push(*v));

        bus.emit("x", "a");
        bus.emit("x", "b");
        assert_eq!(*seen.lock().unwrap(), vec!["a"]);
        assert_eq!(bus.handler_count("x"), 0);
        assert!(bus.has_channel("x"));
        assert!(!d.dispose());
    }

    /// Тест проверяет, что повторная публикация изнутри одноразового
    /// обработчика его не вызывает.
    #[test]
    fn test_once_reentrant_emit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bus: Arc<EventBus<u32, ()>> = Arc::new(EventBus::new());

        let c = calls.clone();
        let inner = Arc::downgrade(&bus);
        bus.once("loop", move |depth: &u32| {
            c.fetch_add(1, Ordering::SeqCst);
            if let Some(bus) = inner.upgrade() {
                bus.emit("loop", depth + 1);
            }
        });

        bus.emit("loop", 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Тест проверяет, что одноразовая запись не вызывается повторно из
    /// внешнего прохода, если её уже захватил вложенный.
    #[test]
    fn test_once_claimed_by_nested_pass() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bus: Arc<EventBus<bool, ()>> = Arc::new(EventBus::new());

        let inner = Arc::downgrade(&bus);
        bus.on("c", move |nested: &bool| {
            if !*nested {
                if let Some(bus) = inner.upgrade() {
                    bus.emit("c", true);
                }
            }
        });
        let c = calls.clone();
        bus.once("c", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit("c", false);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Тест проверяет, что снятая во время прохода запись не вызывается.
    #[test]
    fn test_off_during_dispatch_skips_removed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bus: Arc<EventBus<(), ()>> = Arc::new(EventBus::new());

        let c = calls.clone();
        let victim: Handler<(), ()> = Handler::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let inner = Arc::downgrade(&bus);
        let victim_id = victim.id();
        bus.on("c", move |_| {
            if let Some(bus) = inner.upgrade() {
                bus.off("c", victim_id);
            }
        });
        bus.on_handler("c", &victim, None);

        bus.emit("c", ());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Тест проверяет, что добавленный во время прохода обработчик
    /// вызывается только следующим проходом.
    #[test]
    fn test_subscribe_during_dispatch_waits_for_next_pass() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bus: Arc<EventBus<(), ()>> = Arc::new(EventBus::new());

        let c = calls.clone();
        let inner = Arc::downgrade(&bus);
        bus.once("c", move |_| {
            let c = c.clone();
            if let Some(bus) = inner.upgrade() {
                bus.on("c", move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        bus.emit("c", ());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        bus.emit("c", ());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Тест проверяет, что при `Propagate` паника уходит вызывающему,
    /// прерывает доставку, а шина остаётся рабочей.
    #[test]
    fn test_propagate_aborts_remaining() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bus: EventBus<(), ()> = EventBus::new();
        bus.on("c", |_| panic!("boom"));
        let c = calls.clone();
        bus.on("c", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| bus.emit("c", ())));
        assert!(outcome.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // блокировки не удерживаются: шина продолжает работать
        bus.off_all("c");
        bus.on("c", |_| ());
        bus.emit("c", ());
        assert_eq!(bus.handler_count("c"), 1);
    }

    /// Тест проверяет, что при `Isolate` доставка продолжается, а сбой
    /// учитывается в статистике.
    #[test]
    fn test_isolate_continues_delivery() {
        let bus: EventBus<(), i32, String> = isolated();
        bus.on("c", |_| 1);
        bus.on("c", |_| panic!("second fails"));
        bus.on("c", |_| 3);

        assert_eq!(bus.gather("c", ()), vec![1, 3]);
        assert_eq!(bus.gather_map("c", ()).len(), 2);
        bus.emit("c", ());
        assert_eq!(bus.stats().fault_count, 3);
    }

    #[test]
    fn test_isolate_error_handler_fault() {
        let bus: EventBus<(), (), String> = isolated();
        let reached = Arc::new(AtomicUsize::new(0));
        bus.on_with_error("c", |_| (), |_: &String| panic!("bad error handler"));
        let r = reached.clone();
        bus.on_with_error(
            "c",
            |_| (),
            move |_: &String| {
                r.fetch_add(1, Ordering::SeqCst);
            },
        );

        bus.error("c", "oops".to_string());
        assert_eq!(reached.load(Ordering::SeqCst), 1);
        assert_eq!(bus.stats().fault_count, 1);
    }

    /// Тест проверяет, что `try_gather` сохраняет позиции и перехватывает
    /// панику даже при `Propagate`.
    #[test]
    fn test_try_gather_reports_faults_in_place() {
        let bus: EventBus<i32, i32> = EventBus::new();
        bus.on("c", |x| x * 10);
        bus.on("c", |_| panic!("nope"));
        bus.on("c", |x| x + 1);

        let results = bus.try_gather("c", 4);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().ok(), Some(&40));
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::HandlerPanicked);
        assert!(err.to_string().contains("nope"));
        assert_eq!(results[2].as_ref().ok(), Some(&5));
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "non-string panic payload");
    }
}
