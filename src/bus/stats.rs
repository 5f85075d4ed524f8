use std::sync::atomic::{AtomicUsize, Ordering};

/// Счётчики шины. Обновляются с `Relaxed`: это статистика, а не
/// синхронизация.
#[derive(Debug, Default)]
pub(crate) struct BusCounters {
    /// Вызовы `emit`/`gather`/`gather_map`/`try_gather`
    pub(crate) emits: AtomicUsize,
    /// Вызовы `error`
    pub(crate) errors: AtomicUsize,
    /// Вызовы `error`, не дошедшие ни до одного error-обработчика
    pub(crate) dropped_errors: AtomicUsize,
    /// Паники обработчиков, перехваченные шиной
    pub(crate) faults: AtomicUsize,
}

impl BusCounters {
    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BusStats {
        BusStats {
            emit_count: self.emits.load(Ordering::Relaxed),
            error_count: self.errors.load(Ordering::Relaxed),
            dropped_errors: self.dropped_errors.load(Ordering::Relaxed),
            fault_count: self.faults.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.emits.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.dropped_errors.store(0, Ordering::Relaxed);
        self.faults.store(0, Ordering::Relaxed);
    }
}

/// Снимок статистики шины.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusStats {
    pub emit_count: usize,
    pub error_count: usize,
    pub dropped_errors: usize,
    pub fault_count: usize,
}
