use once_cell::sync::Lazy;
use tracing::warn;

use super::EventBus;
use crate::BusConfig;

/// Общая на процесс динамическая шина.
static EVENT_BUS: Lazy<EventBus> = Lazy::new(|| {
    let config = BusConfig::load().unwrap_or_else(|err| {
        warn!(error = %err, "falling back to default event bus config");
        BusConfig::default()
    });
    EventBus::with_config(config)
});

/// Возвращает общую шину процесса.
///
/// Создаётся при первом обращении; конфигурация читается из переменных
/// окружения `ZEVENT_*`, а при ошибке берутся значения по умолчанию.
pub fn event_bus() -> &'static EventBus {
    &EVENT_BUS
}
