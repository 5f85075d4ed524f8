use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use zevent_error::{BusError, ResultExt, ZeventResult};

/// Префикс переменных окружения, например `ZEVENT_FAULTS=isolate`.
pub const ENV_PREFIX: &str = "ZEVENT";

/// Что делать при повторной регистрации того же [`Handler`](crate::Handler)
/// на том же канале.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Семантика множества: повтор не создаёт новую запись.
    #[default]
    Collapse,
    /// Семантика списка: каждая регистрация — отдельная запись.
    Allow,
}

/// Что делать, если обработчик паникует во время доставки.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Паника уходит вызывающему, оставшиеся обработчики не вызываются.
    #[default]
    Propagate,
    /// Паника перехватывается и логируется, доставка продолжается.
    Isolate,
}

/// Конфигурация `EventBus`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub duplicates: DuplicatePolicy,
    pub faults: FaultPolicy,
    /// Писать `trace!` на каждый вызов обработчика
    pub trace_dispatch: bool,
}

impl BusConfig {
    /// Загружает конфигурацию: значения по умолчанию, затем переменные
    /// окружения с префиксом `ZEVENT`.
    pub fn load() -> ZeventResult<Self> {
        Self::load_with_prefix(ENV_PREFIX)
    }

    pub fn load_with_prefix(prefix: &str) -> ZeventResult<Self> {
        Self::build(prefix)
            .with_context(|| format!("loading bus config from {prefix}_* variables"))
    }

    fn build(prefix: &str) -> ZeventResult<Self> {
        let cfg = Config::builder()
            .set_default("duplicates", "collapse")
            .and_then(|b| b.set_default("faults", "propagate"))
            .and_then(|b| b.set_default("trace_dispatch", false))
            .map_err(load_error)?
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()
            .map_err(load_error)?;

        cfg.try_deserialize().map_err(|err| {
            BusError::InvalidConfig {
                field: format!("{prefix}_*"),
                reason: err.to_string(),
            }
            .into()
        })
    }

    pub fn with_duplicates(
        mut self,
        duplicates: DuplicatePolicy,
    ) -> Self {
        self.duplicates = duplicates;
        self
    }

    pub fn with_faults(
        mut self,
        faults: FaultPolicy,
    ) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_trace_dispatch(
        mut self,
        enabled: bool,
    ) -> Self {
        self.trace_dispatch = enabled;
        self
    }
}

fn load_error(err: config::ConfigError) -> zevent_error::StackError {
    BusError::ConfigLoad {
        reason: err.to_string(),
    }
    .into()
}
