//! Ошибки уровня крейта.
//!
//! Общие типы (`StackError`, `BusError`, `StatusCode`) живут в
//! `zevent-error` и переэкспортируются отсюда.

pub mod promise;

pub use promise::PromiseError;
pub use zevent_error::{
    bail, ensure, BusError, ErrorExt, GenericError, ResultExt, StackError, StatusCode,
    ZeventResult,
};
