//! Настройки реестра событий.

mod settings;

pub use settings::{BusConfig, DuplicatePolicy, FaultPolicy};
