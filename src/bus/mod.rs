//! Реестр каналов и синхронная доставка событий.
//!
//! - `registry`: [`EventBus`], подписка, отписка, одноразовые подписки.
//! - `dispatch`: `emit`, `gather`, `gather_map`, `try_gather`, `error`.
//! - `promise`: мост к future ([`Pending`]).
//! - `handler`: [`Handler`], [`ErrorHandler`], [`HandlerId`].
//! - `disposable`: [`Disposable`].
//! - `shared`: общая шина процесса ([`event_bus`]).
//! - `entry` (приватный): записи каналов.

mod dispatch;
pub mod disposable;
mod entry;
pub mod handler;
pub mod promise;
pub mod registry;
pub mod shared;
pub mod stats;

pub use disposable::*;
pub use handler::*;
pub use promise::*;
pub use registry::*;
pub use shared::*;
pub(crate) use stats::BusCounters;
pub use stats::BusStats;
