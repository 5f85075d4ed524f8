//! In-process publish/subscribe registry.
//!
//! Handlers subscribe to named channels; an emit on a channel invokes every
//! handler registered there, synchronously and in registration order. A
//! separate error channel reaches only handlers that registered an error
//! callback, and any channel can be awaited once as a future.
//!
//! ```
//! use zevent::{args, EventBus, Payload};
//!
//! let bus: EventBus = EventBus::new();
//! let sub = bus.on("ping", |args| Payload::from(args.len() as i64));
//! assert_eq!(bus.gather("ping", args![1, 2]), vec![Payload::Int(2)]);
//! assert!(sub.dispose());
//! ```

/// Channel registry, dispatch, one-shot subscriptions and the promise bridge.
pub mod bus;
/// Registry configuration: duplicate and fault policies.
pub mod config;
/// Error types and re-exports from `zevent-error`.
pub mod error;
/// Console logging setup.
pub mod logging;
/// Dynamically typed arguments and results for the default bus.
pub mod payload;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Registry, handlers and subscription handles.
pub use bus::{
    event_bus, BusStats, Disposable, ErrorHandler, EventBus, Handler, HandlerId, Pending,
};
/// Configuration.
pub use config::{BusConfig, DuplicatePolicy, FaultPolicy};
/// Errors and result types.
pub use error::{BusError, ErrorExt, PromiseError, StackError, StatusCode, ZeventResult};
/// Logging.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Dynamic values.
pub use payload::{Args, Payload};
