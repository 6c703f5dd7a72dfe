//! EventEmitter - synchronous in-process publish/subscribe
//!
//! Callers register [`Listener`]s against [`EventKey`]s and later
//! [`Emitter::emit`] a key, calling every listener registered for it in order,
//! on the caller's thread, before `emit` returns.
//!
//! # Reserved keys
//!
//! ```text
//! newListener     emitted with (key, listener) before a listener is inserted
//! removeListener  emitted with (key, listener) after a listener is removed
//! error           listener failures are routed here; emitting it with no
//!                 listener fails the outermost emit()
//! ```
//!
//! # Example
//!
//! ```
//! use eventemitter::{Emitter, EventKey, Listener, args};
//!
//! let emitter = Emitter::new();
//! emitter
//!     .on("data", Listener::new(|_, args| {
//!         println!("data: {}", args[0]);
//!         Ok(())
//!     }))
//!     .once("data", Listener::new(|_, _| Err(eyre::eyre!("first chunk rejected"))))
//!     .on(EventKey::ERROR, Listener::new(|_, args| {
//!         eprintln!("handled: {}", args[0]);
//!         Ok(())
//!     }));
//!
//! assert!(emitter.emit("data", &args!["chunk-1"]).unwrap());
//! assert_eq!(emitter.listener_count("data"), 1);
//! ```

mod arg;
pub mod cli;
pub mod config;
mod emitter;
mod error;
mod key;
mod listener;

pub use arg::Arg;
pub use config::{EmitterConfig, default_max_listeners, set_default_max_listeners};
pub use emitter::Emitter;
pub use error::{EmitterError, MaxListenersExceededWarning};
pub use key::{EventKey, Symbol};
pub use listener::{Callback, Listener};

/// Initial process-wide listener threshold
pub const DEFAULT_MAX_LISTENERS: i64 = 10;
