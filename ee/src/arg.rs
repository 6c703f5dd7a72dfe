//! Emission arguments
//!
//! Listeners receive `&[Arg]`. Plain data travels as JSON values; the
//! lifecycle events carry keys and listeners, and `error` carries reports.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::key::EventKey;
use crate::listener::Listener;

/// A single argument passed to listeners by [`crate::Emitter::emit`]
#[derive(Clone)]
pub enum Arg {
    /// Arbitrary data
    Value(Value),
    /// An event key (first argument of `newListener` / `removeListener`)
    Key(EventKey),
    /// A listener reference (second argument of `newListener` / `removeListener`)
    Listener(Listener),
    /// A failure, as routed to `error` listeners
    Error(Arc<eyre::Report>),
}

impl Arg {
    /// Wrap any error type as an `Arg::Error`
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Arg::Error(Arc::new(eyre::Report::new(err)))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    pub fn as_key(&self) -> Option<&EventKey> {
        match self {
            Arg::Key(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            Arg::Listener(listener) => Some(listener),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&eyre::Report> {
        match self {
            Arg::Error(report) => Some(report.as_ref()),
            _ => None,
        }
    }

    /// Downcast an `Arg::Error` payload to a concrete error type
    pub fn downcast_error_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.as_error().and_then(|report| report.downcast_ref::<E>())
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => write!(f, "Value({value})"),
            Arg::Key(key) => write!(f, "Key({key:?})"),
            Arg::Listener(listener) => write!(f, "{listener:?}"),
            Arg::Error(report) => write!(f, "Error({report})"),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(Value::String(s)) => f.write_str(s),
            Arg::Value(value) => write!(f, "{value}"),
            Arg::Key(key) => write!(f, "{key}"),
            Arg::Listener(listener) => write!(f, "{listener:?}"),
            Arg::Error(report) => write!(f, "{report}"),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Value(Value::from(s))
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Value(Value::from(s))
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Value(Value::from(n))
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Value(Value::from(n))
    }
}

impl From<u64> for Arg {
    fn from(n: u64) -> Self {
        Arg::Value(Value::from(n))
    }
}

impl From<f64> for Arg {
    fn from(n: f64) -> Self {
        Arg::Value(Value::from(n))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Value(Value::from(b))
    }
}

impl From<EventKey> for Arg {
    fn from(key: EventKey) -> Self {
        Arg::Key(key)
    }
}

impl From<Listener> for Arg {
    fn from(listener: Listener) -> Self {
        Arg::Listener(listener)
    }
}

impl From<eyre::Report> for Arg {
    fn from(report: eyre::Report) -> Self {
        Arg::Error(Arc::new(report))
    }
}

/// Build a `Vec<Arg>` from values convertible into [`Arg`]
///
/// ```
/// use eventemitter::{Arg, args};
///
/// let args: Vec<Arg> = args![200, "OK"];
/// assert_eq!(args[0].as_i64(), Some(200));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}
