//! Emitter error and warning types

use std::fmt;

use thiserror::Error;

use crate::arg::Arg;
use crate::key::EventKey;

/// Errors surfaced by [`crate::Emitter::emit`]
#[derive(Debug, Error)]
pub enum EmitterError {
    /// `error` was emitted with no `error` listener; carries the first argument
    #[error("Unhandled error. ({0})")]
    Unhandled(Arg),

    /// `error` was emitted with no listener and no arguments
    #[error("Unhandled error.")]
    UnhandledWithoutPayload,
}

impl EmitterError {
    pub(crate) fn unhandled(payload: Option<Arg>) -> Self {
        match payload {
            Some(arg) => EmitterError::Unhandled(arg),
            None => EmitterError::UnhandledWithoutPayload,
        }
    }

    /// The value passed to the `error` emission, if any
    pub fn payload(&self) -> Option<&Arg> {
        match self {
            EmitterError::Unhandled(arg) => Some(arg),
            EmitterError::UnhandledWithoutPayload => None,
        }
    }

    /// Downcast an error payload to a concrete error type
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.payload().and_then(|arg| arg.downcast_error_ref::<E>())
    }
}

/// Leak-detection diagnostic, logged when a key's listener count exceeds
/// the configured maximum. Never blocks the registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxListenersExceededWarning {
    pub key: EventKey,
    pub count: usize,
    pub max: i64,
}

impl MaxListenersExceededWarning {
    pub const NAME: &'static str = "MaxListenersExceededWarning";
}

impl fmt::Display for MaxListenersExceededWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Possible EventEmitter memory leak detected. {} {} listeners added (max {}). \
             Use emitter.set_max_listeners() to increase limit",
            self.count, self.key, self.max
        )
    }
}
