//! Listener handles
//!
//! A [`Listener`] is an `Arc` around a callback. Equality is reference
//! identity: clones of a handle are the same listener, while two handles built
//! from identical closures are not. Removal relies on this.
//!
//! A once-registration stores a synthetic wrapper listener in the registry.
//! The wrapper keeps the caller's original so that removal by the original
//! reference still finds it.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::arg::Arg;
use crate::emitter::{Emitter, Shared};
use crate::key::EventKey;

/// Callback signature for listeners
///
/// The first argument is the emitter performing the emission. Returning an
/// error redirects it to the emitter's `error` event.
pub type Callback = dyn Fn(&Emitter, &[Arg]) -> eyre::Result<()> + Send + Sync;

enum ListenerKind {
    Plain(Box<Callback>),
    Once {
        key: EventKey,
        original: Listener,
        owner: Weak<Shared>,
    },
}

/// Reference-counted listener handle
#[derive(Clone)]
pub struct Listener {
    inner: Arc<ListenerKind>,
}

impl Listener {
    /// Create a listener from a callback
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Emitter, &[Arg]) -> eyre::Result<()> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ListenerKind::Plain(Box::new(callback))),
        }
    }

    /// Wrap `original` so that invoking the wrapper unregisters it from
    /// `owner` for `key` before calling `original`
    pub(crate) fn once(key: EventKey, original: Listener, owner: Weak<Shared>) -> Self {
        Self {
            inner: Arc::new(ListenerKind::Once {
                key,
                original: original.original().clone(),
                owner,
            }),
        }
    }

    /// Whether this handle is a once-wrapper
    pub fn is_once(&self) -> bool {
        matches!(*self.inner, ListenerKind::Once { .. })
    }

    /// The caller-facing listener: the wrapped original for a once-wrapper,
    /// otherwise `self`
    pub fn original(&self) -> &Listener {
        match &*self.inner {
            ListenerKind::Once { original, .. } => original,
            ListenerKind::Plain(_) => self,
        }
    }

    /// True if `other` is this exact handle or, for a once-wrapper, the
    /// original it wraps
    pub fn matches(&self, other: &Listener) -> bool {
        self == other || (self.is_once() && self.original() == other)
    }

    /// Invoke the listener with `emitter` as receiver
    ///
    /// A once-wrapper first removes itself from its owning emitter, so a
    /// callback that re-registers itself is not affected by that removal. If
    /// the resulting `removeListener` emission escalates, the original is not
    /// called and the escalation is returned.
    pub fn call(&self, emitter: &Emitter, args: &[Arg]) -> eyre::Result<()> {
        match &*self.inner {
            ListenerKind::Plain(callback) => callback(emitter, args),
            ListenerKind::Once { key, original, owner } => {
                if let Some(shared) = owner.upgrade() {
                    Emitter::from_shared(shared).try_remove_listener(key.clone(), self)?;
                }
                original.call(emitter, args)
            }
        }
    }

    fn addr(&self) -> *const ListenerKind {
        Arc::as_ptr(&self.inner)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner {
            ListenerKind::Plain(_) => write!(f, "Listener({:p})", self.addr()),
            ListenerKind::Once { key, original, .. } => {
                write!(f, "Once({:p}, key={key}, original={original:?})", self.addr())
            }
        }
    }
}
