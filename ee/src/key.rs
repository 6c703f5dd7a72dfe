//! Event keys
//!
//! A key is either a string name or a [`Symbol`]. Lookup is exact equality;
//! there is no pattern matching over keys.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique key token
///
/// Two symbols created with the same description are different keys.
/// Clones of a symbol are the same key.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl Symbol {
    /// Mint a new symbol with a description used only for display
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: Some(description.into()),
        }
    }

    /// Mint a new symbol without a description
    pub fn anonymous() -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol#{}({})", self.id, self.description().unwrap_or(""))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// Key under which listeners are registered
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    Name(Cow<'static, str>),
    Symbol(Symbol),
}

impl EventKey {
    /// Emitted before a listener is inserted, with `(key, listener)`
    pub const NEW_LISTENER: EventKey = EventKey::Name(Cow::Borrowed("newListener"));

    /// Emitted after a listener is removed, with `(key, listener)`
    pub const REMOVE_LISTENER: EventKey = EventKey::Name(Cow::Borrowed("removeListener"));

    /// Unhandled-error escape valve: emitting it with no listeners fails
    pub const ERROR: EventKey = EventKey::Name(Cow::Borrowed("error"));

    pub fn name(&self) -> Option<&str> {
        match self {
            EventKey::Name(name) => Some(name.as_ref()),
            EventKey::Symbol(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        *self == Self::ERROR
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Name(name) => f.write_str(name),
            EventKey::Symbol(symbol) => fmt::Display::fmt(symbol, f),
        }
    }
}

impl From<&'static str> for EventKey {
    fn from(name: &'static str) -> Self {
        EventKey::Name(Cow::Borrowed(name))
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        EventKey::Name(Cow::Owned(name))
    }
}

impl From<Symbol> for EventKey {
    fn from(symbol: Symbol) -> Self {
        EventKey::Symbol(symbol)
    }
}

impl From<&EventKey> for EventKey {
    fn from(key: &EventKey) -> Self {
        key.clone()
    }
}
