//! Emitter - keyed listener registry with synchronous dispatch
//!
//! Emission snapshots the listener list for a key before calling anything, so:
//!   - a listener added during emission is not called until the next emit
//!   - a listener removed during emission is still called in that round
//!
//! All methods take `&self`. The registry lives behind a `parking_lot::Mutex`
//! that is never held while a listener runs, so listeners may call back into
//! `on()` / `off()` / `emit()` on the same emitter without deadlocking.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::arg::Arg;
use crate::config::{self, EmitterConfig};
use crate::error::{EmitterError, MaxListenersExceededWarning};
use crate::key::EventKey;
use crate::listener::Listener;

/// Key -> ordered listeners, plus key insertion order
///
/// A key present in `events` always has a non-empty list.
#[derive(Default)]
struct Registry {
    events: HashMap<EventKey, Vec<Listener>>,
    order: Vec<EventKey>,
}

impl Registry {
    /// Insert and return the resulting count for `key`
    fn insert(&mut self, key: &EventKey, listener: Listener, prepend: bool) -> usize {
        match self.events.get_mut(key) {
            Some(list) => {
                if prepend {
                    list.insert(0, listener);
                } else {
                    list.push(listener);
                }
                list.len()
            }
            None => {
                self.events.insert(key.clone(), vec![listener]);
                self.order.push(key.clone());
                1
            }
        }
    }

    /// Remove the first entry matching `target` (by identity or wrapped original)
    fn remove_first(&mut self, key: &EventKey, target: &Listener) -> Option<Listener> {
        let list = self.events.get_mut(key)?;
        let index = list.iter().position(|stored| stored.matches(target))?;
        let removed = list.remove(index);
        if list.is_empty() {
            self.drop_key(key);
        }
        Some(removed)
    }

    fn take(&mut self, key: &EventKey) -> Option<Vec<Listener>> {
        let list = self.events.remove(key)?;
        self.order.retain(|k| k != key);
        Some(list)
    }

    fn drop_key(&mut self, key: &EventKey) {
        self.events.remove(key);
        self.order.retain(|k| k != key);
    }

    fn clear(&mut self) {
        self.events.clear();
        self.order.clear();
    }

    fn snapshot(&self, key: &EventKey) -> Option<Vec<Listener>> {
        self.events.get(key).cloned()
    }

    fn count(&self, key: &EventKey) -> usize {
        self.events.get(key).map_or(0, Vec::len)
    }
}

pub(crate) struct Shared {
    registry: Mutex<Registry>,
    max_listeners: Mutex<Option<i64>>,
}

/// Synchronous event emitter
///
/// Cheap to clone: clones share the same registry.
///
/// # Example
///
/// ```
/// use eventemitter::{Emitter, Listener, args};
///
/// let emitter = Emitter::new();
/// let status = Listener::new(|_, args| {
///     println!("Got {} and {}", args[0], args[1]);
///     Ok(())
/// });
///
/// emitter.on("status", status.clone());
/// assert_eq!(emitter.emit("status", &args![200, "OK"]).unwrap(), true);
///
/// emitter.off("status", &status);
/// assert_eq!(emitter.emit("status", &[]).unwrap(), false);
/// ```
#[derive(Clone)]
pub struct Emitter {
    shared: Arc<Shared>,
}

impl Emitter {
    /// Create an emitter with an empty registry and no threshold override
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::default()),
                max_listeners: Mutex::new(None),
            }),
        }
    }

    /// Create an emitter using the config's instance override, if any
    pub fn with_config(config: &EmitterConfig) -> Self {
        let emitter = Self::new();
        if let Some(n) = config.max_listeners {
            emitter.set_max_listeners(n);
        }
        emitter
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Register `listener` for `key`, at the front if `prepend`
    ///
    /// Emits `newListener` with `(key, listener)` before inserting. Logs a
    /// [`MaxListenersExceededWarning`] when the resulting count exceeds a
    /// positive threshold; registration always succeeds.
    pub fn add_listener_with(&self, key: impl Into<EventKey>, listener: Listener, prepend: bool) -> &Self {
        let key = key.into();
        self.notify(
            EventKey::NEW_LISTENER,
            &[Arg::Key(key.clone()), Arg::Listener(listener.original().clone())],
        );

        let count = self.shared.registry.lock().insert(&key, listener, prepend);
        debug!(%key, count, prepend, "Emitter::add_listener");

        let max = self.max_listeners();
        if max > 0 && count as i64 > max {
            let warning = MaxListenersExceededWarning { key, count, max };
            warn!(
                warning = MaxListenersExceededWarning::NAME,
                key = %warning.key,
                count,
                max,
                "{}",
                warning
            );
        }
        self
    }

    /// Append `listener` to the list for `key`
    pub fn add_listener(&self, key: impl Into<EventKey>, listener: Listener) -> &Self {
        self.add_listener_with(key, listener, false)
    }

    /// Alias for [`Emitter::add_listener`]
    pub fn on(&self, key: impl Into<EventKey>, listener: Listener) -> &Self {
        self.add_listener_with(key, listener, false)
    }

    /// Insert `listener` at the front of the list for `key`
    pub fn prepend_listener(&self, key: impl Into<EventKey>, listener: Listener) -> &Self {
        self.add_listener_with(key, listener, true)
    }

    /// Register `listener` to run at most once
    ///
    /// The registry stores a wrapper; `off(key, &listener)` with the original
    /// still cancels it.
    pub fn once(&self, key: impl Into<EventKey>, listener: Listener) -> &Self {
        let key = key.into();
        let wrapper = Listener::once(key.clone(), listener, Arc::downgrade(&self.shared));
        self.add_listener_with(key, wrapper, false)
    }

    /// Like [`Emitter::once`], but inserted at the front
    pub fn prepend_once_listener(&self, key: impl Into<EventKey>, listener: Listener) -> &Self {
        let key = key.into();
        let wrapper = Listener::once(key.clone(), listener, Arc::downgrade(&self.shared));
        self.add_listener_with(key, wrapper, true)
    }

    /// Remove the first entry for `key` that is `listener` or wraps it
    ///
    /// Emits `removeListener` with the caller-facing original. No-op if nothing
    /// matches.
    pub fn remove_listener(&self, key: impl Into<EventKey>, listener: &Listener) -> &Self {
        if let Err(e) = self.try_remove_listener(key.into(), listener) {
            error!(error = %e, "Emitter: unhandled error in removeListener listener");
        }
        self
    }

    /// Removal that hands back an unhandled `removeListener` escalation
    ///
    /// Used by once-wrappers, whose removal runs inside an emission and must
    /// fail that emission rather than be logged.
    pub(crate) fn try_remove_listener(&self, key: EventKey, listener: &Listener) -> Result<(), EmitterError> {
        let removed = self.shared.registry.lock().remove_first(&key, listener);
        if let Some(removed) = removed {
            debug!(%key, once = removed.is_once(), "Emitter::remove_listener");
            self.emit(
                EventKey::REMOVE_LISTENER,
                &[Arg::Key(key), Arg::Listener(removed.original().clone())],
            )?;
        }
        Ok(())
    }

    /// Alias for [`Emitter::remove_listener`]
    pub fn off(&self, key: impl Into<EventKey>, listener: &Listener) -> &Self {
        self.remove_listener(key, listener)
    }

    /// Remove every listener for `key`, or for all keys when `key` is `None`
    ///
    /// For a single key, the key is dropped first and `removeListener` is then
    /// emitted once per removed listener in their former order. Clearing all
    /// keys emits nothing.
    pub fn remove_all_listeners(&self, key: Option<EventKey>) -> &Self {
        match key {
            Some(key) => {
                let removed = self.shared.registry.lock().take(&key);
                if let Some(removed) = removed {
                    debug!(%key, count = removed.len(), "Emitter::remove_all_listeners");
                    for listener in removed {
                        self.notify(
                            EventKey::REMOVE_LISTENER,
                            &[Arg::Key(key.clone()), Arg::Listener(listener.original().clone())],
                        );
                    }
                }
            }
            None => {
                debug!("Emitter::remove_all_listeners: clearing registry");
                self.shared.registry.lock().clear();
            }
        }
        self
    }

    /// Synchronously call every listener registered for `key`
    ///
    /// Returns `Ok(false)` when nothing is registered, except for `error`,
    /// which fails with [`EmitterError`]. A listener that returns `Err` has its
    /// report emitted as `error` and iteration continues; if that `error`
    /// emission is itself unhandled, the failure is returned immediately.
    pub fn emit(&self, key: impl Into<EventKey>, args: &[Arg]) -> Result<bool, EmitterError> {
        let key = key.into();
        let snapshot = self.shared.registry.lock().snapshot(&key);

        let Some(listeners) = snapshot else {
            if key.is_error() {
                debug!("Emitter::emit: unhandled error event");
                return Err(EmitterError::unhandled(args.first().cloned()));
            }
            return Ok(false);
        };

        for listener in &listeners {
            trace!(%key, ?listener, "Emitter::emit: calling listener");
            if let Err(report) = listener.call(self, args) {
                if key.is_error() {
                    // Routing a failing error listener back into `error` would recurse
                    return Err(EmitterError::Unhandled(Arg::from(report)));
                }
                debug!(%key, error = %report, "Emitter::emit: listener failed");
                self.emit(EventKey::ERROR, &[Arg::from(report)])?;
            }
        }
        Ok(true)
    }

    /// Lifecycle emission for registration/removal, which must not fail
    fn notify(&self, key: EventKey, args: &[Arg]) {
        if let Err(e) = self.emit(key.clone(), args) {
            error!(%key, error = %e, "Emitter: unhandled error in lifecycle listener");
        }
    }

    /// Number of listeners for `key`; 0 if the key is absent
    pub fn listener_count(&self, key: impl Into<EventKey>) -> usize {
        self.shared.registry.lock().count(&key.into())
    }

    /// Registered keys in the order they were first registered
    pub fn event_names(&self) -> Vec<EventKey> {
        self.shared.registry.lock().order.clone()
    }

    /// Caller-facing listeners for `key`, with once-wrappers unwrapped
    pub fn listeners(&self, key: impl Into<EventKey>) -> Vec<Listener> {
        self.raw_listeners(key)
            .iter()
            .map(|listener| listener.original().clone())
            .collect()
    }

    /// Stored entries for `key`, once-wrappers included
    pub fn raw_listeners(&self, key: impl Into<EventKey>) -> Vec<Listener> {
        self.shared.registry.lock().snapshot(&key.into()).unwrap_or_default()
    }

    /// Instance override if set, otherwise the process-wide default
    pub fn max_listeners(&self) -> i64 {
        self.shared
            .max_listeners
            .lock()
            .unwrap_or_else(config::default_max_listeners)
    }

    /// Set the instance threshold. Not validated: values <= 0 disable the warning.
    pub fn set_max_listeners(&self, n: i64) -> &Self {
        *self.shared.max_listeners.lock() = Some(n);
        self
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("event_names", &self.event_names())
            .field("max_listeners", &self.max_listeners())
            .finish()
    }
}

impl PartialEq for Emitter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for Emitter {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn noop() -> Listener {
        Listener::new(|_, _| Ok(()))
    }

    /// Listener that appends `tag` to `log` when called
    fn logger(log: &Arc<StdMutex<Vec<String>>>, tag: &str) -> Listener {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Listener::new(move |_, _| {
            log.lock().unwrap().push(tag.clone());
            Ok(())
        })
    }

    #[test]
    fn test_registry_drops_empty_keys() {
        let mut registry = Registry::default();
        let key = EventKey::from("a");
        let l = noop();

        assert_eq!(registry.insert(&key, l.clone(), false), 1);
        assert_eq!(registry.order, vec![key.clone()]);
        assert!(registry.remove_first(&key, &l).is_some());
        assert!(registry.events.is_empty());
        assert!(registry.order.is_empty());
    }

    #[test]
    fn test_registry_reinserted_key_moves_to_end() {
        let mut registry = Registry::default();
        let a = EventKey::from("a");
        let b = EventKey::from("b");
        let l = noop();

        registry.insert(&a, l.clone(), false);
        registry.insert(&b, noop(), false);
        registry.remove_first(&a, &l);
        registry.insert(&a, l, false);
        assert_eq!(registry.order, vec![b, a]);
    }

    #[test]
    fn test_registry_prepend() {
        let mut registry = Registry::default();
        let key = EventKey::from("a");
        let first = noop();
        let second = noop();

        registry.insert(&key, first.clone(), false);
        registry.insert(&key, second.clone(), true);
        assert_eq!(registry.snapshot(&key), Some(vec![second, first]));
    }

    #[test]
    fn test_remove_listener_removes_only_first_duplicate() {
        let emitter = Emitter::new();
        let l = noop();
        emitter.on("a", l.clone()).on("a", l.clone());

        emitter.off("a", &l);
        assert_eq!(emitter.listener_count("a"), 1);
        emitter.off("a", &l);
        assert_eq!(emitter.listener_count("a"), 0);
        assert!(emitter.event_names().is_empty());
    }

    #[test]
    fn test_emptied_key_is_gone_before_remove_listener_fires() {
        let emitter = Emitter::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let l = noop();

        emitter.on("a", l.clone());
        emitter.on(
            "removeListener",
            Listener::new(move |em, _| {
                *seen_clone.lock().unwrap() = em.event_names();
                Ok(())
            }),
        );
        emitter.off("a", &l);

        assert_eq!(*seen.lock().unwrap(), vec![EventKey::REMOVE_LISTENER]);
    }

    #[test]
    fn test_remove_unknown_listener_is_noop() {
        let emitter = Emitter::new();
        emitter.on("a", noop());
        emitter.off("a", &noop()).off("missing", &noop());
        assert_eq!(emitter.listener_count("a"), 1);
    }

    #[test]
    fn test_once_wrapper_removed_before_original_runs() {
        let emitter = Emitter::new();
        let seen = Arc::new(StdMutex::new(None));
        let seen_clone = Arc::clone(&seen);

        emitter.once(
            "a",
            Listener::new(move |em, _| {
                *seen_clone.lock().unwrap() = Some(em.listener_count("a"));
                Ok(())
            }),
        );
        emitter.emit("a", &[]).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(0));
    }

    #[test]
    fn test_once_listener_can_reregister_itself() {
        let emitter = Emitter::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);

        let again = Arc::new(StdMutex::new(None::<Listener>));
        let again_clone = Arc::clone(&again);
        let listener = Listener::new(move |em, _| {
            log_clone.lock().unwrap().push("fired");
            if let Some(me) = again_clone.lock().unwrap().take() {
                em.once("a", me);
            }
            Ok(())
        });
        *again.lock().unwrap() = Some(listener.clone());

        emitter.once("a", listener);
        emitter.emit("a", &[]).unwrap();
        assert_eq!(emitter.listener_count("a"), 1);
        emitter.emit("a", &[]).unwrap();
        assert_eq!(emitter.listener_count("a"), 0);
        assert_eq!(*log.lock().unwrap(), vec!["fired", "fired"]);
    }

    #[test]
    fn test_prepend_once_listener_runs_first() {
        let emitter = Emitter::new();
        let log = Arc::new(StdMutex::new(Vec::new()));

        emitter.on("a", logger(&log, "plain"));
        emitter.prepend_once_listener("a", logger(&log, "once"));
        emitter.emit("a", &[]).unwrap();
        emitter.emit("a", &[]).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["once", "plain", "plain"]);
    }

    #[test]
    fn test_listener_receives_emitter_as_receiver() {
        let emitter = Emitter::new();
        let expected = emitter.clone();
        let matched = Arc::new(StdMutex::new(false));
        let matched_clone = Arc::clone(&matched);

        emitter.on(
            "a",
            Listener::new(move |em, _| {
                *matched_clone.lock().unwrap() = *em == expected;
                Ok(())
            }),
        );
        emitter.emit("a", &[]).unwrap();
        assert!(*matched.lock().unwrap());
    }

    #[test]
    fn test_failing_error_listener_escalates() {
        let emitter = Emitter::new();
        emitter.on("error", Listener::new(|_, _| Err(eyre::eyre!("handler broke"))));

        let err = emitter.emit("error", &crate::args!["original"]).unwrap_err();
        assert_eq!(err.to_string(), "Unhandled error. (handler broke)");
    }

    #[test]
    fn test_lifecycle_failure_does_not_block_registration() {
        let emitter = Emitter::new();
        emitter.on("newListener", Listener::new(|_, _| Err(eyre::eyre!("no"))));

        emitter.on("a", noop());
        assert_eq!(emitter.listener_count("a"), 1);
    }

    #[test]
    fn test_with_config_override() {
        let config = EmitterConfig {
            default_max_listeners: 10,
            max_listeners: Some(3),
        };
        assert_eq!(Emitter::with_config(&config).max_listeners(), 3);
    }

    #[test]
    fn test_set_max_listeners_zero_is_kept() {
        let emitter = Emitter::new();
        emitter.set_max_listeners(0);
        assert_eq!(emitter.max_listeners(), 0);
        emitter.set_max_listeners(-1);
        assert_eq!(emitter.max_listeners(), -1);
    }

    #[test]
    fn test_clones_share_registry() {
        let emitter = Emitter::new();
        let other = emitter.clone();
        other.on("a", noop());
        assert_eq!(emitter.listener_count("a"), 1);
        assert_eq!(emitter, other);
        assert_ne!(emitter, Emitter::new());
    }
}
