//! Property tests for registration, removal and emission

use std::sync::{Arc, Mutex};

use eventemitter::{Emitter, Listener};
use proptest::prelude::*;

fn counting(hits: &Arc<Mutex<Vec<usize>>>, index: usize) -> Listener {
    let hits = Arc::clone(hits);
    Listener::new(move |_, _| {
        hits.lock().unwrap().push(index);
        Ok(())
    })
}

proptest! {
    #[test]
    fn prop_listener_count_matches_registrations(n in 0usize..40) {
        let emitter = Emitter::new();
        emitter.set_max_listeners(0);
        for _ in 0..n {
            emitter.on("k", Listener::new(|_, _| Ok(())));
        }
        prop_assert_eq!(emitter.listener_count("k"), n);
        prop_assert_eq!(emitter.emit("k", &[]).unwrap(), n > 0);
    }

    #[test]
    fn prop_emit_calls_in_registration_order(n in 1usize..20) {
        let emitter = Emitter::new();
        let hits = Arc::new(Mutex::new(Vec::new()));
        for i in 0..n {
            emitter.on("k", counting(&hits, i));
        }
        emitter.emit("k", &[]).unwrap();
        prop_assert_eq!(hits.lock().unwrap().clone(), (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn prop_off_removes_exactly_one_and_keeps_order(n in 1usize..20, pick in any::<prop::sample::Index>()) {
        let emitter = Emitter::new();
        let listeners: Vec<Listener> = (0..n).map(|_| Listener::new(|_, _| Ok(()))).collect();
        for l in &listeners {
            emitter.on("k", l.clone());
        }

        let victim = pick.index(n);
        emitter.off("k", &listeners[victim]);

        let mut expected = listeners.clone();
        expected.remove(victim);
        prop_assert_eq!(emitter.listeners("k"), expected);
        prop_assert_eq!(emitter.event_names().is_empty(), n == 1);
    }

    #[test]
    fn prop_once_listeners_fire_exactly_once(plain in 0usize..8, once in 0usize..8) {
        let emitter = Emitter::new();
        let hits = Arc::new(Mutex::new(Vec::new()));
        for i in 0..plain {
            emitter.on("k", counting(&hits, i));
        }
        for i in 0..once {
            emitter.once("k", counting(&hits, plain + i));
        }

        emitter.emit("k", &[]).unwrap();
        emitter.emit("k", &[]).unwrap();

        prop_assert_eq!(emitter.listener_count("k"), plain);
        prop_assert_eq!(hits.lock().unwrap().len(), 2 * plain + once);
    }
}
