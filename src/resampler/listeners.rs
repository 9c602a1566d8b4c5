//! Per-kind ordered listener lists.
//!
//! Delivery snapshots the callbacks of one kind before invoking them, so a
//! listener may register or remove listeners (of any kind) while running.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Error,
    Samples,
    End,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Samples => "samples",
            Self::End => "end",
        }
    }
}

/// What a listener receives for one event.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Error(&'a str),
    Samples(&'a Bytes),
    End,
}

pub type Callback = Box<dyn FnMut(Payload<'_>) + Send>;

/// Returned by registration; pass to [`ListenerRegistry::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Slot {
    id: u64,
    callback: Option<Arc<Mutex<Callback>>>,
}

#[derive(Default)]
pub struct ListenerRegistry {
    slots: DashMap<String, Vec<Slot>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `callback` to the list for `kind`. Any kind name is accepted.
    pub fn register(&self, kind: &str, callback: Callback) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots.entry(kind.to_owned()).or_default().push(Slot {
            id,
            callback: Some(Arc::new(Mutex::new(callback))),
        });
        ListenerId(id)
    }

    /// Empties the slot for `id`. Returns `false` if it was already empty.
    pub fn remove(&self, id: ListenerId) -> bool {
        for mut entry in self.slots.iter_mut() {
            if let Some(slot) = entry.value_mut().iter_mut().find(|s| s.id == id.0) {
                return slot.callback.take().is_some();
            }
        }
        false
    }

    /// Number of live listeners for `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.slots.get(kind).map_or(0, |slots| {
            slots.iter().filter(|s| s.callback.is_some()).count()
        })
    }

    /// Invokes every live listener for `kind` in registration order and
    /// returns how many ran.
    pub fn dispatch(&self, kind: &str, payload: Payload<'_>) -> usize {
        let callbacks: Vec<_> = match self.slots.get(kind) {
            Some(slots) => slots.iter().filter_map(|s| s.callback.clone()).collect(),
            None => return 0,
        };

        for callback in &callbacks {
            let mut callback = callback.lock();
            (&mut **callback)(payload);
        }
        callbacks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Callback {
        let log = log.clone();
        Box::new(move |payload: Payload<'_>| {
            let entry = match payload {
                Payload::Error(msg) => format!("{tag}:error:{msg}"),
                Payload::Samples(bytes) => format!("{tag}:samples:{}", bytes.len()),
                Payload::End => format!("{tag}:end"),
            };
            log.lock().push(entry);
        })
    }

    #[test]
    fn dispatch_preserves_registration_order() {
        let registry = ListenerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register("end", recorder(&log, "a"));
        registry.register("end", recorder(&log, "b"));
        registry.register("error", recorder(&log, "c"));

        assert_eq!(registry.dispatch("end", Payload::End), 2);
        assert_eq!(registry.dispatch("error", Payload::Error("bad")), 1);
        assert_eq!(*log.lock(), vec!["a:end", "b:end", "c:error:bad"]);
    }

    #[test]
    fn removed_slots_are_skipped() {
        let registry = ListenerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register("samples", recorder(&log, "a"));
        let b = registry.register("samples", recorder(&log, "b"));
        registry.register("samples", recorder(&log, "c"));

        assert!(registry.remove(b));
        assert!(!registry.remove(b));
        assert_eq!(registry.count("samples"), 2);

        let bytes = Bytes::from_static(&[1, 2, 3, 4]);
        registry.dispatch("samples", Payload::Samples(&bytes));
        assert_eq!(*log.lock(), vec!["a:samples:4", "c:samples:4"]);
    }

    #[test]
    fn unknown_kinds_accumulate_silently() {
        let registry = ListenerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register("progress", recorder(&log, "x"));

        assert_eq!(registry.count("progress"), 1);
        assert_eq!(registry.dispatch("end", Payload::End), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn listener_can_register_during_dispatch() {
        let registry = Arc::new(ListenerRegistry::new());
        let inner = registry.clone();
        registry.register(
            "end",
            Box::new(move |_: Payload<'_>| {
                inner.register("end", Box::new(|_: Payload<'_>| {}));
            }),
        );

        assert_eq!(registry.dispatch("end", Payload::End), 1);
        assert_eq!(registry.count("end"), 2);
    }

    #[test]
    fn event_kind_names() {
        assert_eq!(EventKind::Error.as_str(), "error");
        assert_eq!(EventKind::Samples.as_str(), "samples");
        assert_eq!(EventKind::End.as_str(), "end");
    }
}
