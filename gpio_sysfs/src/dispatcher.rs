//! Change dispatcher.
//!
//! Ordered, synchronous fan-out of change events. Listeners are invoked in
//! registration order on the caller's task. A panicking listener is isolated
//! and reported in the returned [`DispatchReport`]; the remaining listeners
//! still run.

use gpio_common::types::ChangeEvent;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identity of a registered listener, returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Clone)]
struct Subscriber {
    id: ListenerId,
    // Cleared on unsubscribe so a snapshot taken by an in-progress dispatch
    // skips the listener from then on.
    active: Arc<AtomicBool>,
    callback: Callback,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    list: Vec<Subscriber>,
}

/// Subscriber list with fault-isolating dispatch.
#[derive(Default)]
pub struct ChangeDispatcher {
    subscribers: Mutex<Subscribers>,
}

/// A listener that panicked during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFault {
    /// Faulting listener.
    pub listener: ListenerId,
    /// Panic payload, if it was a string.
    pub message: String,
}

impl fmt::Display for ListenerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener {:?} panicked: {}", self.listener, self.message)
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that returned normally.
    pub delivered: usize,
    /// Listeners that panicked.
    pub faults: Vec<ListenerFault>,
}

impl ChangeDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it is notified after all earlier ones.
    pub fn subscribe<L>(&self, listener: L) -> ListenerId
    where
        L: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut subs = self.subscribers.lock();
        let id = ListenerId(subs.next_id);
        subs.next_id += 1;
        subs.list.push(Subscriber {
            id,
            active: Arc::new(AtomicBool::new(true)),
            callback: Arc::new(listener),
        });
        id
    }

    /// Remove a listener. Returns `false` if the id is unknown.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut subs = self.subscribers.lock();
        match subs.list.iter().position(|s| s.id == id) {
            Some(idx) => {
                let removed = subs.list.remove(idx);
                removed.active.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Remove every listener.
    pub fn clear(&self) {
        let mut subs = self.subscribers.lock();
        for sub in subs.list.drain(..) {
            sub.active.store(false, Ordering::SeqCst);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.subscribers.lock().list.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every listener of `event`, in registration order.
    ///
    /// The subscriber list is snapshotted and the lock released before any
    /// listener runs, so listeners may subscribe or unsubscribe re-entrantly.
    pub fn dispatch(&self, event: &ChangeEvent) -> DispatchReport {
        let snapshot: Vec<Subscriber> = self.subscribers.lock().list.clone();
        let mut report = DispatchReport::default();

        for sub in snapshot {
            if !sub.active.load(Ordering::SeqCst) {
                continue;
            }
            let callback = &sub.callback;
            match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => report.faults.push(ListenerFault {
                    listener: sub.id,
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
        report
    }
}

impl fmt::Debug for ChangeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDispatcher")
            .field("listeners", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
