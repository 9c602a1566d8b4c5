//! Delivers worker events to listeners on the host runtime.
//!
//! The worker never touches listeners. It pushes onto the outbound queue and
//! signals a [`WakeHandle`]; the bridge task wakes up on the tokio runtime and
//! drains the queue in order.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use bytes::Bytes;
use tokio::sync::Notify;
use tracing::{debug, trace};

use super::{
    listeners::{ListenerRegistry, Payload},
    message::Event,
};
use crate::sync::Queue;

/// Fire-and-forget wake signal shared by the worker, the bridge and the
/// owning [`StreamResampler`](super::StreamResampler).
///
/// A signal sent while the bridge is busy is remembered, so no wake-up is lost.
#[derive(Clone, Default)]
pub struct WakeHandle {
    notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
}

impl WakeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// Releases the handle. The bridge performs one last drain and exits.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

pub struct Bridge {
    outbound: Arc<Queue<Event>>,
    listeners: Arc<ListenerRegistry>,
    wake: WakeHandle,
}

impl Bridge {
    pub fn new(outbound: Arc<Queue<Event>>, listeners: Arc<ListenerRegistry>, wake: WakeHandle) -> Self {
        Self {
            outbound,
            listeners,
            wake,
        }
    }

    /// Pops until the queue is empty, delivering each event. Returns the
    /// number of events popped; a spurious wake yields 0.
    pub fn drain(&self) -> usize {
        let mut popped = 0;
        while let Some(event) = self.outbound.try_pop() {
            self.deliver(event);
            popped += 1;
        }
        popped
    }

    fn deliver(&self, event: Event) {
        let kind = event.kind().as_str();
        let invoked = match event {
            Event::Samples(buf) => {
                let bytes = Bytes::from(buf);
                self.listeners.dispatch(kind, Payload::Samples(&bytes))
            }
            Event::Error(message) => self.listeners.dispatch(kind, Payload::Error(&message)),
            Event::End => self.listeners.dispatch(kind, Payload::End),
        };
        trace!("Delivered {} event to {} listener(s)", kind, invoked);
    }

    pub async fn run(self) {
        loop {
            self.wake.wait().await;
            self.drain();
            if self.wake.is_closed() {
                // Anything pushed between the drain and the close flag.
                self.drain();
                break;
            }
        }
        debug!("Outbound bridge stopped");
    }
}
