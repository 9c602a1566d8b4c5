//! `resampler`: the streaming converter instance.
//!
//! ```text
//!  host ──feed/format/end──▶ WaitQueue ──▶ resample-worker thread
//!                                              │ (owns engine session)
//!  listeners ◀── bridge task ◀── wake ◀── Queue<Event>
//! ```
//!
//! | Piece | Role |
//! |---|---|
//! | [`StreamResampler`] | Public handle: formats, feeding, listeners, teardown |
//! | [`worker::Worker`] | Blocking consumer, engine session state machine |
//! | [`bridge::Bridge`] | Drains outbound events on the tokio runtime |
//! | [`listeners::ListenerRegistry`] | Ordered per-kind callbacks |

pub mod bridge;
pub mod listeners;
pub mod message;
pub mod worker;

pub use bridge::WakeHandle;
pub use listeners::{EventKind, ListenerId, Payload};
pub use message::{Event, Message};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

use self::{bridge::Bridge, listeners::ListenerRegistry, worker::Worker};
use crate::{
    audio::{
        engine::{EngineFactory, SoftwareEngineFactory},
        format::Format,
    },
    common::errors::ResampleError,
    configs::ResamplerConfig,
    sync::{Queue, WaitQueue},
};

/// Asynchronous streaming converter.
///
/// Calls return immediately; conversion happens on a dedicated worker thread
/// and results arrive through listeners registered with [`on`](Self::on),
/// invoked from a task on the tokio runtime passed to [`open`](Self::open).
///
/// Listeners should be registered before the first event can be expected.
/// Registering later is safe but events delivered earlier are not replayed.
pub struct StreamResampler {
    config: ResamplerConfig,
    factory: Arc<dyn EngineFactory>,
    inbound: Arc<WaitQueue<Message>>,
    outbound: Arc<Queue<Event>>,
    listeners: Arc<ListenerRegistry>,
    wake: WakeHandle,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    bridge: Mutex<Option<JoinHandle<()>>>,
    opened: AtomicBool,
    closed: AtomicBool,
    saturated: AtomicBool,
}

impl StreamResampler {
    pub fn create() -> Self {
        Self::with_config(ResamplerConfig::default())
    }

    pub fn with_config(config: ResamplerConfig) -> Self {
        let factory = Arc::new(SoftwareEngineFactory::new(config.quality));
        Self::with_engine(config, factory)
    }

    pub fn with_engine(config: ResamplerConfig, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            config,
            factory,
            inbound: Arc::new(WaitQueue::new()),
            outbound: Arc::new(Queue::new()),
            listeners: Arc::new(ListenerRegistry::new()),
            wake: WakeHandle::new(),
            worker: Mutex::new(None),
            bridge: Mutex::new(None),
            opened: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            saturated: AtomicBool::new(false),
        }
    }

    /// Starts the worker thread and binds event delivery to the current
    /// tokio runtime.
    pub fn open(&self) -> Result<(), ResampleError> {
        let handle = Handle::try_current().map_err(|_| ResampleError::NoRuntime)?;
        self.open_on(&handle)
    }

    pub fn open_on(&self, runtime: &Handle) -> Result<(), ResampleError> {
        if self.opened.swap(true, Ordering::AcqRel) {
            return Err(ResampleError::AlreadyOpen);
        }

        let bridge = Bridge::new(
            self.outbound.clone(),
            self.listeners.clone(),
            self.wake.clone(),
        );
        let worker = Worker::new(
            &self.config,
            self.factory.clone(),
            self.inbound.clone(),
            self.outbound.clone(),
            self.wake.clone(),
        );

        *self.bridge.lock() = Some(runtime.spawn(bridge.run()));

        match worker.spawn() {
            Ok(thread) => {
                *self.worker.lock() = Some(thread);
                debug!("Resampler opened");
                Ok(())
            }
            Err(e) => {
                self.wake.close();
                Err(ResampleError::Spawn(e))
            }
        }
    }

    fn push(&self, message: Message) {
        self.inbound.push(message);

        let Some(high_watermark) = self.config.high_watermark else {
            return;
        };
        let pending = self.inbound.len();
        if pending >= high_watermark {
            if !self.saturated.swap(true, Ordering::Relaxed) {
                warn!(
                    "Inbound backlog reached {} messages (high watermark {})",
                    pending, high_watermark
                );
            }
        } else {
            self.saturated.store(false, Ordering::Relaxed);
        }
    }

    pub fn set_source_format(&self, format: Format) {
        self.push(Message::SourceFormat(format));
    }

    pub fn set_destination_format(&self, format: Format) {
        self.push(Message::DestinationFormat(format));
    }

    /// Validates a `{channels, rate, format}` object before queueing it.
    pub fn set_source_format_value(&self, value: &Value) -> Result<(), ResampleError> {
        self.set_source_format(Format::from_value(value)?);
        Ok(())
    }

    pub fn set_destination_format_value(&self, value: &Value) -> Result<(), ResampleError> {
        self.set_destination_format(Format::from_value(value)?);
        Ok(())
    }

    /// Queues a copy of the first `length` bytes of `buf` (all of it when
    /// `length` is `None` or zero). The caller may reuse `buf` as soon as
    /// this returns. An empty `buf` is a no-op.
    pub fn feed(&self, buf: &[u8], length: Option<usize>) -> Result<(), ResampleError> {
        let length = match length {
            Some(0) | None => buf.len(),
            Some(n) => n,
        };
        if length > buf.len() {
            return Err(ResampleError::LengthOutOfBounds {
                length,
                available: buf.len(),
            });
        }
        if length > 0 {
            self.push(Message::Samples(buf[..length].to_vec()));
        }
        Ok(())
    }

    pub fn feed_owned(&self, buf: Vec<u8>) {
        if !buf.is_empty() {
            self.push(Message::Samples(buf));
        }
    }

    pub fn end(&self) {
        self.push(Message::End);
    }

    /// Registers `callback` for events named `kind` (`"error"`, `"samples"`
    /// or `"end"`). Other names are accepted and never fire.
    pub fn on<F>(&self, kind: &str, callback: F) -> ListenerId
    where
        F: FnMut(Payload<'_>) + Send + 'static,
    {
        self.listeners.register(kind, Box::new(callback))
    }

    pub fn on_samples<F>(&self, mut callback: F) -> ListenerId
    where
        F: FnMut(&Bytes) + Send + 'static,
    {
        self.on(EventKind::Samples.as_str(), move |payload: Payload<'_>| {
            if let Payload::Samples(bytes) = payload {
                callback(bytes);
            }
        })
    }

    pub fn on_error<F>(&self, mut callback: F) -> ListenerId
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.on(EventKind::Error.as_str(), move |payload: Payload<'_>| {
            if let Payload::Error(message) = payload {
                callback(message);
            }
        })
    }

    pub fn on_end<F>(&self, mut callback: F) -> ListenerId
    where
        F: FnMut() + Send + 'static,
    {
        self.on(EventKind::End.as_str(), move |payload: Payload<'_>| {
            if let Payload::End = payload {
                callback();
            }
        })
    }

    /// Removes a listener. Returns `false` if it was already removed.
    pub fn off(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Live listeners registered for `kind`.
    pub fn listener_count(&self, kind: &str) -> usize {
        self.listeners.count(kind)
    }

    /// Messages queued for the worker and not yet picked up.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// `true` while the backlog is at or above the configured high watermark.
    pub fn is_saturated(&self) -> bool {
        self.config
            .high_watermark
            .is_some_and(|hw| self.inbound.len() >= hw)
    }

    /// Stops the worker after it has processed everything queued so far,
    /// then releases the wake handle. Safe to call more than once.
    ///
    /// Blocks the calling thread until the worker exits; from async code
    /// prefer [`shutdown`](Self::shutdown).
    pub fn close(&self) -> Result<(), ResampleError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.inbound.push(Message::Stop);
        let joined = match self.worker.lock().take() {
            Some(thread) => thread.join().map_err(|_| ResampleError::WorkerPanicked),
            None => Ok(()),
        };
        self.wake.close();
        debug!("Resampler closed");
        joined
    }

    /// Closes the instance and waits until every queued event has been
    /// delivered to listeners.
    pub async fn shutdown(self) -> Result<(), ResampleError> {
        let bridge = self.bridge.lock().take();

        let closed = tokio::task::spawn_blocking(move || self.close())
            .await
            .map_err(|_| ResampleError::WorkerPanicked)?;

        if let Some(bridge) = bridge {
            if let Err(e) = bridge.await {
                warn!("Outbound bridge ended abnormally: {}", e);
            }
        }
        closed
    }
}

impl Drop for StreamResampler {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Resampler teardown failed: {}", e);
        }
    }
}
