//! The resample worker: a dedicated thread that owns the engine session.
//!
//! It blocks on the inbound [`WaitQueue`], applies format changes, converts
//! sample buffers and pushes [`Event`]s to the outbound queue, signalling the
//! bridge after every push.

use std::{io, ops::ControlFlow, sync::Arc, thread};

use tracing::{debug, error, info_span, trace, warn};

use super::{
    bridge::WakeHandle,
    message::{Event, Message},
};
use crate::{
    audio::{
        engine::{BoxedEngine, EngineFactory},
        format::Format,
    },
    common::errors::EngineError,
    configs::ResamplerConfig,
    sync::{Queue, WaitQueue},
};

/// A live engine plus its reusable output buffer.
struct Session {
    source: Format,
    destination: Format,
    engine: BoxedEngine,
    scratch: Vec<u8>,
    /// Scratch size in destination frames. Only ever grows.
    capacity: usize,
}

enum State {
    Idle,
    Ready(Session),
    Stopped,
}

pub struct Worker {
    inbound: Arc<WaitQueue<Message>>,
    outbound: Arc<Queue<Event>>,
    wake: WakeHandle,
    factory: Arc<dyn EngineFactory>,
    source: Option<Format>,
    destination: Option<Format>,
    state: State,
    /// Frame count of the most recent source chunk.
    last_chunk: usize,
    empty_runs: u32,
    stall_warn_after: u32,
}

fn alloc_scratch(frames: usize, format: &Format) -> Result<Vec<u8>, EngineError> {
    let len = format.bytes_for(frames);
    let mut scratch = Vec::new();
    scratch
        .try_reserve_exact(len)
        .map_err(|_| EngineError::Alloc {
            frames: frames as u64,
        })?;
    scratch.resize(len, 0);
    Ok(scratch)
}

impl Session {
    fn new(source: Format, destination: Format, engine: BoxedEngine, chunk: usize) -> Result<Self, EngineError> {
        let capacity = (chunk as u64 * destination.rate() as u64).div_ceil(source.rate() as u64) as usize;
        Ok(Self {
            scratch: alloc_scratch(capacity, &destination)?,
            source,
            destination,
            engine,
            capacity,
        })
    }

    /// Converts one source buffer. `Ok(None)` means the engine produced
    /// nothing this time.
    fn convert(&mut self, input: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let frames = self.source.frames_in(input.len()) as u64;
        let needed = ((self.engine.delay() + frames) * self.destination.rate() as u64)
            .div_ceil(self.source.rate() as u64) as usize;

        if needed > self.capacity {
            self.scratch = Vec::new();
            self.scratch = alloc_scratch(needed, &self.destination)?;
            debug!(
                "Grew scratch buffer from {} to {} frames",
                self.capacity, needed
            );
            self.capacity = needed;
        }

        let written = self.engine.convert(input, &mut self.scratch)?;
        if written == 0 {
            return Ok(None);
        }

        Ok(Some(
            self.scratch[..self.destination.bytes_for(written)].to_vec(),
        ))
    }
}

impl Worker {
    pub fn new(
        config: &ResamplerConfig,
        factory: Arc<dyn EngineFactory>,
        inbound: Arc<WaitQueue<Message>>,
        outbound: Arc<Queue<Event>>,
        wake: WakeHandle,
    ) -> Self {
        Self {
            inbound,
            outbound,
            wake,
            factory,
            source: None,
            destination: None,
            state: State::Idle,
            last_chunk: config.initial_chunk_samples.max(1),
            empty_runs: 0,
            stall_warn_after: config.stall_warn_after,
        }
    }

    pub fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("resample-worker".to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        let span = info_span!("resample_worker");
        let _enter = span.enter();
        debug!("Resample worker started");

        loop {
            let message = self.inbound.wait_pop();
            if self.handle(message).is_break() {
                break;
            }
        }

        debug!("Resample worker stopped");
    }

    /// Applies one inbound message. `Break` means the worker must exit.
    pub fn handle(&mut self, message: Message) -> ControlFlow<()> {
        match message {
            Message::SourceFormat(format) => {
                self.source = Some(format);
                self.rebuild();
            }
            Message::DestinationFormat(format) => {
                self.destination = Some(format);
                self.rebuild();
            }
            Message::Samples(buf) => self.convert(buf),
            Message::End => self.emit(Event::End),
            Message::Stop => {
                self.state = State::Stopped;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn rebuild(&mut self) {
        let (Some(source), Some(destination)) = (self.source, self.destination) else {
            return;
        };

        // Resubmitting the live pair keeps the engine history.
        if let State::Ready(session) = &self.state {
            if session.source == source && session.destination == destination {
                trace!("Format unchanged, keeping session");
                return;
            }
        }

        // Old engine and scratch go away before the new ones are built.
        self.state = State::Idle;
        self.empty_runs = 0;

        let session = self
            .factory
            .create(&source, &destination)
            .and_then(|engine| Session::new(source, destination, engine, self.last_chunk));

        match session {
            Ok(session) => {
                debug!(
                    "Session ready: {} -> {} ({} frame scratch)",
                    source, destination, session.capacity
                );
                self.state = State::Ready(session);
            }
            Err(e) => self.fail(e),
        }
    }

    fn convert(&mut self, buf: Vec<u8>) {
        let State::Ready(session) = &mut self.state else {
            trace!("Dropping {} bytes: no active session", buf.len());
            return;
        };

        let frames = session.source.frames_in(buf.len());
        let outcome = session.convert(&buf);
        if frames > 0 {
            self.last_chunk = frames;
        }

        match outcome {
            Ok(Some(out)) => {
                self.empty_runs = 0;
                self.emit(Event::Samples(out));
            }
            Ok(None) => {
                if self.record_empty_run() {
                    warn!(
                        "{} consecutive conversions produced no output; consider larger input chunks",
                        self.empty_runs
                    );
                }
            }
            Err(e) => {
                // Conversion failures need both formats resubmitted.
                self.source = None;
                self.destination = None;
                self.fail(e);
            }
        }
    }

    /// Counts a conversion that produced nothing. Returns `true` exactly once
    /// per run, when the run reaches `stall_warn_after`.
    fn record_empty_run(&mut self) -> bool {
        self.empty_runs += 1;
        self.empty_runs == self.stall_warn_after
    }

    fn fail(&mut self, e: EngineError) {
        error!("{}", e);
        self.state = State::Idle;
        self.emit(Event::Error(e.to_string()));
    }

    fn emit(&self, event: Event) {
        self.outbound.push(event);
        self.wake.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        engine::{Engine, SoftwareEngineFactory},
        format::{ChannelLayout, SampleEncoding},
    };

    struct Harness {
        worker: Worker,
        outbound: Arc<Queue<Event>>,
    }

    impl Harness {
        fn new(factory: Arc<dyn EngineFactory>) -> Self {
            Self::with_config(factory, &ResamplerConfig::default())
        }

        fn with_config(factory: Arc<dyn EngineFactory>, config: &ResamplerConfig) -> Self {
            let outbound = Arc::new(Queue::new());
            let worker = Worker::new(
                config,
                factory,
                Arc::new(WaitQueue::new()),
                outbound.clone(),
                WakeHandle::new(),
            );
            Self { worker, outbound }
        }

        fn software() -> Self {
            Self::new(Arc::new(SoftwareEngineFactory::default()))
        }

        fn send(&mut self, message: Message) {
            assert!(self.worker.handle(message).is_continue());
        }

        fn events(&self) -> Vec<Event> {
            std::iter::from_fn(|| self.outbound.try_pop()).collect()
        }

        fn is_ready(&self) -> bool {
            matches!(self.worker.state, State::Ready(_))
        }
    }

    fn s16(layout: ChannelLayout, rate: u32) -> Format {
        Format::new(layout, rate, SampleEncoding::S16).unwrap()
    }

    struct BrokenEngine;

    impl Engine for BrokenEngine {
        fn convert(&mut self, _: &[u8], _: &mut [u8]) -> Result<usize, EngineError> {
            Err(EngineError::convert("broken"))
        }

        fn delay(&self) -> u64 {
            0
        }
    }

    struct BrokenFactory;

    impl EngineFactory for BrokenFactory {
        fn create(&self, _: &Format, _: &Format) -> Result<BoxedEngine, EngineError> {
            Ok(Box::new(BrokenEngine))
        }
    }

    /// Buffers nothing until it sees a non-zero byte, then emits one frame.
    struct QuietEngine {
        frame_bytes: usize,
    }

    impl Engine for QuietEngine {
        fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, EngineError> {
            if input.iter().all(|&b| b == 0) {
                return Ok(0);
            }
            output[..self.frame_bytes].copy_from_slice(&input[..self.frame_bytes]);
            Ok(1)
        }

        fn delay(&self) -> u64 {
            0
        }
    }

    struct QuietFactory;

    impl EngineFactory for QuietFactory {
        fn create(&self, _: &Format, destination: &Format) -> Result<BoxedEngine, EngineError> {
            Ok(Box::new(QuietEngine {
                frame_bytes: destination.frame_bytes(),
            }))
        }
    }

    #[test]
    fn samples_without_session_are_dropped() {
        let mut h = Harness::software();
        h.send(Message::Samples(vec![0; 64]));
        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 8_000)));
        h.send(Message::Samples(vec![0; 64]));

        assert!(!h.is_ready());
        assert!(h.events().is_empty());
    }

    #[test]
    fn converts_once_both_formats_are_set() {
        let mut h = Harness::software();
        h.send(Message::SourceFormat(s16(ChannelLayout::Stereo, 48_000)));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 48_000)));
        assert!(h.is_ready());

        h.send(Message::Samples(vec![0; 4 * 100]));
        h.send(Message::End);

        assert_eq!(h.events(), vec![Event::Samples(vec![0; 2 * 100]), Event::End]);
    }

    #[test]
    fn initial_scratch_scales_with_rate_ratio() {
        let mut h = Harness::software();
        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 44_100)));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 48_000)));

        let State::Ready(session) = &h.worker.state else {
            panic!("expected a session");
        };
        assert_eq!(session.capacity, 1_115);
        assert_eq!(session.scratch.len(), 1_115 * 2);
    }

    #[test]
    fn scratch_grows_for_large_chunks_and_never_shrinks() {
        let mut h = Harness::software();
        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 16_000)));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 32_000)));

        h.send(Message::Samples(vec![0; 2 * 4_000]));
        let grown = match &h.worker.state {
            State::Ready(session) => session.capacity,
            _ => panic!("expected a session"),
        };
        assert!(grown >= 8_000);

        h.send(Message::Samples(vec![0; 2 * 10]));
        match &h.worker.state {
            State::Ready(session) => assert_eq!(session.capacity, grown),
            _ => panic!("expected a session"),
        }
        assert_eq!(h.worker.last_chunk, 10);
    }

    #[test]
    fn engine_creation_failure_reports_error_and_recovers() {
        let mut h = Harness::software();
        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 100)));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 96_000)));
        assert!(!h.is_ready());

        let events = h.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Error(msg) if msg.starts_with("Unable to initialize")));

        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 48_000)));
        assert!(h.is_ready());
    }

    #[test]
    fn conversion_failure_drops_session_and_formats() {
        let mut h = Harness::new(Arc::new(BrokenFactory));
        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 8_000)));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 8_000)));
        h.send(Message::Samples(vec![0; 16]));
        h.send(Message::Samples(vec![0; 16]));

        assert_eq!(
            h.events(),
            vec![Event::Error("Unable to convert samples: broken".into())]
        );
        assert!(!h.is_ready());

        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 8_000)));
        assert!(!h.is_ready());
        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 8_000)));
        assert!(h.is_ready());
    }

    #[test]
    fn stop_breaks_the_loop() {
        let mut h = Harness::software();
        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 8_000)));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 8_000)));

        assert!(h.worker.handle(Message::Stop).is_break());
        assert!(matches!(h.worker.state, State::Stopped));
    }

    #[test]
    fn spawned_worker_exits_on_stop() {
        let inbound = Arc::new(WaitQueue::new());
        let outbound = Arc::new(Queue::new());
        let worker = Worker::new(
            &ResamplerConfig::default(),
            Arc::new(SoftwareEngineFactory::default()),
            inbound.clone(),
            outbound.clone(),
            WakeHandle::new(),
        );
        let handle = worker.spawn().unwrap();

        inbound.push(Message::End);
        inbound.push(Message::Stop);
        handle.join().unwrap();

        assert_eq!(outbound.try_pop(), Some(Event::End));
        assert!(outbound.is_empty());
    }

    #[test]
    fn empty_conversions_emit_nothing_and_count_the_run() {
        let config = ResamplerConfig {
            stall_warn_after: 3,
            ..ResamplerConfig::default()
        };
        let mut h = Harness::with_config(Arc::new(QuietFactory), &config);
        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 8_000)));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 8_000)));

        for _ in 0..5 {
            h.send(Message::Samples(vec![0; 32]));
        }
        assert!(h.events().is_empty());
        assert!(h.is_ready());
        assert_eq!(h.worker.empty_runs, 5);

        h.send(Message::Samples(vec![9, 1, 0, 0]));
        assert_eq!(h.events(), vec![Event::Samples(vec![9, 1])]);
        assert_eq!(h.worker.empty_runs, 0);
    }

    #[test]
    fn stall_warning_fires_once_per_run() {
        let config = ResamplerConfig {
            stall_warn_after: 3,
            ..ResamplerConfig::default()
        };
        let mut h = Harness::with_config(Arc::new(QuietFactory), &config);
        let fired: Vec<bool> = (0..6).map(|_| h.worker.record_empty_run()).collect();
        assert_eq!(fired, vec![false, false, true, false, false, false]);

        h.worker.empty_runs = 0;
        assert!(!h.worker.record_empty_run());
    }

    #[test]
    fn zero_stall_threshold_never_warns() {
        let config = ResamplerConfig {
            stall_warn_after: 0,
            ..ResamplerConfig::default()
        };
        let mut h = Harness::with_config(Arc::new(QuietFactory), &config);
        assert!((0..100).all(|_| !h.worker.record_empty_run()));
    }

    #[test]
    fn unchanged_format_keeps_the_live_session() {
        let mut h = Harness::software();
        let source = s16(ChannelLayout::Mono, 16_000);
        h.send(Message::SourceFormat(source));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 32_000)));
        h.send(Message::Samples(vec![0; 2 * 4_000]));

        let capacity = |h: &Harness| match &h.worker.state {
            State::Ready(session) => session.capacity,
            _ => panic!("expected a session"),
        };
        let grown = capacity(&h);
        assert!(grown >= 8_000);

        // A rebuild would size the scratch from the last chunk again.
        h.send(Message::SourceFormat(source));
        h.send(Message::DestinationFormat(s16(ChannelLayout::Mono, 32_000)));
        assert_eq!(capacity(&h), grown);

        h.send(Message::SourceFormat(s16(ChannelLayout::Mono, 8_000)));
        assert_eq!(capacity(&h), 16_000);
    }
}
