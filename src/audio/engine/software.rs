//! `engine/software.rs`: pure-Rust conversion engine.
//!
//! Packed source bytes are decoded to `f32`, remixed to the destination
//! layout, run through a [`Resampler`] and encoded into the destination
//! encoding. Resampled frames that do not fit into the caller's buffer are
//! kept in `pending` and emitted first on the next call.

use tracing::debug;

use super::{BoxedEngine, Engine, EngineFactory};
use crate::{
    audio::{
        constants::{MAX_RATE_RATIO, MAX_SAMPLE_RATE},
        convert::{decode_into, encode_into, remix_into},
        format::Format,
        resample::Resampler,
    },
    common::errors::EngineError,
    configs::Quality,
};

pub struct SoftwareEngine {
    source: Format,
    destination: Format,
    /// `None` when both rates match.
    resampler: Option<Resampler>,
    decoded: Vec<f32>,
    remixed: Vec<f32>,
    /// Destination-layout samples waiting for room in an output buffer.
    pending: Vec<f32>,
}

impl SoftwareEngine {
    pub fn new(quality: Quality, source: &Format, destination: &Format) -> Result<Self, EngineError> {
        for rate in [source.rate(), destination.rate()] {
            if rate > MAX_SAMPLE_RATE {
                return Err(EngineError::init(format!(
                    "sample rate {rate}Hz exceeds {MAX_SAMPLE_RATE}Hz"
                )));
            }
        }

        let (lo, hi) = if source.rate() < destination.rate() {
            (source.rate(), destination.rate())
        } else {
            (destination.rate(), source.rate())
        };
        if hi / lo > MAX_RATE_RATIO || (hi / lo == MAX_RATE_RATIO && hi % lo != 0) {
            return Err(EngineError::init(format!(
                "rate ratio {}:{} exceeds {MAX_RATE_RATIO}:1",
                source.rate(),
                destination.rate()
            )));
        }

        let resampler = (source.rate() != destination.rate()).then(|| {
            Resampler::new(
                quality,
                source.rate(),
                destination.rate(),
                destination.channels(),
            )
        });

        debug!(
            "Software engine {} -> {} ({:?})",
            source, destination, quality
        );

        Ok(Self {
            source: *source,
            destination: *destination,
            resampler,
            decoded: Vec::new(),
            remixed: Vec::new(),
            pending: Vec::new(),
        })
    }

    fn pending_frames(&self) -> usize {
        self.pending.len() / self.destination.channels()
    }
}

impl Engine for SoftwareEngine {
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, EngineError> {
        let whole = self.source.bytes_for(self.source.frames_in(input.len()));

        self.decoded.clear();
        decode_into(self.source.encoding(), &input[..whole], &mut self.decoded);

        self.remixed.clear();
        remix_into(
            &self.decoded,
            self.source.layout(),
            self.destination.layout(),
            &mut self.remixed,
        );

        match self.resampler.as_mut() {
            Some(r) => r.process(&self.remixed, &mut self.pending),
            None => self.pending.extend_from_slice(&self.remixed),
        }

        let channels = self.destination.channels();
        let frames = self.pending_frames().min(self.destination.frames_in(output.len()));
        let samples = frames * channels;

        encode_into(
            self.destination.encoding(),
            &self.pending[..samples],
            &mut output[..self.destination.bytes_for(frames)],
        );
        self.pending.drain(..samples);

        Ok(frames)
    }

    fn delay(&self) -> u64 {
        let latency = self.resampler.as_ref().map_or(0, Resampler::latency) as u64;
        let pending = self.pending_frames() as u64;
        let src = self.source.rate() as u64;
        let dst = self.destination.rate() as u64;
        latency + (pending * src).div_ceil(dst)
    }
}

/// Creates [`SoftwareEngine`]s with a fixed interpolator quality.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareEngineFactory {
    quality: Quality,
}

impl SoftwareEngineFactory {
    pub fn new(quality: Quality) -> Self {
        Self { quality }
    }
}

impl EngineFactory for SoftwareEngineFactory {
    fn create(&self, source: &Format, destination: &Format) -> Result<BoxedEngine, EngineError> {
        Ok(Box::new(SoftwareEngine::new(self.quality, source, destination)?))
    }
}
