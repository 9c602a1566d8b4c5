//! Streaming sample-rate interpolators.
//!
//! Each kernel keeps per-channel history across calls, so a stream can be fed
//! in arbitrary block sizes without seams.
//!
//! | Type | Quality | CPU Cost | Latency (frames) |
//! |---|---|---|---|
//! | [`LinearResampler`] | Okay | Very low | 1 |
//! | [`HermiteResampler`] | High (Catmull-Rom) | Low | 2 |
//! | [`SincResampler`] | Best (Blackman-windowed sinc) | Medium | taps / 2 |

pub mod hermite;
pub mod linear;
pub mod sinc;

pub use hermite::HermiteResampler;
pub use linear::LinearResampler;
pub use sinc::SincResampler;

use crate::configs::Quality;

pub enum Resampler {
    Linear(LinearResampler),
    Hermite(HermiteResampler),
    Sinc(SincResampler),
}

impl Resampler {
    pub fn new(quality: Quality, source_rate: u32, target_rate: u32, channels: usize) -> Self {
        match quality {
            Quality::Linear => Self::linear(source_rate, target_rate, channels),
            Quality::Hermite => Self::hermite(source_rate, target_rate, channels),
            Quality::Sinc => Self::sinc(source_rate, target_rate, channels),
        }
    }

    pub fn linear(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        Self::Linear(LinearResampler::new(source_rate, target_rate, channels))
    }

    pub fn hermite(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        Self::Hermite(HermiteResampler::new(source_rate, target_rate, channels))
    }

    pub fn sinc(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        Self::Sinc(SincResampler::new(source_rate, target_rate, channels))
    }

    /// Resample interleaved `input` and append the result to `output`.
    pub fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        match self {
            Self::Linear(r) => r.process(input, output),
            Self::Hermite(r) => r.process(input, output),
            Self::Sinc(r) => r.process(input, output),
        }
    }

    /// Input frames held as history and not yet reflected in the output.
    pub fn latency(&self) -> usize {
        match self {
            Self::Linear(_) => linear::LATENCY,
            Self::Hermite(_) => hermite::LATENCY,
            Self::Sinc(r) => r.latency(),
        }
    }
}
