//! `engine/mod.rs`: resampling engine abstraction.
//!
//! The worker only ever talks to an engine through these two traits, so any
//! backend can be plugged in. One concrete implementation ships with the crate:
//!
//! | Engine | Description |
//! |---|---|
//! | [`SoftwareEngine`] | decode → remix → streaming interpolator → encode, all in `f32` |

pub mod software;

pub use software::{SoftwareEngine, SoftwareEngineFactory};

use crate::{audio::format::Format, common::errors::EngineError};

// ─── Engine trait ─────────────────────────────────────────────────────────────

/// A live conversion from one [`Format`] to another.
///
/// Engines are stateful: history and any output that did not fit into the
/// caller's buffer carry over to the next call.
pub trait Engine: Send {
    /// Converts the whole source frames in `input` and writes at most
    /// `output.len() / destination.frame_bytes()` frames into `output`.
    ///
    /// Returns the number of destination frames written. Frames that do not
    /// fit stay buffered and show up in [`delay`](Engine::delay).
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, EngineError>;

    /// Frames held inside the engine, expressed at the source rate.
    fn delay(&self) -> u64;
}

/// Type-erased engine that owns and drives any `Engine` implementation.
pub type BoxedEngine = Box<dyn Engine>;

/// Builds engines for a `(source, destination)` pair.
pub trait EngineFactory: Send + Sync {
    fn create(&self, source: &Format, destination: &Format) -> Result<BoxedEngine, EngineError>;
}
