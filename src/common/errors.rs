//! Error taxonomy.
//!
//! - [`FormatError`]: validation failures, reported synchronously at the call site.
//! - [`EngineError`]: engine failures inside the worker, surfaced as `error` events.
//! - [`ResampleError`]: misuse of the instance API (lifecycle, feed bounds).

use std::io;

/// A format description could not be turned into a [`Format`](crate::audio::Format).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("format must be an object")]
    NotAnObject,

    #[error("format is missing field `{0}`")]
    MissingField(&'static str),

    #[error("format field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unsupported sample format: {0}")]
    UnsupportedEncoding(String),

    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u32),

    #[error("sample rate must be greater than zero")]
    ZeroRate,
}

/// Failures raised by a resampling engine. The worker renders these into
/// `error` events; they never cross the thread boundary as panics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Unable to initialize resampling engine: {reason}")]
    Init { reason: String },

    #[error("Unable to convert samples: {reason}")]
    Convert { reason: String },

    #[error("Unable to allocate destination sample data ({frames} samples)")]
    Alloc { frames: u64 },
}

impl EngineError {
    pub fn init(reason: impl Into<String>) -> Self {
        Self::Init {
            reason: reason.into(),
        }
    }

    pub fn convert(reason: impl Into<String>) -> Self {
        Self::Convert {
            reason: reason.into(),
        }
    }
}

/// Errors returned synchronously by [`StreamResampler`](crate::StreamResampler).
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    #[error("invalid format: {0}")]
    Format(#[from] FormatError),

    #[error("open() must be called from within a tokio runtime")]
    NoRuntime,

    #[error("resampler is already open")]
    AlreadyOpen,

    #[error("failed to spawn resample worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("feed length {length} exceeds buffer size {available}")]
    LengthOutOfBounds { length: usize, available: usize },

    #[error("resample worker panicked")]
    WorkerPanicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_messages_read_like_events() {
        assert_eq!(
            EngineError::convert("boom").to_string(),
            "Unable to convert samples: boom"
        );
        assert!(
            EngineError::Alloc { frames: 10 }
                .to_string()
                .starts_with("Unable to allocate")
        );
    }

    #[test]
    fn format_error_converts_into_resample_error() {
        let err: ResampleError = FormatError::ZeroRate.into();
        assert_eq!(
            err.to_string(),
            "invalid format: sample rate must be greater than zero"
        );
    }
}
