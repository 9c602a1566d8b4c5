use serde::{Deserialize, Serialize};

use crate::audio::constants::{DEFAULT_CHUNK_SAMPLES, DEFAULT_STALL_WARN_AFTER};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResamplerConfig {
    #[serde(default)]
    pub quality: Quality,
    /// Source chunk size (samples per channel) used to size the scratch
    /// buffer before the first chunk arrives.
    #[serde(default = "default_initial_chunk_samples")]
    pub initial_chunk_samples: usize,
    /// Inbound backlog at which the instance reports itself as saturated.
    /// Feeding never blocks; this only drives `is_saturated()` and a warning.
    #[serde(default)]
    pub high_watermark: Option<usize>,
    /// Consecutive empty conversions before a low-output warning is logged.
    #[serde(default = "default_stall_warn_after")]
    pub stall_warn_after: u32,
}

/// Interpolation kernel used by the built-in software engine.
#[derive(Debug, Deserialize, Serialize, Clone, Default, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Linear,
    #[default]
    Hermite,
    Sinc,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            initial_chunk_samples: default_initial_chunk_samples(),
            high_watermark: None,
            stall_warn_after: default_stall_warn_after(),
        }
    }
}

fn default_initial_chunk_samples() -> usize {
    DEFAULT_CHUNK_SAMPLES
}

fn default_stall_warn_after() -> u32 {
    DEFAULT_STALL_WARN_AFTER
}
