//! Central constants for the conversion pipeline.

// ── Scratch sizing ───────────────────────────────────────────────────────────

/// Source chunk size (samples per channel) assumed before any data arrives.
pub const DEFAULT_CHUNK_SAMPLES: usize = 1_024;

/// Consecutive zero-output conversions before a low-output warning.
pub const DEFAULT_STALL_WARN_AFTER: u32 = 32;

// ── Software engine limits ───────────────────────────────────────────────────

/// Highest sample rate the software engine accepts (Hz).
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Largest up- or down-sampling factor the software engine accepts.
pub const MAX_RATE_RATIO: u32 = 256;

/// Taps of the windowed-sinc kernel (even).
pub const SINC_TAPS: usize = 32;

// ── Sample scaling ───────────────────────────────────────────────────────────

pub const U8_BIAS: f32 = 128.0;
pub const INT16_SCALE: f32 = 32_768.0;
pub const INT32_SCALE: f64 = 2_147_483_648.0;
