use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::Format;

/// File-to-file conversion settings for the `resample-stream` binary.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub source: Format,
    pub destination: Format,
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: usize,
}

fn default_chunk_bytes() -> usize {
    4096
}
