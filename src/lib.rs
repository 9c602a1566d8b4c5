pub mod audio;
pub mod common;
pub mod configs;
pub mod resampler;
pub mod sync;
pub mod transcode;

pub use audio::{ChannelLayout, Format, SampleEncoding};
pub use resampler::{EventKind, ListenerId, Payload, StreamResampler};
