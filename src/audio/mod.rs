pub mod constants;
pub mod convert;
pub mod engine;
pub mod format;
pub mod resample;

pub use engine::{BoxedEngine, Engine, EngineFactory, SoftwareEngine, SoftwareEngineFactory};
pub use format::{ChannelLayout, Format, FormatSpec, SampleEncoding};
pub use resample::Resampler;
