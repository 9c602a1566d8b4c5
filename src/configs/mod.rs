pub mod base;
pub mod convert;
pub mod logging;
pub mod resampler;

pub use base::*;
pub use convert::*;
pub use logging::*;
pub use resampler::*;
