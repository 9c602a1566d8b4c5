//! Validated description of a packed PCM stream: channel layout, sample
//! rate and sample encoding.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::errors::FormatError;

/// Named channel arrangement. Samples are always interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn from_count(channels: u32) -> Result<Self, FormatError> {
        match channels {
            1 => Ok(Self::Mono),
            2 => Ok(Self::Stereo),
            n => Err(FormatError::UnsupportedChannels(n)),
        }
    }

    pub const fn channels(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Binary representation of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    U8,
    S16,
    S32,
    F32,
    F64,
}

impl SampleEncoding {
    pub const fn bits(self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::S16 => 16,
            Self::S32 | Self::F32 => 32,
            Self::F64 => 64,
        }
    }

    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Wire name: `u8`, `s16`, `s32`, `flt` or `dbl`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F32 => "flt",
            Self::F64 => "dbl",
        }
    }
}

impl FromStr for SampleEncoding {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" => Ok(Self::U8),
            "s16" => Ok(Self::S16),
            "s32" => Ok(Self::S32),
            "flt" => Ok(Self::F32),
            "dbl" => Ok(Self::F64),
            other => Err(FormatError::UnsupportedEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unvalidated format description, shaped like the objects accepted by
/// `setSourceFormat`/`setDestinationFormat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub channels: u32,
    pub rate: u32,
    pub format: String,
}

/// A fully validated stream format. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FormatSpec", into = "FormatSpec")]
pub struct Format {
    layout: ChannelLayout,
    rate: u32,
    encoding: SampleEncoding,
}

impl Format {
    pub fn new(layout: ChannelLayout, rate: u32, encoding: SampleEncoding) -> Result<Self, FormatError> {
        if rate == 0 {
            return Err(FormatError::ZeroRate);
        }
        Ok(Self {
            layout,
            rate,
            encoding,
        })
    }

    /// Validates a candidate. Any failure yields an error, never a partially
    /// populated format.
    pub fn validate(spec: &FormatSpec) -> Result<Self, FormatError> {
        let encoding = spec.format.parse()?;
        let layout = ChannelLayout::from_count(spec.channels)?;
        Self::new(layout, spec.rate, encoding)
    }

    /// Validates a loosely typed object such as
    /// `{"channels": 2, "rate": 44100, "format": "s16"}`.
    pub fn from_value(value: &Value) -> Result<Self, FormatError> {
        let obj = value.as_object().ok_or(FormatError::NotAnObject)?;

        let uint = |field: &'static str| -> Result<u32, FormatError> {
            let v = obj.get(field).ok_or(FormatError::MissingField(field))?;
            v.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or(FormatError::WrongType {
                    field,
                    expected: "an unsigned 32-bit integer",
                })
        };

        let channels = uint("channels")?;
        let rate = uint("rate")?;
        let format = obj
            .get("format")
            .ok_or(FormatError::MissingField("format"))?
            .as_str()
            .ok_or(FormatError::WrongType {
                field: "format",
                expected: "a string",
            })?;

        Self::validate(&FormatSpec {
            channels,
            rate,
            format: format.to_string(),
        })
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    /// Bytes in one interleaved frame (one sample for every channel).
    pub fn frame_bytes(&self) -> usize {
        self.channels() * self.encoding.bytes()
    }

    /// Whole frames contained in `len` bytes; a trailing partial frame is ignored.
    pub fn frames_in(&self, len: usize) -> usize {
        len / self.channels() / self.encoding.bytes()
    }

    pub fn bytes_for(&self, frames: usize) -> usize {
        frames * self.frame_bytes()
    }
}

impl TryFrom<FormatSpec> for Format {
    type Error = FormatError;

    fn try_from(spec: FormatSpec) -> Result<Self, Self::Error> {
        Self::validate(&spec)
    }
}

impl From<Format> for FormatSpec {
    fn from(format: Format) -> Self {
        Self {
            channels: format.channels() as u32,
            rate: format.rate,
            format: format.encoding.name().to_string(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}Hz {}ch", self.encoding, self.rate, self.channels())
    }
}
