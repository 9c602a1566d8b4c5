//! Messages crossing the two queues.

use crate::audio::format::Format;

use super::listeners::EventKind;

/// Inbound work for the resample worker, processed strictly in push order.
#[derive(Debug)]
pub enum Message {
    SourceFormat(Format),
    DestinationFormat(Format),
    /// Packed source-format bytes, owned by the queue until converted.
    Samples(Vec<u8>),
    End,
    Stop,
}

/// Outbound results, delivered to listeners in production order.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Samples(Vec<u8>),
    Error(String),
    End,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Samples(_) => EventKind::Samples,
            Self::Error(_) => EventKind::Error,
            Self::End => EventKind::End,
        }
    }
}
