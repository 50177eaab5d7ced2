use std::io;

use super::define::Amf0Marker;

/// Errors that can occur when walking AMF0 data.
///
/// Every variant means the metadata could not be trusted; callers treat them
/// all as malformed metadata.
#[derive(Debug, thiserror::Error)]
pub enum Amf0ReadError {
    /// A byte that is not an AMF0 marker was encountered.
    #[error("unknown marker: {0}")]
    UnknownMarker(u8),
    /// A valid marker the walker refuses to step over.
    #[error("unsupported type: {0:?}")]
    UnsupportedType(Amf0Marker),
    /// A value of a specific type was required but another one was found.
    #[error("wrong type: expected {expected:?}, got {got:?}")]
    WrongType {
        /// The marker that was required.
        expected: Amf0Marker,
        /// The marker that was found.
        got: Amf0Marker,
    },
    /// An empty property name was not followed by the object end marker.
    #[error("missing object end marker, got byte {0:#04x}")]
    MissingObjectEnd(u8),
    /// Containers were nested deeper than the decoder allows.
    #[error("nesting too deep: limit is {0}")]
    NestingTooDeep(usize),
    /// The data ended in the middle of a value.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
