use amf0::Amf0ReadError;
use bytes_util::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlvError {
    /// The source ended cleanly on a record boundary.
    #[error("End of stream")]
    EndOfStream,
    #[error("Truncated input while reading {context}: needed {requested} bytes, got {received}")]
    TruncatedInput {
        context: &'static str,
        requested: usize,
        received: usize,
    },
    #[error("Invalid container signature: {0:02x?}")]
    InvalidContainerSignature([u8; 3]),
    #[error("Tag payload of {0} bytes exceeds the 24-bit data size field")]
    PayloadTooLarge(usize),
    #[error("Malformed metadata: {0}")]
    MalformedMetadata(#[from] Amf0ReadError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlvError {
    /// Maps a source failure at the start of a record, where running dry is a
    /// clean end rather than truncation.
    pub(crate) fn at_boundary(err: SourceError, context: &'static str) -> Self {
        if err.is_clean_end() {
            FlvError::EndOfStream
        } else {
            Self::within(err, context)
        }
    }

    /// Maps a source failure inside a record.
    pub(crate) fn within(err: SourceError, context: &'static str) -> Self {
        match err {
            SourceError::UnexpectedEnd {
                requested,
                received,
            } => FlvError::TruncatedInput {
                context,
                requested,
                received,
            },
            SourceError::Io(e) => FlvError::Io(e),
        }
    }

    /// Whether the stream cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FlvError::MalformedMetadata(_))
    }
}
