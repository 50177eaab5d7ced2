use flv::FlvError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("FLV error: {0}")]
    Flv(#[from] FlvError),

    #[error("Channel sink closed")]
    Sink,

    #[error("Relay thread panicked")]
    ThreadPanicked,
}

impl RelayError {
    /// Whether the byte source ended cleanly between tags.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, RelayError::Flv(FlvError::EndOfStream))
    }
}
