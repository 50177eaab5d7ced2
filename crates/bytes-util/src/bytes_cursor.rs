use std::io;

use bytes::Bytes;

use crate::source::{ByteSource, SourceError};

/// A cursor over an in-memory [`Bytes`] buffer.
///
/// Reads through [`ByteSource`] slice the underlying buffer instead of
/// copying it.
pub type BytesCursor = io::Cursor<Bytes>;

/// Zero copy helpers for [`BytesCursor`].
pub trait BytesCursorExt {
    /// Number of bytes left between the cursor position and the end of the buffer.
    fn remaining(&self) -> usize;

    /// Extracts `size` bytes from the cursor in O(1) time.
    ///
    /// On failure the cursor is left where it was.
    fn extract_bytes(&mut self, size: usize) -> Result<Bytes, SourceError>;
}

impl BytesCursorExt for BytesCursor {
    fn remaining(&self) -> usize {
        self.get_ref()
            .len()
            .saturating_sub(self.position() as usize)
    }

    fn extract_bytes(&mut self, size: usize) -> Result<Bytes, SourceError> {
        if size == 0 {
            return Ok(Bytes::new());
        }

        let available = BytesCursorExt::remaining(self);
        if size > available {
            return Err(SourceError::UnexpectedEnd {
                requested: size,
                received: available,
            });
        }

        let position = self.position() as usize;
        let slice = self.get_ref().slice(position..position + size);
        self.set_position((position + size) as u64);

        Ok(slice)
    }
}

impl ByteSource for BytesCursor {
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, SourceError> {
        self.extract_bytes(len)
    }

    fn skip(&mut self, len: usize) -> Result<(), SourceError> {
        self.extract_bytes(len).map(|_| ())
    }
}
