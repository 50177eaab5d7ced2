use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

/// Errors produced by a [`ByteSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source ran out of data before `requested` bytes could be read.
    ///
    /// `received` is the number of bytes that were available. A value of zero
    /// means the source ended exactly at the read boundary.
    #[error("unexpected end of input: requested {requested} bytes, received {received}")]
    UnexpectedEnd {
        /// Number of bytes the caller asked for.
        requested: usize,
        /// Number of bytes that were actually available.
        received: usize,
    },
    /// The underlying reader failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl SourceError {
    /// Returns true if the source ended before yielding a single requested byte.
    pub fn is_clean_end(&self) -> bool {
        matches!(self, SourceError::UnexpectedEnd { received: 0, .. })
    }
}

/// A blocking, forward-only source of bytes.
///
/// Reads either return exactly the requested amount or fail. There is no way
/// to seek backwards.
pub trait ByteSource {
    /// Reads exactly `len` bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, SourceError>;

    /// Discards exactly `len` bytes.
    fn skip(&mut self, len: usize) -> Result<(), SourceError>;

    /// Reads a single byte.
    fn read_u8(&mut self) -> Result<u8, SourceError> {
        let byte = self.read_bytes(1)?;
        Ok(byte[0])
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, SourceError> {
        (**self).read_bytes(len)
    }

    fn skip(&mut self, len: usize) -> Result<(), SourceError> {
        (**self).skip(len)
    }

    fn read_u8(&mut self) -> Result<u8, SourceError> {
        (**self).read_u8()
    }
}

/// A [`ByteSource`] backed by any [`std::io::Read`] implementation.
///
/// Every read blocks until the requested amount has arrived or the reader
/// reports end of file.
#[derive(Debug)]
pub struct ReadSource<R> {
    reader: R,
    position: u64,
}

impl<R: Read> ReadSource<R> {
    /// Wraps a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
        }
    }

    /// Total number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Consumes the source, returning the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, SourceError> {
        let mut buf = BytesMut::zeroed(len);
        let mut filled = 0;

        while filled < len {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.position += filled as u64;
                    return Err(SourceError::UnexpectedEnd {
                        requested: len,
                        received: filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        self.position += len as u64;
        Ok(buf.freeze())
    }

    fn skip(&mut self, len: usize) -> Result<(), SourceError> {
        let skipped = io::copy(&mut (&mut self.reader).take(len as u64), &mut io::sink())?;
        self.position += skipped;

        if skipped < len as u64 {
            return Err(SourceError::UnexpectedEnd {
                requested: len,
                received: skipped as usize,
            });
        }
        Ok(())
    }
}
