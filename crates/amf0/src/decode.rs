use std::io::{Cursor, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use num_traits::FromPrimitive;

use super::{Amf0Marker, Amf0ReadError};

/// Maximum depth of nested objects and arrays the decoder will follow.
pub const MAX_NESTING_DEPTH: usize = 64;

const AUDIO_DATA_RATE: &[u8] = b"audiodatarate";
const VIDEO_DATA_RATE: &[u8] = b"videodatarate";

/// An AMF0 Decoder.
///
/// The decoder steps over values rather than building them. While it walks
/// object and ECMA array properties it adds any `audiodatarate` or
/// `videodatarate` number it meets to a running bitrate accumulator.
pub struct Amf0Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
    bitrate: i64,
    depth: usize,
}

impl<'a> Amf0Decoder<'a> {
    /// Create a new AMF0 decoder.
    pub const fn new(buff: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buff),
            bitrate: 0,
            depth: 0,
        }
    }

    /// Check if the decoder has reached the end of the AMF0 data.
    pub const fn is_empty(&self) -> bool {
        self.cursor.get_ref().len() <= self.cursor.position() as usize
    }

    /// Current read offset into the buffer.
    pub const fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// The sum of all data rates seen since the last [`reset_bitrate`](Self::reset_bitrate).
    pub const fn bitrate(&self) -> i64 {
        self.bitrate
    }

    /// Clear the bitrate accumulator.
    pub fn reset_bitrate(&mut self) {
        self.bitrate = 0;
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Amf0ReadError> {
        let buf: &'a [u8] = *self.cursor.get_ref();
        let pos = self.cursor.position() as usize;
        let end = pos
            .checked_add(len)
            .filter(|end| *end <= buf.len())
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;

        self.cursor.set_position(end as u64);
        Ok(&buf[pos..end])
    }

    /// Read a marker byte.
    pub fn read_marker(&mut self) -> Result<Amf0Marker, Amf0ReadError> {
        let marker = self.cursor.read_u8()?;
        Amf0Marker::from_u8(marker).ok_or(Amf0ReadError::UnknownMarker(marker))
    }

    /// Read the next marker and check that it matches `expected`, without
    /// consuming it on mismatch.
    pub fn expect_marker(&mut self, expected: Amf0Marker) -> Result<(), Amf0ReadError> {
        let marker = self.read_marker()?;
        if marker != expected {
            self.cursor.seek(SeekFrom::Current(-1))?;
            return Err(Amf0ReadError::WrongType {
                expected,
                got: marker,
            });
        }
        Ok(())
    }

    /// Read the body of a string value, without its marker.
    ///
    /// A zero length string yields `None`.
    pub fn read_string(&mut self) -> Result<Option<&'a [u8]>, Amf0ReadError> {
        let len = self.cursor.read_u16::<BigEndian>()?;
        if len == 0 {
            return Ok(None);
        }
        self.read_bytes(len as usize).map(Some)
    }

    /// Read the body of a number value, without its marker.
    pub fn read_number(&mut self) -> Result<f64, Amf0ReadError> {
        Ok(self.cursor.read_f64::<BigEndian>()?)
    }

    /// Step over one complete value, marker included.
    pub fn skip_value(&mut self) -> Result<(), Amf0ReadError> {
        let marker = self.read_marker()?;

        match marker {
            Amf0Marker::Number => {
                self.read_number()?;
            }
            Amf0Marker::Boolean => {
                self.cursor.read_u8()?;
            }
            Amf0Marker::String => {
                self.read_string()?;
            }
            Amf0Marker::Object => self.nested(Self::read_object)?,
            Amf0Marker::Null | Amf0Marker::Undefined | Amf0Marker::ObjectEnd => {}
            Amf0Marker::Reference => {
                self.cursor.read_u16::<BigEndian>()?;
            }
            Amf0Marker::EcmaArray => {
                // The declared count is unreliable in the wild, the end marker is not.
                self.cursor.read_u32::<BigEndian>()?;
                self.nested(Self::read_object)?;
            }
            Amf0Marker::StrictArray => self.nested(Self::read_strict_array)?,
            Amf0Marker::Date => {
                self.read_bytes(10)?;
            }
            _ => return Err(Amf0ReadError::UnsupportedType(marker)),
        }

        Ok(())
    }

    fn nested(
        &mut self,
        read: fn(&mut Self) -> Result<(), Amf0ReadError>,
    ) -> Result<(), Amf0ReadError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Amf0ReadError::NestingTooDeep(MAX_NESTING_DEPTH));
        }

        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn read_object(&mut self) -> Result<(), Amf0ReadError> {
        loop {
            let Some(key) = self.read_string()? else {
                let end = self.cursor.read_u8()?;
                if end != Amf0Marker::ObjectEnd as u8 {
                    return Err(Amf0ReadError::MissingObjectEnd(end));
                }
                return Ok(());
            };

            if key == AUDIO_DATA_RATE || key == VIDEO_DATA_RATE {
                self.read_data_rate()?;
            } else {
                self.skip_value()?;
            }
        }
    }

    fn read_data_rate(&mut self) -> Result<(), Amf0ReadError> {
        self.expect_marker(Amf0Marker::Number)?;
        let rate = self.read_number()?;
        // float to int casts truncate toward zero and saturate, NaN becomes 0
        self.bitrate = self.bitrate.saturating_add(rate as i64);
        Ok(())
    }

    fn read_strict_array(&mut self) -> Result<(), Amf0ReadError> {
        let len = self.cursor.read_u32::<BigEndian>()?;

        for _ in 0..len {
            self.skip_value()?;
        }

        Ok(())
    }
}
