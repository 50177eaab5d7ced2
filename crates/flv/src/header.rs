use std::fmt::Display;

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use bytes_util::ByteSource;

use crate::error::FlvError;

/// Size of the leading block: the 9-byte FLV header followed by the 4-byte
/// PreviousTagSize0 field.
pub const FLV_FILE_HEADER_SIZE: usize = 13;

const FLV_SIGNATURE: [u8; 3] = *b"FLV";
const FLV_DATA_OFFSET: u32 = 9;

/// The leading block of an FLV stream, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct FlvFileHeader {
    /// The version of the FLV file format, usually 0x01
    pub version: u8,
    /// All 13 bytes as read from the stream
    pub data: Bytes,
}

impl Display for FlvFileHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FLV Header: version {}, audio: {}, video: {}, data offset: {}",
            self.version,
            self.has_audio(),
            self.has_video(),
            self.data_offset()
        )
    }
}

impl FlvFileHeader {
    /// Builds a standard header with the given stream flags.
    pub fn new(has_audio: bool, has_video: bool) -> Self {
        let mut flags = 0_u8;
        if has_audio {
            flags |= 0x04;
        }
        if has_video {
            flags |= 0x01;
        }

        let mut buf = BytesMut::with_capacity(FLV_FILE_HEADER_SIZE);
        buf.put_slice(&FLV_SIGNATURE);
        buf.put_u8(0x01);
        buf.put_u8(flags);
        buf.put_u32(FLV_DATA_OFFSET);
        buf.put_u32(0);

        Self {
            version: 0x01,
            data: buf.freeze(),
        }
    }

    /// Reads the 13-byte leading block from the source.
    ///
    /// Fails with [`FlvError::InvalidContainerSignature`] when the block does
    /// not start with `FLV`. The bytes are consumed either way.
    pub fn read<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, FlvError> {
        let data = source
            .read_bytes(FLV_FILE_HEADER_SIZE)
            .map_err(|e| FlvError::at_boundary(e, "file header"))?;

        let signature = [data[0], data[1], data[2]];
        if signature != FLV_SIGNATURE {
            return Err(FlvError::InvalidContainerSignature(signature));
        }

        Ok(Self {
            version: data[3],
            data,
        })
    }

    fn flags(&self) -> u8 {
        self.data.get(4).copied().unwrap_or(0)
    }

    /// Whether the audio flag is set.
    pub fn has_audio(&self) -> bool {
        self.flags() & 0b0000_0100 != 0
    }

    /// Whether the video flag is set.
    pub fn has_video(&self) -> bool {
        self.flags() & 0b0000_0001 != 0
    }

    /// The DataOffset field, 9 for every FLV version in use.
    ///
    /// A header shorter than the leading block reports 0.
    pub fn data_offset(&self) -> u32 {
        self.data.get(5..9).map_or(0, BigEndian::read_u32)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
