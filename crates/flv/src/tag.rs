use std::fmt;
use std::io::Cursor;

use amf0::MetadataSummary;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use bytes::{BufMut, Bytes, BytesMut};
use bytes_util::ByteSource;
use tracing::debug;

use crate::error::FlvError;

/// Size of the fixed tag header preceding every payload.
pub const TAG_HEADER_SIZE: usize = 11;
/// Size of the PreviousTagSize field following every payload.
pub const PREVIOUS_TAG_SIZE_LEN: usize = 4;
/// Largest payload the 24-bit DataSize field can describe.
pub const MAX_TAG_DATA_SIZE: usize = 0x00FF_FFFF;

/// AVC sequence header: keyframe + codec 7, AVCPacketType 0, composition time 0.
const AVC_SEQUENCE_HEADER: [u8; 4] = [0x17, 0x00, 0x00, 0x00];
/// AAC sequence header: SoundFormat 10, 44kHz, 16-bit, stereo, AACPacketType 0.
const AAC_SEQUENCE_HEADER: [u8; 2] = [0xAF, 0x00];

/// FLV Tag Type
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - FLV tags)
///
/// The 3 types that are supported are:
/// - Audio(8)
/// - Video(9)
/// - ScriptData(18)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlvTagType {
    Audio,
    Video,
    ScriptData,
    Unknown(u8),
}

impl From<u8> for FlvTagType {
    fn from(value: u8) -> Self {
        match value {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::ScriptData,
            _ => FlvTagType::Unknown(value),
        }
    }
}

impl From<FlvTagType> for u8 {
    fn from(value: FlvTagType) -> Self {
        match value {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::ScriptData => 18,
            FlvTagType::Unknown(code) => code,
        }
    }
}

impl fmt::Display for FlvTagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FlvTagType::ScriptData => "Script",
            FlvTagType::Video => "Video",
            FlvTagType::Audio => "Audio",
            FlvTagType::Unknown(_) => "Unknown",
        })
    }
}

/// An FLV Tag kept exactly as it was received.
///
/// `raw` holds the tag header, the payload and the PreviousTagSize trailer.
/// `data` is the payload alone, sliced out of `raw` without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct FlvTag {
    pub tag_type: FlvTagType,
    /// A timestamp in milliseconds
    pub timestamp_ms: u32,
    /// A stream id
    pub stream_id: u32,
    /// The tag payload
    pub data: Bytes,
    /// The verbatim on-wire bytes
    pub raw: Bytes,
}

impl FlvTag {
    /// Reads exactly one tag, trailer included, from the source.
    ///
    /// A source that is already exhausted yields [`FlvError::EndOfStream`];
    /// one that ends anywhere inside the tag yields
    /// [`FlvError::TruncatedInput`].
    pub fn read<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, FlvError> {
        let header = source
            .read_bytes(TAG_HEADER_SIZE)
            .map_err(|e| FlvError::at_boundary(e, "tag header"))?;

        let mut reader = Cursor::new(&header[..]);
        let tag_type = FlvTagType::from(reader.read_u8()?);
        let data_size = reader.read_u24::<BigEndian>()? as usize;
        // 24-bit timestamp followed by an 8-bit extension holding the upper bits
        let timestamp_ms = reader.read_u24::<BigEndian>()? | ((reader.read_u8()? as u32) << 24);
        let stream_id = reader.read_u24::<BigEndian>()?;

        let payload = source
            .read_bytes(data_size)
            .map_err(|e| FlvError::within(e, "tag payload"))?;
        let trailer = source
            .read_bytes(PREVIOUS_TAG_SIZE_LEN)
            .map_err(|e| FlvError::within(e, "tag trailer"))?;

        let previous_tag_size = BigEndian::read_u32(&trailer);
        if previous_tag_size as usize != TAG_HEADER_SIZE + data_size {
            debug!(
                "{} tag declares previous tag size {}, expected {}",
                tag_type,
                previous_tag_size,
                TAG_HEADER_SIZE + data_size
            );
        }

        let mut raw = BytesMut::with_capacity(TAG_HEADER_SIZE + data_size + PREVIOUS_TAG_SIZE_LEN);
        raw.extend_from_slice(&header);
        raw.extend_from_slice(&payload);
        raw.extend_from_slice(&trailer);
        let raw = raw.freeze();

        Ok(FlvTag {
            tag_type,
            timestamp_ms,
            stream_id,
            data: raw.slice(TAG_HEADER_SIZE..TAG_HEADER_SIZE + data_size),
            raw,
        })
    }

    /// Builds a tag around the given payload, producing well-formed
    /// on-wire bytes with stream id 0.
    ///
    /// Fails with [`FlvError::PayloadTooLarge`] when the payload does not fit
    /// the 24-bit DataSize field.
    pub fn new(tag_type: FlvTagType, timestamp_ms: u32, payload: &[u8]) -> Result<Self, FlvError> {
        let data_size = payload.len();
        if data_size > MAX_TAG_DATA_SIZE {
            return Err(FlvError::PayloadTooLarge(data_size));
        }

        let mut raw = BytesMut::with_capacity(TAG_HEADER_SIZE + data_size + PREVIOUS_TAG_SIZE_LEN);
        raw.put_u8(tag_type.into());
        raw.put_uint(data_size as u64, 3);
        raw.put_uint((timestamp_ms & 0x00FF_FFFF) as u64, 3);
        raw.put_u8((timestamp_ms >> 24) as u8);
        raw.put_uint(0, 3);
        raw.put_slice(payload);
        raw.put_u32((TAG_HEADER_SIZE + data_size) as u32);

        let raw = raw.freeze();
        Ok(FlvTag {
            tag_type,
            timestamp_ms,
            stream_id: 0,
            data: raw.slice(TAG_HEADER_SIZE..TAG_HEADER_SIZE + data_size),
            raw,
        })
    }

    /// Payload length in bytes.
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Length of the verbatim bytes: header, payload and trailer.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The PreviousTagSize trailer as it appeared on the wire, if `raw` is
    /// long enough to hold one.
    pub fn previous_tag_size(&self) -> Option<u32> {
        let start = self.raw.len().checked_sub(PREVIOUS_TAG_SIZE_LEN)?;
        self.raw.get(start..).map(BigEndian::read_u32)
    }

    /// Whether this is a video tag carrying an AVC decoder configuration record.
    pub fn is_avc_sequence_header(&self) -> bool {
        self.tag_type == FlvTagType::Video && self.data.starts_with(&AVC_SEQUENCE_HEADER)
    }

    /// Whether this is an audio tag carrying an AAC AudioSpecificConfig.
    pub fn is_aac_sequence_header(&self) -> bool {
        self.tag_type == FlvTagType::Audio && self.data.starts_with(&AAC_SEQUENCE_HEADER)
    }

    /// Decodes `onMetaData` from a script data tag.
    ///
    /// Returns `Ok(None)` for other tag kinds, other script events and
    /// metadata without a positive bitrate.
    pub fn metadata(&self) -> Result<Option<MetadataSummary>, FlvError> {
        if self.tag_type != FlvTagType::ScriptData {
            return Ok(None);
        }
        Ok(amf0::read_metadata(&self.data)?)
    }

    /// Whether a decoder needs this tag before it can consume any media.
    pub fn is_codec_config(&self) -> bool {
        self.is_avc_sequence_header() || self.is_aac_sequence_header()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes_util::ReadSource;

    fn wire_tag(tag_type: u8, payload: &[u8], timestamp: u32) -> Vec<u8> {
        let mut buf = vec![tag_type];
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
        buf.extend_from_slice(&(timestamp & 0x00FF_FFFF).to_be_bytes()[1..]);
        buf.push((timestamp >> 24) as u8);
        buf.extend_from_slice(&[0, 0, 0]);
        buf.extend_from_slice(payload);
        buf.extend_from_slice(&((11 + payload.len()) as u32).to_be_bytes());
        buf
    }

    #[test]
    fn test_read_retains_verbatim_bytes() {
        let wire = wire_tag(9, &[0x27, 0x01, 0x00, 0x00, 0x00, 0xAA], 0x0102_0304);
        let mut source = Cursor::new(Bytes::from(wire.clone()));

        let tag = FlvTag::read(&mut source).unwrap();

        assert_eq!(tag.raw, Bytes::from(wire));
        assert_eq!(tag.tag_type, FlvTagType::Video);
        assert_eq!(tag.timestamp_ms, 0x0102_0304);
        assert_eq!(tag.stream_id, 0);
        assert_eq!(tag.data_size(), 6);
        assert_eq!(&tag.data[..], &[0x27, 0x01, 0x00, 0x00, 0x00, 0xAA]);
        assert_eq!(tag.len(), 11 + 6 + 4);
        assert_eq!(tag.previous_tag_size(), Some(17));
    }

    #[test]
    fn test_read_keeps_odd_trailer() {
        let mut wire = wire_tag(8, &[0xAF, 0x01, 0x21], 40);
        let len = wire.len();
        wire[len - 4..].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let mut source = ReadSource::new(&wire[..]);

        let tag = FlvTag::read(&mut source).unwrap();

        assert_eq!(&tag.raw[..], &wire[..]);
        assert_eq!(tag.previous_tag_size(), Some(0xDEAD_BEEF));
    }

    #[test]
    fn test_classification() {
        let cases = [
            (8u8, FlvTagType::Audio, "Audio"),
            (9, FlvTagType::Video, "Video"),
            (18, FlvTagType::ScriptData, "Script"),
            (7, FlvTagType::Unknown(7), "Unknown"),
        ];

        for (code, expected, name) in cases {
            let wire = wire_tag(code, &[0x00], 0);
            let tag = FlvTag::read(&mut ReadSource::new(&wire[..])).unwrap();
            assert_eq!(tag.tag_type, expected);
            assert_eq!(u8::from(tag.tag_type), code);
            assert_eq!(tag.tag_type.to_string(), name);
        }
    }

    #[test]
    fn test_sequence_header_detection() {
        let avc = FlvTag::new(FlvTagType::Video, 0, &[0x17, 0x00, 0x00, 0x00, 0x01]).unwrap();
        assert!(avc.is_avc_sequence_header());
        assert!(avc.is_codec_config());

        let nalu = FlvTag::new(FlvTagType::Video, 0, &[0x17, 0x01, 0x00, 0x00, 0x01]).unwrap();
        assert!(!nalu.is_codec_config());

        let aac = FlvTag::new(FlvTagType::Audio, 0, &[0xAF, 0x00, 0x12, 0x10]).unwrap();
        assert!(aac.is_aac_sequence_header());
        assert!(aac.is_codec_config());

        let aac_raw = FlvTag::new(FlvTagType::Audio, 0, &[0xAF, 0x01, 0x21]).unwrap();
        assert!(!aac_raw.is_codec_config());

        // signatures only count for the matching tag kind
        let script = FlvTag::new(FlvTagType::ScriptData, 0, &[0x17, 0x00, 0x00, 0x00]).unwrap();
        assert!(!script.is_codec_config());
        let audio = FlvTag::new(FlvTagType::Audio, 0, &[0x17, 0x00, 0x00, 0x00]).unwrap();
        assert!(!audio.is_avc_sequence_header());

        // short payloads never match
        let short = FlvTag::new(FlvTagType::Video, 0, &[0x17, 0x00]).unwrap();
        assert!(!short.is_codec_config());
        let empty = FlvTag::new(FlvTagType::Audio, 0, &[]).unwrap();
        assert!(!empty.is_codec_config());
    }

    #[test]
    fn test_metadata_summary() {
        let mut payload = vec![0x02, 0x00, 0x0a];
        payload.extend_from_slice(b"onMetaData");
        payload.extend_from_slice(&[0x03, 0x00, 0x0d]);
        payload.extend_from_slice(b"audiodatarate");
        payload.push(0x00);
        payload.extend_from_slice(&96.0_f64.to_be_bytes());
        payload.extend_from_slice(&[0x00, 0x00, 0x09]);

        let script = FlvTag::new(FlvTagType::ScriptData, 0, &payload).unwrap();
        assert_eq!(
            script.metadata().unwrap(),
            Some(MetadataSummary { bitrate: 96 })
        );

        // the same bytes in a video tag are not metadata
        let video = FlvTag::new(FlvTagType::Video, 0, &payload).unwrap();
        assert_eq!(video.metadata().unwrap(), None);
    }

    #[test]
    fn test_malformed_metadata() {
        let mut payload = vec![0x02, 0x00, 0x0a];
        payload.extend_from_slice(b"onMetaData");
        payload.push(0x0c);

        let script = FlvTag::new(FlvTagType::ScriptData, 0, &payload).unwrap();
        let err = script.metadata().unwrap_err();
        assert!(matches!(err, FlvError::MalformedMetadata(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_new_matches_wire_layout() {
        let payload = [0x27, 0x01, 0x02];
        let tag = FlvTag::new(FlvTagType::Video, 0x0A0B_0C0D, &payload).unwrap();
        assert_eq!(&tag.raw[..], &wire_tag(9, &payload, 0x0A0B_0C0D)[..]);

        let reread = FlvTag::read(&mut Cursor::new(tag.raw.clone())).unwrap();
        assert_eq!(reread, tag);
    }

    #[test]
    fn test_empty_source_is_end_of_stream() {
        let mut source = ReadSource::new(&[0u8; 0][..]);
        assert!(matches!(
            FlvTag::read(&mut source),
            Err(FlvError::EndOfStream)
        ));
    }

    #[test]
    fn test_truncated_header() {
        let wire = wire_tag(9, &[0x27; 8], 0);
        let mut source = ReadSource::new(&wire[..5]);
        assert!(matches!(
            FlvTag::read(&mut source),
            Err(FlvError::TruncatedInput {
                context: "tag header",
                requested: 11,
                received: 5
            })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let wire = wire_tag(9, &[0x27; 100], 0);
        let mut source = ReadSource::new(&wire[..11 + 40]);
        assert!(matches!(
            FlvTag::read(&mut source),
            Err(FlvError::TruncatedInput {
                context: "tag payload",
                requested: 100,
                received: 40
            })
        ));
    }

    #[test]
    fn test_missing_trailer() {
        let wire = wire_tag(8, &[0xAF, 0x01], 0);
        let mut source = ReadSource::new(&wire[..wire.len() - 4]);
        assert!(matches!(
            FlvTag::read(&mut source),
            Err(FlvError::TruncatedInput {
                context: "tag trailer",
                requested: 4,
                received: 0
            })
        ));
    }

    #[test]
    fn test_reads_consecutive_tags() {
        let mut wire = wire_tag(8, &[0xAF, 0x01, 0x21], 0);
        wire.extend(wire_tag(9, &[0x27, 0x01, 0x00, 0x00, 0x00], 33));
        let mut source = Cursor::new(Bytes::from(wire));

        let first = FlvTag::read(&mut source).unwrap();
        let second = FlvTag::read(&mut source).unwrap();

        assert_eq!(first.tag_type, FlvTagType::Audio);
        assert_eq!(second.tag_type, FlvTagType::Video);
        assert_eq!(second.timestamp_ms, 33);
        assert!(matches!(
            FlvTag::read(&mut source),
            Err(FlvError::EndOfStream)
        ));
    }

    #[test]
    fn test_new_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_TAG_DATA_SIZE + 1];
        assert!(matches!(
            FlvTag::new(FlvTagType::Video, 0, &payload),
            Err(FlvError::PayloadTooLarge(size)) if size == MAX_TAG_DATA_SIZE + 1
        ));
    }

    #[test]
    fn test_previous_tag_size_of_hand_built_tag() {
        let tag = FlvTag {
            tag_type: FlvTagType::Audio,
            timestamp_ms: 0,
            stream_id: 0,
            data: Bytes::new(),
            raw: Bytes::from_static(&[0x00, 0x01]),
        };
        assert_eq!(tag.previous_tag_size(), None);
    }
}
