//! # Test Utilities
//!
//! Builders for FLV tags and streams shared by the relay tests.

use bytes::{Bytes, BytesMut};
use flv::{FlvFileHeader, FlvTag, FlvTagType};

/// Initialize tracing for tests
///
/// Usage:
/// - `init_test_tracing!()` - uses DEBUG level (default)
/// - `init_test_tracing!(INFO)` - uses specified level
macro_rules! init_test_tracing {
    () => {
        $crate::test_utils::init_test_tracing!(DEBUG);
    };
    ($level:ident) => {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::$level)
            .with_test_writer()
            .try_init();
    };
}

pub(crate) use init_test_tracing;

/// A complete FLV stream: standard file header followed by the given tags.
pub fn flv_stream(tags: &[FlvTag]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&FlvFileHeader::new(true, true).data);
    for tag in tags {
        buf.extend_from_slice(&tag.raw);
    }
    buf.freeze()
}

fn amf_string(buf: &mut Vec<u8>, value: &str) {
    buf.push(0x02);
    buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
    buf.extend_from_slice(value.as_bytes());
}

fn amf_number_property(buf: &mut Vec<u8>, name: &str, value: f64) {
    buf.extend_from_slice(&(name.len() as u16).to_be_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.push(0x00);
    buf.extend_from_slice(&value.to_be_bytes());
}

/// An `onMetaData` script tag with the given data rates plus some unrelated fields.
pub fn metadata_tag(audio_rate: f64, video_rate: f64) -> FlvTag {
    let mut payload = vec![];
    amf_string(&mut payload, "onMetaData");
    payload.extend_from_slice(&[0x08, 0x00, 0x00, 0x00, 0x05]);
    amf_number_property(&mut payload, "duration", 0.0);
    amf_number_property(&mut payload, "width", 1280.0);
    amf_number_property(&mut payload, "height", 720.0);
    amf_number_property(&mut payload, "audiodatarate", audio_rate);
    amf_number_property(&mut payload, "videodatarate", video_rate);
    payload.extend_from_slice(&[0x00, 0x00, 0x09]);

    FlvTag::new(FlvTagType::ScriptData, 0, &payload).unwrap()
}

/// An `onMetaData` script tag containing a long string, which the decoder rejects.
pub fn malformed_metadata_tag() -> FlvTag {
    let mut payload = vec![];
    amf_string(&mut payload, "onMetaData");
    payload.push(0x03);
    amf_number_property(&mut payload, "videodatarate", 2000.0);
    payload.extend_from_slice(&[0x00, 0x07]);
    payload.extend_from_slice(b"comment");
    payload.extend_from_slice(&[0x0c, 0x00, 0x00, 0x00, 0x02]);
    payload.extend_from_slice(b"hi");
    payload.extend_from_slice(&[0x00, 0x00, 0x09]);

    FlvTag::new(FlvTagType::ScriptData, 0, &payload).unwrap()
}

/// An AVC sequence header tag.
pub fn avc_config_tag() -> FlvTag {
    FlvTag::new(
        FlvTagType::Video,
        0,
        &[
            0x17, 0x00, 0x00, 0x00, 0x01, 0x64, 0x00, 0x1f, 0xff, 0xe1, 0x00, 0x04, 0x67, 0x64,
            0x00, 0x1f, 0x01, 0x00, 0x02, 0x68, 0xee,
        ],
    ).unwrap()
}

/// An AAC sequence header tag.
pub fn aac_config_tag() -> FlvTag {
    FlvTag::new(FlvTagType::Audio, 0, &[0xAF, 0x00, 0x12, 0x10]).unwrap()
}

/// An inter-frame AVC video tag whose payload is `size` bytes.
pub fn video_tag(timestamp: u32, size: usize) -> FlvTag {
    let mut payload = vec![0u8; size];
    if let Some(first) = payload.first_mut() {
        *first = 0x27;
    }
    if size > 1 {
        payload[1] = 0x01;
    }
    FlvTag::new(FlvTagType::Video, timestamp, &payload).unwrap()
}

/// A raw AAC audio tag.
pub fn audio_tag(timestamp: u32) -> FlvTag {
    FlvTag::new(FlvTagType::Audio, timestamp, &[0xAF, 0x01, 0x21, 0x10, 0x04]).unwrap()
}
