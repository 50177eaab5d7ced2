use tracing::trace;

use super::{Amf0Decoder, Amf0Marker, Amf0ReadError};

/// Name of the script data event that carries stream metadata.
pub const ON_METADATA: &str = "onMetaData";

/// Figures extracted from an `onMetaData` script tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataSummary {
    /// Sum of `audiodatarate` and `videodatarate`, in kbit/s.
    pub bitrate: u32,
}

/// Reads the payload of a script data tag.
///
/// Returns `Ok(None)` when the payload is not an `onMetaData` event or when
/// it declares no positive bitrate. Returns an error when the event value
/// following `onMetaData` cannot be walked.
pub fn read_metadata(payload: &[u8]) -> Result<Option<MetadataSummary>, Amf0ReadError> {
    let mut decoder = Amf0Decoder::new(payload);

    if decoder.expect_marker(Amf0Marker::String).is_err() {
        trace!("script data does not start with a string, ignoring");
        return Ok(None);
    }

    match decoder.read_string()? {
        Some(name) if name == ON_METADATA.as_bytes() => {}
        name => {
            trace!(
                "ignoring script data event {:?}",
                name.map(String::from_utf8_lossy)
            );
            return Ok(None);
        }
    }

    decoder.reset_bitrate();
    decoder.skip_value()?;

    let bitrate = decoder.bitrate();
    if bitrate <= 0 {
        return Ok(None);
    }

    Ok(Some(MetadataSummary {
        bitrate: u32::try_from(bitrate).unwrap_or(u32::MAX),
    }))
}
