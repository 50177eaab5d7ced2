//! # FLV
//!
//! Forward-only reading of FLV streams for relay.
//!
//! Unlike a demuxer that decodes every tag body, this crate keeps each tag
//! exactly as it appeared on the wire (11-byte tag header, payload and the
//! 4-byte previous-tag-size trailer) so it can be forwarded unmodified. The
//! payload is exposed as a zero-copy slice of that verbatim buffer.
//!
//! ## Specifications
//!
//! - [Flash Video File Format Specification v10](https://www.adobe.com/content/dam/acom/en/devnet/flv/video_file_format_spec_v10.pdf)
//!
//! ## License
//!
//! MIT License
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

pub mod error;
pub mod header;
pub mod tag;

pub use error::FlvError;
pub use header::{FLV_FILE_HEADER_SIZE, FlvFileHeader};
pub use tag::{FlvTag, FlvTagType, MAX_TAG_DATA_SIZE, PREVIOUS_TAG_SIZE_LEN, TAG_HEADER_SIZE};
