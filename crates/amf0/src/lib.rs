//! AMF0 decoding for FLV `onMetaData` script tags.
//!
//! The relay only needs a handful of numbers out of a script tag, so this
//! crate walks the AMF0 value tree without materialising it, summing the
//! `audiodatarate` and `videodatarate` fields it meets along the way.
//!
//! Decoding fails closed: any marker the walker does not understand, such as
//! a long string or a typed object, aborts the read with an
//! [`Amf0ReadError`] instead of guessing where the next value starts.
//!
//! # Examples
//!
//! ```rust
//! # fn test() -> Result<(), Box<dyn std::error::Error>> {
//! use amf0::read_metadata;
//!
//! let mut payload = vec![0x02, 0x00, 0x0a];
//! payload.extend_from_slice(b"onMetaData");
//! payload.extend_from_slice(&[0x03, 0x00, 0x0d]);
//! payload.extend_from_slice(b"videodatarate");
//! payload.push(0x00);
//! payload.extend_from_slice(&900.0_f64.to_be_bytes());
//! payload.extend_from_slice(&[0x00, 0x00, 0x09]);
//!
//! let summary = read_metadata(&payload)?.expect("bitrate is positive");
//! assert_eq!(summary.bitrate, 900);
//! # Ok(())
//! # }
//! # test().expect("test failed");
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod decode;
mod define;
mod errors;
mod metadata;

pub use crate::decode::{Amf0Decoder, MAX_NESTING_DEPTH};
pub use crate::define::Amf0Marker;
pub use crate::errors::Amf0ReadError;
pub use crate::metadata::{MetadataSummary, ON_METADATA, read_metadata};
