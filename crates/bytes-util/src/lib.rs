//! Byte sources for forward-only stream parsing.
//!
//! The FLV relay pipeline pulls its input through the [`ByteSource`] trait,
//! which offers blocking reads of an exact number of bytes. Two sources are
//! provided: [`ReadSource`] wraps any [`std::io::Read`] (sockets, pipes,
//! files) and [`BytesCursor`] reads from an in-memory [`bytes::Bytes`]
//! buffer without copying.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod bytes_cursor;
mod source;

pub use bytes_cursor::{BytesCursor, BytesCursorExt};
pub use source::{ByteSource, ReadSource, SourceError};
