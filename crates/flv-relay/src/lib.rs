//! # FLV Relay
//!
//! Repacketizes a live FLV stream for peer-to-peer relay.
//!
//! A peer that joins a broadcast midway needs more than the live bytes: it
//! needs the FLV file header, the latest `onMetaData` tag and the latest AVC
//! and AAC sequence headers before anything else is decodable. This crate
//! keeps those per channel and emits them as a single HEAD packet whenever one
//! of them changes. Every other tag is relayed verbatim as one or more
//! bounded DATA packets.
//!
//! ## Usage
//!
//! ```no_run
//! use std::fs::File;
//! use std::sync::atomic::AtomicBool;
//!
//! use bytes_util::ReadSource;
//! use flv_relay::{MemorySink, RelayChannel, RelayConfig, Repacketizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = ReadSource::new(File::open("live.flv")?);
//! let mut channel = RelayChannel::new("live", MemorySink::new());
//! let repacketizer = Repacketizer::new(RelayConfig::builder().max_segment_size(8192).build());
//!
//! let summary = repacketizer.run(&mut source, &mut channel, &AtomicBool::new(false))?;
//! println!("{} tags, {} head packets", summary.tags, summary.head_packets);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! MIT License

pub mod config;
pub mod driver;
pub mod error;
pub mod packet;
pub mod repacketizer;
pub mod sink;
pub mod state;
#[cfg(test)]
mod test_utils;

pub use config::{RelayConfig, RelayConfigBuilder};
pub use driver::{RelayHandle, spawn_relay};
pub use error::RelayError;
pub use packet::{PacketKind, RelayPacket};
pub use repacketizer::{ReadOutcome, RelayChannel, RelaySummary, Repacketizer};
pub use sink::{ChannelSink, MemorySink, ReadDelayPacer, SenderSink};
pub use state::{HeaderUpdate, RetainedHeaderState, StreamPhase};
