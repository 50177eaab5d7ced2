//! # Channel Sinks
//!
//! The relay hands every packet it produces to a [`ChannelSink`]. The sink
//! owns the channel's bookkeeping: the logical stream position the next
//! packet starts at and the bitrate published from the stream metadata.
//!
//! Two sinks are provided:
//!
//! - [`MemorySink`] collects packets in a `Vec`, for embedding and tests
//! - [`SenderSink`] forwards packets over a bounded crossbeam channel; a full
//!   channel blocks the relay, which is how backpressure reaches the source

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::error::RelayError;
use crate::packet::RelayPacket;

/// Destination of relay packets for one channel.
pub trait ChannelSink {
    /// Accepts one packet. May block.
    fn emit(&mut self, packet: RelayPacket) -> Result<(), RelayError>;

    /// Offset in the logical output stream where the next packet starts.
    fn stream_pos(&self) -> u64;

    /// Moves the stream position forward by `len` bytes.
    fn advance(&mut self, len: u64);

    /// Publishes the aggregate bitrate (kbit/s) declared by the stream metadata.
    fn set_bitrate(&mut self, bitrate: u32);

    /// Called after every DATA packet, before the next one is produced.
    fn pace(&mut self, _len: usize) {}
}

/// Sleeps after each DATA packet for as long as the packet would take to
/// play at the channel bitrate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadDelayPacer {
    enabled: bool,
}

impl ReadDelayPacer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Delay owed for `len` bytes at `bitrate` kbit/s. `None` when pacing is
    /// off or the bitrate is unknown.
    pub fn delay_for(&self, len: usize, bitrate: u32) -> Option<Duration> {
        if !self.enabled {
            return None;
        }

        let bytes_per_sec = u64::from(bitrate) * 1024 / 8;
        if bytes_per_sec == 0 {
            return None;
        }

        Some(Duration::from_millis(len as u64 * 1000 / bytes_per_sec))
    }

    pub fn pace(&self, len: usize, bitrate: u32) {
        if let Some(delay) = self.delay_for(len, bitrate) {
            thread::sleep(delay);
        }
    }
}

/// A sink that keeps every packet in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub packets: Vec<RelayPacket>,
    stream_pos: u64,
    bitrate: u32,
    pacer: ReadDelayPacer,
    paced_bytes: u64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pacer(pacer: ReadDelayPacer) -> Self {
        Self {
            pacer,
            ..Self::default()
        }
    }

    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    /// Total bytes reported through [`ChannelSink::pace`].
    pub fn paced_bytes(&self) -> u64 {
        self.paced_bytes
    }

    /// The most recent HEAD packet, which is what a newly joining peer receives first.
    pub fn last_head(&self) -> Option<&RelayPacket> {
        self.packets.iter().rev().find(|p| p.is_head())
    }
}

impl ChannelSink for MemorySink {
    fn emit(&mut self, packet: RelayPacket) -> Result<(), RelayError> {
        self.packets.push(packet);
        Ok(())
    }

    fn stream_pos(&self) -> u64 {
        self.stream_pos
    }

    fn advance(&mut self, len: u64) {
        self.stream_pos += len;
    }

    fn set_bitrate(&mut self, bitrate: u32) {
        self.bitrate = bitrate;
    }

    fn pace(&mut self, len: usize) {
        self.paced_bytes += len as u64;
        self.pacer.pace(len, self.bitrate);
    }
}

/// A sink that forwards packets through a crossbeam channel.
///
/// The bitrate is shared through an atomic so the receiving side can read it
/// while the relay runs on another thread.
#[derive(Debug)]
pub struct SenderSink {
    tx: Sender<RelayPacket>,
    stream_pos: u64,
    bitrate: Arc<AtomicU32>,
    pacer: ReadDelayPacer,
}

impl SenderSink {
    pub fn new(tx: Sender<RelayPacket>, pacer: ReadDelayPacer) -> Self {
        Self {
            tx,
            stream_pos: 0,
            bitrate: Arc::new(AtomicU32::new(0)),
            pacer,
        }
    }

    /// Handle to the published bitrate.
    pub fn bitrate_handle(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.bitrate)
    }
}

impl ChannelSink for SenderSink {
    fn emit(&mut self, packet: RelayPacket) -> Result<(), RelayError> {
        self.tx.send(packet).map_err(|_| RelayError::Sink)
    }

    fn stream_pos(&self) -> u64 {
        self.stream_pos
    }

    fn advance(&mut self, len: u64) {
        self.stream_pos += len;
    }

    fn set_bitrate(&mut self, bitrate: u32) {
        self.bitrate.store(bitrate, Ordering::Relaxed);
    }

    fn pace(&mut self, len: usize) {
        self.pacer.pace(len, self.bitrate.load(Ordering::Relaxed));
    }
}
