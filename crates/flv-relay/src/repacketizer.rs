//! # Repacketizer
//!
//! Turns an FLV byte stream into relay packets, one tag at a time.
//!
//! ## How it Works
//!
//! For every call to [`Repacketizer::read_packet`]:
//!
//! 1. On a channel's first read, the 13-byte file header is read first and
//!    the header counts as changed
//! 2. One tag is read, keeping its verbatim bytes
//! 3. The tag is inspected according to its kind: `onMetaData` script tags
//!    with a positive bitrate, AVC sequence headers and AAC sequence headers
//!    replace the matching slot of the channel's retained header state
//! 4. If the header changed, the whole header pack is emitted as one HEAD
//!    packet. Otherwise the tag's bytes are emitted as DATA packets of at
//!    most `max_segment_size` bytes, calling the sink's pacing hook after
//!    each one
//!
//! Every packet is stamped with the sink's current stream position, which is
//! then advanced by the packet length, so positions are gapless.
//!
//! A tag is read completely before anything is emitted for it. A truncated
//! tag therefore produces an error and no packets.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use bytes_util::ByteSource;
use flv::{FlvFileHeader, FlvTag, FlvTagType};
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::packet::RelayPacket;
use crate::sink::ChannelSink;
use crate::state::{HeaderUpdate, RetainedHeaderState, StreamPhase};

/// One relayed channel: its name, its retained header state and its sink.
#[derive(Debug)]
pub struct RelayChannel<K> {
    pub name: String,
    pub state: RetainedHeaderState,
    pub sink: K,
}

impl<K: ChannelSink> RelayChannel<K> {
    pub fn new(name: impl Into<String>, sink: K) -> Self {
        Self {
            name: name.into(),
            state: RetainedHeaderState::new(),
            sink,
        }
    }
}

/// What a single [`Repacketizer::read_packet`] call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A HEAD packet of `len` bytes was emitted.
    Head { len: usize },
    /// The tag was emitted as `segments` DATA packets totalling `len` bytes.
    Data { segments: usize, len: usize },
}

/// Totals for a finished [`Repacketizer::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub tags: usize,
    pub head_packets: usize,
    pub data_packets: usize,
    pub bytes: u64,
    /// The run stopped because cancellation was requested.
    pub cancelled: bool,
}

impl RelaySummary {
    fn record(&mut self, outcome: ReadOutcome) {
        self.tags += 1;
        match outcome {
            ReadOutcome::Head { len } => {
                self.head_packets += 1;
                self.bytes += len as u64;
            }
            ReadOutcome::Data { segments, len } => {
                self.data_packets += segments;
                self.bytes += len as u64;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Repacketizer {
    config: RelayConfig,
}

impl Repacketizer {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Reads one tag (plus the file header on a channel's first call) and
    /// emits the resulting packets.
    ///
    /// Fails with [`flv::FlvError::EndOfStream`] when the source is exhausted
    /// between tags. Malformed metadata is logged and the tag is relayed as
    /// ordinary data.
    pub fn read_packet<S, K>(
        &self,
        source: &mut S,
        channel: &mut RelayChannel<K>,
    ) -> Result<ReadOutcome, RelayError>
    where
        S: ByteSource + ?Sized,
        K: ChannelSink,
    {
        let file_header = match channel.state.phase() {
            StreamPhase::Uninitialized => Some(FlvFileHeader::read(source)?),
            StreamPhase::Streaming => None,
        };

        let tag = FlvTag::read(source)?;

        let mut header_changed = false;
        if let Some(file_header) = file_header {
            info!("{} stream started, {}", channel.name, file_header);
            channel.state.begin_stream(file_header);
            header_changed = true;
        }

        let raw = tag.raw.clone();
        if let Some(update) = inspect(&channel.name, &tag) {
            debug!(
                "{} retained {} tag for header pack: {:?}",
                channel.name, tag.tag_type, update
            );
            channel.state.retain(update, tag);
            header_changed = true;
        }

        if header_changed {
            self.emit_head(channel)
        } else {
            self.emit_data(raw, &mut channel.sink)
        }
    }

    /// Calls [`read_packet`](Self::read_packet) until the source ends or
    /// `cancel` is set.
    ///
    /// The flag is checked between tags, never in the middle of one.
    pub fn run<S, K>(
        &self,
        source: &mut S,
        channel: &mut RelayChannel<K>,
        cancel: &AtomicBool,
    ) -> Result<RelaySummary, RelayError>
    where
        S: ByteSource + ?Sized,
        K: ChannelSink,
    {
        let mut summary = RelaySummary::default();
        info!("{} relay starting with {}", channel.name, self.config);

        loop {
            if cancel.load(Ordering::Relaxed) {
                info!("{} relay cancelled after {} tags", channel.name, summary.tags);
                summary.cancelled = true;
                break;
            }

            match self.read_packet(source, channel) {
                Ok(outcome) => summary.record(outcome),
                Err(e) if e.is_end_of_stream() => {
                    info!(
                        "{} end of stream after {} tags, {} bytes relayed",
                        channel.name, summary.tags, summary.bytes
                    );
                    break;
                }
                Err(e) => {
                    warn!("{} relay stopped: {}", channel.name, e);
                    return Err(e);
                }
            }
        }

        Ok(summary)
    }

    fn emit_head<K: ChannelSink>(
        &self,
        channel: &mut RelayChannel<K>,
    ) -> Result<ReadOutcome, RelayError> {
        // begin_stream has always run by the time a header change is reported
        let Some(pack) = channel.state.head_pack() else {
            return Ok(ReadOutcome::Head { len: 0 });
        };

        let len = pack.len();
        let pos = channel.sink.stream_pos();
        channel.sink.set_bitrate(channel.state.bitrate());
        channel.sink.emit(RelayPacket::head(pack, pos))?;
        channel.sink.advance(len as u64);

        debug!(
            "{} head pack updated: {} bytes at {}, bitrate {} kbps",
            channel.name,
            len,
            pos,
            channel.state.bitrate()
        );
        Ok(ReadOutcome::Head { len })
    }

    fn emit_data<K: ChannelSink>(
        &self,
        raw: Bytes,
        sink: &mut K,
    ) -> Result<ReadOutcome, RelayError> {
        let max = self.config.max_segment_size.max(1);
        let len = raw.len();
        let mut offset = 0;
        let mut segments = 0;

        while offset < len {
            let segment_len = (len - offset).min(max);
            let segment = raw.slice(offset..offset + segment_len);
            let pos = sink.stream_pos();

            sink.emit(RelayPacket::data(segment, pos))?;
            sink.pace(segment_len);
            sink.advance(segment_len as u64);

            offset += segment_len;
            segments += 1;
        }

        Ok(ReadOutcome::Data { segments, len })
    }
}

impl Default for Repacketizer {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

/// Decides whether `tag` belongs in the header pack. Each tag kind has
/// exactly one check.
fn inspect(channel: &str, tag: &FlvTag) -> Option<HeaderUpdate> {
    match tag.tag_type {
        FlvTagType::ScriptData => match tag.metadata() {
            Ok(Some(summary)) => Some(HeaderUpdate::Metadata {
                bitrate: summary.bitrate,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(
                    "{} malformed metadata at {}ms, header not updated: {}",
                    channel, tag.timestamp_ms, e
                );
                None
            }
        },
        FlvTagType::Video if tag.is_avc_sequence_header() => Some(HeaderUpdate::VideoConfig),
        FlvTagType::Audio if tag.is_aac_sequence_header() => Some(HeaderUpdate::AudioConfig),
        _ => None,
    }
}
