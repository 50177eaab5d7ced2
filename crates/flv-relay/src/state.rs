//! # Retained Header State
//!
//! A peer that joins a broadcast halfway through cannot decode anything until
//! it has seen the FLV file header, the stream metadata and the codec
//! configuration records. This module keeps the latest copy of each of those
//! for one channel and assembles them into a single header pack.
//!
//! Every slot owns at most one tag. Storing a new tag in a slot drops the one
//! it replaces.

use bytes::{Bytes, BytesMut};
use flv::{FlvFileHeader, FlvTag};

/// Where a channel is in its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Nothing has been read yet; the next read starts with the file header.
    Uninitialized,
    /// The file header has been read; every read is one tag.
    Streaming,
}

/// Which slot a tag should be retained in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderUpdate {
    /// An `onMetaData` script tag with the given aggregate bitrate (kbit/s)
    Metadata { bitrate: u32 },
    /// An AVC sequence header
    VideoConfig,
    /// An AAC sequence header
    AudioConfig,
}

#[derive(Debug, Default)]
pub struct RetainedHeaderState {
    file_header: Option<FlvFileHeader>,
    metadata: Option<FlvTag>,
    video_config: Option<FlvTag>,
    audio_config: Option<FlvTag>,
    bitrate: u32,
}

impl RetainedHeaderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> StreamPhase {
        if self.file_header.is_some() {
            StreamPhase::Streaming
        } else {
            StreamPhase::Uninitialized
        }
    }

    /// Starts a new stream: stores its file header and resets the bitrate.
    ///
    /// Metadata and codec configuration from an earlier stream are kept until
    /// the new stream replaces them.
    pub fn begin_stream(&mut self, file_header: FlvFileHeader) {
        self.file_header = Some(file_header);
        self.bitrate = 0;
    }

    /// Stores `tag` in the slot named by `update`.
    pub fn retain(&mut self, update: HeaderUpdate, tag: FlvTag) {
        match update {
            HeaderUpdate::Metadata { bitrate } => {
                self.metadata = Some(tag);
                self.bitrate = bitrate;
            }
            HeaderUpdate::VideoConfig => self.video_config = Some(tag),
            HeaderUpdate::AudioConfig => self.audio_config = Some(tag),
        }
    }

    pub fn file_header(&self) -> Option<&FlvFileHeader> {
        self.file_header.as_ref()
    }

    pub fn metadata(&self) -> Option<&FlvTag> {
        self.metadata.as_ref()
    }

    pub fn video_config(&self) -> Option<&FlvTag> {
        self.video_config.as_ref()
    }

    pub fn audio_config(&self) -> Option<&FlvTag> {
        self.audio_config.as_ref()
    }

    /// Aggregate bitrate from the retained metadata, in kbit/s.
    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    /// Concatenates the file header, metadata, video configuration and audio
    /// configuration, in that order, skipping any that are absent.
    ///
    /// Returns `None` until a file header has been stored.
    pub fn head_pack(&self) -> Option<Bytes> {
        let file_header = self.file_header.as_ref()?;
        let tags = [&self.metadata, &self.video_config, &self.audio_config];

        let len = file_header.len()
            + tags
                .iter()
                .filter_map(|slot| slot.as_ref())
                .map(FlvTag::len)
                .sum::<usize>();

        let mut pack = BytesMut::with_capacity(len);
        pack.extend_from_slice(&file_header.data);
        for tag in tags.into_iter().flatten() {
            pack.extend_from_slice(&tag.raw);
        }

        Some(pack.freeze())
    }
}
