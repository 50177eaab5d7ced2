use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// A synthesized header pack, replayed to every peer that joins
    Head,
    /// A slice of live tag bytes
    Data,
}

/// A packet handed to the channel sink.
///
/// `pos` is the offset of the first byte of `data` in the channel's logical
/// output stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayPacket {
    pub kind: PacketKind,
    pub data: Bytes,
    pub pos: u64,
}

impl RelayPacket {
    pub fn head(data: Bytes, pos: u64) -> Self {
        Self {
            kind: PacketKind::Head,
            data,
            pos,
        }
    }

    pub fn data(data: Bytes, pos: u64) -> Self {
        Self {
            kind: PacketKind::Data,
            data,
            pos,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_head(&self) -> bool {
        self.kind == PacketKind::Head
    }

    /// Offset one past the last byte of this packet.
    pub fn end(&self) -> u64 {
        self.pos + self.data.len() as u64
    }
}
