use std::fmt::Display;

/// Largest DATA packet the relay emits, matching the peer protocol's metaint.
pub const DEFAULT_MAX_SEGMENT_SIZE: usize = 8192;

/// Default capacity of the packet channel used by [`spawn_relay`](crate::spawn_relay).
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximum payload size of a single DATA packet, in bytes (at least 1)
    pub max_segment_size: usize,

    /// Sleep after each DATA packet in proportion to the stream bitrate
    pub read_delay: bool,

    /// Number of packets buffered between the relay thread and its consumer
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            read_delay: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Display for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RelayConfig {{ max_segment_size: {} bytes, read_delay: {}, channel_capacity: {} }}",
            self.max_segment_size, self.read_delay, self.channel_capacity
        )
    }
}

impl RelayConfig {
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    /// Zero is raised to one so segmentation always makes progress.
    pub fn max_segment_size(mut self, max_segment_size: usize) -> Self {
        self.config.max_segment_size = max_segment_size.max(1);
        self
    }

    pub fn read_delay(mut self, read_delay: bool) -> Self {
        self.config.read_delay = read_delay;
        self
    }

    pub fn channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.config.channel_capacity = channel_capacity;
        self
    }

    pub fn build(self) -> RelayConfig {
        self.config
    }
}
