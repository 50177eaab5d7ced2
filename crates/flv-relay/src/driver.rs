//! Runs one relay per OS thread and hands its packets over a bounded channel.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::{self, JoinHandle};

use bytes_util::ByteSource;
use crossbeam_channel::Receiver;
use tracing::error;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::packet::RelayPacket;
use crate::repacketizer::{RelayChannel, RelaySummary, Repacketizer};
use crate::sink::{ReadDelayPacer, SenderSink};

/// Handle to a relay running on its own thread.
///
/// Dropping the packet receiver makes the relay fail with
/// [`RelayError::Sink`] at its next emit.
pub struct RelayHandle {
    packets: Receiver<RelayPacket>,
    bitrate: Arc<AtomicU32>,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<Result<RelaySummary, RelayError>>,
}

impl RelayHandle {
    pub fn packets(&self) -> &Receiver<RelayPacket> {
        &self.packets
    }

    /// Bitrate published from the stream metadata, in kbit/s.
    pub fn bitrate(&self) -> u32 {
        self.bitrate.load(Ordering::Relaxed)
    }

    /// Asks the relay to stop before its next tag.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Waits for the relay thread to finish.
    ///
    /// Packets still buffered in the channel are discarded.
    pub fn join(self) -> Result<RelaySummary, RelayError> {
        let RelayHandle {
            packets, thread, ..
        } = self;
        // a relay blocked on a full channel would otherwise never finish
        drop(packets);
        thread.join().map_err(|_| RelayError::ThreadPanicked)?
    }
}

/// Spawns a thread that relays `source` until it ends, fails or is cancelled.
pub fn spawn_relay<S>(
    name: impl Into<String>,
    mut source: S,
    config: RelayConfig,
) -> io::Result<RelayHandle>
where
    S: ByteSource + Send + 'static,
{
    let name = name.into();
    let (tx, packets) = crossbeam_channel::bounded(config.channel_capacity);
    let sink = SenderSink::new(tx, ReadDelayPacer::new(config.read_delay));
    let bitrate = sink.bitrate_handle();
    let cancel = Arc::new(AtomicBool::new(false));

    let thread = {
        let cancel = Arc::clone(&cancel);
        let mut channel = RelayChannel::new(name.clone(), sink);
        let repacketizer = Repacketizer::new(config);

        thread::Builder::new()
            .name(format!("relay-{name}"))
            .spawn(move || {
                let result = repacketizer.run(&mut source, &mut channel, &cancel);
                if let Err(e) = &result {
                    error!("{} relay failed: {}", channel.name, e);
                }
                result
            })?
    };

    Ok(RelayHandle {
        packets,
        bitrate,
        cancel,
        thread,
    })
}
