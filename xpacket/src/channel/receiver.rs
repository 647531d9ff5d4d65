//! Inbound pump: one per attached transport.

use std::sync::Arc;

use tokio::io::ReadHalf;
use tokio::sync::mpsc;

use crate::core::Packet;
use crate::stream::{IoError, Shared};
use crate::transport::{BoxTransport, ConnectionId};

pub(crate) struct Receiver {
    shared: Arc<Shared>,
    id: ConnectionId,
    reader: ReadHalf<BoxTransport>,
    incoming: mpsc::Sender<Packet>,
}

impl Receiver {
    pub(crate) fn new(
        shared: Arc<Shared>,
        id: ConnectionId,
        reader: ReadHalf<BoxTransport>,
        incoming: mpsc::Sender<Packet>,
    ) -> Self {
        Self {
            shared,
            id,
            reader,
            incoming,
        }
    }

    /// Reads frames until the transport fails or the stream closes.
    ///
    /// Never retries: after a failure a new transport has to be attached.
    pub(crate) async fn run(mut self) {
        log::debug!("Reader pump started for {}", self.id);
        let max_payload_len = self.shared.config.max_payload_len;

        loop {
            if self.shared.is_closed() {
                break;
            }

            let result = tokio::select! {
                biased;
                _ = self.shared.shutdown.cancelled() => break,
                result = crate::io::read_packet(&mut self.reader, max_payload_len) => result,
            };

            let packet = match result {
                Ok(packet) => packet,
                Err(error) => {
                    log::debug!("Reader pump for {} failed", self.id);
                    self.shared.report(IoError::new(self.id, error));
                    break;
                }
            };

            log::trace!(
                "Received packet kind={}, len={} on {}",
                packet.kind(),
                packet.length(),
                self.id
            );

            // Blocks while the inbound queue is full.
            let sent = tokio::select! {
                biased;
                _ = self.shared.shutdown.cancelled() => break,
                sent = self.incoming.send(packet) => sent,
            };
            if sent.is_err() {
                break;
            }
        }

        log::debug!("Reader pump for {} stopped", self.id);
    }
}
