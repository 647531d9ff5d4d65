//! Outbound pump: a single instance per stream.
//!
//! Writes packets in queue order. A packet that fails to write is retried
//! against whatever transport is active at the time of the retry, and
//! everything queued behind it waits.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::{DeliveryEvent, DeliveryState};
use crate::core::Packet;
use crate::stream::{ActiveConnection, IoError, Shared};

pub(crate) struct Sender {
    shared: Arc<Shared>,
    outgoing: mpsc::Receiver<Packet>,
    connection: watch::Receiver<ActiveConnection>,
}

impl Sender {
    pub(crate) fn new(shared: Arc<Shared>, outgoing: mpsc::Receiver<Packet>) -> Self {
        let connection = shared.connection.subscribe();
        Self {
            shared,
            outgoing,
            connection,
        }
    }

    pub(crate) async fn run(mut self) {
        log::debug!("Writer pump started");

        loop {
            let packet = tokio::select! {
                biased;
                _ = self.shared.shutdown.cancelled() => break,
                packet = self.outgoing.recv() => match packet {
                    Some(packet) => packet,
                    None => break,
                },
            };

            if self.deliver(&packet).await == DeliveryState::Abandoned {
                log::debug!(
                    "Abandoned packet kind={}, len={} on close",
                    packet.kind(),
                    packet.length()
                );
                break;
            }
        }

        self.close_connection().await;
        log::debug!("Writer pump stopped");
    }

    async fn deliver(&mut self, packet: &Packet) -> DeliveryState {
        let mut state = DeliveryState::Writing;

        while !state.is_terminal() {
            let event = match state {
                DeliveryState::Writing => self.attempt(packet).await,
                DeliveryState::Retrying => self.backoff().await,
                DeliveryState::AwaitingConnection => self.wait_for_connection().await,
                DeliveryState::Delivered | DeliveryState::Abandoned => break,
            };
            state = state.next(event);
        }

        state
    }

    async fn attempt(&mut self, packet: &Packet) -> DeliveryEvent {
        if self.shared.is_closed() {
            return DeliveryEvent::Closed;
        }

        let Some(connection) = self.connection.borrow_and_update().clone() else {
            return DeliveryEvent::NoConnection;
        };

        let chunk_size = self.shared.config.send_buffer_size;
        let result = tokio::select! {
            biased;
            _ = self.shared.shutdown.cancelled() => return DeliveryEvent::Closed,
            result = connection.write_packet(packet, chunk_size) => result,
        };

        match result {
            Ok(()) => {
                log::trace!(
                    "Sent packet kind={}, len={} on {}",
                    packet.kind(),
                    packet.length(),
                    connection.id()
                );
                DeliveryEvent::Written
            }
            Err(error) => {
                self.shared.report(IoError::new(connection.id(), error));
                DeliveryEvent::WriteFailed
            }
        }
    }

    async fn backoff(&self) -> DeliveryEvent {
        tokio::select! {
            biased;
            _ = self.shared.shutdown.cancelled() => DeliveryEvent::Closed,
            _ = tokio::time::sleep(self.shared.config.retry_delay) => DeliveryEvent::BackoffElapsed,
        }
    }

    async fn wait_for_connection(&mut self) -> DeliveryEvent {
        tokio::select! {
            biased;
            _ = self.shared.shutdown.cancelled() => DeliveryEvent::Closed,
            changed = self.connection.changed() => match changed {
                Ok(()) => DeliveryEvent::Connected,
                Err(_) => DeliveryEvent::Closed,
            },
        }
    }

    /// Shuts down the active transport. Runs once, when the pump stops.
    async fn close_connection(&self) {
        let Some(connection) = self.shared.connection.send_replace(None) else {
            return;
        };

        self.shared.shut_down(&connection).await;
    }
}
