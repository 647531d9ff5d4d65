//! Inbound and outbound pumps of a [`Stream`](crate::Stream).
//!
//! The receiver moves frames from one transport into the inbound queue;
//! the sender moves packets from the outbound queue onto whichever
//! transport is active, driving each packet through [`DeliveryState`].

mod receiver;
mod sender;

pub(crate) use receiver::Receiver;
pub(crate) use sender::Sender;

/// Progress of a single outbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// A write to the active transport is due.
    Writing,

    /// No transport is attached yet.
    AwaitingConnection,

    /// The last write failed; waiting out the retry delay.
    Retrying,

    /// The packet was fully written.
    Delivered,

    /// The stream closed before the packet could be written.
    Abandoned,
}

/// Inputs of the delivery state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryEvent {
    /// The whole frame reached the transport.
    Written,
    /// The transport rejected a write.
    WriteFailed,
    /// No transport is attached.
    NoConnection,
    /// A transport was attached.
    Connected,
    /// The retry delay is over.
    BackoffElapsed,
    /// The stream is shutting down.
    Closed,
}

impl DeliveryState {
    /// State after `event`. Terminal states ignore every event.
    pub fn next(self, event: DeliveryEvent) -> Self {
        use DeliveryEvent as E;
        use DeliveryState as S;

        match (self, event) {
            (S::Delivered | S::Abandoned, _) => self,
            (_, E::Closed) => S::Abandoned,
            (S::Writing, E::Written) => S::Delivered,
            (S::Writing, E::WriteFailed) => S::Retrying,
            (S::Writing, E::NoConnection) => S::AwaitingConnection,
            (S::Retrying, E::BackoffElapsed) => S::Writing,
            (S::AwaitingConnection, E::Connected) => S::Writing,
            (state, _) => state,
        }
    }

    /// True for `Delivered` and `Abandoned`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Abandoned)
    }
}
