//! Tunables of a [`Stream`](crate::Stream).

use std::time::Duration;

use crate::core::SEND_BUFFER_SIZE;

/// Default bound of the inbound and outbound queues.
pub const DEFAULT_CAPACITY: usize = 64;

/// Default pause between two write attempts of the same packet.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Default upper bound for the length field of an inbound frame (1 GiB).
pub const DEFAULT_MAX_PAYLOAD_LEN: u64 = 1 << 30;

/// Queue sizes, write chunking, retry pacing and inbound limits.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Bound of each of the inbound and outbound queues.
    pub capacity: usize,
    /// Largest payload chunk passed to one transport write.
    pub send_buffer_size: usize,
    /// Pause before rewriting a packet whose write failed.
    pub retry_delay: Duration,
    /// Largest accepted payload of an inbound frame.
    pub max_payload_len: u64,
}

impl StreamConfig {
    /// Configuration with every default applied.
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            send_buffer_size: SEND_BUFFER_SIZE,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }

    /// Queue bound. Zero is raised to one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Payload chunk size for streamed writes. Zero is treated as one.
    pub fn with_send_buffer_size(mut self, size: usize) -> Self {
        self.send_buffer_size = size;
        self
    }

    /// Delay between write attempts of the same packet.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Inbound payload limit.
    pub fn with_max_payload_len(mut self, len: u64) -> Self {
        self.max_payload_len = len;
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = StreamConfig::default()
            .with_capacity(8)
            .with_send_buffer_size(512)
            .with_retry_delay(Duration::from_millis(5))
            .with_max_payload_len(1024);

        assert_eq!(config.capacity, 8);
        assert_eq!(config.send_buffer_size, 512);
        assert_eq!(config.retry_delay, Duration::from_millis(5));
        assert_eq!(config.max_payload_len, 1024);
    }

    #[test]
    fn test_defaults() {
        let config = StreamConfig::new();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.send_buffer_size, 16384);
        assert_eq!(config.retry_delay, Duration::from_millis(1));
    }
}
