//! Error type shared by the codec and the stream.

use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors raised while encoding, decoding or moving packets.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read needed more bytes than the buffer holds.
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left.
        remaining: usize,
    },

    /// A frame header or length prefix carried a negative length.
    #[error("negative length field: {0}")]
    NegativeLength(i64),

    /// A frame claimed a payload above the configured limit.
    #[error("frame length {length} exceeds limit of {limit} bytes")]
    FrameTooLarge {
        /// Length field of the frame.
        length: i64,
        /// Configured limit.
        limit: u64,
    },

    /// A byte string is too long for its 32-bit length prefix.
    #[error("payload of {0} bytes does not fit a 32-bit length prefix")]
    PayloadTooLarge(usize),

    /// A character field held no valid code point.
    #[error("invalid unicode scalar value: {0:#x}")]
    InvalidChar(u32),

    /// A string field held invalid UTF-8.
    #[error("invalid UTF-8 text: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// The stream was closed.
    #[error("stream is closed")]
    Closed,

    /// `close` was called twice.
    #[error("stream was already closed")]
    AlreadyClosed,

    /// A pump task panicked or was cancelled.
    #[error("pump task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// True for errors caused by malformed or truncated frame data rather
    /// than by the transport itself.
    pub fn is_decode(&self) -> bool {
        match self {
            Error::UnexpectedEof { .. }
            | Error::NegativeLength(_)
            | Error::FrameTooLarge { .. }
            | Error::InvalidChar(_)
            | Error::InvalidUtf8(_) => true,
            Error::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
