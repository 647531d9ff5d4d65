//! Packet definition and its frame serialization.
//!
//! A packet is a single message: a type tag chosen by the application
//! and an opaque payload. On the wire every packet is preceded by a
//! fixed 12-byte header; length prefixing is the only framing.
//!
//! # Frame Format
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Kind (i32)                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! +                     Payload Length (i64)                      +
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          Payload...                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! All fields are big-endian.

use crate::error::{Error, Result};

use super::decomposer::Decomposer;

/// Frame header size in bytes.
pub const HEADER_SIZE: usize = 12;

/// Largest payload chunk handed to a single transport write.
pub const SEND_BUFFER_SIZE: usize = 16384;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Application-defined packet type.
    pub kind: i32,
    /// Payload length in bytes.
    pub length: i64,
}

impl FrameHeader {
    /// Big-endian wire form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.kind.to_be_bytes());
        buf[4..12].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Parses a header without validating the length field.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Self {
        let kind = i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let length = i64::from_be_bytes([
            buf[4], buf[5], buf[6], buf[7], buf[8], buf[9], buf[10], buf[11],
        ]);
        Self { kind, length }
    }

    /// Checks the length field and returns it as a payload size.
    pub fn payload_len(&self, limit: u64) -> Result<usize> {
        if self.length < 0 {
            return Err(Error::NegativeLength(self.length));
        }
        let length = self.length as u64;
        if length > limit || usize::try_from(length).is_err() {
            return Err(Error::FrameTooLarge {
                length: self.length,
                limit,
            });
        }
        Ok(length as usize)
    }
}

/// A single protocol message.
///
/// The length carried on the wire is always derived from the payload,
/// so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    kind: i32,
    payload: Vec<u8>,
}

impl Packet {
    /// Creates a packet of type `kind` around `payload`.
    pub fn new(kind: i32, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// A packet that carries only its kind.
    pub fn empty(kind: i32) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Application-defined packet type.
    pub fn kind(&self) -> i32 {
        self.kind
    }

    /// Payload length as written in the frame header.
    pub fn length(&self) -> i64 {
        self.payload.len() as i64
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the packet, returning its payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Header that precedes this packet on the wire.
    pub fn header(&self) -> FrameHeader {
        FrameHeader {
            kind: self.kind,
            length: self.length(),
        }
    }

    /// Returns a reader positioned at the start of the payload.
    pub fn decomposer(&self) -> Decomposer<'_> {
        Decomposer::new(self)
    }

    /// Serializes the whole frame in one buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.extend_from_slice(&self.header().encode());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decodes one frame from the front of `buf`.
    ///
    /// Returns the packet and the number of bytes consumed.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self, usize)> {
        Self::from_bytes_with_limit(buf, u64::MAX)
    }

    /// Like [`Packet::from_bytes`], rejecting payloads longer than `limit`.
    pub fn from_bytes_with_limit(buf: &[u8], limit: u64) -> Result<(Self, usize)> {
        let header: &[u8; HEADER_SIZE] = buf
            .get(..HEADER_SIZE)
            .and_then(|head| head.try_into().ok())
            .ok_or(Error::UnexpectedEof {
                needed: HEADER_SIZE,
                remaining: buf.len(),
            })?;
        let header = FrameHeader::decode(header);
        let len = header.payload_len(limit)?;

        let rest = &buf[HEADER_SIZE..];
        if rest.len() < len {
            return Err(Error::UnexpectedEof {
                needed: len,
                remaining: rest.len(),
            });
        }

        Ok((Self::new(header.kind, &rest[..len]), HEADER_SIZE + len))
    }
}
