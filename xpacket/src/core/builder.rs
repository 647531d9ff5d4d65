//! Sequential writer for typed packet fields, the counterpart of
//! [`Decomposer`](super::Decomposer).

use crate::error::{Error, Result};

use super::complex::Complex;
use super::packet::Packet;

macro_rules! add_be {
    ($(#[$doc:meta] $name:ident => $ty:ty),* $(,)?) => {
        $(
            #[$doc]
            pub fn $name(&mut self, value: $ty) -> &mut Self {
                self.buf.extend_from_slice(&value.to_be_bytes());
                self
            }
        )*
    };
}

/// Accumulates typed fields into a payload.
#[derive(Debug, Clone, Default)]
pub struct PacketBuilder {
    buf: Vec<u8>,
}

impl PacketBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty builder with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes appended so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True until a field is added.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends a boolean as one byte, 1 or 0.
    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.add_u8(value as u8)
    }

    /// Appends a single byte.
    pub fn add_byte(&mut self, value: u8) -> &mut Self {
        self.add_u8(value)
    }

    add_be! {
        /// Appends an unsigned 8-bit integer.
        add_u8 => u8,
        /// Appends a signed 8-bit integer.
        add_i8 => i8,
        /// Appends a big-endian unsigned 16-bit integer.
        add_u16 => u16,
        /// Appends a big-endian signed 16-bit integer.
        add_i16 => i16,
        /// Appends a big-endian unsigned 32-bit integer.
        add_u32 => u32,
        /// Appends a big-endian signed 32-bit integer.
        add_i32 => i32,
        /// Appends a big-endian unsigned 64-bit integer.
        add_u64 => u64,
        /// Appends a big-endian signed 64-bit integer.
        add_i64 => i64,
        /// Appends a big-endian IEEE 754 single precision float.
        add_f32 => f32,
        /// Appends a big-endian IEEE 754 double precision float.
        add_f64 => f64,
    }

    /// Appends real then imaginary part as `f32`.
    pub fn add_complex64(&mut self, value: Complex<f32>) -> &mut Self {
        self.add_f32(value.re).add_f32(value.im)
    }

    /// Appends real then imaginary part as `f64`.
    pub fn add_complex128(&mut self, value: Complex<f64>) -> &mut Self {
        self.add_f64(value.re).add_f64(value.im)
    }

    /// Appends the code point as a 32-bit integer.
    pub fn add_char(&mut self, value: char) -> &mut Self {
        self.add_u32(value as u32)
    }

    /// Appends a byte string behind a 32-bit signed length prefix.
    pub fn add_bytes(&mut self, value: &[u8]) -> Result<&mut Self> {
        let len = i32::try_from(value.len()).map_err(|_| Error::PayloadTooLarge(value.len()))?;
        self.add_i32(len);
        self.buf.extend_from_slice(value);
        Ok(self)
    }

    /// Appends UTF-8 text behind a 32-bit signed length prefix.
    pub fn add_string(&mut self, value: &str) -> Result<&mut Self> {
        self.add_bytes(value.as_bytes())
    }

    /// Appends bytes with no length prefix.
    pub fn add_raw(&mut self, value: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(value);
        self
    }

    /// Finishes the payload and wraps it in a packet of type `kind`.
    pub fn build(self, kind: i32) -> Packet {
        Packet::new(kind, self.buf)
    }
}
