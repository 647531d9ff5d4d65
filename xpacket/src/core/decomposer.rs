//! Sequential reader for typed packet fields.
//!
//! Fields have no tags on the wire, so they must be read back in exactly
//! the order and with exactly the types they were added with
//! [`PacketBuilder`](super::PacketBuilder). Reading in a different order
//! yields garbage values, not an error, unless it runs past the end.

use crate::error::{Error, Result};

use super::complex::Complex;
use super::packet::Packet;

macro_rules! read_be {
    ($(#[$doc:meta] $name:ident => $ty:ty),* $(,)?) => {
        $(
            #[$doc]
            pub fn $name(&mut self) -> Result<$ty> {
                Ok(<$ty>::from_be_bytes(self.array()?))
            }
        )*
    };
}

/// Cursor over a packet payload.
///
/// A failed read leaves the cursor at the end of the payload, so once a
/// read has failed every later read fails as well.
#[derive(Debug, Clone)]
pub struct Decomposer<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decomposer<'a> {
    /// Reader over the payload of `packet`.
    pub fn new(packet: &'a Packet) -> Self {
        Self::from_slice(packet.payload())
    }

    /// Reader over a bare payload.
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once the whole payload has been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            self.pos = self.buf.len();
            return Err(Error::UnexpectedEof {
                needed: n,
                remaining,
            });
        }
        let span = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(span)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a 32-bit signed length prefix.
    fn prefix(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        if len < 0 {
            self.pos = self.buf.len();
            return Err(Error::NegativeLength(len as i64));
        }
        Ok(len as usize)
    }

    /// Reads a one-byte boolean; any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        self.read_u8()
    }

    read_be! {
        /// Reads an unsigned 8-bit integer.
        read_u8 => u8,
        /// Reads a signed 8-bit integer.
        read_i8 => i8,
        /// Reads a big-endian unsigned 16-bit integer.
        read_u16 => u16,
        /// Reads a big-endian signed 16-bit integer.
        read_i16 => i16,
        /// Reads a big-endian unsigned 32-bit integer.
        read_u32 => u32,
        /// Reads a big-endian signed 32-bit integer.
        read_i32 => i32,
        /// Reads a big-endian unsigned 64-bit integer.
        read_u64 => u64,
        /// Reads a big-endian signed 64-bit integer.
        read_i64 => i64,
        /// Reads a big-endian IEEE 754 single precision float.
        read_f32 => f32,
        /// Reads a big-endian IEEE 754 double precision float.
        read_f64 => f64,
    }

    /// Reads two `f32` values as (real, imaginary).
    pub fn read_complex64(&mut self) -> Result<Complex<f32>> {
        let re = self.read_f32()?;
        let im = self.read_f32()?;
        Ok(Complex::new(re, im))
    }

    /// Reads two `f64` values as (real, imaginary).
    pub fn read_complex128(&mut self) -> Result<Complex<f64>> {
        let re = self.read_f64()?;
        let im = self.read_f64()?;
        Ok(Complex::new(re, im))
    }

    /// Reads a code point stored as a 32-bit integer.
    pub fn read_char(&mut self) -> Result<char> {
        let raw = self.read_u32()?;
        char::from_u32(raw).ok_or(Error::InvalidChar(raw))
    }

    /// Reads a length-prefixed byte string.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.prefix()?;
        self.take(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Reads exactly `n` bytes with no length prefix.
    pub fn read_n_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }
}
