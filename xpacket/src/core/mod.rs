//! Core data structures of the packet protocol.
//!
//! - Packet: one message and its frame serialization
//! - Decomposer / PacketBuilder: typed field access to the payload
//! - Complex: (real, imaginary) pair used by the complex field types

mod builder;
mod complex;
mod decomposer;
mod packet;

pub use builder::PacketBuilder;
pub use complex::Complex;
pub use decomposer::Decomposer;
pub use packet::{FrameHeader, Packet, HEADER_SIZE, SEND_BUFFER_SIZE};
