//! # XPacket - Length-Prefixed Packet Streams
//!
//! XPacket frames discrete messages over any ordered, reliable byte
//! stream and manages the connection they travel on:
//!
//! - **Wire codec**: `[kind: i32][length: i64][payload]`, big-endian
//! - **Typed payloads**: `PacketBuilder` writes fields, `Decomposer` reads them back
//! - **Concurrent pumps**: inbound and outbound traffic run as independent tasks
//! - **Hot-swap**: replace a failed transport without losing queued packets
//! - **Error callback**: I/O failures are reported, never raised from the pumps
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Application Layer                     │
//! │        send() ──▶ outgoing          incoming ──▶ recv()  │
//! ├─────────────────────────────────────────────────────────┤
//! │                      Stream Layer                        │
//! │  ┌─────────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │  Writer pump    │  │ Reader pumps │  │  on_error  │  │
//! │  │ (retry / swap)  │  │ (1 per conn) │  │  callback  │  │
//! │  └─────────────────┘  └──────────────┘  └────────────┘  │
//! ├─────────────────────────────────────────────────────────┤
//! │                      Frame Layer                         │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────┐    │
//! │  │   Packet    │ │ Decomposer  │ │  PacketBuilder  │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────┘    │
//! ├─────────────────────────────────────────────────────────┤
//! │                    Transport Layer                       │
//! │  ┌─────────────────────────────────────────────────┐    │
//! │  │       Any AsyncRead + AsyncWrite byte stream     │    │
//! │  └─────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use xpacket::{Packet, PacketBuilder};
//!
//! let mut builder = PacketBuilder::new();
//! builder.add_u16(7).add_bool(true);
//! builder.add_string("hello").unwrap();
//! let packet = builder.build(42);
//!
//! let bytes = packet.to_bytes();
//! let (decoded, _) = Packet::from_bytes(&bytes).unwrap();
//!
//! let mut fields = decoded.decomposer();
//! assert_eq!(fields.read_u16().unwrap(), 7);
//! assert!(fields.read_bool().unwrap());
//! assert_eq!(fields.read_string().unwrap(), "hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod stream;
pub mod transport;

// Re-export commonly used types
pub use crate::core::{Complex, Decomposer, FrameHeader, Packet, PacketBuilder, HEADER_SIZE, SEND_BUFFER_SIZE};
pub use config::StreamConfig;
pub use error::{Error, Result};
pub use stream::{IoError, Stream};
pub use transport::{ConnectionId, Transport};
