//! Streamed frame I/O over byte-oriented transports.
//!
//! Writes send the header first and then the payload in chunks of at most
//! `chunk_size` bytes, so a single transport write call is bounded. Reads
//! consume exactly one frame or fail without returning a partial packet.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::{FrameHeader, Packet, HEADER_SIZE, SEND_BUFFER_SIZE};
use crate::Result;

/// Writes one packet, aborting at the first failed write.
pub async fn write_packet<W>(writer: &mut W, packet: &Packet, chunk_size: usize) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer.write_all(&packet.header().encode()).await?;
    for chunk in packet.payload().chunks(chunk_size.max(1)) {
        writer.write_all(chunk).await?;
    }
    writer.flush().await?;

    log::trace!("Wrote packet kind={}, len={}", packet.kind(), packet.length());
    Ok(())
}

/// Reads exactly one packet, rejecting payloads longer than `max_payload_len`.
pub async fn read_packet<R>(reader: &mut R, max_payload_len: u64) -> Result<Packet>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header_buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_buf).await?;
    let header = FrameHeader::decode(&header_buf);
    let len = header.payload_len(max_payload_len)?;

    // Grows with the bytes that actually arrive, not with the claimed length.
    let mut payload = Vec::with_capacity(len.min(SEND_BUFFER_SIZE));
    (&mut *reader).take(len as u64).read_to_end(&mut payload).await?;
    check_complete(&payload, len)?;

    log::trace!("Read packet kind={}, len={}", header.kind, len);
    Ok(Packet::new(header.kind, payload))
}

/// Blocking counterpart of [`write_packet`].
pub fn write_packet_blocking<W>(writer: &mut W, packet: &Packet, chunk_size: usize) -> Result<()>
where
    W: std::io::Write + ?Sized,
{
    use std::io::Write;

    writer.write_all(&packet.header().encode())?;
    for chunk in packet.payload().chunks(chunk_size.max(1)) {
        writer.write_all(chunk)?;
    }
    writer.flush()?;
    Ok(())
}

/// Blocking counterpart of [`read_packet`].
pub fn read_packet_blocking<R>(reader: &mut R, max_payload_len: u64) -> Result<Packet>
where
    R: std::io::Read + ?Sized,
{
    use std::io::Read;

    let mut header_buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_buf)?;
    let header = FrameHeader::decode(&header_buf);
    let len = header.payload_len(max_payload_len)?;

    let mut payload = Vec::with_capacity(len.min(SEND_BUFFER_SIZE));
    (&mut *reader).take(len as u64).read_to_end(&mut payload)?;
    check_complete(&payload, len)?;
    Ok(Packet::new(header.kind, payload))
}

fn check_complete(payload: &[u8], len: usize) -> Result<()> {
    if payload.len() < len {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Records the size of every write call.
    #[derive(Default)]
    struct RecordingWriter {
        data: Vec<u8>,
        calls: Vec<usize>,
    }

    impl AsyncWrite for RecordingWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.calls.push(buf.len());
            self.data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Accepts `budget` bytes, then fails every write.
    struct FailingWriter {
        budget: usize,
        written: usize,
    }

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            if self.written >= self.budget {
                return Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()));
            }
            let n = buf.len().min(self.budget - self.written);
            self.written += n;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_chunked_write_matches_to_bytes() {
        let packet = Packet::new(77, vec![0xAB; 40_000]);
        let mut writer = RecordingWriter::default();

        write_packet(&mut writer, &packet, 16384).await.unwrap();

        assert_eq!(writer.data, packet.to_bytes());
        assert_eq!(writer.calls, vec![HEADER_SIZE, 16384, 16384, 40_000 - 2 * 16384]);
    }

    #[tokio::test]
    async fn test_write_error_surfaces() {
        let packet = Packet::new(1, vec![1u8; 100]);
        let mut writer = FailingWriter { budget: 20, written: 0 };

        let err = write_packet(&mut writer, &packet, 8).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }

    #[tokio::test]
    async fn test_read_sequence_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let packets = vec![
            Packet::new(1, b"hello".to_vec()),
            Packet::empty(2),
            Packet::new(-3, vec![0x5A; 1000]),
        ];

        let sent = packets.clone();
        let writer = tokio::spawn(async move {
            for packet in &sent {
                write_packet(&mut a, packet, 16).await.unwrap();
            }
        });

        for expected in &packets {
            let packet = read_packet(&mut b, u64::MAX).await.unwrap();
            assert_eq!(&packet, expected);
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_truncated_frame() {
        let bytes = Packet::new(1, vec![3u8; 50]).to_bytes();
        let mut reader = Cursor::new(bytes[..30].to_vec());

        let err = read_packet(&mut reader, u64::MAX).await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_read_rejects_oversized_length() {
        let header = FrameHeader { kind: 1, length: 1 << 40 };
        let mut reader = Cursor::new(header.encode().to_vec());

        let err = read_packet(&mut reader, 1 << 20).await.unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_read_huge_claimed_length_fails_on_eof() {
        let header = FrameHeader { kind: 1, length: 1 << 40 };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(b"short");

        let err = read_packet(&mut Cursor::new(bytes), u64::MAX).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_blocking_truncated_frame() {
        let bytes = Packet::new(4, vec![9u8; 64]).to_bytes();
        let err = read_packet_blocking(&mut Cursor::new(&bytes[..40]), u64::MAX).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_blocking_roundtrip() {
        let packet = Packet::new(12, b"blocking".to_vec());
        let mut wire = Vec::new();
        write_packet_blocking(&mut wire, &packet, 3).unwrap();
        assert_eq!(wire, packet.to_bytes());

        let decoded = read_packet_blocking(&mut Cursor::new(wire), u64::MAX).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_blocking_negative_length() {
        let header = FrameHeader { kind: 1, length: -1 };
        let err = read_packet_blocking(&mut Cursor::new(header.encode()), u64::MAX).unwrap_err();
        assert!(matches!(err, Error::NegativeLength(-1)));
    }
}
