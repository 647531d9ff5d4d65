use std::sync::Arc;
use std::time::{Duration, Instant};

use log::*;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use xpacket::{ConnectionId, Error, Packet, PacketBuilder, Stream};

const CHANNEL_CAPACITY: usize = 256;
const RECONNECT_DELAY: Duration = Duration::from_millis(500);
const KIND_ECHO: i32 = 1;

pub struct EchoClient {
    addr: String,
}

impl EchoClient {
    pub fn new(addr: String) -> Self {
        Self { addr }
    }

    /// Sends `count` packets and waits for every echo.
    ///
    /// A failed connection is replaced in the background; packets queued
    /// in the meantime go out on the new one.
    pub async fn run(&self, count: u32, payload_size: usize) -> xpacket::Result<()> {
        let stream = Arc::new(Stream::new(CHANNEL_CAPACITY));

        let (failed_tx, failed_rx) = mpsc::unbounded_channel();
        stream.on_error(move |err| {
            warn!("{}", err);
            let _ = failed_tx.send(err.connection);
        });

        let socket = connect(&self.addr).await;
        info!("Connected!");
        stream.set_connection(socket);

        let reconnector = tokio::spawn(reconnect(
            Arc::clone(&stream),
            self.addr.clone(),
            failed_rx,
        ));

        let sender = {
            let stream = Arc::clone(&stream);
            tokio::spawn(async move {
                let filler = vec![0xAB; payload_size];
                let start = Instant::now();
                for seq in 0..count {
                    let packet = build_packet(seq, &filler)?;
                    stream.send(packet).await?;
                }
                let elapsed = start.elapsed();
                info!("=== Send Complete ===");
                info!("Packets queued: {}", count);
                info!("Time: {:.2} seconds", elapsed.as_secs_f64());
                Ok::<_, Error>(())
            })
        };

        let start = Instant::now();
        let mut bytes = 0u64;
        for expected in 0..count {
            let Some(packet) = stream.recv().await else {
                break;
            };
            let seq = check_echo(&packet, payload_size)?;
            if seq != expected {
                warn!("Echo out of order: expected #{}, got #{}", expected, seq);
            }
            bytes += packet.length() as u64;
        }
        let elapsed = start.elapsed();
        let speed = (bytes as f64 / 1024.0 / 1024.0) / elapsed.as_secs_f64();

        info!("=== Receive Complete ===");
        info!("Total received: {} MB", bytes / 1024 / 1024);
        info!("Time: {:.2} seconds", elapsed.as_secs_f64());
        info!("Speed: {:.2} MB/s", speed);

        sender.await??;
        reconnector.abort();
        stream.close().await
    }
}

async fn connect(addr: &str) -> TcpStream {
    loop {
        match TcpStream::connect(addr).await {
            Ok(socket) => {
                if let Err(e) = socket.set_nodelay(true) {
                    warn!("Failed to set TCP_NODELAY: {}", e);
                }
                return socket;
            }
            Err(e) => {
                warn!("Connect to {} failed: {}, retrying", addr, e);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Replaces the active connection whenever it reports a failure.
///
/// Reports about transports that were already replaced are ignored.
async fn reconnect(
    stream: Arc<Stream>,
    addr: String,
    mut failed: mpsc::UnboundedReceiver<ConnectionId>,
) {
    while let Some(id) = failed.recv().await {
        if stream.is_closed() {
            break;
        }
        if stream.connection() != Some(id) {
            continue;
        }

        info!("Connection {} failed, reconnecting to {}...", id, addr);
        let socket = connect(&addr).await;
        let new_id = stream.set_connection(socket);
        info!("Reconnected as {}", new_id);
    }
}

fn build_packet(seq: u32, filler: &[u8]) -> xpacket::Result<Packet> {
    let mut builder = PacketBuilder::with_capacity(filler.len() + 32);
    builder.add_u32(seq);
    builder.add_string(&format!("packet #{}", seq))?;
    builder.add_bytes(filler)?;
    Ok(builder.build(KIND_ECHO))
}

fn check_echo(packet: &Packet, payload_size: usize) -> xpacket::Result<u32> {
    let mut fields = packet.decomposer();
    let seq = fields.read_u32()?;
    let label = fields.read_string()?;
    let filler = fields.read_bytes()?;

    if packet.kind() != KIND_ECHO || filler.len() != payload_size {
        warn!(
            "Unexpected echo kind={} len={} ({})",
            packet.kind(),
            filler.len(),
            label
        );
    }
    trace!("Echo {} ok", label);
    Ok(seq)
}
