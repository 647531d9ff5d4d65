use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use log::*;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use xpacket::Stream;

pub struct EchoServer {
    addr: String,
    capacity: usize,
}

impl EchoServer {
    pub fn new(addr: String, capacity: usize) -> Self {
        Self { addr, capacity }
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        info!("Server listening on TCP {}", listener.local_addr()?);

        loop {
            let (socket, peer) = listener.accept().await?;
            info!("Accepted TCP connection from {:?}", peer);
            tokio::spawn(Self::handle_connection(socket, peer, self.capacity));
        }
    }

    /// Echoes every packet back until the client goes away.
    async fn handle_connection(socket: TcpStream, peer: SocketAddr, capacity: usize) {
        if let Err(e) = socket.set_nodelay(true) {
            warn!("[{}] Failed to set TCP_NODELAY: {}", peer, e);
        }

        let stream = Stream::new(capacity);
        let failed = Arc::new(Notify::new());
        {
            let failed = Arc::clone(&failed);
            stream.on_error(move |err| {
                debug!("[{}] {}", peer, err);
                failed.notify_one();
            });
        }
        stream.set_connection(socket);

        let start = Instant::now();
        let mut packets = 0u64;
        let mut bytes = 0u64;

        loop {
            let packet = tokio::select! {
                packet = stream.recv() => packet,
                _ = failed.notified() => None,
            };
            let Some(packet) = packet else {
                break;
            };

            packets += 1;
            bytes += packet.length() as u64;
            if stream.send(packet).await.is_err() {
                break;
            }
        }

        let elapsed = start.elapsed();
        info!("=== Session Complete [{}] ===", peer);
        info!("Packets echoed: {}", packets);
        info!("Total echoed: {} KB", bytes / 1024);
        info!("Time: {:.2} seconds", elapsed.as_secs_f64());

        if let Err(e) = stream.close().await {
            error!("[{}] Failed to close stream: {}", peer, e);
        }
    }
}
