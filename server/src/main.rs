mod echo_server;

use log::error;

use crate::echo_server::EchoServer;

const DEFAULT_ADDR: &str = "127.0.0.1:7878";
const CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let server = EchoServer::new(addr, CHANNEL_CAPACITY);
    if let Err(e) = server.run().await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
