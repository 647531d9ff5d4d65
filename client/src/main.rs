mod echo_client;

use log::{error, info};

use crate::echo_client::EchoClient;

const DEFAULT_ADDR: &str = "127.0.0.1:7878";
const PACKET_COUNT: u32 = 10_000;
const PAYLOAD_SIZE: usize = 4 * 1024; // 4 KB

#[tokio::main]
async fn main() {
    env_logger::init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    info!("Connecting to server at {}...", addr);
    let client = EchoClient::new(addr);
    if let Err(e) = client.run(PACKET_COUNT, PAYLOAD_SIZE).await {
        error!("Client failed: {}", e);
        std::process::exit(1);
    }
}
