//! Echo server on port 8080.
//!
//! ```text
//! RUST_LOG=wsmux=debug cargo run --example echo_server
//! ```

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wsmux::{Config, Server, server};

const ADDR: &str = "0.0.0.0:8080";

#[tokio::main(flavor = "current_thread")]
async fn main() -> wsmux::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = Server::bind(ADDR, Config::server()).await?;
    let (handle, shutdown) = server::channel();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received");
                handle.trigger();
            }
            Err(err) => error!(error = %err, "failed to listen for interrupt"),
        }
    });

    server.run(shutdown).await
}
