//! Spawns a multiplexer on an ephemeral loopback port.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinHandle;
use wsmux::server::{self, ShutdownHandle};
use wsmux::{Config, Server};

pub struct TestServer {
    handle: ShutdownHandle,
    task: JoinHandle<wsmux::Result<()>>,
}

impl TestServer {
    pub async fn spawn() -> (Self, SocketAddr) {
        Self::spawn_with(Config::server()).await
    }

    pub async fn spawn_with(config: Config) -> (Self, SocketAddr) {
        let config = config.with_poll_interval(Duration::from_millis(20));
        let server = Server::bind("127.0.0.1:0", config).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (handle, shutdown) = server::channel();
        let task = tokio::spawn(server.run(shutdown));
        (Self { handle, task }, addr)
    }

    /// Trigger shutdown and wait for the loop to return.
    pub async fn shutdown(self) {
        self.handle.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server returned an error");
    }
}
