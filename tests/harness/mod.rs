//! Shared fixtures for driving a live multiplexer over loopback TCP.

mod client;
mod server;

pub use client::{KEY, TestClient, assert_closed, request};
pub use server::TestServer;
