pub mod cli;
pub mod client;
pub mod common;
pub mod error;
pub mod message;
pub mod payload;
pub mod server;
pub mod shutdown;
pub mod streamer;
pub mod tls;
