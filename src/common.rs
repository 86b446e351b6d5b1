use std::{path::PathBuf, time::Duration};

use crate::{error::BenchError, streamer::ChunkPolicy};

/// Largest chunk emitted by the server, kept below gRPC's 4 MiB default message limit.
pub const CHUNK_SIZE: usize = 4 * 1000 * 1000;
/// Default payload size in bytes.
pub const DEFAULT_PAYLOAD_SIZE: u64 = 1024;
/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;
/// Default client target.
pub const DEFAULT_TARGET: &str = "localhost:5000";
/// Default number of benchmark trials.
pub const DEFAULT_NTIMES: usize = 10;
/// Default depth of the per-request chunk channel.
pub const DEFAULT_STREAM_BUFFER: usize = 4;
/// Name the reference certificates are issued for.
pub const DEFAULT_TLS_DOMAIN: &str = "x.test.example.com";

pub const DEFAULT_SERVER_CERT: &str = "tls/server_cert.pem";
pub const DEFAULT_SERVER_KEY: &str = "tls/server_key.pem";
pub const DEFAULT_CA_CERT: &str = "tls/ca_cert.pem";

/// Switches shared by the server and the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Split the payload into chunks instead of sending it as one message.
    /// Only read by the server; the client accepts either layout.
    pub chunked: bool,
    /// Use TLS for the listener / channel.
    pub secure: bool,
    /// Log every chunk and every trial at debug level.
    pub verbose: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            chunked: true,
            secure: false,
            verbose: false,
        }
    }
}

/// Options for the timeout of a connection.
///
/// Nothing is bounded by default: an RPC is only cancelled by a signal on the
/// server or by process exit on the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeoutOptions {
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

/// Server side TLS material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for ServerTlsPaths {
    fn default() -> Self {
        Self {
            cert: PathBuf::from(DEFAULT_SERVER_CERT),
            key: PathBuf::from(DEFAULT_SERVER_KEY),
        }
    }
}

/// Client side TLS material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTlsPaths {
    pub ca_cert: PathBuf,
    /// Server name checked against the presented certificate.
    pub domain: String,
}

impl Default for ClientTlsPaths {
    fn default() -> Self {
        Self {
            ca_cert: PathBuf::from(DEFAULT_CA_CERT),
            domain: DEFAULT_TLS_DOMAIN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub payload_size: u64,
    pub chunk_size: usize,
    pub stream_buffer: usize,
    pub options: TransferOptions,
    pub tls: ServerTlsPaths,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            chunk_size: CHUNK_SIZE,
            stream_buffer: DEFAULT_STREAM_BUFFER,
            options: TransferOptions::default(),
            tls: ServerTlsPaths::default(),
        }
    }
}

impl ServerConfig {
    /// The chunking policy selected by this configuration.
    pub fn chunk_policy(&self) -> Result<ChunkPolicy, BenchError> {
        if self.options.chunked {
            ChunkPolicy::fixed(self.chunk_size)
        } else {
            Ok(ChunkPolicy::Whole)
        }
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        self.chunk_policy()?;
        if self.stream_buffer == 0 {
            return Err(BenchError::InvalidConfig(
                "stream buffer must hold at least one chunk".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub target: String,
    pub ntimes: usize,
    pub options: TransferOptions,
    pub tls: ClientTlsPaths,
    pub timeout_options: TimeoutOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            ntimes: DEFAULT_NTIMES,
            options: TransferOptions::default(),
            tls: ClientTlsPaths::default(),
            timeout_options: TimeoutOptions::default(),
        }
    }
}

impl ClientConfig {
    /// The URI tonic connects to. A bare `host:port` gets a scheme matching
    /// the transport security setting.
    pub fn endpoint_uri(&self) -> String {
        if self.target.contains("://") {
            self.target.clone()
        } else if self.options.secure {
            format!("https://{}", self.target)
        } else {
            format!("http://{}", self.target)
        }
    }
}
