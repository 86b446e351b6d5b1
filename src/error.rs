use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the benchmark server and client.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to allocate a payload of {size} bytes")]
    PayloadAllocation { size: u64 },
    #[error("Failed to read TLS material from {path:?}: {source}")]
    TlsMaterial {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("Stream finished with non-OK status: {0}")]
    Stream(#[from] tonic::Status),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Shutdown requested before the server started serving")]
    ShutdownBeforeStart,
    #[error("Internal error: {0}")]
    InternalError(String),
}
