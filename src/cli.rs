use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::common::{
    ClientConfig, ClientTlsPaths, ServerConfig, ServerTlsPaths, TimeoutOptions, TransferOptions,
    CHUNK_SIZE, DEFAULT_CA_CERT, DEFAULT_NTIMES, DEFAULT_PAYLOAD_SIZE, DEFAULT_PORT,
    DEFAULT_SERVER_CERT, DEFAULT_SERVER_KEY, DEFAULT_STREAM_BUFFER, DEFAULT_TARGET,
    DEFAULT_TLS_DOMAIN,
};

#[derive(Parser, Debug)]
#[command(name = "grpc_server", about = "Streams a generated payload to benchmark clients")]
pub struct ServerArgs {
    /// Server port for the service
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Number of bytes to test with
    #[arg(short, long, default_value_t = DEFAULT_PAYLOAD_SIZE)]
    pub size: u64,
    /// Whether to enable TLS
    #[arg(long)]
    pub tls: bool,
    /// Largest number of bytes sent per message
    #[arg(long, default_value_t = CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Send the whole payload as a single message
    #[arg(long)]
    pub no_chunking: bool,
    /// Chunks buffered per stream before the server waits for the client
    #[arg(long, default_value_t = DEFAULT_STREAM_BUFFER)]
    pub stream_buffer: usize,
    #[arg(long, default_value = DEFAULT_SERVER_CERT)]
    pub cert: PathBuf,
    #[arg(long, default_value = DEFAULT_SERVER_KEY)]
    pub key: PathBuf,
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            port: args.port,
            payload_size: args.size,
            chunk_size: args.chunk_size,
            stream_buffer: args.stream_buffer,
            options: TransferOptions {
                chunked: !args.no_chunking,
                secure: args.tls,
                verbose: args.verbose,
            },
            tls: ServerTlsPaths {
                cert: args.cert,
                key: args.key,
            },
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "grpc_client", about = "Measures streaming throughput against a grpc_server")]
pub struct ClientArgs {
    /// Server address
    #[arg(short = 'a', long, visible_alias = "address", default_value = DEFAULT_TARGET)]
    pub target: String,
    /// Number of times to run the test
    #[arg(short, long, default_value_t = DEFAULT_NTIMES)]
    pub ntimes: usize,
    /// Whether to enable TLS
    #[arg(long)]
    pub tls: bool,
    #[arg(long, default_value = DEFAULT_CA_CERT)]
    pub ca_cert: PathBuf,
    /// Name the server certificate must be valid for
    #[arg(long, default_value = DEFAULT_TLS_DOMAIN)]
    pub tls_domain: String,
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<ClientArgs> for ClientConfig {
    fn from(args: ClientArgs) -> Self {
        Self {
            target: args.target,
            ntimes: args.ntimes,
            options: TransferOptions {
                secure: args.tls,
                verbose: args.verbose,
                ..TransferOptions::default()
            },
            tls: ClientTlsPaths {
                ca_cert: args.ca_cert,
                domain: args.tls_domain,
            },
            timeout_options: TimeoutOptions::default(),
        }
    }
}

/// Install the global fmt subscriber, at debug level when verbose.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::from(ServerArgs::try_parse_from(["grpc_server"]).unwrap());
        assert_eq!(config.port, 5000);
        assert_eq!(config.payload_size, 1024);
        assert_eq!(config.chunk_size, 4_000_000);
        assert_eq!(config.options, TransferOptions::default());
        assert_eq!(config.tls, ServerTlsPaths::default());
    }

    #[test]
    fn test_server_flags() {
        let args = ServerArgs::try_parse_from([
            "grpc_server",
            "--port",
            "6000",
            "--size",
            "1048576",
            "--tls",
            "--no-chunking",
            "-v",
        ])
        .unwrap();
        let config = ServerConfig::from(args);
        assert_eq!(config.port, 6000);
        assert_eq!(config.payload_size, 1_048_576);
        assert!(config.options.secure);
        assert!(!config.options.chunked);
        assert!(config.options.verbose);
    }

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::from(ClientArgs::try_parse_from(["grpc_client"]).unwrap());
        assert_eq!(config.target, "localhost:5000");
        assert_eq!(config.ntimes, 10);
        assert!(!config.options.secure);
        assert_eq!(config.tls, ClientTlsPaths::default());
    }

    #[test]
    fn test_client_flags() {
        let args = ClientArgs::try_parse_from([
            "grpc_client",
            "--target",
            "10.0.0.2:5000",
            "--ntimes",
            "3",
            "--tls",
        ])
        .unwrap();
        let config = ClientConfig::from(args);
        assert_eq!(config.target, "10.0.0.2:5000");
        assert_eq!(config.ntimes, 3);
        assert!(config.options.secure);
    }

    #[test]
    fn test_short_flags() {
        let config = ServerConfig::from(
            ServerArgs::try_parse_from(["grpc_server", "-p", "6001", "-s", "2048", "-v"]).unwrap(),
        );
        assert_eq!(config.port, 6001);
        assert_eq!(config.payload_size, 2048);
        assert!(config.options.verbose);

        let config = ClientConfig::from(
            ClientArgs::try_parse_from(["grpc_client", "-a", "10.0.0.3:5000", "-n", "4"]).unwrap(),
        );
        assert_eq!(config.target, "10.0.0.3:5000");
        assert_eq!(config.ntimes, 4);

        let config = ClientConfig::from(
            ClientArgs::try_parse_from(["grpc_client", "--address", "10.0.0.4:5000"]).unwrap(),
        );
        assert_eq!(config.target, "10.0.0.4:5000");
    }

    #[test]
    fn test_client_options_leave_layout_to_server() {
        let config = ClientConfig::from(
            ClientArgs::try_parse_from(["grpc_client", "--tls", "-v"]).unwrap(),
        );
        assert_eq!(
            config.options,
            TransferOptions {
                secure: true,
                verbose: true,
                ..TransferOptions::default()
            }
        );
    }
}
