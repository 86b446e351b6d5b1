use std::path::Path;

use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};
use tracing::info;

use crate::{
    common::{ClientTlsPaths, ServerTlsPaths},
    error::BenchError,
};

/// Read a PEM file; a missing or unreadable file is fatal.
fn read_pem(path: &Path) -> Result<Vec<u8>, BenchError> {
    std::fs::read(path).map_err(|source| BenchError::TlsMaterial {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the listener TLS configuration from the certificate and key pair.
pub fn server_tls_config(paths: &ServerTlsPaths) -> Result<ServerTlsConfig, BenchError> {
    let cert = read_pem(&paths.cert)?;
    let key = read_pem(&paths.key)?;
    info!("Loaded server certificate {:?} and key {:?}", paths.cert, paths.key);
    Ok(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
}

/// Build the channel TLS configuration trusting only the given root certificate.
pub fn client_tls_config(paths: &ClientTlsPaths) -> Result<ClientTlsConfig, BenchError> {
    let ca_cert = read_pem(&paths.ca_cert)?;
    info!("Loaded root certificate {:?}", paths.ca_cert);
    Ok(ClientTlsConfig::new()
        .ca_certificate(Certificate::from_pem(ca_cert))
        .domain_name(paths.domain.clone()))
}
