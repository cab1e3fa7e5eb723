//! TLS client transport.
//!
//! The connection is always encrypted and always anonymous; the session
//! owns the returned stream exclusively.

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

/// Errors establishing the encrypted connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no usable system root certificates")]
    NoRootCertificates,

    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Open an encrypted stream to `host:port`, verifying against the
/// system's native root certificates.
pub async fn connect(host: &str, port: u16) -> Result<TlsStream<TcpStream>, TransportError> {
    let mut roots = RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        // Individually unloadable certs are skipped; the store only has
        // to end up non-empty.
        let _ = roots.add(cert);
    }
    if roots.is_empty() {
        return Err(TransportError::NoRootCertificates);
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| TransportError::InvalidServerName(host.to_string()))?;

    let tcp = TcpStream::connect((host, port)).await?;
    Ok(connector.connect(server_name, tcp).await?)
}
