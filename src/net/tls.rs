//! Inbound TLS termination.

use axum_server::tls_rustls::RustlsConfig;
use std::io;
use std::path::Path;

use crate::config::TlsConfig;

/// Load the listener certificate chain and key (PEM).
///
/// Requires a process-wide rustls provider; see
/// [`install_crypto_provider`](crate::proxy::tls::install_crypto_provider).
pub async fn load_tls_config(config: &TlsConfig) -> io::Result<RustlsConfig> {
    let cert_path = Path::new(&config.cert_path);
    let key_path = Path::new(&config.key_path);

    for (kind, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} file not found: {}", kind, path.display()),
            ));
        }
    }

    let tls = RustlsConfig::from_pem_file(cert_path, key_path).await?;
    tracing::info!(cert = %cert_path.display(), "Listener TLS enabled");
    Ok(tls)
}
