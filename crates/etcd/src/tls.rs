use crate::{Error, Result};

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Certificate, Client, Identity};

/// Paths of the credential material used to talk to etcd.
#[derive(Clone, Debug)]
pub struct TlsConfig {
    /// CA certificate that signed the server certificate.
    pub ca_cert: PathBuf,

    /// Client certificate presented to the server.
    pub client_cert: PathBuf,

    /// Private key of the client certificate.
    pub client_key: PathBuf,
}

impl TlsConfig {
    /// Reads the credentials and builds a client that only trusts `ca_cert`
    /// and authenticates with the client certificate.
    ///
    /// # Errors
    ///
    /// This function will return an error if any of the files cannot be read
    /// or does not contain valid PEM data.
    pub fn build_client(&self, timeout: Option<Duration>) -> Result<Client> {
        let ca_pem = read(&self.ca_cert, "failed to read ca certificate")?;
        let mut identity_pem = read(&self.client_cert, "failed to read client certificate")?;
        let key_pem = read(&self.client_key, "failed to read client key")?;

        // rustls expects the certificate chain and key in a single PEM buffer.
        identity_pem.push(b'\n');
        identity_pem.extend_from_slice(&key_pem);

        let ca = Certificate::from_pem(&ca_pem).map_err(Error::Tls)?;
        let identity = Identity::from_pem(&identity_pem).map_err(Error::Tls)?;

        let mut builder = Client::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .add_root_certificate(ca)
            .identity(identity);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        builder.build().map_err(Error::Tls)
    }
}

fn read(path: &Path, context: &'static str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::Io(context, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_ca_is_io_error() {
        let cert = file_with("cert");
        let key = file_with("key");

        let config = TlsConfig {
            ca_cert: PathBuf::from("/nonexistent/leadervip/ca.crt"),
            client_cert: cert.path().to_path_buf(),
            client_key: key.path().to_path_buf(),
        };

        let err = config.build_client(None).unwrap_err();

        assert!(matches!(err, Error::Io("failed to read ca certificate", _)));
    }

    #[test]
    fn test_missing_key_is_io_error() {
        let ca = file_with("ca");
        let cert = file_with("cert");

        let config = TlsConfig {
            ca_cert: ca.path().to_path_buf(),
            client_cert: cert.path().to_path_buf(),
            client_key: PathBuf::from("/nonexistent/leadervip/client.key"),
        };

        let err = config.build_client(None).unwrap_err();

        assert!(matches!(err, Error::Io("failed to read client key", _)));
    }

    #[test]
    fn test_garbage_identity_is_tls_error() {
        let ca = file_with("not a certificate");
        let cert = file_with("not a certificate");
        let key = file_with("not a key");

        let config = TlsConfig {
            ca_cert: ca.path().to_path_buf(),
            client_cert: cert.path().to_path_buf(),
            client_key: key.path().to_path_buf(),
        };

        let err = config.build_client(None).unwrap_err();

        assert!(matches!(err, Error::Tls(_)));
    }

    #[test]
    fn test_sec1_client_identity_builds_client() {
        let config = TlsConfig {
            ca_cert: fixture("server-ca.crt"),
            client_cert: fixture("client.crt"),
            client_key: fixture("client.key"),
        };

        assert!(config.build_client(None).is_ok());
        assert!(config.build_client(Some(Duration::from_secs(5))).is_ok());
    }

    #[test]
    fn test_key_without_certificate_is_tls_error() {
        let cert = file_with("");

        let config = TlsConfig {
            ca_cert: fixture("server-ca.crt"),
            client_cert: cert.path().to_path_buf(),
            client_key: fixture("client.key"),
        };

        let err = config.build_client(None).unwrap_err();

        assert!(matches!(err, Error::Tls(_)));
    }
}
