//! TLS material loading for both directions of the cache.
//!
//! Outbound: the provider client presents the operator identity over mTLS
//! and may pin the provider certificate's subject common name. Inbound: the
//! cache listener requires client certificates chained to the configured CA.
//! Any failure here is a configuration error and the process fails fast at
//! startup.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::server::WebPkiClientVerifier;
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, ServerConfig,
    SignatureScheme,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("invalid PEM material in {path}: {source}")]
    Pem {
        path: String,
        source: rustls::pki_types::pem::Error,
    },

    #[error("failed to build mTLS http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to build certificate verifier: {0}")]
    Verifier(#[from] rustls::server::VerifierBuilderError),

    #[error("invalid certificate chain: {0}")]
    Chain(#[from] rustls::Error),
}

fn pem_error(path: &Path) -> impl Fn(rustls::pki_types::pem::Error) -> TlsError {
    let path = path.display().to_string();
    move |source| TlsError::Pem { path: path.clone(), source }
}

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    CertificateDer::pem_file_iter(path)
        .map_err(pem_error(path))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(pem_error(path))
}

fn load_root_store(path: &Path) -> Result<RootCertStore, TlsError> {
    let mut roots = RootCertStore::empty();
    for cert in load_cert_chain(path)? {
        roots.add(cert)?;
    }
    Ok(roots)
}

/// Build the outbound HTTP client presenting the operator identity to the
/// provider, trusting only the provider CA. When `expected_cn` is set, the
/// provider's certificate must additionally carry that subject common name.
pub fn build_mtls_http_client(
    ca_path: &Path,
    cert_path: &Path,
    key_path: &Path,
    expected_cn: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, TlsError> {
    let certs = load_cert_chain(cert_path)?;
    let key = PrivateKeyDer::from_pem_file(key_path).map_err(pem_error(key_path))?;
    let roots = Arc::new(load_root_store(ca_path)?);

    let builder = ClientConfig::builder();
    let tls = match expected_cn {
        Some(expected) => {
            let verifier = ProviderCnVerifier::new(roots, expected)?;
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(verifier))
                .with_client_auth_cert(certs, key)?
        },
        None => builder.with_root_certificates(roots).with_client_auth_cert(certs, key)?,
    };

    let client =
        reqwest::Client::builder().use_preconfigured_tls(tls).timeout(timeout).build()?;
    Ok(client)
}

/// Build the listener TLS config: serve `cert`/`key`, require peer
/// certificates chained to `ca`.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
    ca_path: &Path,
) -> Result<ServerConfig, TlsError> {
    let certs = load_cert_chain(cert_path)?;
    let key = PrivateKeyDer::from_pem_file(key_path).map_err(pem_error(key_path))?;
    let roots = load_root_store(ca_path)?;

    let verifier = WebPkiClientVerifier::builder(Arc::new(roots)).build()?;
    let config = ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)?;
    Ok(config)
}

/// Extract the subject common name of a peer leaf certificate.
pub fn peer_common_name(cert: &CertificateDer<'_>) -> Option<String> {
    let (_, parsed) = x509_parser::parse_x509_certificate(cert.as_ref()).ok()?;
    let name = parsed
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);
    name
}

/// Chain-validates the provider certificate through webpki and additionally
/// requires its subject common name to match the configured value.
#[derive(Debug)]
struct ProviderCnVerifier {
    inner: Arc<WebPkiServerVerifier>,
    expected_cn: String,
}

impl ProviderCnVerifier {
    fn new(roots: Arc<RootCertStore>, expected_cn: &str) -> Result<Self, TlsError> {
        let inner = WebPkiServerVerifier::builder(roots).build()?;
        Ok(Self { inner, expected_cn: expected_cn.to_string() })
    }
}

impl ServerCertVerifier for ProviderCnVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verified = self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        )?;
        match peer_common_name(end_entity) {
            Some(cn) if cn == self.expected_cn => Ok(verified),
            _ => Err(rustls::Error::InvalidCertificate(CertificateError::NotValidForName)),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
