//! Secure stream transport (RadSec, RFC 6614)
//!
//! The same framed session as the plain stream transport, opened through a
//! TLS handshake. `connection_timeout` bounds the TCP connect and the
//! handshake together. Peer trust comes exclusively from the injected
//! [`TrustConfig`]; there is no default policy. The standard RadSec port is
//! 2083, but nothing here hard-codes it.

use super::stream::StreamConnector;
use crate::error::TransportError;
use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// Peer trust for the TLS session
pub enum TrustConfig {
    /// Validate the server chain against these roots
    Roots(rustls::RootCertStore),
    /// A fully prepared client configuration, passed verbatim into the TLS
    /// engine; `enabled_protocols` and `enabled_cipher_suites` are ignored
    ClientConfig(Arc<rustls::ClientConfig>),
    /// Accept any server certificate. Test helper only; never use this
    /// against a production peer.
    InsecureTrustAny,
}

/// TLS session options
pub struct TlsOptions {
    /// Name presented for SNI and certificate validation
    pub server_name: ServerName<'static>,
    pub trust: TrustConfig,
    /// When non-empty, restricts the negotiated protocol versions
    pub enabled_protocols: Option<Vec<&'static rustls::SupportedProtocolVersion>>,
    /// When non-empty, restricts the negotiated cipher suites
    pub enabled_cipher_suites: Option<Vec<rustls::SupportedCipherSuite>>,
}

impl TlsOptions {
    pub fn new(server_name: &str, trust: TrustConfig) -> Result<Self, TransportError> {
        let server_name = ServerName::try_from(server_name.to_string())
            .map_err(|e| TransportError::Tls(format!("invalid server name: {}", e)))?;
        Ok(TlsOptions {
            server_name,
            trust,
            enabled_protocols: None,
            enabled_cipher_suites: None,
        })
    }

    pub fn protocols(
        mut self,
        protocols: Vec<&'static rustls::SupportedProtocolVersion>,
    ) -> Self {
        self.enabled_protocols = Some(protocols);
        self
    }

    pub fn cipher_suites(mut self, suites: Vec<rustls::SupportedCipherSuite>) -> Self {
        self.enabled_cipher_suites = Some(suites);
        self
    }

    fn provider(&self) -> CryptoProvider {
        let mut provider = rustls::crypto::aws_lc_rs::default_provider();
        if let Some(suites) = &self.enabled_cipher_suites {
            provider.cipher_suites = suites.clone();
        }
        provider
    }

    fn config_builder(
        &self,
    ) -> Result<rustls::ConfigBuilder<rustls::ClientConfig, rustls::WantsVerifier>, TransportError>
    {
        let versions = self
            .enabled_protocols
            .as_deref()
            .unwrap_or(rustls::ALL_VERSIONS);
        rustls::ClientConfig::builder_with_provider(Arc::new(self.provider()))
            .with_protocol_versions(versions)
            .map_err(|e| TransportError::Tls(e.to_string()))
    }

    /// Resolve into a rustls client configuration
    pub fn client_config(&self) -> Result<Arc<rustls::ClientConfig>, TransportError> {
        match &self.trust {
            TrustConfig::ClientConfig(config) => Ok(Arc::clone(config)),
            TrustConfig::Roots(roots) => {
                let config = self
                    .config_builder()?
                    .with_root_certificates(roots.clone())
                    .with_no_client_auth();
                Ok(Arc::new(config))
            }
            TrustConfig::InsecureTrustAny => {
                let verifier = InsecureVerifier {
                    provider: Arc::new(self.provider()),
                };
                let config = self
                    .config_builder()?
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(verifier))
                    .with_no_client_auth();
                Ok(Arc::new(config))
            }
        }
    }
}

/// Opens TCP + TLS within one timeout budget
pub struct TlsStreamConnector {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl TlsStreamConnector {
    pub fn new(options: TlsOptions) -> Result<Self, TransportError> {
        let config = options.client_config()?;
        Ok(TlsStreamConnector {
            connector: TlsConnector::from(config),
            server_name: options.server_name,
        })
    }
}

#[async_trait]
impl StreamConnector for TlsStreamConnector {
    type Stream = TlsStream<TcpStream>;

    async fn open(
        &self,
        peer: SocketAddr,
        limit: Duration,
    ) -> Result<Self::Stream, TransportError> {
        let server_name = self.server_name.clone();
        let connector = self.connector.clone();

        timeout(limit, async move {
            let tcp = TcpStream::connect(peer).await?;
            tcp.set_nodelay(true)?;
            debug!(peer = %peer, "TCP connected, starting TLS handshake");
            connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| TransportError::Tls(e.to_string()))
        })
        .await
        .map_err(|_| TransportError::ConnectTimeout(limit))?
    }
}

/// Certificate verifier that accepts anything. Kept out of every default
/// path; reachable only through [`TrustConfig::InsecureTrustAny`].
#[derive(Debug)]
struct InsecureVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
