//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use blazorfront_host::lifecycle::ListenerBootstrap;
use blazorfront_host::orchestration::ServiceContext;
use blazorfront_host::trust::{CertificateResolver, MemoryStore, Thumbprint, TrustStore};
use rcgen::{generate_simple_self_signed, CertifiedKey};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

/// A freshly generated self-signed certificate for `localhost`.
pub struct TestCert {
    pub der: CertificateDer<'static>,
    pub key: PrivateKeyDer<'static>,
    pub cert_pem: String,
    pub key_pem: String,
    pub thumbprint: Thumbprint,
}

impl TestCert {
    pub fn generate() -> Self {
        let CertifiedKey { cert, key_pair } =
            generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let der = cert.der().clone();
        Self {
            thumbprint: Thumbprint::of_der(&der),
            key: PrivatePkcs8KeyDer::from(key_pair.serialize_der()).into(),
            cert_pem: cert.pem(),
            key_pem: key_pair.serialize_pem(),
            der,
        }
    }

    pub fn chain(&self) -> Vec<CertificateDer<'static>> {
        vec![self.der.clone()]
    }
}

/// Memory store holding the given certificates, in order.
pub fn memory_store(certs: &[&TestCert]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (i, cert) in certs.iter().enumerate() {
        store.insert(format!("cert-{}", i), cert.chain(), cert.key.clone_key());
    }
    store
}

pub fn localhost() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

/// A port that was free a moment ago.
pub fn free_port() -> u32 {
    let listener = std::net::TcpListener::bind((localhost(), 0)).unwrap();
    u32::from(listener.local_addr().unwrap().port())
}

/// Whether something can bind the port right now.
pub fn port_is_free(port: u32) -> bool {
    let port = u16::try_from(port).unwrap();
    std::net::TcpListener::bind((localhost(), port)).is_ok()
}

pub fn services() -> ServiceContext {
    ServiceContext::new("fabric:/Storefront", "BlazorFront", "_Node_0", "EndpointHttps")
}

pub fn bootstrap(store: Arc<dyn TrustStore>) -> ListenerBootstrap {
    ListenerBootstrap::new(CertificateResolver::new(store), services())
        .with_shutdown_grace(Duration::from_secs(2))
        .with_handshake_timeout(Duration::from_secs(5))
}

/// Complete a TLS handshake trusting only `trusted`, returning the peer's leaf.
pub async fn tls_connect(
    addr: SocketAddr,
    trusted: &TestCert,
) -> std::io::Result<CertificateDer<'static>> {
    let mut roots = rustls::RootCertStore::empty();
    roots.add(trusted.der.clone()).unwrap();

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let stream = TcpStream::connect(addr).await?;
    let tls = TlsConnector::from(Arc::new(config))
        .connect(ServerName::try_from("localhost").unwrap(), stream)
        .await?;

    let (_, connection) = tls.get_ref();
    Ok(connection
        .peer_certificates()
        .and_then(|chain| chain.first())
        .cloned()
        .unwrap())
}

/// HTTPS client that trusts `trusted` and sends `localhost` to `addr`.
pub fn https_client(addr: SocketAddr, trusted: &TestCert) -> reqwest::Client {
    reqwest::Client::builder()
        .add_root_certificate(reqwest::Certificate::from_der(&trusted.der).unwrap())
        .resolve("localhost", addr)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("https://localhost:{}{}", addr.port(), path)
}
