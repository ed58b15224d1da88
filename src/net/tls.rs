//! TLS configuration and handshake observation.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum_server::accept::Accept;
use futures_util::future::BoxFuture;

use crate::observability::metrics;
use crate::trust::Certificate;

/// Build a rustls server configuration serving the given certificate.
///
/// Offers HTTP/2 and HTTP/1.1 through ALPN.
pub fn server_config(certificate: Certificate) -> Result<Arc<rustls::ServerConfig>, rustls::Error> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let (chain, key) = certificate.into_parts();

    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(chain, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

/// Acceptor wrapper that records failed TLS negotiations.
///
/// A failed handshake only ends its own connection: the error is logged,
/// counted and handed back to the server, which drops that connection and
/// keeps accepting.
#[derive(Debug, Clone)]
pub struct HandshakeObserver<A> {
    inner: A,
    failures: Arc<AtomicU64>,
}

impl<A> HandshakeObserver<A> {
    pub fn new(inner: A, failures: Arc<AtomicU64>) -> Self {
        Self { inner, failures }
    }

    /// Failed negotiations seen so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl<A, I, S> Accept<I, S> for HandshakeObserver<A>
where
    A: Accept<I, S>,
    A::Future: Send + 'static,
    A::Stream: Send + 'static,
    A::Service: Send + 'static,
{
    type Stream = A::Stream;
    type Service = A::Service;
    type Future = BoxFuture<'static, io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        let failures = Arc::clone(&self.failures);
        let handshake = self.inner.accept(stream, service);

        Box::pin(async move {
            handshake.await.inspect_err(|e| {
                failures.fetch_add(1, Ordering::Relaxed);
                metrics::record_handshake_failure();
                tracing::warn!(error = %e, "TLS negotiation failed");
            })
        })
    }
}
