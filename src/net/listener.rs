//! TCP binding and the TLS listener handed to request handling.
//!
//! # Responsibilities
//! - Bind to the assigned address
//! - Carry the bound socket, TLS settings and shutdown signal to the handler
//! - Only expose the socket through a TLS-terminating server

use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use axum_server::accept::DefaultAcceptor;
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use axum_server::Server;
use tokio::net::TcpListener;

use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::tls::HandshakeObserver;

/// Bind a TCP listener on the given address.
///
/// The returned socket is already in non-blocking mode.
pub async fn bind(addr: SocketAddr) -> Result<std::net::TcpListener, std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listener bound");

    listener.into_std()
}

/// A bound, TLS-terminating listener.
///
/// Owned by the bootstrap until passed to the request handler factory, which
/// then owns the socket, including closing it on shutdown.
pub struct BoundListener {
    listener: std::net::TcpListener,
    local_addr: SocketAddr,
    tls: Arc<rustls::ServerConfig>,
    handshake_timeout: Duration,
    handshake_failures: Arc<AtomicU64>,
    shutdown: ShutdownSignal,
}

impl std::fmt::Debug for BoundListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundListener")
            .field("local_addr", &self.local_addr)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

impl BoundListener {
    pub(crate) fn new(
        listener: std::net::TcpListener,
        tls: Arc<rustls::ServerConfig>,
        handshake_timeout: Duration,
        handshake_failures: Arc<AtomicU64>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, std::io::Error> {
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            tls,
            handshake_timeout,
            handshake_failures,
            shutdown,
        })
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// TLS settings carrying the resolved certificate.
    pub fn tls_config(&self) -> &Arc<rustls::ServerConfig> {
        &self.tls
    }

    /// Resolves once the host asks the server to stop.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Turn the listener into an axum-server that negotiates TLS on every
    /// accepted connection.
    pub fn into_server(self) -> Server<HandshakeObserver<RustlsAcceptor<DefaultAcceptor>>> {
        let acceptor = RustlsAcceptor::new(RustlsConfig::from_config(self.tls))
            .handshake_timeout(self.handshake_timeout);

        axum_server::from_tcp(self.listener)
            .acceptor(HandshakeObserver::new(acceptor, self.handshake_failures))
    }
}
