//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn the activation context and settings into an `EndpointConfig`
//! - Resolve the certificate, bind the port and wrap it in TLS
//! - Hand the TLS listener and the service context to the request handler
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and moves the state to `Failed`
//! - One attempt only, no retries
//! - The certificate is resolved before binding, so a missing certificate
//!   never leaves the port bound
//! - Listeners start last (traffic only when ready)

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::config::HostConfig;
use crate::lifecycle::running::RunningServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::{self, ServerState};
use crate::net::{listener, tls, BoundListener};
use crate::orchestration::{ActivationContext, OrchestrationError, ServiceContext};
use crate::trust::{CertificateError, CertificateResolver, Thumbprint};

/// Future driving the request handler. Resolves when the server has stopped.
pub type ServerFuture = Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'static>>;

/// Error returned by a request handler factory.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Startup and listener errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid endpoint configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Certificate(#[from] CertificateError),
    #[error("cannot bind {addr}: {source}")]
    PortBindFailure {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("cannot build TLS configuration: {0}")]
    TlsConfiguration(#[source] rustls::Error),
    #[error("request handler factory failed: {0}")]
    HandlerFactory(#[source] HandlerError),
    #[error("listener failed: {0}")]
    ListenerIo(#[source] io::Error),
}

/// Where to listen and which certificate to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub bind_address: IpAddr,
    /// Port as assigned by the runtime. Checked against 1-65535 on start.
    pub port: u32,
    /// Thumbprint exactly as configured.
    pub thumbprint: String,
}

impl EndpointConfig {
    pub fn new(bind_address: IpAddr, port: u32, thumbprint: impl Into<String>) -> Self {
        Self {
            bind_address,
            port,
            thumbprint: thumbprint.into(),
        }
    }

    /// Combine the runtime-assigned port with the settings file.
    pub fn from_activation(
        activation: &dyn ActivationContext,
        config: &HostConfig,
        bind_override: Option<IpAddr>,
    ) -> Result<Self, OrchestrationError> {
        let endpoint = activation.endpoint(&config.endpoint.name)?;
        Ok(Self {
            bind_address: bind_override.unwrap_or(config.endpoint.bind_address),
            port: endpoint.port,
            thumbprint: config.https.certificate_thumbprint.clone(),
        })
    }
}

/// Builds the request handler once the TLS listener is ready.
///
/// The factory takes ownership of the listener. It must stop accepting and
/// drain when the listener's shutdown signal fires.
pub trait RequestHandlerFactory: Send {
    fn create(
        self,
        listener: BoundListener,
        services: ServiceContext,
    ) -> Result<ServerFuture, HandlerError>;
}

impl<F> RequestHandlerFactory for F
where
    F: FnOnce(BoundListener, ServiceContext) -> Result<ServerFuture, HandlerError> + Send,
{
    fn create(
        self,
        listener: BoundListener,
        services: ServiceContext,
    ) -> Result<ServerFuture, HandlerError> {
        self(listener, services)
    }
}

/// Brings up the HTTPS listener.
pub struct ListenerBootstrap {
    resolver: CertificateResolver,
    services: ServiceContext,
    shutdown_grace: Duration,
    handshake_timeout: Duration,
    state: Arc<watch::Sender<ServerState>>,
}

impl ListenerBootstrap {
    pub fn new(resolver: CertificateResolver, services: ServiceContext) -> Self {
        let (state, _) = watch::channel(ServerState::Created);
        Self {
            resolver,
            services,
            shutdown_grace: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(10),
            state: Arc::new(state),
        }
    }

    /// How long `stop()` waits for the handler to drain before aborting it.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Upper bound on a single TLS negotiation.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Watch state transitions, including the ones after `start`.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Start serving. On error nothing remains bound and the state is `Failed`.
    pub async fn start<F>(
        self,
        config: EndpointConfig,
        factory: F,
    ) -> Result<RunningServer, BootstrapError>
    where
        F: RequestHandlerFactory,
    {
        state::transition(&self.state, ServerState::Starting);

        match self.launch(config, factory).await {
            Ok(server) => {
                tracing::info!(address = %server.local_addr(), "HTTPS listener running");
                Ok(server)
            }
            Err(e) => {
                state::transition(&self.state, ServerState::Failed);
                tracing::error!(error = %e, "Listener startup failed");
                Err(e)
            }
        }
    }

    async fn launch<F>(
        &self,
        config: EndpointConfig,
        factory: F,
    ) -> Result<RunningServer, BootstrapError>
    where
        F: RequestHandlerFactory,
    {
        let port = u16::try_from(config.port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| {
                BootstrapError::InvalidConfig(format!(
                    "port {} is outside 1-65535",
                    config.port
                ))
            })?;
        let thumbprint: Thumbprint = config
            .thumbprint
            .parse()
            .map_err(|e| BootstrapError::InvalidConfig(format!("certificate thumbprint: {}", e)))?;
        if !thumbprint.is_sha1() {
            tracing::warn!(
                thumbprint = %thumbprint,
                "Certificate thumbprint is not a 40 digit SHA-1 value and will match no certificate"
            );
        }

        let certificate = self.resolver.resolve(&thumbprint)?;

        let addr = SocketAddr::new(config.bind_address, port);
        let socket = listener::bind(addr)
            .await
            .map_err(|source| BootstrapError::PortBindFailure { addr, source })?;

        let tls_config =
            tls::server_config(certificate).map_err(BootstrapError::TlsConfiguration)?;

        let shutdown = Shutdown::new();
        let handshake_failures = Arc::new(AtomicU64::new(0));
        let bound = BoundListener::new(
            socket,
            tls_config,
            self.handshake_timeout,
            Arc::clone(&handshake_failures),
            shutdown.subscribe(),
        )
        .map_err(|source| BootstrapError::PortBindFailure { addr, source })?;
        let local_addr = bound.local_addr();

        tracing::debug!(
            address = %local_addr,
            instance_id = %self.services.instance_id,
            "Handing listener to request handler"
        );

        let server = factory
            .create(bound, self.services.clone())
            .map_err(BootstrapError::HandlerFactory)?;

        Ok(RunningServer::spawn(
            server,
            local_addr,
            Arc::clone(&self.state),
            shutdown,
            self.shutdown_grace,
            handshake_failures,
        ))
    }
}

impl std::fmt::Debug for ListenerBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerBootstrap")
            .field("resolver", &self.resolver)
            .field("state", &self.state())
            .finish()
    }
}
