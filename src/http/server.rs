//! Default request handler factory.
//!
//! # Responsibilities
//! - Build the axum Router (instance endpoint, static content, middleware)
//! - Serve it on the TLS listener handed over by the bootstrap
//! - Stop accepting and drain when the listener's shutdown signal fires
//!
//! # Design Decisions
//! - The service context becomes router state instead of a global
//! - A missing content root is logged, not fatal; `/instance` still answers

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use axum_server::Handle;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::http::request::{request_span, MakeRequestUuid};
use crate::lifecycle::{HandlerError, RequestHandlerFactory, ServerFuture};
use crate::net::BoundListener;
use crate::orchestration::ServiceContext;

/// Serves the content root and the instance endpoint over HTTPS.
#[derive(Debug, Clone)]
pub struct AxumHandlerFactory {
    content_root: PathBuf,
    drain_timeout: Duration,
}

impl AxumHandlerFactory {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            drain_timeout: Duration::from_secs(10),
        }
    }

    /// How long open connections may finish after shutdown starts.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }
}

impl RequestHandlerFactory for AxumHandlerFactory {
    fn create(
        self,
        listener: BoundListener,
        services: ServiceContext,
    ) -> Result<ServerFuture, HandlerError> {
        if !self.content_root.is_dir() {
            tracing::warn!(
                content_root = %self.content_root.display(),
                "Content root does not exist, serving the instance endpoint only"
            );
        }

        let address = listener.local_addr();
        let app = build_router(self.content_root, services);
        let mut shutdown = listener.shutdown_signal();
        let handle = Handle::new();
        let server = listener.into_server().handle(handle.clone());
        let drain_timeout = self.drain_timeout;

        tracing::info!(address = %address, "HTTPS server starting");

        Ok(Box::pin(async move {
            let serve = server.serve(app.into_make_service());
            tokio::pin!(serve);

            tokio::select! {
                result = &mut serve => return result,
                _ = shutdown.recv() => {
                    tracing::info!(
                        address = %address,
                        drain_secs = drain_timeout.as_secs_f64(),
                        "Draining connections"
                    );
                    handle.graceful_shutdown(Some(drain_timeout));
                }
            }

            serve.await
        }))
    }
}

/// Build the router with all middleware layers.
pub fn build_router(content_root: impl Into<PathBuf>, services: ServiceContext) -> Router {
    Router::new()
        .route("/instance", get(instance))
        .fallback_service(ServeDir::new(content_root.into()))
        .with_state(Arc::new(services))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Identity of the instance serving this request.
async fn instance(State(services): State<Arc<ServiceContext>>) -> Json<ServiceContext> {
    Json(services.as_ref().clone())
}
