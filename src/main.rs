//! blazorfront-host
//!
//! Brings up the HTTPS endpoint of a web front-end running under the cluster
//! orchestrator: reads the settings file, takes the port the runtime
//! assigned, resolves the certificate by thumbprint and serves until the
//! orchestrator stops the process.
//!
//! Exit status is non-zero on any startup failure, so the orchestrator
//! marks the instance unhealthy.

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use blazorfront_host::config::{load_config, HostConfig};
use blazorfront_host::http::AxumHandlerFactory;
use blazorfront_host::lifecycle::{signals, EndpointConfig, ListenerBootstrap};
use blazorfront_host::observability;
use blazorfront_host::orchestration::{
    ActivationContext, EnvActivationContext, StaticActivationContext,
};
use blazorfront_host::trust::{CertificateResolver, DirectoryStore};

#[derive(Debug, Parser)]
#[command(name = "blazorfront-host", version, about = "HTTPS host for the web front-end")]
struct Cli {
    /// Settings file.
    #[arg(long, default_value = "config/Settings.toml")]
    config: PathBuf,

    /// Listen on this port instead of the one assigned by the runtime.
    #[arg(long)]
    port: Option<u32>,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<IpAddr>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("blazorfront-host: {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = observability::init_logging(&config.observability) {
        eprintln!("blazorfront-host: cannot initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "blazorfront-host starting"
    );

    match run(cli, config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "blazorfront-host exiting with failure");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: HostConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        observability::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let activation: Box<dyn ActivationContext> = match cli.port {
        Some(port) => Box::new(
            StaticActivationContext::default().with_endpoint(config.endpoint.name.clone(), port),
        ),
        None => Box::new(EnvActivationContext::from_env()),
    };

    let endpoint = EndpointConfig::from_activation(activation.as_ref(), &config, cli.bind)?;
    let services = activation.service_context(&config.endpoint.name);

    tracing::info!(
        endpoint = %config.endpoint.name,
        bind_address = %endpoint.bind_address,
        port = endpoint.port,
        thumbprint = %endpoint.thumbprint,
        trust_store = %config.trust_store.path.display(),
        application = %services.application_name,
        node = %services.node_name,
        "Configuration loaded"
    );

    let store = DirectoryStore::new(config.trust_store.path.clone());
    let resolver = CertificateResolver::new(Arc::new(store));
    let grace = Duration::from_secs(config.server.shutdown_grace_secs);

    let bootstrap = ListenerBootstrap::new(resolver, services)
        .with_shutdown_grace(grace)
        .with_handshake_timeout(Duration::from_secs(config.server.handshake_timeout_secs));
    // Leave the bootstrap's grace period room to see the drain finish.
    let factory = AxumHandlerFactory::new(config.server.content_root.clone())
        .with_drain_timeout(grace.mul_f64(0.8));

    let server = bootstrap.start(endpoint, factory).await?;

    tokio::select! {
        _ = signals::shutdown_signal() => {
            server.stop().await;
        }
        _ = server.wait() => {}
    }

    server.wait().await?;
    Ok(())
}
