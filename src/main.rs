//! CPE reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                      CPE PROXY                        │
//!                  │                                                      │
//!  Client Request  │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!  ────────────────┼─▶│  http   │───▶│ routing  │───▶│  directory   │◀────┼──── MongoDB
//!                  │  │ server  │    │identifier│    │    client    │     │
//!                  │  └─────────┘    │+ resolver│    └──────────────┘     │
//!                  │                 └────┬─────┘                         │
//!                  │                      ▼                               │
//!  Client Response │  ┌─────────┐    ┌──────────┐                         │
//!  ◀───────────────┼──│ handler │◀───│ pipeline │◀────────────────────────┼──── CPE (HTTPS)
//!                  │  └─────────┘    │  cache   │                         │
//!                  │                 └──────────┘                         │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use cpe_proxy::config::load_from_env;
use cpe_proxy::lifecycle::{signals, startup, Shutdown};
use cpe_proxy::observability::{logging, metrics};
use cpe_proxy::{net, proxy};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env()?;
    logging::init_logging(&config.observability)?;
    proxy::tls::install_crypto_provider();

    tracing::info!("cpe-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let bind_addr = config
        .listener
        .bind_target()
        .ok_or("listener.bind_address must be host:port")?;
    tracing::info!(
        bind_address = %bind_addr,
        directory = %config.directory.uri,
        directory_kind = ?config.directory.kind,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let tls = config.listener.tls.clone();
    let server = startup::build_server(config).await?;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        trigger.trigger();
    });

    match tls {
        Some(tls) => {
            let tls = net::tls::load_tls_config(&tls).await?;
            let listener = std::net::TcpListener::bind(bind_addr.as_str())?;
            listener.set_nonblocking(true)?;
            server.run_tls(listener, tls, server_shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(bind_addr.as_str()).await?;
            server.run(listener, server_shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
