//! # Protogate Demo Server
//!
//! Serves the example `userservice.UserService` through a [`protogate_core::Gateway`]:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    log subscriber.
//! 2. **Registration**: Binds every method of the service to its handler.
//! 3. **Serving**: Mounts the gateway on `POST {prefix}/{*path}` and serves until Ctrl-C.
//!
//! ```bash
//! curl -X POST localhost:8080/rpc/userservice.UserService/Login \
//!     -d '{"name":"Dan","password":"u12345678"}'
//! ```

mod cli;
mod handlers;
mod logging;

use anyhow::Context;
use axum::Router;
use clap::Parser;
use cli::Cli;
use handlers::UserStore;
use protogate_core::{Gateway, UriPath};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logging::init_logging(args.json_logs);

    let handlers = handlers::register(Arc::new(UserStore::demo()))?;

    let gateway = Gateway::builder(UriPath::with_prefix(args.prefix.as_str()), handlers)
        .propagate_headers(args.propagate_headers)
        .status_policy(args.status_policy)
        .build();

    let route = format!("{}/{{*path}}", args.prefix);
    let app = Router::new().route(&route, gateway.into_route());

    let listener = TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.addr))?;

    info!(addr = %args.addr, route = %route, "protogate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("protogate stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(err) => {
            error!("Failed to listen for Ctrl+C: {err}");
            // Keep serving without a shutdown trigger.
            std::future::pending::<()>().await
        }
    }
}
