//! Elohim IPFS daemon
//!
//! ## Usage
//!
//! ```bash
//! # In-memory backend (no credentials)
//! elohim-ipfs
//!
//! # Blockfrost backend, with the JSON gateway on 8080
//! BLOCKFROST_IPFS_PROJECT_ID=ipfsXXXX elohim-ipfs --port 9093 --http-port 8080
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use elohim_ipfs::api::{create_router, rpc_path};
use elohim_ipfs::grpc::{create_grpc_router, SERVICE_NAME};
use elohim_ipfs::{Args, Backend, IpfsService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("elohim_ipfs={},tower_http=info", args.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    args.validate()?;

    let backend = args.backend();
    if let Backend::Memory { .. } = backend {
        warn!("No BLOCKFROST_IPFS_PROJECT_ID provided, running with in-memory storage");
    }

    info!(
        listen = %args.listen_addr(),
        backend = backend.name(),
        gateway = %args.gateway_url,
        max_message_bytes = args.max_message_bytes,
        "Starting elohim-ipfs"
    );

    let client = backend.into_client()?;
    let service = Arc::new(IpfsService::new(client));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let grpc = create_grpc_router(service.clone(), args.max_message_bytes).await?;
    info!("gRPC services: {}, grpc.health.v1.Health, reflection", SERVICE_NAME);
    let grpc_addr = args.listen_addr();
    let grpc_task = tokio::spawn(
        grpc.serve_with_shutdown(grpc_addr, wait_for(shutdown_rx.clone())),
    );

    let http_task = match args.http_listen_addr() {
        Some(addr) => {
            let app = create_router(service, args.max_message_bytes);
            let listener = tokio::net::TcpListener::bind(addr).await?;

            info!(listen = %addr, "JSON gateway enabled");
            for method in [
                "UploadContent",
                "UploadProto",
                "GetContent",
                "GetProto",
                "PinContent",
                "UnpinContent",
                "GetGatewayURL",
            ] {
                info!("  POST {}", rpc_path(method));
            }
            info!("  GET  /health");

            let shutdown = wait_for(shutdown_rx);
            Some(tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
            }))
        }
        None => None,
    };

    grpc_task.await??;
    if let Some(task) = http_task {
        task.await??;
    }

    info!("elohim-ipfs stopped");
    Ok(())
}

/// Resolves once the shutdown flag flips
async fn wait_for(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutting down...");
}
