// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use xrpl_issuer_server::{
    api::router,
    config::{Config, LogFormat, SigningBackend},
    ledger::{faucet::HttpFaucet, session::JsonRpcConnector, Ledger},
    signing::{InMemoryProvider, PayloadSweeper, SigningProvider, UnconfiguredProvider, XummClient},
    state::AppState,
    storage::IssuerDatabase,
};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let db = Arc::new(IssuerDatabase::open(&config.database_path())?);
    info!(path = %config.database_path().display(), "Database opened");

    let ledger = Ledger::new(
        config.network,
        Arc::new(JsonRpcConnector::new(config.endpoints.clone())),
        Arc::new(HttpFaucet::new(&config.faucet_devnet, &config.faucet_testnet)?),
    );

    let shutdown = CancellationToken::new();
    let mut background = Vec::new();

    let signing: Arc<dyn SigningProvider> = match &config.signing {
        SigningBackend::Xumm(xumm) => Arc::new(XummClient::new(xumm)?),
        SigningBackend::Disabled => {
            warn!("No wallet signing provider configured; signing endpoints will answer 503");
            Arc::new(UnconfiguredProvider)
        }
        SigningBackend::Memory => {
            warn!("Using the in-memory signing provider; payloads cannot be signed by a wallet app");
            let provider = Arc::new(InMemoryProvider::new());
            let sweeper = PayloadSweeper::new(provider.clone());
            background.push(tokio::spawn(sweeper.run(shutdown.clone())));
            provider
        }
    };

    let network = config.network;
    let addr = config.bind_address();
    let state = AppState::new(config, ledger, db, signing).with_shutdown(shutdown.clone());
    let app = router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(
        %addr,
        %network,
        seed_operations = !network.is_production(),
        "XRPL issuer server listening (docs at /docs)"
    );

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    for task in background {
        if let Err(e) = task.await {
            warn!(error = %e, "Background task ended abnormally");
        }
    }
    info!("Server stopped");
    Ok(())
}
