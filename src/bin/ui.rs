//! HTTPS UI for DragonScales: lists free experts, selects one and chats through it.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use dragonscales::{
    bootstrap::{build_dragon, checkpoint_storage, load_settings_from_env},
    config::SettingsOverrides,
    routes,
    state::{AppState, SharedState},
    telemetry::init_tracing,
    tls,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("a TLS crypto provider is already installed"))?;

    let settings = load_settings_from_env(SettingsOverrides::default())
        .await
        .context("resolving settings")?;

    let Some(api_key) = settings.ui_api_key.clone() else {
        bail!("UI_API_KEY (or API_KEY) must be set to protect the UI");
    };
    let (Some(cert), Some(key)) = (settings.ui_tls_cert.clone(), settings.ui_tls_key.clone())
    else {
        bail!("UI_TLS_CERT and UI_TLS_KEY must point to a certificate and private key");
    };
    if tls::is_self_signed(&cert) {
        warn!(cert = %cert.display(), "UI certificate is self-signed; browsers will not trust it");
    }

    let dragon = build_dragon(&settings)
        .await
        .context("building the Dragon")?;
    let checkpoints = checkpoint_storage(&settings)
        .await
        .context("preparing router checkpoints")?;
    let state = AppState::new(api_key, Arc::new(dragon), Some(checkpoints));
    let app = build_router(state);

    let tls_config = RustlsConfig::from_pem_file(&cert, &key)
        .await
        .context("loading TLS certificate and key")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.ui_port));
    info!(%addr, "starting UI server");

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("serving UI")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state).layer(TraceLayer::new_for_http())
}

async fn shutdown_on_signal(handle: Handle) {
    shutdown_signal().await;
    info!("shutting down UI server");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
