use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use natours_infra::AppConfig;
use natours_observability::LogFormat;

#[tokio::main]
async fn main() {
    // The log format is needed before the rest of the configuration loads.
    let production = std::env::var("APP_ENV").is_ok_and(|env| env.trim() == "production");
    natours_observability::init(if production { LogFormat::Json } else { LogFormat::Compact });

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "UNCAUGHT EXCEPTION! Shutting down...");
        std::process::exit(1);
    }));

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "UNHANDLED REJECTION! Shutting down...");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    tracing::info!(environment = ?config.environment, "configuration loaded");

    let port = config.port;
    let services = natours_api::app::services::build_services(config).await?;
    let app = natours_api::app::build_app(Arc::new(services));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    tracing::info!("App running on port {port}...");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    tracing::info!("Process terminated!");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            tracing::warn!(error = %err, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received. Shutting down gracefully");
        }
        _ = sigterm.recv() => {
            tracing::info!("SIGTERM RECEIVED. Shutting down gracefully");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Ctrl+C received. Shutting down gracefully");
}
