//! `supago server` - a minimal HTTP listener.

use anyhow::{Context, Result};
use axum::Router;
use supago_core::ServerConfig;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const GREETING: &str = "Hello from Supago server!";

pub struct SupagoServer {
    config: ServerConfig,
}

impl SupagoServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Every method and path answers with the greeting.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(greeting)
            .layer(RequestBodyLimitLayer::new(self.config.max_request_body_size))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until Ctrl-C or SIGTERM, then drain in-flight requests.
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        tracing::info!(address = %addr, "server is running");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server stopped with error")?;

        tracing::info!("server gracefully stopped");
        Ok(())
    }
}

async fn greeting() -> &'static str {
    GREETING
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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

    tracing::warn!("shutdown signal received");
}
