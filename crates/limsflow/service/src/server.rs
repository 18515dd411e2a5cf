//! Server setup and lifecycle management.

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::router::create_router;
use crate::scheduler::spawn_sla_scan;
use crate::state::AppState;
use limsflow_sla::SlaPolicy;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// The limsflow HTTP server: API, state, and the SLA scan task.
pub struct Server {
    config: ServiceConfig,
    state: AppState,
}

impl Server {
    pub fn new(config: ServiceConfig) -> Self {
        let state = AppState::new(Arc::new(limsflow_rules::builtin()), SlaPolicy::builtin());
        if config.seed_demo {
            state.seed_demo();
        }
        Self { config, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run(self) -> ServiceResult<()> {
        let mut app = create_router(self.state.clone());
        if self.config.enable_cors {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        let scan_task = spawn_sla_scan(self.state.sla.clone(), self.config.sla_scan_interval_secs);

        let listener = TcpListener::bind(self.config.listen_addr).await?;
        tracing::info!(addr = %self.config.listen_addr, "limsflow service listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServiceError::Server(e.to_string()))?;

        tracing::info!("limsflow service shutting down");
        scan_task.abort();
        Ok(())
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
