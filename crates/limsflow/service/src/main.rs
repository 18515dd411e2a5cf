//! limsflowd - the limsflow workflow service.
//!
//! Serves the workflow API and runs the periodic SLA scan.

use clap::Parser;
use limsflow_service::{error::ServiceError, error::ServiceResult, Server, ServiceConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// limsflow daemon CLI.
#[derive(Parser)]
#[command(name = "limsflowd")]
#[command(about = "Workflow transition service for laboratory entities", long_about = None)]
#[command(version)]
struct Cli {
    /// Listen address
    #[arg(
        short,
        long,
        env = "LIMSFLOW_LISTEN_ADDR",
        default_value = "127.0.0.1:8080"
    )]
    listen: String,

    /// Seconds between SLA scan passes
    #[arg(long, env = "LIMSFLOW_SLA_SCAN_INTERVAL", default_value_t = 300)]
    sla_scan_interval: u64,

    /// Disable permissive CORS
    #[arg(long, env = "LIMSFLOW_NO_CORS")]
    no_cors: bool,

    /// Seed demo memberships and entities at startup
    #[arg(long, env = "LIMSFLOW_SEED_DEMO")]
    seed_demo: bool,

    /// Log level
    #[arg(long, env = "LIMSFLOW_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "LIMSFLOW_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> ServiceResult<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = ServiceConfig {
        listen_addr: cli
            .listen
            .parse()
            .map_err(|e| ServiceError::Config(format!("Invalid listen address: {e}")))?,
        sla_scan_interval_secs: cli.sla_scan_interval,
        enable_cors: !cli.no_cors,
        seed_demo: cli.seed_demo,
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        "starting limsflow service"
    );

    Server::new(config).run().await
}
