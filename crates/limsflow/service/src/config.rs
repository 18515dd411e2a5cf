//! Service configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

fn default_listen_addr() -> SocketAddr {
    // Loopback by default; a deployment fronts this with its gateway.
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_scan_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Listen address for the HTTP API.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Seconds between periodic SLA scan passes.
    #[serde(default = "default_scan_interval")]
    pub sla_scan_interval_secs: u64,

    /// Enable permissive CORS (on by default for UI development).
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Seed demo memberships and entities at startup.
    #[serde(default)]
    pub seed_demo: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            sla_scan_interval_secs: default_scan_interval(),
            enable_cors: true,
            seed_demo: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.sla_scan_interval_secs, 300);
        assert!(config.enable_cors);
        assert!(!config.seed_demo);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: ServiceConfig = serde_json::from_str(
            r#"{"listen_addr": "0.0.0.0:9900", "sla_scan_interval_secs": 30}"#,
        )
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9900);
        assert_eq!(config.sla_scan_interval_secs, 30);
    }
}
