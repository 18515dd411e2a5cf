//! Periodic SLA scan task.

use chrono::Utc;
use limsflow_sla::SlaMonitor;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Spawn the background scan loop. The first tick fires immediately so
/// alerts missed during downtime surface at startup.
pub fn spawn_sla_scan(monitor: Arc<SlaMonitor>, every_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(every_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(every_secs, "sla scan scheduler started");

        loop {
            ticker.tick().await;
            let report = monitor.scan(Utc::now());
            if report.raised.is_empty() && report.resolved.is_empty() {
                tracing::debug!("sla scan pass: no changes");
            } else {
                tracing::info!(
                    raised = report.raised.len(),
                    resolved = report.resolved.len(),
                    "sla scan pass"
                );
            }
        }
    })
}
