//! SLA threshold configuration.
//!
//! Pure data, loaded once at startup and shared read-only. States with
//! no entry are untracked; terminal states are simply never listed.

use chrono::Duration;
use limsflow_types::{AlertSeverity, Kind, State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum dwell time for one `(kind, state)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaThreshold {
    pub max_age_secs: i64,
    pub severity: AlertSeverity,
}

impl SlaThreshold {
    pub fn hours(hours: i64, severity: AlertSeverity) -> Self {
        Self {
            max_age_secs: hours * 3600,
            severity,
        }
    }

    pub fn max_age(&self) -> Duration {
        Duration::seconds(self.max_age_secs)
    }
}

/// The threshold table: `(kind, state)` → [`SlaThreshold`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaPolicy {
    thresholds: BTreeMap<Kind, BTreeMap<State, SlaThreshold>>,
}

impl SlaPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(
        mut self,
        kind: Kind,
        state: State,
        threshold: SlaThreshold,
    ) -> Self {
        self.thresholds.entry(kind).or_default().insert(state, threshold);
        self
    }

    pub fn threshold_for(&self, kind: &Kind, state: &State) -> Option<SlaThreshold> {
        self.thresholds.get(kind).and_then(|m| m.get(state)).copied()
    }

    pub fn is_tracked(&self, kind: &Kind, state: &State) -> bool {
        self.threshold_for(kind, state).is_some()
    }

    /// The lab defaults: intake and QC queues alert after a day, the
    /// long-running processing and experiment windows escalate to
    /// critical after several.
    pub fn builtin() -> Self {
        use AlertSeverity::{Critical, Warning};
        Self::new()
            .with_threshold(
                Kind::new("sample"),
                State::new("RECEIVED"),
                SlaThreshold::hours(24, Warning),
            )
            .with_threshold(
                Kind::new("sample"),
                State::new("IN_PROCESS"),
                SlaThreshold::hours(72, Critical),
            )
            .with_threshold(
                Kind::new("sample"),
                State::new("QC_PENDING"),
                SlaThreshold::hours(24, Warning),
            )
            .with_threshold(
                Kind::new("experiment"),
                State::new("PLANNED"),
                SlaThreshold::hours(48, Warning),
            )
            .with_threshold(
                Kind::new("experiment"),
                State::new("RUNNING"),
                SlaThreshold::hours(168, Critical),
            )
    }
}
