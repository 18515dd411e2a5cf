//! Built-in rule tables for the laboratory kinds.
//!
//! These are the canonical lifecycles the rest of the system is tested
//! against. Deployments that need additional kinds construct their own
//! [`RuleTable`] and pass it to the engine at startup.

use crate::table::{KindRules, RuleTable};
use limsflow_types::Kind;

const TECH: [&str; 2] = ["LAB_TECH", "ADMIN"];
const QC: [&str; 2] = ["QA", "ADMIN"];
const ADMIN_ONLY: [&str; 1] = ["ADMIN"];
const BENCH: [&str; 3] = ["SCIENTIST", "LAB_TECH", "ADMIN"];

/// The default rule table: the `sample` and `experiment` lifecycles.
///
/// A malformed builtin table is a programming error; construction
/// failures here abort startup rather than degrade into default-allow.
pub fn builtin() -> RuleTable {
    let mut sample = KindRules::new(
        Kind::new("sample"),
        [
            "RECEIVED",
            "IN_PROCESS",
            "QC_PENDING",
            "QC_PASSED",
            "QC_FAILED",
            "ARCHIVED",
        ],
    );
    let mut experiment = KindRules::new(
        Kind::new("experiment"),
        ["PLANNED", "RUNNING", "PAUSED", "COMPLETED", "CANCELLED"],
    );

    let wired: Result<(), limsflow_types::WorkflowError> = (|| {
        sample.add_edge("RECEIVED", "IN_PROCESS", TECH)?;
        sample.add_edge("RECEIVED", "QC_PENDING", TECH)?;
        sample.add_edge("RECEIVED", "ARCHIVED", ADMIN_ONLY)?;
        sample.add_edge("IN_PROCESS", "QC_PENDING", TECH)?;
        sample.add_edge("IN_PROCESS", "ARCHIVED", ADMIN_ONLY)?;
        sample.add_edge("QC_PENDING", "QC_PASSED", QC)?;
        sample.add_edge("QC_PENDING", "QC_FAILED", QC)?;
        sample.add_edge("QC_PASSED", "ARCHIVED", ADMIN_ONLY)?;
        sample.add_edge("QC_FAILED", "IN_PROCESS", TECH)?;
        sample.add_edge("QC_FAILED", "ARCHIVED", ADMIN_ONLY)?;

        experiment.add_edge("PLANNED", "RUNNING", BENCH)?;
        experiment.add_edge("PLANNED", "CANCELLED", ADMIN_ONLY)?;
        experiment.add_edge("RUNNING", "PAUSED", BENCH)?;
        experiment.add_edge("RUNNING", "COMPLETED", BENCH)?;
        experiment.add_edge("RUNNING", "CANCELLED", ADMIN_ONLY)?;
        experiment.add_edge("PAUSED", "RUNNING", BENCH)?;
        experiment.add_edge("PAUSED", "CANCELLED", ADMIN_ONLY)?;
        Ok(())
    })();
    wired.expect("builtin rule table is well-formed");

    RuleTable::new().with_kind(sample).with_kind(experiment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use limsflow_types::State;

    #[test]
    fn builtin_has_both_kinds() {
        let table = builtin();
        assert!(table.known_kind(&Kind::new("sample")));
        assert!(table.known_kind(&Kind::new("experiment")));
        assert!(!table.known_kind(&Kind::new("reagent")));
    }

    #[test]
    fn qc_failed_can_reenter_processing() {
        let table = builtin();
        assert!(table
            .valid_transition(
                &Kind::new("sample"),
                &State::new("QC_FAILED"),
                &State::new("IN_PROCESS")
            )
            .unwrap());
    }
}
