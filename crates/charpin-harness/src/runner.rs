//! Replay verification against stored snapshot sets.
//!
//! Replay is the consistency check the captured snapshots exist for:
//! re-run the capture and compare record by record, order included.

use serde::{Deserialize, Serialize};

use charpin_core::{Context, PluginRegistry};

use crate::capture::{CaptureError, capture};
use crate::diff::render_diff;
use crate::module::Target;
use crate::snapshots::{Snapshot, SnapshotSet};

/// One snapshot position where replay disagreed with the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Divergence {
    /// Snapshot position in enumeration order.
    pub index: usize,
    /// Rendered diff between baseline and replayed record.
    pub diff: String,
}

/// Aggregate result of one replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySummary {
    /// Target identifier replayed.
    pub target: String,
    /// Baseline snapshot count.
    pub baseline_total: usize,
    /// Replayed snapshot count.
    pub replayed_total: usize,
    /// Positions compared and found equal.
    pub matched: usize,
    /// Positions that diverged.
    pub divergences: Vec<Divergence>,
}

impl ReplaySummary {
    /// Whether replay reproduced the baseline exactly.
    #[must_use]
    pub fn all_matched(&self) -> bool {
        self.divergences.is_empty() && self.baseline_total == self.replayed_total
    }
}

/// Re-capture `target` and compare against `baseline`.
pub fn replay(
    target: &Target<'_>,
    registry: &PluginRegistry,
    context: &Context,
    baseline: &SnapshotSet,
) -> Result<ReplaySummary, CaptureError> {
    let replayed = capture(target, registry, context)?;
    Ok(compare(baseline, &replayed))
}

/// Ordered comparison of a baseline set against a replayed sequence.
#[must_use]
pub fn compare(baseline: &SnapshotSet, replayed: &[Snapshot]) -> ReplaySummary {
    let mut summary = ReplaySummary {
        target: baseline.target.clone(),
        baseline_total: baseline.snapshots.len(),
        replayed_total: replayed.len(),
        matched: 0,
        divergences: Vec::new(),
    };

    let common = baseline.snapshots.len().min(replayed.len());
    for index in 0..common {
        let expected = &baseline.snapshots[index];
        let actual = &replayed[index];
        if expected == actual {
            summary.matched += 1;
        } else {
            summary.divergences.push(Divergence {
                index,
                diff: render_diff(&pretty(expected), &pretty(actual)),
            });
        }
    }
    if baseline.snapshots.len() != replayed.len() {
        summary.divergences.push(Divergence {
            index: common,
            diff: format!(
                "baseline has {} snapshots, replay produced {}",
                baseline.snapshots.len(),
                replayed.len()
            ),
        });
    }
    summary
}

fn pretty(snapshot: &Snapshot) -> String {
    serde_json::to_string_pretty(snapshot).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use charpin_core::Repr;

    fn snapshot(val: i64) -> Snapshot {
        Snapshot {
            inputs_repr: vec![Repr::Int(val)],
            return_value_repr: Some(Repr::Int(val)),
            after_states_repr: Some(vec![Repr::Int(val)]),
            exception_repr: String::new(),
        }
    }

    #[test]
    fn identical_sequences_match() {
        let baseline = SnapshotSet::new("t", vec![snapshot(1), snapshot(2)]);
        let summary = compare(&baseline, &[snapshot(1), snapshot(2)]);
        assert!(summary.all_matched());
        assert_eq!(summary.matched, 2);
    }

    #[test]
    fn divergence_carries_position_and_diff() {
        let baseline = SnapshotSet::new("t", vec![snapshot(1), snapshot(2)]);
        let summary = compare(&baseline, &[snapshot(1), snapshot(3)]);
        assert!(!summary.all_matched());
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.divergences.len(), 1);
        assert_eq!(summary.divergences[0].index, 1);
        assert!(summary.divergences[0].diff.contains("+"));
    }

    #[test]
    fn length_mismatch_is_a_divergence() {
        let baseline = SnapshotSet::new("t", vec![snapshot(1)]);
        let summary = compare(&baseline, &[snapshot(1), snapshot(2)]);
        assert!(!summary.all_matched());
        assert_eq!(summary.divergences.len(), 1);
        assert!(summary.divergences[0].diff.contains("baseline has 1"));
    }
}
