//! Report generation for replay results.

use serde::{Deserialize, Serialize};

use crate::runner::ReplaySummary;

/// A replay report suitable for markdown and JSON rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Report title.
    pub title: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    /// Replay summary.
    pub summary: ReplaySummary,
}

impl ReplayReport {
    /// Build a report stamped with the current time.
    #[must_use]
    pub fn new(title: impl Into<String>, summary: ReplaySummary) -> Self {
        Self {
            title: title.into(),
            timestamp: format!("{:?}", std::time::SystemTime::now()),
            summary,
        }
    }

    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Target: {}\n", self.summary.target));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!("- Baseline: {}\n", self.summary.baseline_total));
        out.push_str(&format!("- Replayed: {}\n", self.summary.replayed_total));
        out.push_str(&format!("- Matched: {}\n", self.summary.matched));
        out.push_str(&format!(
            "- Diverged: {}\n\n",
            self.summary.divergences.len()
        ));

        if self.summary.divergences.is_empty() {
            out.push_str("All snapshots reproduced.\n");
        } else {
            for divergence in &self.summary.divergences {
                out.push_str(&format!("## Snapshot {}\n\n", divergence.index));
                out.push_str("```\n");
                out.push_str(&divergence.diff);
                if !divergence.diff.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("```\n\n");
            }
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}
