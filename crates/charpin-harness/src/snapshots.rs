//! Snapshot records and fixture files.

use serde::{Deserialize, Serialize};

use charpin_core::Repr;

/// One execution record: the input combination, what the target returned,
/// the post-call state of every argument, and the fault description if
/// execution raised.
///
/// Exactly one of the (return value, after-states) pair or the exception
/// field is populated, never both. A unit return is recorded as an absent
/// return value while after-states remain populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// One representation literal per parameter (receiver first, if any).
    pub inputs_repr: Vec<Repr>,
    /// Representation of the result, absent for unit returns and faults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value_repr: Option<Repr>,
    /// Post-call state of every input argument, absent for faults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_states_repr: Option<Vec<Repr>>,
    /// Fault description when execution raised, else empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exception_repr: String,
}

impl Snapshot {
    /// A snapshot recording a fault for the given inputs.
    pub fn fault(inputs_repr: Vec<Repr>, exception: impl Into<String>) -> Self {
        Self {
            inputs_repr,
            return_value_repr: None,
            after_states_repr: None,
            exception_repr: exception.into(),
        }
    }

    /// Whether this snapshot recorded a fault.
    pub fn is_fault(&self) -> bool {
        !self.exception_repr.is_empty()
    }

    /// The exactly-one invariant: fault snapshots carry no observation,
    /// normal snapshots carry after-states.
    pub fn is_well_formed(&self) -> bool {
        if self.is_fault() {
            self.return_value_repr.is_none() && self.after_states_repr.is_none()
        } else {
            self.after_states_repr.is_some()
        }
    }
}

/// A captured snapshot sequence for one target, as a versioned fixture
/// file. Fixture files are an explicit CLI affordance; the generation flow
/// itself persists nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSet {
    /// Schema version.
    pub version: String,
    /// Target identifier the snapshots were captured from.
    pub target: String,
    /// Captured snapshots, in enumeration order.
    pub snapshots: Vec<Snapshot>,
}

impl SnapshotSet {
    pub const VERSION: &'static str = "v1";

    /// Wrap a captured sequence under the current schema version.
    #[must_use]
    pub fn new(target: impl Into<String>, snapshots: Vec<Snapshot>) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            target: target.into(),
            snapshots,
        }
    }

    /// Load a snapshot set from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the snapshot set to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a snapshot set from a file path.
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let set = Self::from_json(&content)?;
        Ok(set)
    }
}
