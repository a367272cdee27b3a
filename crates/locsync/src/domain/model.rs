//! Text records, derived variable keys, and reconciliation outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the container segment and the layer segment of a key.
pub const KEY_SEPARATOR: char = '/';

/// Opaque handle identifying a node within one host document session.
///
/// Handles are only stable for the lifetime of the session that produced
/// them; a handle captured from one scan may already be stale by the time it
/// is used.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One text-bearing node captured by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRecord {
    pub id: NodeId,
    /// Display name of the layer, not required to be unique.
    pub name: String,
    /// Current text content of the layer.
    pub content: String,
    /// Whether the content is already driven by a variable.
    pub is_bound: bool,
    /// Effective visibility, with hidden ancestors folded in.
    pub visible: bool,
    /// Whether the record takes part in reconciliation. Starts out at the
    /// computed default; consumers may flip it before submitting.
    pub selected: bool,
}

impl TextRecord {
    /// Default curation policy: hidden and already-bound layers are not
    /// re-offered.
    pub fn default_selected(visible: bool, is_bound: bool) -> bool {
        visible && !is_bound
    }
}

/// Variable key derived from a container name and a disambiguated layer name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableKey(String);

impl VariableKey {
    pub fn new(container: &str, layer: &str) -> Self {
        Self(format!("{container}{KEY_SEPARATOR}{layer}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal state of one record after a reconciliation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The variable was created or updated and the node bound to it.
    Bound { name: String, key: VariableKey },
    /// The record failed; the rest of the batch still ran.
    Failed { name: String, reason: String },
}

impl RecordOutcome {
    pub fn is_bound(&self) -> bool {
        matches!(self, RecordOutcome::Bound { .. })
    }
}

/// Result of one reconciliation batch over a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Display name of the reconciled container.
    pub container: String,
    /// Per-record outcomes in submission order.
    pub outcomes: Vec<RecordOutcome>,
}

impl ReconcileSummary {
    /// Records whose variable was written and whose node was bound.
    pub fn created_or_updated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_bound()).count()
    }

    /// Records that failed without stopping the batch.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.created_or_updated()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_skips_hidden_and_bound() {
        assert!(TextRecord::default_selected(true, false));
        assert!(!TextRecord::default_selected(false, false));
        assert!(!TextRecord::default_selected(true, true));
        assert!(!TextRecord::default_selected(false, true));
    }

    #[test]
    fn variable_key_joins_container_and_layer() {
        let key = VariableKey::new("Card", "Title_1");
        assert_eq!(key.as_str(), "Card/Title_1");
        assert_eq!(key.to_string(), "Card/Title_1");
    }

    #[test]
    fn summary_counts_split_by_outcome() {
        let summary = ReconcileSummary {
            container: "Card".into(),
            outcomes: vec![
                RecordOutcome::Bound {
                    name: "Title".into(),
                    key: VariableKey::new("Card", "Title"),
                },
                RecordOutcome::Failed {
                    name: "Subtitle".into(),
                    reason: "layer no longer exists".into(),
                },
            ],
        };
        assert_eq!(summary.created_or_updated(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_empty());
    }
}
