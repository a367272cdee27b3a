//! Typed messages exchanged with the external UI consumer.
//!
//! The wire format is JSON with a `kind` discriminator and camelCase field
//! names, so a JavaScript peer can consume it without adaptation.

use serde::{Deserialize, Serialize};

use crate::domain::model::TextRecord;

/// Requests the UI sends to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum UiRequest {
    /// Ask for a fresh scan of the current designation.
    RequestScan,
    /// Reconcile the carried records. Unselected records ride along and are
    /// filtered out core-side.
    RequestReconcile { records: Vec<TextRecord> },
    /// Outcome of the UI-side file download, informational only.
    ExportResult { success: bool },
}

/// Events the core posts to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum CoreEvent {
    /// Fresh snapshot, posted after every scan.
    TextLayers {
        records: Vec<TextRecord>,
        container_name: Option<String>,
    },
}
