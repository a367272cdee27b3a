//! Reconciling selected text records into a variable collection.

use thiserror::Error;

use crate::app::naming::NameAllocator;
use crate::domain::errors::ReconcileError;
use crate::domain::model::{NodeId, RecordOutcome, ReconcileSummary, TextRecord, VariableKey};
use crate::infra::config::Config;
use crate::infra::host::{CollectionId, HostError, ModeId, NodeTree, VariableStore};

/// Failures scoped to a single record. They become `Failed` outcomes instead
/// of stopping the batch.
#[derive(Debug, Error)]
enum RecordError {
    #[error("layer no longer exists")]
    NodeVanished,
    #[error("layer is no longer a text node")]
    NotTextAnymore,
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Binds selected text layers to variables in one collection.
#[derive(Debug, Clone)]
pub struct Reconciler {
    collection: String,
    mode: String,
}

impl Reconciler {
    pub fn new(collection: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            mode: mode.into(),
        }
    }

    /// Use the collection and mode names from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.defaults.collection.clone(),
            config.defaults.mode.clone(),
        )
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Create or update one variable per selected record and bind each
    /// record's node to its variable.
    ///
    /// The designated root is validated up front; an unusable root means
    /// nothing at all is written. An empty selection is a silent no-op that
    /// touches neither collections nor variables. Failures on individual
    /// records are recorded in the summary while the batch keeps going.
    pub fn reconcile<H>(
        &self,
        host: &mut H,
        root: Option<&NodeId>,
        records: &[TextRecord],
    ) -> Result<ReconcileSummary, ReconcileError>
    where
        H: NodeTree + VariableStore,
    {
        let root_id = root.ok_or(ReconcileError::InvalidRoot)?;
        let root_info = host.node(root_id).ok_or(ReconcileError::InvalidRoot)?;
        if !host.is_container(&root_info) {
            return Err(ReconcileError::InvalidRoot);
        }
        let container = root_info.name;

        let selected: Vec<&TextRecord> = records.iter().filter(|r| r.selected).collect();
        let mut summary = ReconcileSummary {
            container: container.clone(),
            outcomes: Vec::new(),
        };
        if selected.is_empty() {
            return Ok(summary);
        }

        let collection = match host.collection_named(&self.collection) {
            Some(id) => id,
            None => host.create_collection(&self.collection)?,
        };
        let mode = match host.modes(&collection)?.into_iter().next() {
            Some(id) => id,
            None => host.add_mode(&collection, &self.mode)?,
        };

        let mut names = NameAllocator::new();
        for record in selected {
            let key = VariableKey::new(&container, &names.disambiguate(&record.name));
            match apply_record(host, &collection, &mode, &key, record) {
                Ok(()) => summary.outcomes.push(RecordOutcome::Bound {
                    name: record.name.clone(),
                    key,
                }),
                Err(reason) => {
                    tracing::warn!(layer = %record.name, error = %reason, "failed to bind layer");
                    summary.outcomes.push(RecordOutcome::Failed {
                        name: record.name.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            container = %summary.container,
            succeeded = summary.created_or_updated(),
            failed = summary.failed(),
            "reconciled selection"
        );
        Ok(summary)
    }
}

/// One record's write path. Every step short-circuits into a `Failed`
/// outcome for this record only.
fn apply_record<H>(
    host: &mut H,
    collection: &CollectionId,
    mode: &ModeId,
    key: &VariableKey,
    record: &TextRecord,
) -> Result<(), RecordError>
where
    H: NodeTree + VariableStore,
{
    let variable = match host.variable_named(collection, key.as_str()) {
        Some(id) => id,
        None => host.create_variable(collection, key.as_str())?,
    };
    host.set_value(&variable, mode, &record.content)?;

    // The handle may have gone stale since the scan; the value write above
    // is deliberately kept even when binding is no longer possible.
    let node = host.node(&record.id).ok_or(RecordError::NodeVanished)?;
    if !node.kind.is_text() {
        return Err(RecordError::NotTextAnymore);
    }
    host.bind_text(&record.id, &variable)?;
    Ok(())
}
