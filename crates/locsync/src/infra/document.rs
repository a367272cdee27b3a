//! File-backed design document implementing the host capability traits.
//!
//! A document is a flat node table plus variable collections, persisted as
//! JSON or YAML. It stands in for a live host connection: the CLI loads one,
//! runs scans and reconciliations against it, and saves it back.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::model::NodeId;
use crate::infra::host::{
    CollectionId, HostError, ModeId, NodeInfo, NodeKind, NodeTree, VariableId, VariableStore,
};

/// Snapshot of a design document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignDocument {
    /// Currently designated nodes, in selection order.
    pub selection: Vec<NodeId>,
    /// Every node in the document, keyed by identity.
    pub nodes: BTreeMap<NodeId, NodeRecord>,
    pub collections: Vec<CollectionRecord>,
    #[serde(skip)]
    next_id: u64,
}

/// Stored attributes of one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_variable: Option<VariableId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

fn default_visible() -> bool {
    true
}

impl NodeRecord {
    /// Structural node holding the given children.
    pub fn container(name: impl Into<String>, kind: NodeKind, children: Vec<NodeId>) -> Self {
        Self {
            name: name.into(),
            kind,
            visible: true,
            characters: None,
            bound_variable: None,
            children,
        }
    }

    /// Childless node of an arbitrary kind.
    pub fn leaf(name: impl Into<String>, kind: NodeKind) -> Self {
        Self::container(name, kind, Vec::new())
    }

    /// Visible text leaf with the given content.
    pub fn text(name: impl Into<String>, characters: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Text,
            visible: true,
            characters: Some(characters.into()),
            bound_variable: None,
            children: Vec::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn bound_to(mut self, variable: VariableId) -> Self {
        self.bound_variable = Some(variable);
        self
    }
}

/// One variable collection with its modes and variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub modes: Vec<ModeRecord>,
    #[serde(default)]
    pub variables: Vec<VariableRecord>,
}

impl CollectionRecord {
    /// Look up a variable by key.
    pub fn variable(&self, name: &str) -> Option<&VariableRecord> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// The collection's first mode, the one values display through.
    pub fn default_mode(&self) -> Option<&ModeRecord> {
        self.modes.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRecord {
    pub id: ModeId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableRecord {
    pub id: VariableId,
    pub name: String,
    #[serde(default)]
    pub values: BTreeMap<ModeId, String>,
}

impl VariableRecord {
    pub fn value_for(&self, mode: &ModeId) -> Option<&str> {
        self.values.get(mode).map(String::as_str)
    }
}

impl DesignDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document, choosing the format from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read document {}", path.display()))?;
        let document = if is_yaml(path) {
            serde_yaml::from_str(&data)
                .with_context(|| format!("failed to parse document {}", path.display()))?
        } else {
            serde_json::from_str(&data)
                .with_context(|| format!("failed to parse document {}", path.display()))?
        };
        Ok(document)
    }

    /// Persist the document in the format its extension implies.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = if is_yaml(path) {
            serde_yaml::to_string(self).context("failed to serialize document")?
        } else {
            let mut data =
                serde_json::to_string_pretty(self).context("failed to serialize document")?;
            data.push('\n');
            data
        };
        fs::write(path, data)
            .with_context(|| format!("failed to write document {}", path.display()))
    }

    /// Insert a node, returning its id for wiring up children.
    pub fn insert_node(&mut self, id: impl Into<NodeId>, record: NodeRecord) -> NodeId {
        let id = id.into();
        self.nodes.insert(id.clone(), record);
        id
    }

    /// Look up a collection by display name.
    pub fn collection(&self, name: &str) -> Option<&CollectionRecord> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Next unused id with the given prefix. Ids already present in the
    /// document are skipped so loaded fixtures never collide.
    fn allocate_id(&mut self, prefix: &str) -> String {
        loop {
            self.next_id += 1;
            let candidate = format!("{prefix}:{}", self.next_id);
            if !self.id_in_use(&candidate) {
                return candidate;
            }
        }
    }

    fn id_in_use(&self, candidate: &str) -> bool {
        self.nodes.keys().any(|id| id.as_str() == candidate)
            || self.collections.iter().any(|collection| {
                collection.id.as_str() == candidate
                    || collection.modes.iter().any(|m| m.id.as_str() == candidate)
                    || collection.variables.iter().any(|v| v.id.as_str() == candidate)
            })
    }

    fn owning_collection(&self, variable: &VariableId) -> Option<&CollectionRecord> {
        self.collections
            .iter()
            .find(|c| c.variables.iter().any(|v| &v.id == variable))
    }

    /// Value a bound node displays for `variable`: the first-mode value of
    /// its owning collection.
    fn display_value(&self, variable: &VariableId) -> Option<String> {
        let collection = self.owning_collection(variable)?;
        let mode = collection.modes.first()?;
        collection
            .variables
            .iter()
            .find(|v| &v.id == variable)?
            .values
            .get(&mode.id)
            .cloned()
    }

    /// Push a fresh first-mode value into every node bound to `variable`.
    fn refresh_bound_text(&mut self, variable: &VariableId, value: &str) {
        for record in self.nodes.values_mut() {
            if record.bound_variable.as_ref() == Some(variable) {
                record.characters = Some(value.to_owned());
            }
        }
    }
}

impl NodeTree for DesignDocument {
    fn selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn node(&self, id: &NodeId) -> Option<NodeInfo> {
        self.nodes.get(id).map(|record| NodeInfo {
            id: id.clone(),
            name: record.name.clone(),
            kind: record.kind,
            visible: record.visible,
            characters: record.characters.clone(),
            bound_variable: record.bound_variable.clone(),
        })
    }

    fn children(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }
}

impl VariableStore for DesignDocument {
    fn collection_named(&self, name: &str) -> Option<CollectionId> {
        self.collection(name).map(|c| c.id.clone())
    }

    fn create_collection(&mut self, name: &str) -> Result<CollectionId, HostError> {
        let id = CollectionId::new(self.allocate_id("col"));
        let mode = ModeRecord {
            id: ModeId::new(self.allocate_id("mode")),
            name: "Default".to_owned(),
        };
        self.collections.push(CollectionRecord {
            id: id.clone(),
            name: name.to_owned(),
            modes: vec![mode],
            variables: Vec::new(),
        });
        Ok(id)
    }

    fn modes(&self, collection: &CollectionId) -> Result<Vec<ModeId>, HostError> {
        self.collections
            .iter()
            .find(|c| &c.id == collection)
            .map(|c| c.modes.iter().map(|m| m.id.clone()).collect())
            .ok_or_else(|| HostError::UnknownCollection(collection.clone()))
    }

    fn add_mode(&mut self, collection: &CollectionId, name: &str) -> Result<ModeId, HostError> {
        let id = ModeId::new(self.allocate_id("mode"));
        let record = self
            .collections
            .iter_mut()
            .find(|c| &c.id == collection)
            .ok_or_else(|| HostError::UnknownCollection(collection.clone()))?;
        record.modes.push(ModeRecord {
            id: id.clone(),
            name: name.to_owned(),
        });
        Ok(id)
    }

    fn variable_named(&self, collection: &CollectionId, name: &str) -> Option<VariableId> {
        self.collections
            .iter()
            .find(|c| &c.id == collection)?
            .variable(name)
            .map(|v| v.id.clone())
    }

    fn create_variable(
        &mut self,
        collection: &CollectionId,
        name: &str,
    ) -> Result<VariableId, HostError> {
        let id = VariableId::new(self.allocate_id("var"));
        let record = self
            .collections
            .iter_mut()
            .find(|c| &c.id == collection)
            .ok_or_else(|| HostError::UnknownCollection(collection.clone()))?;
        record.variables.push(VariableRecord {
            id: id.clone(),
            name: name.to_owned(),
            values: BTreeMap::new(),
        });
        Ok(id)
    }

    fn set_value(
        &mut self,
        variable: &VariableId,
        mode: &ModeId,
        value: &str,
    ) -> Result<(), HostError> {
        let mut found = false;
        let mut refresh = false;
        for collection in &mut self.collections {
            let Some(record) = collection.variables.iter_mut().find(|v| &v.id == variable) else {
                continue;
            };
            if !collection.modes.iter().any(|m| &m.id == mode) {
                return Err(HostError::UnknownMode(mode.clone()));
            }
            record.values.insert(mode.clone(), value.to_owned());
            refresh = collection.modes.first().is_some_and(|m| &m.id == mode);
            found = true;
            break;
        }
        if !found {
            return Err(HostError::UnknownVariable(variable.clone()));
        }
        // Nodes bound to the variable display its first-mode value.
        if refresh {
            self.refresh_bound_text(variable, value);
        }
        Ok(())
    }

    fn bind_text(&mut self, node: &NodeId, variable: &VariableId) -> Result<(), HostError> {
        if self.owning_collection(variable).is_none() {
            return Err(HostError::UnknownVariable(variable.clone()));
        }
        let value = self.display_value(variable);
        let record = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| HostError::UnknownNode(node.clone()))?;
        if !record.kind.is_text() {
            return Err(HostError::NotText(node.clone()));
        }
        record.bound_variable = Some(variable.clone());
        if let Some(value) = value {
            record.characters = Some(value);
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_document() -> DesignDocument {
        let mut document = DesignDocument::new();
        let title = document.insert_node("1:2", NodeRecord::text("Title", "Hello"));
        document.insert_node(
            "1:1",
            NodeRecord::container("Card", NodeKind::Frame, vec![title]),
        );
        document.selection = vec![NodeId::new("1:1")];
        document
    }

    #[test]
    fn round_trips_through_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let document = sample_document();
        document.save(&path).unwrap();

        let loaded = DesignDocument::load(&path).unwrap();
        assert_eq!(loaded.selection, document.selection);
        assert_eq!(loaded.nodes.len(), 2);
        let info = loaded.node(&NodeId::new("1:2")).unwrap();
        assert_eq!(info.characters.as_deref(), Some("Hello"));
    }

    #[test]
    fn round_trips_through_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.yaml");
        sample_document().save(&path).unwrap();

        let loaded = DesignDocument::load(&path).unwrap();
        assert_eq!(loaded.nodes.len(), 2);
        assert!(loaded.node(&NodeId::new("1:1")).unwrap().kind.container_capable());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = DesignDocument::load(Path::new("/nonexistent/doc.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read document"));
    }

    #[test]
    fn created_collection_starts_with_a_default_mode() {
        let mut document = DesignDocument::new();
        let collection = document.create_collection("Localized").unwrap();
        let modes = document.modes(&collection).unwrap();
        assert_eq!(modes.len(), 1);
        assert_eq!(
            document.collection("Localized").unwrap().default_mode().unwrap().name,
            "Default"
        );
    }

    #[test]
    fn add_mode_appends_to_an_existing_collection() {
        let mut document = DesignDocument::new();
        let collection = document.create_collection("Localized").unwrap();
        let added = document.add_mode(&collection, "German").unwrap();

        let modes = document.modes(&collection).unwrap();
        assert_eq!(modes.len(), 2);
        assert_eq!(modes[1], added);

        let err = document
            .add_mode(&CollectionId::new("col:404"), "German")
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownCollection(_)));
    }

    #[test]
    fn allocated_ids_skip_ones_already_in_the_document() {
        let mut document = DesignDocument::new();
        document.insert_node("col:1", NodeRecord::leaf("Decoy", NodeKind::Other));
        let collection = document.create_collection("Localized").unwrap();
        assert_ne!(collection.as_str(), "col:1");
    }

    #[test]
    fn first_mode_writes_refresh_bound_nodes() {
        let mut document = sample_document();
        let collection = document.create_collection("Localized").unwrap();
        let mode = document.modes(&collection).unwrap()[0].clone();
        let variable = document.create_variable(&collection, "Card/Title").unwrap();
        document.set_value(&variable, &mode, "Hello").unwrap();
        document.bind_text(&NodeId::new("1:2"), &variable).unwrap();

        document.set_value(&variable, &mode, "Bonjour").unwrap();
        let info = document.node(&NodeId::new("1:2")).unwrap();
        assert_eq!(info.characters.as_deref(), Some("Bonjour"));
    }

    #[test]
    fn binding_snaps_the_current_value_into_the_node() {
        let mut document = sample_document();
        let collection = document.create_collection("Localized").unwrap();
        let mode = document.modes(&collection).unwrap()[0].clone();
        let variable = document.create_variable(&collection, "Card/Title").unwrap();
        document.set_value(&variable, &mode, "Bonjour").unwrap();
        document.bind_text(&NodeId::new("1:2"), &variable).unwrap();

        let info = document.node(&NodeId::new("1:2")).unwrap();
        assert_eq!(info.bound_variable, Some(variable));
        assert_eq!(info.characters.as_deref(), Some("Bonjour"));
    }

    #[test]
    fn binding_rejects_unknown_and_non_text_nodes() {
        let mut document = sample_document();
        let collection = document.create_collection("Localized").unwrap();
        let variable = document.create_variable(&collection, "Card/Title").unwrap();

        let err = document.bind_text(&NodeId::new("9:9"), &variable).unwrap_err();
        assert!(matches!(err, HostError::UnknownNode(_)));

        let err = document.bind_text(&NodeId::new("1:1"), &variable).unwrap_err();
        assert!(matches!(err, HostError::NotText(_)));
    }

    #[test]
    fn set_value_rejects_foreign_modes() {
        let mut document = DesignDocument::new();
        let collection = document.create_collection("Localized").unwrap();
        let variable = document.create_variable(&collection, "Card/Title").unwrap();
        let err = document
            .set_value(&variable, &ModeId::new("mode:999"), "Hello")
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownMode(_)));
    }
}
