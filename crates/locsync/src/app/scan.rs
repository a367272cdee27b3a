//! Scanning the designated container for text layers.

use std::collections::HashSet;

use crate::domain::model::{NodeId, TextRecord};
use crate::infra::host::NodeTree;

/// Snapshot produced by one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Display name of the scanned container; `None` when nothing valid was
    /// designated.
    pub container_name: Option<String>,
    /// Text records in pre-order traversal order.
    pub records: Vec<TextRecord>,
}

impl ScanResult {
    /// The empty snapshot reported for a missing or invalid designation.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Walks a designated container and snapshots every text layer beneath it.
///
/// Scanning is read-only and never fails: an unusable designation simply
/// yields the empty snapshot.
#[derive(Debug, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Self
    }

    /// Collect the text layers under `root` in pre-order, children in their
    /// native order. Visibility of hidden ancestors is folded into each
    /// record. Stale child handles are skipped; a node reached through a
    /// repeated or cyclic reference contributes only once.
    pub fn scan(&self, tree: &impl NodeTree, root: Option<&NodeId>) -> ScanResult {
        let Some(root_id) = root else {
            return ScanResult::empty();
        };
        let Some(root_info) = tree.node(root_id) else {
            return ScanResult::empty();
        };
        if !tree.is_container(&root_info) {
            return ScanResult::empty();
        }

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        // Children go on the stack reversed so they pop in native order.
        let mut stack = vec![(root_id.clone(), true)];
        while let Some((id, inherited)) = stack.pop() {
            // A hand-edited document can wire up a cycle; visit each node once.
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(info) = tree.node(&id) else {
                continue;
            };
            let visible = inherited && info.visible;
            if info.kind.is_text() {
                let is_bound = info.bound_variable.is_some();
                records.push(TextRecord {
                    id: info.id,
                    name: info.name,
                    content: info.characters.unwrap_or_default(),
                    is_bound,
                    visible,
                    selected: TextRecord::default_selected(visible, is_bound),
                });
            }
            for child in tree.children(&id).into_iter().rev() {
                stack.push((child, visible));
            }
        }

        tracing::debug!(
            container = %root_info.name,
            records = records.len(),
            "scanned container"
        );

        ScanResult {
            container_name: Some(root_info.name),
            records,
        }
    }
}
