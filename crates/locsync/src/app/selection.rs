//! Curating which scanned records take part in reconciliation.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::app::scan::ScanResult;
use crate::domain::model::{NodeId, TextRecord};

/// One scanned record plus the user's override of its computed default.
#[derive(Debug, Clone)]
pub struct SelectionEntry {
    record: TextRecord,
    user_override: Option<bool>,
}

impl SelectionEntry {
    pub fn record(&self) -> &TextRecord {
        &self.record
    }

    /// The scanner's default for this record.
    pub fn default_selected(&self) -> bool {
        self.record.selected
    }

    /// Effective flag after applying any user override.
    pub fn effective(&self) -> bool {
        self.user_override.unwrap_or(self.record.selected)
    }
}

/// Per-record selection state held between a scan and a reconcile.
///
/// Computed defaults and user intent stay separate here; they collapse into
/// a single flag only when records are handed over for reconciliation.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    entries: Vec<SelectionEntry>,
}

impl SelectionSet {
    pub fn from_scan(scan: &ScanResult) -> Self {
        Self::from_records(scan.records.clone())
    }

    pub fn from_records(records: Vec<TextRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| SelectionEntry {
                record,
                user_override: None,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    /// Override one record's flag. Returns false when the id is unknown.
    pub fn set_override(&mut self, id: &NodeId, selected: bool) -> bool {
        match self.entries.iter_mut().find(|entry| &entry.record.id == id) {
            Some(entry) => {
                entry.user_override = Some(selected);
                true
            }
            None => false,
        }
    }

    pub fn clear_overrides(&mut self) {
        for entry in &mut self.entries {
            entry.user_override = None;
        }
    }

    /// Select everything, including hidden and already-bound records.
    pub fn select_all(&mut self) {
        for entry in &mut self.entries {
            entry.user_override = Some(true);
        }
    }

    pub fn deselect_all(&mut self) {
        for entry in &mut self.entries {
            entry.user_override = Some(false);
        }
    }

    /// Override every record whose display name matches, returning how many
    /// records were touched.
    pub fn override_matching(&mut self, names: &GlobSet, selected: bool) -> usize {
        let mut touched = 0;
        for entry in &mut self.entries {
            if names.is_match(&entry.record.name) {
                entry.user_override = Some(selected);
                touched += 1;
            }
        }
        touched
    }

    pub fn selected_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.effective()).count()
    }

    /// Collapse defaults and overrides into the records handed over for
    /// reconciliation.
    pub fn effective_records(&self) -> Vec<TextRecord> {
        self.entries
            .iter()
            .map(|entry| {
                let mut record = entry.record.clone();
                record.selected = entry.effective();
                record
            })
            .collect()
    }
}

/// Build a matcher over layer display names.
pub fn name_matcher(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("invalid layer name pattern '{pattern}'"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build layer name matcher")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, visible: bool, is_bound: bool) -> TextRecord {
        TextRecord {
            id: NodeId::new(id),
            name: name.to_owned(),
            content: String::new(),
            is_bound,
            visible,
            selected: TextRecord::default_selected(visible, is_bound),
        }
    }

    fn sample() -> SelectionSet {
        SelectionSet::from_records(vec![
            record("1:2", "Title", true, false),
            record("1:3", "Subtitle", true, true),
            record("1:4", "Debug note", false, false),
        ])
    }

    #[test]
    fn defaults_flow_through_untouched() {
        let selection = sample();
        assert_eq!(selection.len(), 3);
        assert_eq!(selection.selected_count(), 1);
        let effective = selection.effective_records();
        assert!(effective[0].selected);
        assert!(!effective[1].selected);
        assert!(!effective[2].selected);
    }

    #[test]
    fn overrides_flip_effective_but_keep_the_default() {
        let mut selection = sample();
        assert!(selection.set_override(&NodeId::new("1:3"), true));
        assert!(!selection.set_override(&NodeId::new("9:9"), true));

        let entry = &selection.entries()[1];
        assert!(!entry.default_selected());
        assert!(entry.effective());

        selection.clear_overrides();
        assert!(!selection.entries()[1].effective());
    }

    #[test]
    fn select_all_covers_hidden_and_bound() {
        let mut selection = sample();
        selection.select_all();
        assert_eq!(selection.selected_count(), 3);
        selection.deselect_all();
        assert_eq!(selection.selected_count(), 0);
    }

    #[test]
    fn glob_overrides_match_display_names() {
        let mut selection = sample();
        selection.deselect_all();
        let matcher = name_matcher(&["Title".to_owned(), "Debug*".to_owned()]).unwrap();
        let touched = selection.override_matching(&matcher, true);
        assert_eq!(touched, 2);
        assert_eq!(selection.selected_count(), 2);
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let err = name_matcher(&["ti[tle".to_owned()]).unwrap_err();
        assert!(err.to_string().contains("invalid layer name pattern"));
    }
}
