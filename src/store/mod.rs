use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};
use crate::model::{Entry, EntryId, Group, GroupId, HistoryItem, PropertyType};
use crate::view::{GroupGraph, SortMode};

mod actions;

pub use actions::{TrashOutcome, VaultActions};

const SNAPSHOT_TMP_EXTENSION: &str = "json.tmp";

/// Read access to a vault snapshot.
pub trait VaultStore {
    fn groups(&self) -> &[Group];
    fn entries(&self) -> &[Entry];

    fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups().iter().find(|group| &group.id == id)
    }

    fn entry(&self, id: &EntryId) -> Option<&Entry> {
        self.entries().iter().find(|entry| &entry.id == id)
    }
}

/// Items removed together by a purge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteBatch {
    pub group_ids: Vec<GroupId>,
    pub entry_ids: Vec<EntryId>,
}

impl DeleteBatch {
    pub fn is_empty(&self) -> bool {
        self.group_ids.is_empty() && self.entry_ids.is_empty()
    }
}

/// Write access to a vault. Implementations own validation of the requested change.
pub trait VaultMutator {
    fn move_entry(&mut self, entry: &EntryId, group: &GroupId) -> VaultResult<()>;
    fn move_group(&mut self, group: &GroupId, parent: &GroupId) -> VaultResult<()>;
    /// Removes every listed item that exists and returns how many were removed.
    fn delete_items(&mut self, batch: &DeleteBatch) -> VaultResult<usize>;
    fn set_field_value(
        &mut self,
        entry: &EntryId,
        property: &str,
        property_type: PropertyType,
        value: &str,
    ) -> VaultResult<()>;
}

/// Snapshot-backed vault held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryVault {
    groups: Vec<Group>,
    entries: Vec<Entry>,
}

impl MemoryVault {
    pub fn from_parts(groups: Vec<Group>, entries: Vec<Entry>) -> Self {
        Self { groups, entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading vault snapshot {}", path.display()))?;
        let vault: MemoryVault = serde_json::from_str(&raw)
            .with_context(|| format!("parsing vault snapshot {}", path.display()))?;
        tracing::debug!(
            groups = vault.groups.len(),
            entries = vault.entries.len(),
            "loaded vault snapshot"
        );
        Ok(vault)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).context("serialising vault snapshot")?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp_path = path.with_extension(SNAPSHOT_TMP_EXTENSION);
        fs::write(&tmp_path, &json)
            .with_context(|| format!("writing temporary snapshot {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("replacing vault snapshot {}", path.display()))?;
        Ok(())
    }

    fn entry_mut(&mut self, id: &EntryId) -> VaultResult<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|entry| &entry.id == id)
            .ok_or_else(|| VaultError::UnknownEntry(id.clone()))
    }
}

impl VaultStore for MemoryVault {
    fn groups(&self) -> &[Group] {
        &self.groups
    }

    fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

impl VaultMutator for MemoryVault {
    fn move_entry(&mut self, entry: &EntryId, group: &GroupId) -> VaultResult<()> {
        if self.group(group).is_none() {
            return Err(VaultError::UnknownGroup(group.clone()));
        }
        let target = self.entry_mut(entry)?;
        target.parent = group.clone();
        Ok(())
    }

    fn move_group(&mut self, group: &GroupId, parent: &GroupId) -> VaultResult<()> {
        if group == parent {
            return Err(VaultError::structural(group, "cannot move a group into itself"));
        }
        let graph = GroupGraph::build(&self.groups, SortMode::Natural);
        let group_idx = graph
            .position(group)
            .ok_or_else(|| VaultError::UnknownGroup(group.clone()))?;
        if !parent.is_root() {
            let parent_idx = graph
                .position(parent)
                .ok_or_else(|| VaultError::UnknownGroup(parent.clone()))?;
            if graph.is_descendant_of(parent_idx, group_idx) {
                return Err(VaultError::structural(
                    group,
                    format!("cannot move beneath its own descendant {parent}"),
                ));
            }
        }
        self.groups[group_idx].parent = Some(parent.clone());
        Ok(())
    }

    fn delete_items(&mut self, batch: &DeleteBatch) -> VaultResult<usize> {
        let group_ids: HashSet<&GroupId> = batch.group_ids.iter().collect();
        let entry_ids: HashSet<&EntryId> = batch.entry_ids.iter().collect();
        let before = self.groups.len() + self.entries.len();
        self.groups.retain(|group| !group_ids.contains(&group.id));
        self.entries.retain(|entry| !entry_ids.contains(&entry.id));
        Ok(before - (self.groups.len() + self.entries.len()))
    }

    fn set_field_value(
        &mut self,
        entry: &EntryId,
        property: &str,
        property_type: PropertyType,
        value: &str,
    ) -> VaultResult<()> {
        let target = self.entry_mut(entry)?;
        let field = target
            .field_mut(property, property_type)
            .ok_or_else(|| VaultError::UnknownField {
                entry: entry.clone(),
                property: property.to_string(),
            })?;
        if field.value == value {
            return Ok(());
        }
        let previous = std::mem::replace(&mut field.value, value.to_string());
        target.history.push(HistoryItem::change(
            property,
            property_type,
            Some(previous),
            Some(value.to_string()),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn vault() -> MemoryVault {
        MemoryVault::from_parts(
            vec![
                Group::new("g1", "General"),
                Group::new("g2", "Cards").with_parent("g1"),
                Group::new("g3", "Debit").with_parent("g2"),
            ],
            vec![Entry::new("e1", "g1")
                .with_title("Mail")
                .with_field(Field::property("password", "one"))],
        )
    }

    #[test]
    fn move_entry_requires_existing_target() {
        let mut vault = vault();
        vault.move_entry(&"e1".into(), &"g2".into()).unwrap();
        assert_eq!(vault.entry(&"e1".into()).unwrap().parent.as_str(), "g2");
        assert_matches!(
            vault.move_entry(&"e1".into(), &"nope".into()),
            Err(VaultError::UnknownGroup(_))
        );
        assert_matches!(
            vault.move_entry(&"missing".into(), &"g1".into()),
            Err(VaultError::UnknownEntry(_))
        );
    }

    #[test]
    fn move_group_rejects_cycles() {
        let mut vault = vault();
        assert_matches!(
            vault.move_group(&"g1".into(), &"g3".into()),
            Err(VaultError::Structural { .. })
        );
        assert_matches!(
            vault.move_group(&"g2".into(), &"g2".into()),
            Err(VaultError::Structural { .. })
        );
        vault.move_group(&"g3".into(), &"0".into()).unwrap();
        assert!(vault.group(&"g3".into()).unwrap().parent_id().is_none());
    }

    #[test]
    fn set_field_value_appends_history() {
        let mut vault = vault();
        let id = EntryId::from("e1");
        vault
            .set_field_value(&id, "password", PropertyType::Property, "two")
            .unwrap();
        vault
            .set_field_value(&id, "password", PropertyType::Property, "two")
            .unwrap();
        let entry = vault.entry(&id).unwrap();
        assert_eq!(entry.field("password", PropertyType::Property).unwrap().value, "two");
        assert_eq!(entry.history.len(), 1);
        assert_eq!(entry.history[0].original_value.as_deref(), Some("one"));
        assert_matches!(
            vault.set_field_value(&id, "pin", PropertyType::Property, "1"),
            Err(VaultError::UnknownField { .. })
        );
    }

    #[test]
    fn delete_items_counts_removed() {
        let mut vault = vault();
        let removed = vault
            .delete_items(&DeleteBatch {
                group_ids: vec!["g3".into(), "ghost".into()],
                entry_ids: vec!["e1".into()],
            })
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(vault.groups().len(), 2);
        assert!(vault.entries().is_empty());
    }

    #[test]
    fn snapshot_round_trips_through_disk() -> Result<()> {
        let temp = TempDir::new().context("creating temp dir")?;
        let path = temp.path().join("nested/vault.json");
        let original = vault();
        original.save(&path)?;
        assert!(!path.with_extension(SNAPSHOT_TMP_EXTENSION).exists());
        let loaded = MemoryVault::load(&path)?;
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn load_reports_malformed_snapshot() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("vault.json");
        fs::write(&path, "{ not json")?;
        let err = MemoryVault::load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing vault snapshot"));
        Ok(())
    }
}
