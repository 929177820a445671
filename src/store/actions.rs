use crate::error::{VaultError, VaultResult};
use crate::model::{EntryId, Field, GroupId};
use crate::view::{entries_under, find_trash_group, groups_under, is_in_trash};

use super::{DeleteBatch, VaultMutator, VaultStore};

/// Result of a trash-dependent action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrashOutcome {
    Moved { trash: GroupId },
    Purged { groups: usize, entries: usize },
    AlreadyInTrash,
    /// The vault has no trash group; nothing was changed.
    NoTrash,
}

/// Mutation requests issued by the presentation layer, routed to a vault.
pub struct VaultActions<'a, V> {
    vault: &'a mut V,
}

impl<'a, V> VaultActions<'a, V>
where
    V: VaultStore + VaultMutator,
{
    pub fn new(vault: &'a mut V) -> Self {
        Self { vault }
    }

    pub fn trash_id(&self) -> Option<GroupId> {
        find_trash_group(self.vault.groups()).map(|group| group.id.clone())
    }

    pub fn move_entry_to_trash(&mut self, entry_id: &EntryId) -> VaultResult<TrashOutcome> {
        let Some(trash) = self.trash_id() else {
            tracing::warn!(entry = %entry_id, reason = %VaultError::MissingTrash, "entry not moved");
            return Ok(TrashOutcome::NoTrash);
        };
        let entry = self
            .vault
            .entry(entry_id)
            .ok_or_else(|| VaultError::UnknownEntry(entry_id.clone()))?;
        if is_in_trash(self.vault.groups(), &entry.parent, &trash) {
            return Ok(TrashOutcome::AlreadyInTrash);
        }
        self.vault.move_entry(entry_id, &trash)?;
        tracing::info!(entry = %entry_id, %trash, "moved entry to trash");
        Ok(TrashOutcome::Moved { trash })
    }

    pub fn move_group_to_trash(&mut self, group_id: &GroupId) -> VaultResult<TrashOutcome> {
        let Some(trash) = self.trash_id() else {
            tracing::warn!(group = %group_id, reason = %VaultError::MissingTrash, "group not moved");
            return Ok(TrashOutcome::NoTrash);
        };
        if self.vault.group(group_id).is_none() {
            return Err(VaultError::UnknownGroup(group_id.clone()));
        }
        if is_in_trash(self.vault.groups(), group_id, &trash) {
            return Ok(TrashOutcome::AlreadyInTrash);
        }
        self.vault.move_group(group_id, &trash)?;
        tracing::info!(group = %group_id, %trash, "moved group to trash");
        Ok(TrashOutcome::Moved { trash })
    }

    /// Deletes everything beneath the trash group. The trash group itself stays.
    pub fn empty_trash(&mut self) -> VaultResult<TrashOutcome> {
        let Some(trash) = self.trash_id() else {
            tracing::warn!(reason = %VaultError::MissingTrash, "nothing to empty");
            return Ok(TrashOutcome::NoTrash);
        };
        let batch = self.trash_contents(&trash);
        let outcome = TrashOutcome::Purged {
            groups: batch.group_ids.len(),
            entries: batch.entry_ids.len(),
        };
        if !batch.is_empty() {
            self.vault.delete_items(&batch)?;
        }
        tracing::info!(?outcome, "emptied trash");
        Ok(outcome)
    }

    /// What `empty_trash` would delete, without deleting it.
    pub fn trash_contents(&self, trash: &GroupId) -> DeleteBatch {
        let groups = self.vault.groups();
        DeleteBatch {
            group_ids: groups_under(groups, trash)
                .into_iter()
                .map(|group| group.id.clone())
                .collect(),
            entry_ids: entries_under(groups, self.vault.entries(), trash)
                .into_iter()
                .map(|entry| entry.id.clone())
                .collect(),
        }
    }

    /// Writes a value picked from a field's history back into the field.
    pub fn restore_field_value(
        &mut self,
        entry_id: &EntryId,
        field: &Field,
        value: &str,
    ) -> VaultResult<()> {
        self.vault
            .set_field_value(entry_id, &field.property, field.property_type, value)
    }
}
