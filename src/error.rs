use thiserror::Error;

use crate::model::{EntryId, GroupId};

pub type VaultResult<T> = Result<T, VaultError>;

/// Conditions raised by vault mutations and strict structure checks.
///
/// Projections never return these; they degrade and log instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("malformed group structure at {group}: {reason}")]
    Structural { group: GroupId, reason: String },
    #[error("no trash group present in vault")]
    MissingTrash,
    #[error("group {0} not found")]
    UnknownGroup(GroupId),
    #[error("entry {0} not found")]
    UnknownEntry(EntryId),
    #[error("entry {entry} has no field '{property}'")]
    UnknownField { entry: EntryId, property: String },
    #[error("unknown sort mode '{0}' (expected na, az or za)")]
    UnknownSortMode(String),
}

impl VaultError {
    pub(crate) fn structural(group: &GroupId, reason: impl Into<String>) -> Self {
        VaultError::Structural {
            group: group.clone(),
            reason: reason.into(),
        }
    }
}
