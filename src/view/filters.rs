use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::VaultError;

/// Ordering applied to a list of groups or entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum SortMode {
    /// Natural order: whatever order the vault hands us.
    #[serde(rename = "na")]
    #[strum(serialize = "na")]
    Natural,
    #[serde(rename = "az")]
    #[strum(serialize = "az")]
    Ascending,
    #[serde(rename = "za")]
    #[strum(serialize = "za")]
    Descending,
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::Natural
    }
}

impl SortMode {
    pub fn parse(raw: &str) -> Result<Self, VaultError> {
        SortMode::from_str(raw.trim()).map_err(|_| VaultError::UnknownSortMode(raw.to_string()))
    }

    /// Compares two titles case-insensitively in this mode's direction.
    /// Natural order compares everything equal so stable sorts keep input order.
    pub fn compare_titles(self, a: &str, b: &str) -> Ordering {
        match self {
            SortMode::Natural => Ordering::Equal,
            SortMode::Ascending => fold_case(a).cmp(&fold_case(b)),
            SortMode::Descending => fold_case(b).cmp(&fold_case(a)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewFilters {
    pub term: String,
    pub sort_mode: SortMode,
}

pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Case-insensitive substring test; an empty needle matches everything.
pub(crate) fn title_matches(title: &str, needle: &str) -> bool {
    needle.is_empty() || fold_case(title).contains(&fold_case(needle))
}
