//! Display-ready projections over a vault snapshot.
//!
//! Everything here borrows from the snapshot and is recomputed on demand; nothing
//! mutates source data.

pub mod entries;
pub mod fields;
pub mod filters;
pub mod groups;
pub mod history;
pub mod trash;

pub use entries::{entries_in_group, project_entries};
pub use fields::{can_edit, choice_options, field_display, layout_fields, shows_label, EntryLayout, FieldDisplay};
pub use filters::{SortMode, ViewFilters};
pub use groups::{build_visible_group_tree, GroupGraph, GroupNode, StructuralDefect};
pub use history::history_for_field;
pub use trash::{entries_under, find_trash_group, groups_under, is_in_trash, trash_count};
