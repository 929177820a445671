use crate::model::{Entry, GroupId};

use super::filters::{title_matches, SortMode};

/// Direct members of `group`, in vault order.
pub fn entries_in_group<'a>(entries: &'a [Entry], group: &GroupId) -> Vec<&'a Entry> {
    entries.iter().filter(|entry| &entry.parent == group).collect()
}

/// Orders and filters entries for the list pane.
///
/// Natural mode keeps the caller's order. Sorting is stable and keyed on the
/// display title, compared case-insensitively; the term only matches that title.
pub fn project_entries<'a, I>(entries: I, sort_mode: SortMode, term: &str) -> Vec<&'a Entry>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let needle = term.trim();
    let mut visible: Vec<&Entry> = entries
        .into_iter()
        .filter(|entry| title_matches(entry.display_title(), needle))
        .collect();
    if sort_mode != SortMode::Natural {
        visible.sort_by(|a, b| sort_mode.compare_titles(a.display_title(), b.display_title()));
    }
    visible
}
