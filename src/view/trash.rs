use std::collections::HashSet;

use crate::model::{Entry, Group, GroupId};

use super::filters::SortMode;
use super::groups::GroupGraph;

/// The group marked as trash. When the snapshot flags several, the first wins.
pub fn find_trash_group(groups: &[Group]) -> Option<&Group> {
    let mut flagged = groups.iter().filter(|group| group.is_trash());
    let trash = flagged.next()?;
    let extra: Vec<&GroupId> = flagged.map(|group| &group.id).collect();
    if !extra.is_empty() {
        tracing::warn!(trash = %trash.id, ?extra, "multiple trash groups flagged, using the first");
    }
    Some(trash)
}

/// Entries sitting directly in the trash group.
pub fn trash_count(entries: &[Entry], trash_id: &GroupId) -> usize {
    entries
        .iter()
        .filter(|entry| &entry.parent == trash_id)
        .count()
}

/// All groups beneath `root`, transitively, in pre-order. `root` itself is excluded.
pub fn groups_under<'a>(groups: &'a [Group], root: &GroupId) -> Vec<&'a Group> {
    let graph = GroupGraph::build(groups, SortMode::Natural);
    match graph.position(root) {
        Some(idx) => graph
            .descendants(idx)
            .into_iter()
            .map(|child| graph.group(child))
            .collect(),
        None => Vec::new(),
    }
}

/// Entries held by `root` or by any group beneath it.
pub fn entries_under<'a>(groups: &[Group], entries: &'a [Entry], root: &GroupId) -> Vec<&'a Entry> {
    let mut scope: HashSet<&GroupId> = groups_under(groups, root)
        .into_iter()
        .map(|group| &group.id)
        .collect();
    scope.insert(root);
    entries
        .iter()
        .filter(|entry| scope.contains(&entry.parent))
        .collect()
}

/// Whether `group` is the trash group or lives somewhere below it.
pub fn is_in_trash(groups: &[Group], group: &GroupId, trash_id: &GroupId) -> bool {
    if group == trash_id {
        return true;
    }
    let graph = GroupGraph::build(groups, SortMode::Natural);
    match (graph.position(group), graph.position(trash_id)) {
        (Some(idx), Some(trash_idx)) => graph.is_descendant_of(idx, trash_idx),
        _ => false,
    }
}
