use std::collections::hash_map::Entry as Slot;
use std::collections::{HashMap, HashSet};

use crate::error::{VaultError, VaultResult};
use crate::model::{Group, GroupId};

use super::filters::{title_matches, SortMode};

/// One row of the rendered group tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode<'a> {
    pub group: &'a Group,
    pub depth: usize,
    pub is_selected: bool,
    pub is_expanded: bool,
    pub has_children: bool,
    /// Set when the group's parent link was cut because it was dangling or cyclic.
    pub detached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralDefect {
    DanglingParent { group: GroupId, parent: GroupId },
    Cycle { group: GroupId },
}

impl StructuralDefect {
    pub fn group(&self) -> &GroupId {
        match self {
            StructuralDefect::DanglingParent { group, .. } => group,
            StructuralDefect::Cycle { group } => group,
        }
    }

    fn into_error(self) -> VaultError {
        match self {
            StructuralDefect::DanglingParent { group, parent } => {
                VaultError::structural(&group, format!("parent {parent} does not exist"))
            }
            StructuralDefect::Cycle { group } => {
                VaultError::structural(&group, "group is part of a parent cycle")
            }
        }
    }
}

/// Adjacency list over a flat group snapshot.
///
/// Built once per snapshot. Parent links that dangle or close a cycle are cut, so
/// every group is reachable from exactly one root and all walks terminate.
/// Later groups repeating an earlier id are left out of the tree entirely.
#[derive(Debug, Clone)]
pub struct GroupGraph<'a> {
    groups: &'a [Group],
    index: HashMap<&'a GroupId, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    detached: Vec<bool>,
    defects: Vec<StructuralDefect>,
}

impl<'a> GroupGraph<'a> {
    pub fn build(groups: &'a [Group], sort_mode: SortMode) -> Self {
        let mut index = HashMap::with_capacity(groups.len());
        let mut shadowed = vec![false; groups.len()];
        for (idx, group) in groups.iter().enumerate() {
            match index.entry(&group.id) {
                Slot::Vacant(slot) => {
                    slot.insert(idx);
                }
                Slot::Occupied(_) => {
                    shadowed[idx] = true;
                    tracing::warn!(group = %group.id, "duplicate group id, keeping first occurrence");
                }
            }
        }

        let mut defects = Vec::new();
        let mut detached = vec![false; groups.len()];
        let mut parents: Vec<Option<usize>> = groups
            .iter()
            .enumerate()
            .map(|(idx, group)| {
                if shadowed[idx] {
                    return None;
                }
                let parent = group.parent_id()?;
                match index.get(parent) {
                    Some(&parent_idx) => Some(parent_idx),
                    None => {
                        detached[idx] = true;
                        defects.push(StructuralDefect::DanglingParent {
                            group: group.id.clone(),
                            parent: parent.clone(),
                        });
                        None
                    }
                }
            })
            .collect();

        for idx in cycle_members(&parents) {
            parents[idx] = None;
            detached[idx] = true;
            defects.push(StructuralDefect::Cycle {
                group: groups[idx].id.clone(),
            });
        }

        for defect in &defects {
            tracing::warn!(?defect, "treating malformed group as top-level");
        }

        let mut children = vec![Vec::new(); groups.len()];
        let mut roots = Vec::new();
        for (idx, parent) in parents.iter().enumerate() {
            if shadowed[idx] {
                continue;
            }
            match parent {
                Some(parent_idx) => children[*parent_idx].push(idx),
                None => roots.push(idx),
            }
        }
        // Groups only know alphabetical or insertion order.
        let by_title = |a: &usize, b: &usize| {
            SortMode::Ascending.compare_titles(&groups[*a].title, &groups[*b].title)
        };
        if sort_mode == SortMode::Ascending {
            roots.sort_by(by_title);
            for siblings in &mut children {
                siblings.sort_by(by_title);
            }
        }

        Self {
            groups,
            index,
            parents,
            children,
            roots,
            detached,
            defects,
        }
    }

    /// Fails on the first dangling or cyclic parent reference.
    pub fn validate(&self) -> VaultResult<()> {
        match self.defects.first() {
            Some(defect) => Err(defect.clone().into_error()),
            None => Ok(()),
        }
    }

    pub fn defects(&self) -> &[StructuralDefect] {
        &self.defects
    }

    pub fn position(&self, id: &GroupId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn group(&self, idx: usize) -> &'a Group {
        &self.groups[idx]
    }

    /// Strict ancestors of `idx`, nearest first.
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.parents[idx], move |current| self.parents[*current])
    }

    pub fn is_descendant_of(&self, idx: usize, ancestor: usize) -> bool {
        self.ancestors(idx).any(|candidate| candidate == ancestor)
    }

    /// Every group below `idx` in pre-order, excluding `idx` itself.
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.children[idx].iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children[current].iter().rev().copied());
        }
        out
    }

    /// Rows to render for the given selection, expand state and filter term.
    pub fn visible_nodes(
        &self,
        selected: Option<&GroupId>,
        expanded: &HashSet<GroupId>,
        term: &str,
    ) -> Vec<GroupNode<'a>> {
        let needle = term.trim();
        let selected_idx = selected.and_then(|id| self.position(id));
        let keep = if needle.is_empty() {
            None
        } else {
            Some(self.matching_subtrees(needle))
        };
        let open_path: HashSet<usize> = selected_idx
            .map(|idx| self.ancestors(idx).collect())
            .unwrap_or_default();

        let mut out = Vec::new();
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&idx| (idx, 0)).collect();
        while let Some((idx, depth)) = stack.pop() {
            if let Some(keep) = &keep {
                if !keep[idx] {
                    continue;
                }
            }
            let group = &self.groups[idx];
            let is_expanded = expanded.contains(&group.id);
            out.push(GroupNode {
                group,
                depth,
                is_selected: selected_idx == Some(idx),
                is_expanded,
                has_children: !self.children[idx].is_empty(),
                detached: self.detached[idx],
            });
            // A filter reveals matches through collapsed parents.
            let descend = keep.is_some() || is_expanded || open_path.contains(&idx);
            if descend {
                stack.extend(self.children[idx].iter().rev().map(|&child| (child, depth + 1)));
            }
        }
        out
    }

    /// `keep[i]` is true when group `i` or one of its descendants matches `needle`.
    fn matching_subtrees(&self, needle: &str) -> Vec<bool> {
        let mut order = Vec::with_capacity(self.groups.len());
        for &root in &self.roots {
            order.push(root);
            order.extend(self.descendants(root));
        }
        let mut keep: Vec<bool> = self
            .groups
            .iter()
            .map(|group| title_matches(&group.title, needle))
            .collect();
        for &idx in order.iter().rev() {
            if keep[idx] {
                if let Some(parent) = self.parents[idx] {
                    keep[parent] = true;
                }
            }
        }
        keep
    }
}

/// Builds the rendered group tree from a flat snapshot.
pub fn build_visible_group_tree<'a>(
    groups: &'a [Group],
    selected: Option<&GroupId>,
    expanded: &HashSet<GroupId>,
    sort_mode: SortMode,
    term: &str,
) -> Vec<GroupNode<'a>> {
    GroupGraph::build(groups, sort_mode).visible_nodes(selected, expanded, term)
}

/// Indices that sit on a parent cycle. Each node has at most one parent, so
/// following the links from any start either terminates or closes one loop.
fn cycle_members(parents: &[Option<usize>]) -> Vec<usize> {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; parents.len()];
    let mut members = Vec::new();
    let mut path = Vec::new();
    for start in 0..parents.len() {
        if state[start] != UNSEEN {
            continue;
        }
        path.clear();
        let mut current = Some(start);
        while let Some(idx) = current {
            match state[idx] {
                DONE => break,
                ON_PATH => {
                    if let Some(pos) = path.iter().position(|&seen| seen == idx) {
                        members.extend_from_slice(&path[pos..]);
                    }
                    break;
                }
                _ => {
                    state[idx] = ON_PATH;
                    path.push(idx);
                    current = parents[idx];
                }
            }
        }
        for &idx in &path {
            state[idx] = DONE;
        }
    }
    members.sort_unstable();
    members
}
