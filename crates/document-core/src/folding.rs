//! Hierarchical code-folding (outlining) regions.
//!
//! A [`FoldingTree`] layers collapsible line ranges over the line store. All
//! nodes live in an arena owned by the tree; a node's parent is a back-index
//! into the arena and children are index lists, so there are no ownership
//! cycles. A synthetic root node spans the whole document and is never
//! collapsed.
//!
//! Invariants maintained here:
//! - sibling ranges are disjoint
//! - a child's range is contained in its parent's range
//! - creation requires a multi-line range (`start_line < end_line`); edits
//!   may truncate a region down to a single surviving line, which is kept

use std::fmt;

/// Index of a folding node inside its tree's arena.
pub type NodeId = usize;

/// The synthetic root node id.
pub const ROOT: NodeId = 0;

/// Folding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldingError {
    /// The proposed region does not nest cleanly within exactly one existing
    /// node's children (it crosses a sibling boundary, duplicates an existing
    /// region, or is degenerate).
    RangeInvalid {
        /// Proposed start line (inclusive).
        start_line: usize,
        /// Proposed end line (inclusive).
        end_line: usize,
    },
}

impl fmt::Display for FoldingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RangeInvalid {
                start_line,
                end_line,
            } => write!(f, "invalid folding range: {}..={}", start_line, end_line),
        }
    }
}

impl std::error::Error for FoldingError {}

/// A collapsible inclusive line range.
#[derive(Debug, Clone)]
pub struct FoldingNode {
    start_line: usize,
    end_line: usize,
    collapsed: bool,
    derived: bool,
    parent: NodeId,
    children: Vec<NodeId>,
}

impl FoldingNode {
    /// First line of the region (inclusive). Stays visible when collapsed.
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// Last line of the region (inclusive).
    pub fn end_line(&self) -> usize {
        self.end_line
    }

    /// Whether the region is collapsed.
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    /// Whether the region came from an automatic (derived) producer rather
    /// than an explicit user action.
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    /// Back-index of the parent node (the root is its own parent).
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Child node ids, sorted by start line.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns `true` if `line` falls within the region.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    fn contains_range(&self, start: usize, end: usize) -> bool {
        self.start_line <= start && end <= self.end_line
    }
}

/// Arena-owned tree of folding regions.
#[derive(Debug)]
pub struct FoldingTree {
    slots: Vec<Option<FoldingNode>>,
    free: Vec<NodeId>,
    line_count: usize,
}

impl FoldingTree {
    /// Create a tree for a document with `line_count` lines.
    pub fn new(line_count: usize) -> Self {
        let line_count = line_count.max(1);
        let root = FoldingNode {
            start_line: 1,
            end_line: line_count,
            collapsed: false,
            derived: false,
            parent: ROOT,
            children: Vec::new(),
        };
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            line_count,
        }
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> Option<&FoldingNode> {
        self.slots.get(id).and_then(|s| s.as_ref())
    }

    fn node_ref(&self, id: NodeId) -> &FoldingNode {
        self.slots[id].as_ref().expect("live node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut FoldingNode {
        self.slots[id].as_mut().expect("live node id")
    }

    /// Number of live regions, excluding the root.
    pub fn region_count(&self) -> usize {
        self.slots
            .iter()
            .skip(1)
            .filter(|slot| slot.is_some())
            .count()
    }

    /// Iterate over all live region ids (excluding the root), in arena order.
    pub fn region_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(id, slot)| slot.as_ref().map(|_| id))
    }

    fn alloc(&mut self, node: FoldingNode) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id] = Some(node);
            id
        } else {
            self.slots.push(Some(node));
            self.slots.len() - 1
        }
    }

    fn insert_child_sorted(&mut self, parent: NodeId, child: NodeId) {
        let start = self.node_ref(child).start_line;
        let pos = {
            let children = &self.node_ref(parent).children;
            children
                .binary_search_by_key(&start, |&c| self.node_ref(c).start_line)
                .unwrap_or_else(|pos| pos)
        };
        self.node_mut(parent).children.insert(pos, child);
    }

    /// Create a new region spanning `start_line..=end_line` (inclusive).
    ///
    /// Fails with [`FoldingError::RangeInvalid`] when the range is degenerate,
    /// out of document bounds, duplicates an existing region, or crosses a
    /// sibling boundary instead of nesting cleanly.
    pub fn create_region(&mut self, start_line: usize, end_line: usize) -> Result<NodeId, FoldingError> {
        self.create_region_impl(start_line, end_line, false)
    }

    /// Create a region tagged as automatically derived (see
    /// [`clear_derived`](Self::clear_derived)).
    pub fn create_derived_region(
        &mut self,
        start_line: usize,
        end_line: usize,
    ) -> Result<NodeId, FoldingError> {
        self.create_region_impl(start_line, end_line, true)
    }

    fn create_region_impl(
        &mut self,
        start_line: usize,
        end_line: usize,
        derived: bool,
    ) -> Result<NodeId, FoldingError> {
        let invalid = FoldingError::RangeInvalid {
            start_line,
            end_line,
        };

        if start_line == 0 || start_line >= end_line || end_line > self.line_count {
            return Err(invalid);
        }

        // Descend to the innermost node whose range contains the new one.
        let mut parent = ROOT;
        loop {
            let mut descend = None;
            for &child in self.node_ref(parent).children.iter() {
                let node = self.node_ref(child);
                if node.start_line == start_line && node.end_line == end_line {
                    return Err(invalid); // duplicate
                }
                if node.contains_range(start_line, end_line) {
                    descend = Some(child);
                    break;
                }
            }
            match descend {
                Some(child) => parent = child,
                None => break,
            }
        }

        // The new range must not partially overlap any child of the parent;
        // children fully inside it are adopted.
        let mut adopted: Vec<NodeId> = Vec::new();
        for &child in self.node_ref(parent).children.iter() {
            let node = self.node_ref(child);
            let disjoint = node.end_line < start_line || node.start_line > end_line;
            if disjoint {
                continue;
            }
            if start_line <= node.start_line && node.end_line <= end_line {
                adopted.push(child);
            } else {
                return Err(invalid); // crosses a sibling boundary
            }
        }

        let id = self.alloc(FoldingNode {
            start_line,
            end_line,
            collapsed: false,
            derived,
            parent,
            children: Vec::new(),
        });

        self.node_mut(parent).children.retain(|c| !adopted.contains(c));
        for child in adopted {
            self.node_mut(child).parent = id;
            self.insert_child_sorted(id, child);
        }
        self.insert_child_sorted(parent, id);
        Ok(id)
    }

    /// Remove a region, re-parenting its children. The root cannot be removed.
    pub fn remove_region(&mut self, id: NodeId) -> bool {
        if id == ROOT || self.node(id).is_none() {
            return false;
        }

        let node = self.slots[id].take().expect("checked");
        self.free.push(id);

        let parent = node.parent;
        self.node_mut(parent).children.retain(|&c| c != id);
        for child in node.children {
            self.node_mut(child).parent = parent;
            self.insert_child_sorted(parent, child);
        }
        true
    }

    /// Find the region with exactly this range, if one exists.
    pub fn region_with_range(&self, start_line: usize, end_line: usize) -> Option<NodeId> {
        self.region_ids().find(|&id| {
            let node = self.node_ref(id);
            node.start_line == start_line && node.end_line == end_line
        })
    }

    /// Collapse a region. Returns `false` when the region was already
    /// collapsed (or is the root, which never collapses).
    pub fn collapse(&mut self, id: NodeId) -> bool {
        if id == ROOT || self.node(id).is_none() {
            return false;
        }
        let node = self.node_mut(id);
        if node.collapsed {
            return false;
        }
        node.collapsed = true;
        true
    }

    /// Expand a region. Returns `false` when the region was already expanded.
    pub fn expand(&mut self, id: NodeId) -> bool {
        if id == ROOT || self.node(id).is_none() {
            return false;
        }
        let node = self.node_mut(id);
        if !node.collapsed {
            return false;
        }
        node.collapsed = false;
        true
    }

    /// Collapse every region, depth-first.
    pub fn collapse_all(&mut self) {
        self.walk_set_collapsed(ROOT, true);
    }

    /// Expand every region, depth-first.
    pub fn expand_all(&mut self) {
        self.walk_set_collapsed(ROOT, false);
    }

    fn walk_set_collapsed(&mut self, id: NodeId, collapsed: bool) {
        let children = self.node_ref(id).children.clone();
        for child in children {
            self.node_mut(child).collapsed = collapsed;
            self.walk_set_collapsed(child, collapsed);
        }
    }

    /// The innermost region containing `line` (the root if none).
    pub fn leaf_region_containing(&self, line: usize) -> NodeId {
        let mut current = ROOT;
        loop {
            let mut descend = None;
            for &child in self.node_ref(current).children.iter() {
                if self.node_ref(child).contains_line(line) {
                    descend = Some(child);
                    break;
                }
            }
            match descend {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// The outermost collapsed region starting at `line`, if any.
    ///
    /// This is the region whose placeholder is rendered on `line`'s row.
    pub fn collapsed_region_starting_at(&self, line: usize) -> Option<NodeId> {
        let mut current = ROOT;
        loop {
            let mut descend = None;
            for &child in self.node_ref(current).children.iter() {
                let node = self.node_ref(child);
                if !node.contains_line(line) {
                    continue;
                }
                if node.start_line == line && node.collapsed {
                    return Some(child);
                }
                descend = Some(child);
                break;
            }
            match descend {
                Some(child) => current = child,
                None => return None,
            }
        }
    }

    /// Returns `true` if `line` is hidden by a collapsed region.
    ///
    /// The start line of a collapsed region stays visible; lines
    /// `start + 1 ..= end` are hidden.
    pub fn is_line_hidden(&self, line: usize) -> bool {
        self.hidden_span_containing(line).is_some()
    }

    /// The outermost collapsed region hiding `line`, if any.
    pub fn hidden_span_containing(&self, line: usize) -> Option<NodeId> {
        let mut current = ROOT;
        loop {
            let mut descend = None;
            for &child in self.node_ref(current).children.iter() {
                let node = self.node_ref(child);
                if !node.contains_line(line) {
                    continue;
                }
                if node.collapsed && line > node.start_line {
                    return Some(child);
                }
                descend = Some(child);
                break;
            }
            match descend {
                Some(child) => current = child,
                None => return None,
            }
        }
    }

    /// Collect the hidden line spans `(first_hidden, last_hidden)` implied by
    /// the outermost collapsed regions, in document order.
    pub fn hidden_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        self.collect_hidden_spans(ROOT, &mut spans);
        spans
    }

    fn collect_hidden_spans(&self, id: NodeId, spans: &mut Vec<(usize, usize)>) {
        for &child in self.node_ref(id).children.iter() {
            let node = self.node_ref(child);
            if node.collapsed {
                if node.end_line > node.start_line {
                    spans.push((node.start_line + 1, node.end_line));
                }
                // Inner regions are already hidden; no need to descend.
            } else {
                self.collect_hidden_spans(child, spans);
            }
        }
    }

    /// Remove every derived region, keeping user regions intact.
    pub fn clear_derived(&mut self) {
        let derived: Vec<NodeId> = self
            .region_ids()
            .filter(|&id| self.node_ref(id).derived)
            .collect();
        for id in derived {
            self.remove_region(id);
        }
    }

    /// Shift regions after lines were inserted by an edit at `at_line`.
    ///
    /// `first_moved` is the first pre-edit line whose number grew by `added`
    /// (the edited line itself when the insertion hit column 1, the following
    /// line otherwise).
    pub fn apply_insert(&mut self, first_moved: usize, added: usize, new_line_count: usize) {
        if added > 0 {
            for id in 0..self.slots.len() {
                let Some(node) = self.slots[id].as_mut() else {
                    continue;
                };
                if id == ROOT {
                    continue;
                }
                if node.start_line >= first_moved {
                    node.start_line += added;
                }
                if node.end_line >= first_moved {
                    node.end_line += added;
                }
            }
        }
        self.set_line_count(new_line_count);
    }

    /// Update regions after lines `removed_first..=removed_last` were removed
    /// by a delete that merged them into line `removed_first - 1`.
    ///
    /// Regions fully consumed by the delete are removed; regions straddling a
    /// boundary are truncated to their surviving portion.
    pub fn apply_delete(&mut self, removed_first: usize, removed_last: usize, new_line_count: usize) {
        if removed_last >= removed_first {
            let keep = removed_first.saturating_sub(1).max(1);
            let count = removed_last - removed_first + 1;

            let map_start = |l: usize| -> usize {
                if l < removed_first {
                    l
                } else if l <= removed_last {
                    keep + 1
                } else {
                    l - count
                }
            };
            let map_end = |l: usize| -> usize {
                if l < removed_first {
                    l
                } else if l <= removed_last {
                    keep
                } else {
                    l - count
                }
            };

            let mut dead: Vec<NodeId> = Vec::new();
            for id in 0..self.slots.len() {
                if id == ROOT {
                    continue;
                }
                let Some(node) = self.slots[id].as_mut() else {
                    continue;
                };
                node.start_line = map_start(node.start_line);
                node.end_line = map_end(node.end_line);
                // Truncation down to a single surviving line keeps the
                // region; only a fully consumed range dies.
                if node.start_line > node.end_line {
                    dead.push(id);
                }
            }
            for id in dead {
                self.remove_region(id);
            }
        }
        self.set_line_count(new_line_count);
    }

    /// Reset the root span after the document's line count changed, clamping
    /// any region that now reaches past the end.
    pub fn set_line_count(&mut self, line_count: usize) {
        self.line_count = line_count.max(1);
        let max_line = self.line_count;
        self.node_mut(ROOT).start_line = 1;
        self.node_mut(ROOT).end_line = max_line;

        let mut dead: Vec<NodeId> = Vec::new();
        for id in 0..self.slots.len() {
            if id == ROOT {
                continue;
            }
            let Some(node) = self.slots[id].as_mut() else {
                continue;
            };
            node.start_line = node.start_line.min(max_line);
            node.end_line = node.end_line.min(max_line);
            if node.start_line > node.end_line {
                dead.push(id);
            }
        }
        for id in dead {
            self.remove_region(id);
        }
    }

    /// Reset the tree to a single root spanning `line_count` lines.
    pub fn clear(&mut self, line_count: usize) {
        *self = Self::new(line_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(tree: &FoldingTree) {
        for id in tree.region_ids() {
            let node = tree.node(id).unwrap();
            assert!(node.start_line() <= node.end_line(), "region {} empty", id);
            let parent = tree.node(node.parent()).unwrap();
            assert!(
                parent.start_line() <= node.start_line() && node.end_line() <= parent.end_line(),
                "region {} escapes its parent",
                id
            );
        }
        // Sibling disjointness.
        for id in tree.region_ids().chain(std::iter::once(ROOT)) {
            let children = tree.node(id).unwrap().children();
            for pair in children.windows(2) {
                let a = tree.node(pair[0]).unwrap();
                let b = tree.node(pair[1]).unwrap();
                assert!(a.end_line() < b.start_line(), "siblings overlap");
            }
        }
    }

    #[test]
    fn test_create_nested_regions() {
        let mut tree = FoldingTree::new(20);
        let outer = tree.create_region(2, 10).unwrap();
        let inner = tree.create_region(3, 6).unwrap();

        assert_eq!(tree.node(inner).unwrap().parent(), outer);
        assert_eq!(tree.node(outer).unwrap().children(), &[inner]);
        assert_invariants(&tree);
    }

    #[test]
    fn test_create_region_adopts_children() {
        let mut tree = FoldingTree::new(20);
        let a = tree.create_region(3, 5).unwrap();
        let b = tree.create_region(7, 9).unwrap();
        let outer = tree.create_region(2, 10).unwrap();

        assert_eq!(tree.node(a).unwrap().parent(), outer);
        assert_eq!(tree.node(b).unwrap().parent(), outer);
        assert_eq!(tree.node(outer).unwrap().parent(), ROOT);
        assert_invariants(&tree);
    }

    #[test]
    fn test_create_region_rejects_crossing() {
        let mut tree = FoldingTree::new(20);
        tree.create_region(2, 8).unwrap();
        let err = tree.create_region(5, 12).unwrap_err();
        assert_eq!(
            err,
            FoldingError::RangeInvalid {
                start_line: 5,
                end_line: 12
            }
        );
    }

    #[test]
    fn test_create_region_rejects_duplicate_and_degenerate() {
        let mut tree = FoldingTree::new(20);
        tree.create_region(2, 8).unwrap();
        assert!(tree.create_region(2, 8).is_err());
        assert!(tree.create_region(4, 4).is_err());
        assert!(tree.create_region(5, 30).is_err());
        assert!(tree.create_region(0, 3).is_err());
    }

    #[test]
    fn test_collapse_is_idempotent_and_hides_lines() {
        let mut tree = FoldingTree::new(10);
        let id = tree.create_region(2, 5).unwrap();

        assert!(tree.collapse(id));
        assert!(!tree.collapse(id)); // already collapsed, no change
        assert!(tree.node(id).unwrap().collapsed());

        assert!(!tree.is_line_hidden(2)); // start line stays visible
        assert!(tree.is_line_hidden(3));
        assert!(tree.is_line_hidden(5));
        assert!(!tree.is_line_hidden(6));

        assert!(tree.expand(id));
        assert!(!tree.is_line_hidden(3));
    }

    #[test]
    fn test_root_never_collapses() {
        let mut tree = FoldingTree::new(5);
        assert!(!tree.collapse(ROOT));
        assert!(!tree.node(ROOT).unwrap().collapsed());
    }

    #[test]
    fn test_leaf_region_containing() {
        let mut tree = FoldingTree::new(20);
        let outer = tree.create_region(2, 10).unwrap();
        let inner = tree.create_region(3, 6).unwrap();

        assert_eq!(tree.leaf_region_containing(4), inner);
        assert_eq!(tree.leaf_region_containing(8), outer);
        assert_eq!(tree.leaf_region_containing(15), ROOT);
    }

    #[test]
    fn test_collapse_all_expand_all() {
        let mut tree = FoldingTree::new(20);
        tree.create_region(2, 10).unwrap();
        tree.create_region(3, 6).unwrap();
        tree.create_region(12, 15).unwrap();

        tree.collapse_all();
        assert!(tree.region_ids().all(|id| tree.node(id).unwrap().collapsed()));

        tree.expand_all();
        assert!(tree.region_ids().all(|id| !tree.node(id).unwrap().collapsed()));
    }

    #[test]
    fn test_hidden_spans_outermost_only() {
        let mut tree = FoldingTree::new(20);
        let outer = tree.create_region(2, 10).unwrap();
        let inner = tree.create_region(3, 6).unwrap();
        tree.collapse(outer);
        tree.collapse(inner);

        assert_eq!(tree.hidden_spans(), vec![(3, 10)]);
    }

    #[test]
    fn test_apply_insert_shifts_regions() {
        let mut tree = FoldingTree::new(10);
        let id = tree.create_region(4, 7).unwrap();

        // Two lines inserted above the region (split at column 1 of line 2).
        tree.apply_insert(2, 2, 12);
        assert_eq!(tree.node(id).unwrap().start_line(), 6);
        assert_eq!(tree.node(id).unwrap().end_line(), 9);
        assert_invariants(&tree);
    }

    #[test]
    fn test_apply_insert_inside_region_grows_it() {
        let mut tree = FoldingTree::new(10);
        let id = tree.create_region(2, 5).unwrap();

        // A newline typed mid-line on line 3 moves lines 4.. down.
        tree.apply_insert(4, 1, 11);
        assert_eq!(tree.node(id).unwrap().start_line(), 2);
        assert_eq!(tree.node(id).unwrap().end_line(), 6);
    }

    #[test]
    fn test_apply_delete_consumes_region() {
        let mut tree = FoldingTree::new(10);
        let id = tree.create_region(4, 6).unwrap();

        // Lines 4..=6 merged into line 3.
        tree.apply_delete(4, 6, 7);
        assert!(tree.node(id).is_none());
        assert_eq!(tree.region_count(), 0);
    }

    #[test]
    fn test_apply_delete_truncates_straddling_region() {
        let mut tree = FoldingTree::new(10);
        let id = tree.create_region(2, 6).unwrap();

        // Lines 5..=8 removed; region keeps its surviving head.
        tree.apply_delete(5, 8, 6);
        let node = tree.node(id).unwrap();
        assert_eq!(node.start_line(), 2);
        assert_eq!(node.end_line(), 4);
        assert_invariants(&tree);
    }

    #[test]
    fn test_apply_delete_keeps_single_line_survivor() {
        let mut tree = FoldingTree::new(10);
        let id = tree.create_region(2, 3).unwrap();

        // Line 3 merged into line 2; the region shrinks to one line but stays.
        tree.apply_delete(3, 3, 9);
        let node = tree.node(id).unwrap();
        assert_eq!(node.start_line(), 2);
        assert_eq!(node.end_line(), 2);
        assert_invariants(&tree);
    }

    #[test]
    fn test_apply_delete_keeps_siblings_disjoint() {
        let mut tree = FoldingTree::new(10);
        let a = tree.create_region(2, 4).unwrap();
        let b = tree.create_region(5, 7).unwrap();

        // Line 5 removed (merged into 4).
        tree.apply_delete(5, 5, 9);
        assert_eq!(tree.node(a).unwrap().end_line(), 4);
        assert_eq!(tree.node(b).unwrap().start_line(), 5);
        assert_eq!(tree.node(b).unwrap().end_line(), 6);
        assert_invariants(&tree);
    }

    #[test]
    fn test_remove_region_reparents_children() {
        let mut tree = FoldingTree::new(20);
        let outer = tree.create_region(2, 10).unwrap();
        let inner = tree.create_region(3, 6).unwrap();

        assert!(tree.remove_region(outer));
        assert_eq!(tree.node(inner).unwrap().parent(), ROOT);
        assert_invariants(&tree);
    }

    #[test]
    fn test_clear_derived_keeps_user_regions() {
        let mut tree = FoldingTree::new(20);
        let user = tree.create_region(2, 5).unwrap();
        tree.create_derived_region(8, 12).unwrap();
        tree.create_derived_region(9, 11).unwrap();

        tree.clear_derived();
        assert_eq!(tree.region_count(), 1);
        assert!(tree.node(user).is_some());
    }

    #[test]
    fn test_collapsed_region_starting_at_prefers_outermost() {
        let mut tree = FoldingTree::new(20);
        let outer = tree.create_region(2, 10).unwrap();
        let inner = tree.create_region(2, 6).unwrap();
        tree.collapse(outer);
        tree.collapse(inner);

        assert_eq!(tree.collapsed_region_starting_at(2), Some(outer));
        assert_eq!(tree.collapsed_region_starting_at(3), None);
    }
}
