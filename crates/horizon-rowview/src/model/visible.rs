//! The flat list of visible rows.
//!
//! A node is visible when every ancestor up to the root is expanded. The
//! visible rows are kept in pre-order, so a node's visible descendants form
//! the contiguous run right after it. Every structural change patches the
//! run it touches instead of rebuilding the list.

use horizon_rowview_core::logging::targets;
use horizon_rowview_core::{Result, RowViewError};

use super::node::{NodeArena, NodeFilters, NodeKey};
use super::path::TreePath;
use super::source::TreeSource;

/// Pre-order list of the records whose ancestors are all expanded.
#[derive(Debug, Clone, Default)]
pub struct VisibleRows {
    rows: Vec<NodeKey>,
}

impl VisibleRows {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of visible rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are visible.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The record shown at `row`.
    pub fn get(&self, row: usize) -> Option<NodeKey> {
        self.rows.get(row).copied()
    }

    /// The row showing `key`, if it is visible.
    pub fn position_of(&self, key: NodeKey) -> Option<usize> {
        self.rows.iter().position(|&row| row == key)
    }

    /// Iterate over the visible records in row order.
    pub fn iter(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.rows.iter().copied()
    }

    /// The visible records as a slice.
    pub fn as_slice(&self) -> &[NodeKey] {
        &self.rows
    }

    /// Forget every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Clear the list and rebuild it from the root.
    pub fn rebuild<T, S>(&mut self, arena: &mut NodeArena<T>, source: &S, filters: &NodeFilters<T>) -> Result<usize>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.rows.clear();
        let root = arena.root();
        self.add_children(arena, source, filters, root)
    }

    /// Insert the children of an expanded `branch` right after it, along
    /// with the children of any descendant that is itself expanded.
    ///
    /// Nothing happens when `branch` is not visible. Returns the number of
    /// rows inserted.
    pub fn add_children<T, S>(
        &mut self,
        arena: &mut NodeArena<T>,
        source: &S,
        filters: &NodeFilters<T>,
        branch: NodeKey,
    ) -> Result<usize>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        let insert_at = if branch == arena.root() {
            0
        } else {
            match self.position_of(branch) {
                Some(row) => row + 1,
                None => return Ok(0),
            }
        };

        arena.ensure_loaded(branch, source, filters)?;
        let mut pending: Vec<NodeKey> = arena.record(branch).children().unwrap_or_default().to_vec();
        pending.reverse();

        let mut added = Vec::new();
        while let Some(key) = pending.pop() {
            added.push(key);
            if arena.record(key).is_expanded() {
                arena.ensure_loaded(key, source, filters)?;
                let children = arena.record(key).children().unwrap_or_default();
                pending.extend(children.iter().rev().copied());
            }
        }

        let count = added.len();
        self.rows.splice(insert_at..insert_at, added);
        tracing::trace!(target: targets::VISIBLE, insert_at, count, "added visible children");
        Ok(count)
    }

    /// Insert child `index` of `branch`, which must already be linked into
    /// the loaded children of `branch` and must not be an expanded branch.
    ///
    /// Returns the row it was inserted at, or `None` when `branch` is
    /// collapsed or hidden.
    pub fn add_child<T>(&mut self, arena: &NodeArena<T>, branch: NodeKey, index: usize) -> Option<usize> {
        let record = arena.record(branch);
        let branch_row = self.position_of(branch);
        let is_root = branch == arena.root();
        if !is_root && !(branch_row.is_some() && record.is_expanded()) {
            return None;
        }

        let children = record
            .children()
            .unwrap_or_else(|| panic!("children of visible branch {branch:?} are not loaded"));
        assert!(index < children.len(), "child index {index} is out of range");
        let key = children[index];

        let mut insert_at = branch_row.map_or(0, |row| row + 1) + index;
        if index > 0 {
            let sibling = children[index - 1];
            let sibling_depth = arena.record(sibling).depth();
            insert_at = self
                .position_of(sibling)
                .unwrap_or_else(|| panic!("sibling {sibling:?} of a visible node is not visible"))
                + 1;
            while insert_at < self.rows.len() && arena.record(self.rows[insert_at]).depth() > sibling_depth {
                insert_at += 1;
            }
        }

        self.rows.insert(insert_at, key);
        tracing::trace!(target: targets::VISIBLE, insert_at, "added visible child");
        Some(insert_at)
    }

    /// Remove `count` children of `branch` starting at `index`, together with
    /// their visible descendants. `count = None` removes every child.
    ///
    /// Nothing happens when the children are unloaded or not visible.
    /// Returns the number of rows removed.
    pub fn remove_children<T>(
        &mut self,
        arena: &NodeArena<T>,
        branch: NodeKey,
        index: usize,
        count: Option<usize>,
    ) -> Result<usize> {
        let Some(children) = arena.record(branch).children() else {
            return Ok(0);
        };

        let count = match count {
            Some(count) => count,
            None => {
                assert_eq!(index, 0, "removing all children must start at index 0");
                children.len()
            }
        };
        let end = index.saturating_add(count);
        if end > children.len() {
            return Err(RowViewError::out_of_bounds(end - 1, children.len()));
        }
        if count == 0 {
            return Ok(0);
        }

        let first = children[index];
        let last = children[end - 1];
        let Some(range_start) = self.position_of(first) else {
            return Ok(0);
        };

        let last_depth = arena.record(last).depth();
        let mut range_end = self
            .position_of(last)
            .unwrap_or_else(|| panic!("last removed child {last:?} is not visible"))
            + 1;
        assert!(range_end > range_start, "visible rows are out of order");
        while range_end < self.rows.len() && arena.record(self.rows[range_end]).depth() > last_depth {
            range_end += 1;
        }

        self.rows.drain(range_start..range_end);
        let removed = range_end - range_start;
        tracing::trace!(target: targets::VISIBLE, range_start, removed, "removed visible children");
        Ok(removed)
    }

    /// Iterate over rows `start..=end`, yielding each row's path.
    pub fn iter_paths<'a, T>(
        &'a self,
        arena: &'a NodeArena<T>,
        start: usize,
        end: usize,
    ) -> Result<VisibleNodeIter<'a, T>> {
        if end >= self.rows.len() {
            return Err(RowViewError::out_of_bounds(end, self.rows.len()));
        }
        if start > end {
            return Err(RowViewError::InvalidRange { start, end });
        }
        Ok(VisibleNodeIter {
            rows: self,
            arena,
            row: start,
            end,
            path: None,
            previous: None,
        })
    }
}

/// Iterator over a run of visible rows that maintains each row's path
/// incrementally from the previous one.
pub struct VisibleNodeIter<'a, T> {
    rows: &'a VisibleRows,
    arena: &'a NodeArena<T>,
    row: usize,
    end: usize,
    path: Option<TreePath>,
    previous: Option<NodeKey>,
}

impl<T> Iterator for VisibleNodeIter<'_, T> {
    type Item = (usize, TreePath, NodeKey);

    fn next(&mut self) -> Option<Self::Item> {
        if self.row > self.end {
            return None;
        }
        let row = self.row;
        let key = self.rows.rows[row];
        self.row += 1;

        let parent = self.arena.record(key).parent();
        if let (Some(path), Some(mut previous)) = (self.path.as_mut(), self.previous) {
            if parent == Some(previous) {
                path.push(0);
            } else {
                while parent != self.arena.record(previous).parent() {
                    path.pop();
                    previous = self
                        .arena
                        .record(previous)
                        .parent()
                        .unwrap_or_else(|| panic!("visible rows are not in pre-order"));
                }
                let tail = path
                    .components_mut()
                    .last_mut()
                    .unwrap_or_else(|| panic!("visible rows are not in pre-order"));
                *tail += 1;
            }
        } else {
            self.path = Some(self.arena.path_of(key));
        }
        self.previous = Some(key);

        let path = self.path.clone().unwrap_or_default();
        Some((row, path, key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end + 1).saturating_sub(self.row);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::source::{TreeItem, TreeModel};

    fn sample() -> TreeModel<String> {
        TreeModel::from_items(vec![
            TreeItem::leaf("A"),
            TreeItem::branch(
                "B",
                vec![
                    TreeItem::leaf("B1"),
                    TreeItem::branch("B2", vec![TreeItem::leaf("B2a"), TreeItem::leaf("B2b")]),
                ],
            ),
            TreeItem::leaf("C"),
        ])
    }

    struct Fixture {
        model: TreeModel<String>,
        arena: NodeArena<String>,
        filters: NodeFilters<String>,
        rows: VisibleRows,
    }

    impl Fixture {
        fn new() -> Self {
            let model = sample();
            let mut arena = NodeArena::new();
            let filters = NodeFilters::default();
            let mut rows = VisibleRows::new();
            rows.rebuild(&mut arena, &model, &filters).unwrap();
            Self {
                model,
                arena,
                filters,
                rows,
            }
        }

        fn key(&mut self, path: &[usize]) -> NodeKey {
            self.arena.resolve(path, &self.model, &self.filters).unwrap()
        }

        fn expand(&mut self, path: &[usize]) {
            let key = self.key(path);
            self.arena.record_mut(key).flags.set_expanded(true);
            self.rows
                .add_children(&mut self.arena, &self.model, &self.filters, key)
                .unwrap();
        }

        fn collapse(&mut self, path: &[usize]) {
            let key = self.key(path);
            self.arena.record_mut(key).flags.set_expanded(false);
            self.rows.remove_children(&self.arena, key, 0, None).unwrap();
        }

        fn names(&self) -> Vec<String> {
            self.rows
                .iter()
                .map(|key| self.arena.record(key).item().unwrap().to_string())
                .collect()
        }
    }

    #[test]
    fn test_initial_rows() {
        let fixture = Fixture::new();
        assert_eq!(fixture.names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_expand_collapse() {
        let mut fixture = Fixture::new();
        fixture.expand(&[1]);
        assert_eq!(fixture.names(), vec!["A", "B", "B1", "B2", "C"]);

        fixture.expand(&[1, 1]);
        assert_eq!(fixture.names(), vec!["A", "B", "B1", "B2", "B2a", "B2b", "C"]);

        fixture.collapse(&[1]);
        assert_eq!(fixture.names(), vec!["A", "B", "C"]);

        // B2 stays expanded, so it reappears with its children.
        fixture.expand(&[1]);
        assert_eq!(fixture.names(), vec!["A", "B", "B1", "B2", "B2a", "B2b", "C"]);
    }

    #[test]
    fn test_add_child_skips_sibling_descendants() {
        let mut fixture = Fixture::new();
        fixture.expand(&[1]);
        fixture.expand(&[1, 1]);

        let root = fixture.arena.root();
        let node = crate::model::SourceNode::leaf(std::sync::Arc::new("D".to_string()));
        fixture.arena.insert_child(root, 2, &node, &fixture.filters).unwrap();
        let row = fixture.rows.add_child(&fixture.arena, root, 2);
        assert_eq!(row, Some(6));
        assert_eq!(fixture.names(), vec!["A", "B", "B1", "B2", "B2a", "B2b", "D", "C"]);
    }

    #[test]
    fn test_add_child_to_collapsed_branch() {
        let mut fixture = Fixture::new();
        let b = fixture.key(&[1]);
        fixture.arena.ensure_loaded(b, &fixture.model, &fixture.filters).unwrap();
        let node = crate::model::SourceNode::leaf(std::sync::Arc::new("B0".to_string()));
        fixture.arena.insert_child(b, 0, &node, &fixture.filters).unwrap();
        assert_eq!(fixture.rows.add_child(&fixture.arena, b, 0), None);
        assert_eq!(fixture.rows.len(), 3);
    }

    #[test]
    fn test_remove_children_with_descendants() {
        let mut fixture = Fixture::new();
        fixture.expand(&[1]);
        fixture.expand(&[1, 1]);

        let root = fixture.arena.root();
        let removed = fixture.rows.remove_children(&fixture.arena, root, 1, Some(1)).unwrap();
        assert_eq!(removed, 5);
        assert_eq!(fixture.names(), vec!["A", "C"]);
    }

    #[test]
    fn test_remove_children_out_of_range() {
        let fixture = Fixture::new();
        let root = fixture.arena.root();
        assert!(matches!(
            fixture.rows.clone().remove_children(&fixture.arena, root, 2, Some(2)),
            Err(RowViewError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_iter_paths() {
        let mut fixture = Fixture::new();
        fixture.expand(&[1]);
        fixture.expand(&[1, 1]);

        let paths: Vec<(usize, TreePath)> = fixture
            .rows
            .iter_paths(&fixture.arena, 0, fixture.rows.len() - 1)
            .unwrap()
            .map(|(row, path, _)| (row, path))
            .collect();
        let expected: Vec<(usize, TreePath)> = vec![
            (0, TreePath::from([0])),
            (1, TreePath::from([1])),
            (2, TreePath::from([1, 0])),
            (3, TreePath::from([1, 1])),
            (4, TreePath::from([1, 1, 0])),
            (5, TreePath::from([1, 1, 1])),
            (6, TreePath::from([2])),
        ];
        assert_eq!(paths, expected);

        let tail: Vec<TreePath> = fixture
            .rows
            .iter_paths(&fixture.arena, 4, 6)
            .unwrap()
            .map(|(_, path, _)| path)
            .collect();
        assert_eq!(tail, vec![TreePath::from([1, 1, 0]), TreePath::from([1, 1, 1]), TreePath::from([2])]);
    }

    #[test]
    fn test_iter_paths_rejects_bad_range() {
        let fixture = Fixture::new();
        assert!(fixture.rows.iter_paths(&fixture.arena, 0, 3).is_err());
        assert!(fixture.rows.iter_paths(&fixture.arena, 2, 1).is_err());
    }
}
