//! Selection bookkeeping for list, table and tree indexes.
//!
//! This module provides:
//! - [`RangeSelection`]: a sorted set of disjoint inclusive [`Span`]s, kept
//!   coalesced so adjacent and overlapping spans merge
//! - [`SelectionTracker`]: a `RangeSelection` gated by a [`SelectMode`] and
//!   bounded by a row count, announcing every change through signals
//! - [`PathSelection`]: the same contract for tree paths
//!
//! # Example
//!
//! ```
//! use horizon_rowview::model::{SelectMode, SelectionTracker, Span};
//!
//! let mut selection = SelectionTracker::new(10);
//! selection.set_select_mode(SelectMode::Multi);
//! selection.range_added.connect(|span| println!("added {span}"));
//!
//! selection.add_range(2, 4).unwrap();
//! selection.add_range(5, 6).unwrap();
//! assert_eq!(selection.ranges(), &[Span::new(2, 6)]);
//! ```

use std::fmt;

use horizon_rowview_core::logging::targets;
use horizon_rowview_core::{Result, RowViewError, Signal};

use super::path::TreePath;

// ============================================================================
// Span
// ============================================================================

/// An inclusive range of indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    /// First index, inclusive.
    pub start: usize,
    /// Last index, inclusive.
    pub end: usize,
}

impl Span {
    /// A span covering `start..=end`, with the bounds swapped if reversed.
    pub fn new(start: usize, end: usize) -> Self {
        Self::normalize(start, end)
    }

    /// A span covering one index.
    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// Order two bounds into a span.
    pub fn normalize(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// A span covering `start..=end`, failing if `start > end`.
    pub fn try_new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(RowViewError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of indexes covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always `false`; a span covers at least one index.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `index` lies inside the span.
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// ============================================================================
// Range Selection
// ============================================================================

/// Sorted, disjoint, coalesced spans.
///
/// No two stored spans overlap or touch: adding `[3, 5]` next to `[0, 2]`
/// yields the single span `[0, 5]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSelection {
    spans: Vec<Span>,
}

impl RangeSelection {
    /// An empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored spans, sorted by start.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of stored spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Remove every span.
    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Total number of selected indexes.
    pub fn count(&self) -> usize {
        self.spans.iter().map(Span::len).sum()
    }

    /// Select `start..=end`. Returns the parts that were not selected
    /// before, in order.
    pub fn add_range(&mut self, start: usize, end: usize) -> Vec<Span> {
        let span = Span::normalize(start, end);

        // Spans in i..j overlap or touch the new one.
        let i = self
            .spans
            .partition_point(|s| s.end.saturating_add(1) < span.start);
        let j = self
            .spans
            .partition_point(|s| s.start <= span.end.saturating_add(1));

        if i == j {
            self.spans.insert(i, span);
            return vec![span];
        }

        let lower = self.spans[i];
        let upper = self.spans[j - 1];
        let merged = Span {
            start: span.start.min(lower.start),
            end: span.end.max(upper.end),
        };

        let mut added = Vec::new();
        if span.start < lower.start {
            added.push(Span {
                start: span.start,
                end: lower.start - 1,
            });
        }
        for pair in self.spans[i..j].windows(2) {
            added.push(Span {
                start: pair[0].end + 1,
                end: pair[1].start - 1,
            });
        }
        if span.end > upper.end {
            added.push(Span {
                start: upper.end + 1,
                end: span.end,
            });
        }

        self.spans.splice(i..j, [merged]);
        added
    }

    /// Deselect `start..=end`. Returns the parts that were selected before,
    /// in order.
    pub fn remove_range(&mut self, start: usize, end: usize) -> Vec<Span> {
        let span = Span::normalize(start, end);

        // Spans in i..j intersect the removed one.
        let i = self.spans.partition_point(|s| s.end < span.start);
        let j = self.spans.partition_point(|s| s.start <= span.end);
        if i >= j {
            return Vec::new();
        }

        let removed = self.spans[i..j]
            .iter()
            .map(|s| Span {
                start: s.start.max(span.start),
                end: s.end.min(span.end),
            })
            .collect();

        let lower = self.spans[i];
        let upper = self.spans[j - 1];
        let mut remainder = Vec::with_capacity(2);
        if lower.start < span.start {
            remainder.push(Span {
                start: lower.start,
                end: span.start - 1,
            });
        }
        if upper.end > span.end {
            remainder.push(Span {
                start: span.end + 1,
                end: upper.end,
            });
        }

        self.spans.splice(i..j, remainder);
        removed
    }

    /// Whether `index` is selected.
    pub fn contains_index(&self, index: usize) -> bool {
        let i = self.spans.partition_point(|s| s.end < index);
        self.spans.get(i).is_some_and(|s| s.start <= index)
    }

    /// Shift the selection for one index inserted at `index`. A span that
    /// straddles `index` grows; spans after it move down. Returns the number
    /// of spans that changed.
    pub fn insert_index(&mut self, index: usize) -> usize {
        let mut i = self.spans.partition_point(|s| s.end < index);
        let mut updated = 0;

        if let Some(span) = self.spans.get_mut(i)
            && span.start < index
        {
            span.end += 1;
            updated += 1;
            i += 1;
        }

        for span in &mut self.spans[i..] {
            span.start += 1;
            span.end += 1;
            updated += 1;
        }
        updated
    }

    /// Shift the selection for `count` indexes removed at `index`: the
    /// removed indexes are deselected and later spans move up. Returns the
    /// number of spans that changed.
    pub fn remove_indexes(&mut self, index: usize, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let mut updated = self.remove_range(index, index + count - 1).len();

        let i = self.spans.partition_point(|s| s.end < index);
        assert!(
            !self.spans.get(i).is_some_and(|s| s.start <= index),
            "removed index {index} is still selected"
        );
        for span in &mut self.spans[i..] {
            span.start -= count;
            span.end -= count;
            updated += 1;
        }

        // Removing the indexes between two spans makes them touch.
        self.coalesce();
        updated
    }

    fn coalesce(&mut self) {
        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            match merged.last_mut() {
                Some(last) if last.end.saturating_add(1) >= span.start => {
                    last.end = last.end.max(span.end);
                }
                _ => merged.push(span),
            }
        }
        self.spans = merged;
    }
}

// ============================================================================
// Select Mode
// ============================================================================

/// How many items a view lets the user select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectMode {
    /// Selection is disabled.
    None,
    /// At most one item is selected.
    #[default]
    Single,
    /// Any number of ranges may be selected.
    Multi,
}

fn require_multi(mode: SelectMode) -> Result<()> {
    match mode {
        SelectMode::Multi => Ok(()),
        SelectMode::Single => Err(RowViewError::SingleSelectMode),
        SelectMode::None => Err(RowViewError::SelectionDisabled),
    }
}

// ============================================================================
// Selection Tracker
// ============================================================================

/// Index selection of a flat list or table, kept attached to its items as
/// they are inserted and removed.
pub struct SelectionTracker {
    selection: RangeSelection,
    mode: SelectMode,
    row_count: usize,

    /// Emitted once per newly selected span.
    pub range_added: Signal<Span>,
    /// Emitted once per newly deselected span.
    pub range_removed: Signal<Span>,
    /// Emitted after any change. Args: the previous spans.
    pub ranges_changed: Signal<Vec<Span>>,
}

impl fmt::Debug for SelectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionTracker")
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .field("row_count", &self.row_count)
            .finish()
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SelectionTracker {
    /// A tracker over `row_count` rows in single-select mode.
    pub fn new(row_count: usize) -> Self {
        Self {
            selection: RangeSelection::new(),
            mode: SelectMode::default(),
            row_count,
            range_added: Signal::new(),
            range_removed: Signal::new(),
            ranges_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Mode and bounds
    // =========================================================================

    /// The current select mode.
    pub fn select_mode(&self) -> SelectMode {
        self.mode
    }

    /// Change the select mode. Any selection is cleared first.
    pub fn set_select_mode(&mut self, mode: SelectMode) {
        if self.mode != mode {
            self.clear_selection();
            self.mode = mode;
        }
    }

    /// Number of rows indexes are validated against.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    fn check_span(&self, span: Span) -> Result<()> {
        if span.start > span.end {
            return Err(RowViewError::InvalidRange {
                start: span.start,
                end: span.end,
            });
        }
        if span.end >= self.row_count {
            return Err(RowViewError::out_of_bounds(span.end, self.row_count));
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The selected spans, sorted and coalesced.
    pub fn ranges(&self) -> &[Span] {
        self.selection.spans()
    }

    /// The underlying range selection.
    pub fn selection(&self) -> &RangeSelection {
        &self.selection
    }

    /// Whether row `index` is selected.
    pub fn is_selected(&self, index: usize) -> Result<bool> {
        horizon_rowview_core::check_index(index, self.row_count)?;
        Ok(self.selection.contains_index(index))
    }

    /// The first selected index.
    pub fn selected_index(&self) -> Option<usize> {
        self.selection.spans().first().map(|span| span.start)
    }

    /// Every selected index, ascending.
    pub fn selected_indexes(&self) -> Vec<usize> {
        self.selection
            .spans()
            .iter()
            .flat_map(|span| span.start..=span.end)
            .collect()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Add `start..=end` to the selection. Requires multi-select mode.
    pub fn add_range(&mut self, start: usize, end: usize) -> Result<Vec<Span>> {
        require_multi(self.mode)?;
        let span = Span::normalize(start, end);
        self.check_span(span)?;

        let previous = self.selection.spans().to_vec();
        let added = self.selection.add_range(span.start, span.end);
        for span in &added {
            self.range_added.emit(*span);
        }
        if !added.is_empty() {
            tracing::trace!(target: targets::SELECTION, %span, added = added.len(), "selection range added");
            self.ranges_changed.emit(previous);
        }
        Ok(added)
    }

    /// Remove `start..=end` from the selection. Requires multi-select mode.
    pub fn remove_range(&mut self, start: usize, end: usize) -> Result<Vec<Span>> {
        require_multi(self.mode)?;
        let span = Span::normalize(start, end);
        self.check_span(span)?;

        let previous = self.selection.spans().to_vec();
        let removed = self.selection.remove_range(span.start, span.end);
        for span in &removed {
            self.range_removed.emit(*span);
        }
        if !removed.is_empty() {
            tracing::trace!(target: targets::SELECTION, %span, removed = removed.len(), "selection range removed");
            self.ranges_changed.emit(previous);
        }
        Ok(removed)
    }

    /// Replace the selection with the normalized union of `spans`.
    ///
    /// With select mode `None` only an empty set is accepted; with `Single`
    /// the result must be at most one index. Observers are notified unless
    /// the selection was and stays empty.
    pub fn set_ranges(&mut self, spans: &[Span]) -> Result<Vec<Span>> {
        if self.mode == SelectMode::None && !spans.is_empty() {
            return Err(RowViewError::SelectionDisabled);
        }

        let mut selection = RangeSelection::new();
        for &span in spans {
            self.check_span(span)?;
            selection.add_range(span.start, span.end);
        }
        if self.mode == SelectMode::Single && selection.count() > 1 {
            return Err(RowViewError::SingleSelectMode);
        }

        let previous = std::mem::replace(&mut self.selection, selection);
        if !(previous.is_empty() && self.selection.is_empty()) {
            tracing::trace!(target: targets::SELECTION, spans = self.selection.len(), "selection replaced");
            self.ranges_changed.emit(previous.spans().to_vec());
        }
        Ok(self.selection.spans().to_vec())
    }

    /// Select exactly one index, or nothing.
    pub fn set_selected_index(&mut self, index: Option<usize>) -> Result<()> {
        match index {
            Some(index) => self.set_ranges(&[Span::single(index)])?,
            None => self.set_ranges(&[])?,
        };
        Ok(())
    }

    /// Select every row. Requires multi-select mode.
    pub fn select_all(&mut self) -> Result<()> {
        require_multi(self.mode)?;
        if self.row_count > 0 {
            self.set_ranges(&[Span::new(0, self.row_count - 1)])?;
        }
        Ok(())
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            let previous = std::mem::take(&mut self.selection);
            self.ranges_changed.emit(previous.spans().to_vec());
        }
    }

    // =========================================================================
    // Data changes
    // =========================================================================

    /// `count` rows were inserted at `index`.
    pub fn items_inserted(&mut self, index: usize, count: usize) -> Result<()> {
        if index > self.row_count {
            return Err(RowViewError::out_of_bounds(index, self.row_count + 1));
        }
        let previous = self.selection.spans().to_vec();
        let mut updated = 0;
        for _ in 0..count {
            updated += self.selection.insert_index(index);
        }
        self.row_count += count;
        if updated > 0 {
            self.ranges_changed.emit(previous);
        }
        Ok(())
    }

    /// `count` rows were removed at `index`.
    pub fn items_removed(&mut self, index: usize, count: usize) -> Result<()> {
        let end = index.saturating_add(count);
        if end > self.row_count {
            return Err(RowViewError::out_of_bounds(end.saturating_sub(1), self.row_count));
        }
        let previous = self.selection.spans().to_vec();
        let updated = self.selection.remove_indexes(index, count);
        self.row_count -= count;
        if updated > 0 {
            self.ranges_changed.emit(previous);
        }
        Ok(())
    }

    /// Every row was removed.
    pub fn items_cleared(&mut self) {
        self.clear_selection();
        self.row_count = 0;
    }

    /// Rows were reordered; positions no longer identify the same items.
    pub fn items_sorted(&mut self) {
        self.clear_selection();
    }

    /// The data was replaced with `row_count` new rows.
    pub fn reset(&mut self, row_count: usize) {
        self.clear_selection();
        self.row_count = row_count;
    }
}

// ============================================================================
// Path Selection
// ============================================================================

/// Selected tree paths, kept sorted and attached to their nodes as siblings
/// are inserted and removed.
pub struct PathSelection {
    paths: Vec<TreePath>,
    mode: SelectMode,

    /// Emitted when a path is added.
    pub path_added: Signal<TreePath>,
    /// Emitted when a path is removed.
    pub path_removed: Signal<TreePath>,
    /// Emitted after any change. Args: the previous paths.
    pub paths_changed: Signal<Vec<TreePath>>,
}

impl fmt::Debug for PathSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSelection")
            .field("paths", &self.paths)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Default for PathSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl PathSelection {
    /// An empty selection in single-select mode.
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            mode: SelectMode::default(),
            path_added: Signal::new(),
            path_removed: Signal::new(),
            paths_changed: Signal::new(),
        }
    }

    /// The current select mode.
    pub fn select_mode(&self) -> SelectMode {
        self.mode
    }

    /// Change the select mode. Any selection is cleared first.
    pub fn set_select_mode(&mut self, mode: SelectMode) {
        if self.mode != mode {
            self.clear();
            self.mode = mode;
        }
    }

    /// The selected paths in tree order.
    pub fn paths(&self) -> &[TreePath] {
        &self.paths
    }

    /// The first selected path.
    pub fn selected_path(&self) -> Option<&TreePath> {
        self.paths.first()
    }

    /// Whether `path` is selected.
    pub fn contains(&self, path: &TreePath) -> bool {
        self.paths.binary_search(path).is_ok()
    }

    /// Whether some strict descendant of `path` is selected.
    pub fn has_descendant(&self, path: &TreePath) -> bool {
        // Descendants sort right after their ancestor.
        let i = self.paths.partition_point(|p| p <= path);
        self.paths.get(i).is_some_and(|next| path.is_ancestor_of(next))
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Add `path`. Requires multi-select mode. Returns whether it was new.
    pub fn add_path(&mut self, path: TreePath) -> Result<bool> {
        require_multi(self.mode)?;
        let Err(position) = self.paths.binary_search(&path) else {
            return Ok(false);
        };
        let previous = self.paths.clone();
        self.paths.insert(position, path.clone());
        self.path_added.emit(path);
        self.paths_changed.emit(previous);
        Ok(true)
    }

    /// Remove `path`. Requires multi-select mode. Returns whether it was
    /// selected.
    pub fn remove_path(&mut self, path: &TreePath) -> Result<bool> {
        require_multi(self.mode)?;
        let Ok(position) = self.paths.binary_search(path) else {
            return Ok(false);
        };
        let previous = self.paths.clone();
        let removed = self.paths.remove(position);
        self.path_removed.emit(removed);
        self.paths_changed.emit(previous);
        Ok(true)
    }

    /// Replace the selection. Duplicates collapse; the root path is not a
    /// selectable node.
    pub fn set_paths(&mut self, paths: &[TreePath]) -> Result<Vec<TreePath>> {
        if self.mode == SelectMode::None && !paths.is_empty() {
            return Err(RowViewError::SelectionDisabled);
        }
        if let Some(root) = paths.iter().find(|path| path.is_root()) {
            return Err(RowViewError::invalid_path(root.as_slice()));
        }

        let mut sorted = paths.to_vec();
        sorted.sort();
        sorted.dedup();
        if self.mode == SelectMode::Single && sorted.len() > 1 {
            return Err(RowViewError::SingleSelectMode);
        }

        let previous = std::mem::replace(&mut self.paths, sorted);
        if !(previous.is_empty() && self.paths.is_empty()) {
            self.paths_changed.emit(previous);
        }
        Ok(self.paths.clone())
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        if !self.paths.is_empty() {
            let previous = std::mem::take(&mut self.paths);
            self.paths_changed.emit(previous);
        }
    }

    // =========================================================================
    // Tree changes
    // =========================================================================

    /// A node was inserted at `index` under `parent`: later siblings and
    /// their descendants shift by one.
    pub fn node_inserted(&mut self, parent: &TreePath, index: usize) {
        let depth = parent.depth();
        let previous = self.paths.clone();
        let mut updated = false;
        for path in &mut self.paths {
            if parent.is_ancestor_of(path) && path.as_slice()[depth] >= index {
                path.components_mut()[depth] += 1;
                updated = true;
            }
        }
        if updated {
            self.paths_changed.emit(previous);
        }
    }

    /// `count` nodes were removed at `index` under `parent`: their subtrees
    /// are deselected and later siblings shift up.
    pub fn nodes_removed(&mut self, parent: &TreePath, index: usize, count: usize) {
        let depth = parent.depth();
        let previous = self.paths.clone();
        let before = self.paths.len();
        self.paths.retain(|path| {
            !(parent.is_ancestor_of(path) && (index..index + count).contains(&path.as_slice()[depth]))
        });
        let mut updated = self.paths.len() != before;
        for path in &mut self.paths {
            if parent.is_ancestor_of(path) && path.as_slice()[depth] >= index + count {
                path.components_mut()[depth] -= count;
                updated = true;
            }
        }
        if updated {
            self.paths_changed.emit(previous);
        }
    }

    /// The node at `index` under `parent` was replaced: its subtree is
    /// deselected.
    pub fn node_replaced(&mut self, parent: &TreePath, index: usize) {
        let child = parent.child(index);
        self.clear_where(|path| *path == child || child.is_ancestor_of(path));
    }

    /// Every descendant of `parent` is deselected.
    pub fn descendants_cleared(&mut self, parent: &TreePath) {
        self.clear_where(|path| parent.is_ancestor_of(path));
    }

    fn clear_where(&mut self, predicate: impl Fn(&TreePath) -> bool) {
        if !self.paths.iter().any(&predicate) {
            return;
        }
        let previous = self.paths.clone();
        self.paths.retain(|path| !predicate(path));
        self.paths_changed.emit(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn spans(pairs: &[(usize, usize)]) -> Vec<Span> {
        pairs.iter().map(|&(s, e)| Span::new(s, e)).collect()
    }

    #[test]
    fn test_add_range_merges_adjacent() {
        let mut selection = RangeSelection::new();
        assert_eq!(selection.add_range(0, 2), spans(&[(0, 2)]));
        assert_eq!(selection.add_range(3, 5), spans(&[(3, 5)]));
        assert_eq!(selection.spans(), &spans(&[(0, 5)])[..]);
    }

    #[test]
    fn test_add_range_reports_gaps() {
        let mut selection = RangeSelection::new();
        selection.add_range(2, 3);
        selection.add_range(6, 7);
        selection.add_range(10, 10);

        let added = selection.add_range(0, 8);
        assert_eq!(added, spans(&[(0, 1), (4, 5), (8, 8)]));
        assert_eq!(selection.spans(), &spans(&[(0, 8), (10, 10)])[..]);
    }

    #[test]
    fn test_add_range_already_selected() {
        let mut selection = RangeSelection::new();
        selection.add_range(0, 9);
        assert!(selection.add_range(3, 4).is_empty());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_add_range_reversed_bounds() {
        let mut selection = RangeSelection::new();
        selection.add_range(7, 4);
        assert_eq!(selection.spans(), &[Span { start: 4, end: 7 }]);
    }

    #[test]
    fn test_remove_range_splits() {
        let mut selection = RangeSelection::new();
        selection.add_range(0, 9);
        assert_eq!(selection.remove_range(3, 5), spans(&[(3, 5)]));
        assert_eq!(selection.spans(), &spans(&[(0, 2), (6, 9)])[..]);
    }

    #[test]
    fn test_remove_range_across_spans() {
        let mut selection = RangeSelection::new();
        selection.add_range(0, 2);
        selection.add_range(5, 6);
        selection.add_range(9, 12);

        let removed = selection.remove_range(1, 10);
        assert_eq!(removed, spans(&[(1, 2), (5, 6), (9, 10)]));
        assert_eq!(selection.spans(), &spans(&[(0, 0), (11, 12)])[..]);
        assert!(selection.remove_range(3, 4).is_empty());
    }

    #[test]
    fn test_contains_index() {
        let mut selection = RangeSelection::new();
        selection.add_range(2, 4);
        selection.add_range(8, 8);
        assert!(selection.contains_index(3));
        assert!(selection.contains_index(8));
        assert!(!selection.contains_index(5));
        assert!(!selection.contains_index(9));
    }

    #[test]
    fn test_insert_index() {
        let mut selection = RangeSelection::new();
        selection.add_range(2, 4);
        selection.add_range(8, 9);

        assert_eq!(selection.insert_index(3), 2);
        assert_eq!(selection.spans(), &spans(&[(2, 5), (9, 10)])[..]);

        assert_eq!(selection.insert_index(0), 2);
        assert_eq!(selection.spans(), &spans(&[(3, 6), (10, 11)])[..]);

        assert_eq!(selection.insert_index(20), 0);
    }

    #[test]
    fn test_remove_indexes() {
        let mut selection = RangeSelection::new();
        selection.add_range(2, 4);
        selection.add_range(8, 9);

        selection.remove_indexes(3, 2);
        assert_eq!(selection.spans(), &spans(&[(2, 2), (6, 7)])[..]);

        // Removing the gap joins the neighbours.
        selection.remove_indexes(3, 3);
        assert_eq!(selection.spans(), &spans(&[(2, 4)])[..]);
    }

    #[test]
    fn test_tracker_mode_gating() {
        let mut tracker = SelectionTracker::new(10);
        assert!(matches!(tracker.add_range(0, 1), Err(RowViewError::SingleSelectMode)));

        tracker.set_select_mode(SelectMode::None);
        assert!(matches!(tracker.add_range(0, 1), Err(RowViewError::SelectionDisabled)));
        assert!(matches!(
            tracker.set_ranges(&[Span::single(1)]),
            Err(RowViewError::SelectionDisabled)
        ));
        assert!(tracker.set_ranges(&[]).is_ok());
    }

    #[test]
    fn test_tracker_single_mode() {
        let mut tracker = SelectionTracker::new(10);
        tracker.set_selected_index(Some(4)).unwrap();
        assert_eq!(tracker.selected_index(), Some(4));
        assert!(matches!(
            tracker.set_ranges(&[Span::new(1, 2)]),
            Err(RowViewError::SingleSelectMode)
        ));
        assert_eq!(tracker.selected_index(), Some(4));
    }

    #[test]
    fn test_tracker_bounds() {
        let mut tracker = SelectionTracker::new(5);
        tracker.set_select_mode(SelectMode::Multi);
        assert!(matches!(
            tracker.add_range(3, 5),
            Err(RowViewError::IndexOutOfBounds { index: 5, len: 5 })
        ));
        assert!(matches!(
            tracker.set_ranges(&[Span { start: 3, end: 1 }]),
            Err(RowViewError::InvalidRange { start: 3, end: 1 })
        ));
        assert!(tracker.is_selected(5).is_err());
    }

    #[test]
    fn test_tracker_notifications() {
        let mut tracker = SelectionTracker::new(20);
        tracker.set_select_mode(SelectMode::Multi);

        let added = Arc::new(Mutex::new(Vec::new()));
        let changes = Arc::new(Mutex::new(Vec::new()));
        let added_clone = added.clone();
        let changes_clone = changes.clone();
        tracker.range_added.connect(move |span| added_clone.lock().push(*span));
        tracker
            .ranges_changed
            .connect(move |previous| changes_clone.lock().push(previous.clone()));

        tracker.add_range(2, 3).unwrap();
        tracker.add_range(6, 7).unwrap();
        tracker.add_range(0, 8).unwrap();
        assert_eq!(*added.lock(), spans(&[(2, 3), (6, 7), (0, 1), (4, 5), (8, 8)]));
        assert_eq!(changes.lock().len(), 3);
        assert_eq!(changes.lock()[2], spans(&[(2, 3), (6, 7)]));

        // Nothing new: no notification.
        tracker.add_range(1, 2).unwrap();
        assert_eq!(changes.lock().len(), 3);
    }

    #[test]
    fn test_set_ranges_empty_notifies_when_previously_selected() {
        let mut tracker = SelectionTracker::new(10);
        let changes = Arc::new(Mutex::new(0));
        let changes_clone = changes.clone();
        tracker.ranges_changed.connect(move |_| *changes_clone.lock() += 1);

        tracker.set_ranges(&[]).unwrap();
        assert_eq!(*changes.lock(), 0);

        tracker.set_selected_index(Some(3)).unwrap();
        tracker.set_ranges(&[]).unwrap();
        assert_eq!(*changes.lock(), 2);
        assert!(tracker.ranges().is_empty());
    }

    #[test]
    fn test_set_ranges_idempotent() {
        let mut tracker = SelectionTracker::new(30);
        tracker.set_select_mode(SelectMode::Multi);
        let input = spans(&[(9, 7), (1, 2), (3, 4), (20, 25), (22, 29)]);
        let once = tracker.set_ranges(&input).unwrap();
        let twice = tracker.set_ranges(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, spans(&[(1, 4), (7, 9), (20, 29)]));
    }

    #[test]
    fn test_select_mode_change_clears() {
        let mut tracker = SelectionTracker::new(10);
        tracker.set_select_mode(SelectMode::Multi);
        tracker.add_range(1, 5).unwrap();
        tracker.set_select_mode(SelectMode::Single);
        assert!(tracker.ranges().is_empty());
    }

    #[test]
    fn test_tracker_follows_items() {
        let mut tracker = SelectionTracker::new(10);
        tracker.set_select_mode(SelectMode::Multi);
        tracker.add_range(4, 6).unwrap();

        tracker.items_inserted(0, 2).unwrap();
        assert_eq!(tracker.ranges(), &spans(&[(6, 8)])[..]);
        assert_eq!(tracker.row_count(), 12);

        tracker.items_removed(7, 3).unwrap();
        assert_eq!(tracker.ranges(), &spans(&[(6, 6)])[..]);
        assert_eq!(tracker.row_count(), 9);

        tracker.items_sorted();
        assert!(tracker.ranges().is_empty());
        assert!(tracker.items_removed(8, 2).is_err());
    }

    #[test]
    fn test_path_selection_modes() {
        let mut selection = PathSelection::new();
        assert!(matches!(
            selection.add_path(TreePath::from([0])),
            Err(RowViewError::SingleSelectMode)
        ));
        selection.set_paths(&[TreePath::from([1, 0])]).unwrap();
        assert!(selection.contains(&TreePath::from([1, 0])));
        assert!(matches!(
            selection.set_paths(&[TreePath::from([0]), TreePath::from([1])]),
            Err(RowViewError::SingleSelectMode)
        ));
        assert!(selection.set_paths(&[TreePath::root()]).is_err());

        selection.set_select_mode(SelectMode::Multi);
        assert!(selection.is_empty());
        assert!(selection.add_path(TreePath::from([2])).unwrap());
        assert!(!selection.add_path(TreePath::from([2])).unwrap());
        assert!(selection.add_path(TreePath::from([0])).unwrap());
        assert_eq!(selection.paths(), &[TreePath::from([0]), TreePath::from([2])]);
        assert!(selection.remove_path(&TreePath::from([0])).unwrap());
        assert!(!selection.remove_path(&TreePath::from([0])).unwrap());

        selection.add_path(TreePath::from([2, 1, 0])).unwrap();
        assert!(selection.has_descendant(&TreePath::from([2])));
        assert!(selection.has_descendant(&TreePath::from([2, 1])));
        assert!(!selection.has_descendant(&TreePath::from([2, 1, 0])));
        assert!(!selection.has_descendant(&TreePath::from([1])));
    }

    #[test]
    fn test_path_selection_follows_tree() {
        let mut selection = PathSelection::new();
        selection.set_select_mode(SelectMode::Multi);
        selection
            .set_paths(&[
                TreePath::from([0]),
                TreePath::from([1, 0]),
                TreePath::from([1, 2, 0]),
                TreePath::from([2]),
            ])
            .unwrap();

        selection.node_inserted(&TreePath::from([1]), 1);
        assert_eq!(
            selection.paths(),
            &[
                TreePath::from([0]),
                TreePath::from([1, 0]),
                TreePath::from([1, 3, 0]),
                TreePath::from([2]),
            ]
        );

        selection.nodes_removed(&TreePath::root(), 0, 1);
        assert_eq!(
            selection.paths(),
            &[TreePath::from([0, 0]), TreePath::from([0, 3, 0]), TreePath::from([1])]
        );

        selection.node_replaced(&TreePath::from([0]), 3);
        assert_eq!(selection.paths(), &[TreePath::from([0, 0]), TreePath::from([1])]);

        selection.descendants_cleared(&TreePath::from([0]));
        assert_eq!(selection.paths(), &[TreePath::from([1])]);
    }
}
