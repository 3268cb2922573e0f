//! Row index for tree views.
//!
//! [`TreeIndex`] answers the geometry and state questions a tree view's
//! painter and input handler ask: which node is at this y, where is this
//! node, which rows intersect the viewport, which nodes are selected,
//! checked or disabled. It owns no widget and draws nothing.
//!
//! The index reads its [`TreeSource`] lazily. Branch children are loaded
//! the first time a branch is expanded or a path through it is resolved.
//! Afterwards the index follows the source only through [`TreeEvent`]s,
//! applied with [`TreeIndex::apply`] or [`TreeIndex::sync`] in the order
//! they were emitted. Apply pending events before calling anything that
//! takes a source, since those calls may load children from the source's
//! current state.
//!
//! # Example
//!
//! ```
//! use horizon_rowview::model::{EventQueue, TreeItem, TreeModel, TreePath, UniformHeight};
//! use horizon_rowview::view::TreeIndex;
//!
//! let model = TreeModel::<String>::from_items(vec![
//!     TreeItem::leaf("A"),
//!     TreeItem::branch("B", vec![TreeItem::leaf("B1"), TreeItem::leaf("B2")]),
//!     TreeItem::leaf("C"),
//! ]);
//! let queue = EventQueue::attach(&model);
//!
//! let mut index = TreeIndex::new();
//! index.set_tree_data(&model).unwrap();
//! index.expand(&model, &TreePath::from([1])).unwrap();
//! assert_eq!(index.row_count(), 5);
//!
//! model.remove(&TreePath::from([1]), 0, 1).unwrap();
//! index.sync(&model, &queue).unwrap();
//! assert_eq!(index.row_count(), 4);
//!
//! index.layout(&UniformHeight(20), 200).unwrap();
//! assert_eq!(index.node_at(45).unwrap(), Some(TreePath::from([1, 0])));
//! ```

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use horizon_rowview_core::logging::targets;
use horizon_rowview_core::{DebugRow, PerfSpan, Result, RowTreeDebug, RowViewError, Signal, check_index};

use crate::config::{CheckboxMetrics, LayoutConfig, RowSizing};
use crate::model::{
    Bounds, CheckState, EventQueue, ItemFilter, MeasureContext, NodeArena, NodeFilters, NodeFlags, NodeKey,
    OffsetTable, PathSelection, RowMeasure, SelectMode, TreeEvent, TreePath, TreeSource, VisibleNodeIter,
    VisibleRows, measure_row, visible_range,
};

/// Geometry and state index for a tree view.
///
/// # Signals
///
/// - `branch_expanded(TreePath)`: a branch was expanded
/// - `branch_collapsed(TreePath)`: a branch was collapsed
/// - `check_state_changed((TreePath, CheckState))`: a node's check state
///   changed; carries the previous state
///
/// Selection signals live on [`selection`](Self::selection).
pub struct TreeIndex<T> {
    // Node state
    arena: NodeArena<T>,
    rows: VisibleRows,
    filters: NodeFilters<T>,
    has_data: bool,

    // Layout
    config: LayoutConfig,
    checkbox: CheckboxMetrics,
    offsets: OffsetTable,
    width: u32,
    layout_valid: bool,

    // Interaction state
    selection: PathSelection,
    checked: PathSelection,
    show_mixed_checkmark_state: bool,
    highlighted: Option<NodeKey>,

    // Signals
    /// Emitted after a branch is expanded.
    pub branch_expanded: Signal<TreePath>,
    /// Emitted after a branch is collapsed.
    pub branch_collapsed: Signal<TreePath>,
    /// Emitted when a node's check state changes. Args: (path, previous).
    pub check_state_changed: Signal<(TreePath, CheckState)>,
}

impl<T> fmt::Debug for TreeIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeIndex")
            .field("rows", &self.rows.len())
            .field("records", &self.arena.len())
            .field("has_data", &self.has_data)
            .field("layout_valid", &self.layout_valid)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T> Default for TreeIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeIndex<T> {
    /// An index with the default configuration and no data.
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    /// An index with `config` and no data.
    pub fn with_config(config: LayoutConfig) -> Self {
        let mut checked = PathSelection::new();
        checked.set_select_mode(SelectMode::Multi);

        Self {
            arena: NodeArena::new(),
            rows: VisibleRows::new(),
            filters: NodeFilters::default(),
            has_data: false,
            checkbox: config.checkmarks.unwrap_or_default(),
            config,
            offsets: OffsetTable::empty(),
            width: 0,
            layout_valid: false,
            selection: PathSelection::new(),
            checked,
            show_mixed_checkmark_state: false,
            highlighted: None,
            branch_expanded: Signal::new(),
            branch_collapsed: Signal::new(),
            check_state_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// The layout configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the layout configuration. Disabling checkmarks unchecks
    /// every node.
    pub fn set_config(&mut self, config: LayoutConfig) {
        if let Some(metrics) = config.checkmarks {
            self.checkbox = metrics;
        }
        let checkmarks_enabled = config.checkmarks_enabled();
        self.config = config;
        if !checkmarks_enabled {
            self.checked.clear();
            self.arena.clear_flags(NodeFlags::CHECK_STATE);
        }
        self.invalidate_layout();
    }

    // =========================================================================
    // Tree Data
    // =========================================================================

    /// Install `source` as the tree data, discarding every record, the
    /// selection and the check states, and rebuild the visible rows.
    pub fn set_tree_data<S>(&mut self, source: &S) -> Result<()>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.reload(source)
    }

    /// Forget the tree data.
    pub fn clear_tree_data(&mut self) {
        self.arena.new_root();
        self.rows.clear();
        self.selection.clear();
        self.checked.clear();
        self.highlighted = None;
        self.has_data = false;
        self.invalidate_layout();
    }

    /// Whether tree data is installed.
    pub fn has_data(&self) -> bool {
        self.has_data
    }

    fn require_data(&self) -> Result<()> {
        if self.has_data { Ok(()) } else { Err(RowViewError::NoData) }
    }

    fn reload<S>(&mut self, source: &S) -> Result<()>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.arena.new_root();
        self.highlighted = None;
        self.selection.clear();
        self.checked.clear();
        self.has_data = true;
        self.invalidate_layout();

        let count = self.rows.rebuild(&mut self.arena, source, &self.filters)?;
        tracing::debug!(target: targets::VISIBLE, rows = count, "tree data reloaded");
        Ok(())
    }

    /// The record arena.
    pub fn arena(&self) -> &NodeArena<T> {
        &self.arena
    }

    /// The visible rows, in pre-order.
    pub fn visible_rows(&self) -> &VisibleRows {
        &self.rows
    }

    /// Number of visible rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    // =========================================================================
    // Expand/Collapse
    // =========================================================================

    /// Whether the branch at `path` is expanded. Unmaterialized nodes are
    /// collapsed.
    pub fn is_expanded(&self, path: &TreePath) -> Result<bool> {
        self.require_data()?;
        Ok(self
            .arena
            .find(path.as_slice())?
            .is_some_and(|key| self.arena.record(key).is_expanded()))
    }

    /// Expand the branch at `path`, loading its children if needed.
    ///
    /// Returns `false` if it was already expanded. A branch under a
    /// collapsed ancestor is marked expanded but adds no rows until the
    /// ancestor is expanded too.
    pub fn expand<S>(&mut self, source: &S, path: &TreePath) -> Result<bool>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.require_data()?;
        if path.is_root() {
            return Ok(false);
        }
        let key = self.arena.resolve(path.as_slice(), source, &self.filters)?;
        let record = self.arena.record(key);
        if !record.is_branch() {
            return Err(RowViewError::not_a_branch(path.as_slice()));
        }
        if record.is_expanded() {
            return Ok(false);
        }

        self.arena.ensure_loaded(key, source, &self.filters)?;
        self.arena.record_mut(key).flags.set_expanded(true);
        let added = self.rows.add_children(&mut self.arena, source, &self.filters, key)?;
        self.invalidate_layout();

        tracing::trace!(target: targets::VISIBLE, %path, added, "branch expanded");
        self.branch_expanded.emit(path.clone());
        Ok(true)
    }

    /// Collapse the branch at `path`. Returns `false` if it was already
    /// collapsed.
    pub fn collapse<S>(&mut self, source: &S, path: &TreePath) -> Result<bool>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.require_data()?;
        if path.is_root() {
            return Ok(false);
        }
        let key = self.arena.resolve(path.as_slice(), source, &self.filters)?;
        let record = self.arena.record(key);
        if !record.is_branch() {
            return Err(RowViewError::not_a_branch(path.as_slice()));
        }
        if !record.is_expanded() {
            return Ok(false);
        }

        let removed = self.rows.remove_children(&self.arena, key, 0, None)?;
        self.arena.record_mut(key).flags.set_expanded(false);
        if let Some(highlighted) = self.highlighted
            && self.rows.position_of(highlighted).is_none()
        {
            self.set_highlighted_key(None);
        }
        self.invalidate_layout();

        tracing::trace!(target: targets::VISIBLE, %path, removed, "branch collapsed");
        self.branch_collapsed.emit(path.clone());
        Ok(true)
    }

    /// Expand or collapse the branch at `path`. Returns the new state.
    pub fn toggle<S>(&mut self, source: &S, path: &TreePath) -> Result<bool>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        if self.is_expanded(path)? {
            self.collapse(source, path)?;
            Ok(false)
        } else {
            self.expand(source, path)?;
            Ok(true)
        }
    }

    /// Expand every ancestor of `path` so the node becomes visible.
    pub fn expand_to<S>(&mut self, source: &S, path: &TreePath) -> Result<()>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        let components = path.as_slice();
        for depth in 1..components.len() {
            self.expand(source, &TreePath::from(&components[..depth]))?;
        }
        Ok(())
    }

    // =========================================================================
    // Data Changes
    // =========================================================================

    /// Patch the index for one change of the source.
    ///
    /// Changes inside branches whose children were never loaded are
    /// ignored; those branches load the current state when first needed.
    pub fn apply<S>(&mut self, source: &S, event: &TreeEvent<T>) -> Result<()>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.require_data()?;
        match event {
            TreeEvent::NodeInserted { parent, index, node } => {
                let branch = self.loaded_branch(parent)?;
                if let Some(branch) = branch {
                    let len = self.loaded_child_count(branch);
                    if *index > len {
                        return Err(RowViewError::out_of_bounds(*index, len + 1));
                    }
                }
                self.selection.node_inserted(parent, *index);
                self.checked.node_inserted(parent, *index);
                if let Some(branch) = branch {
                    self.arena.insert_child(branch, *index, node, &self.filters)?;
                    self.rows.add_child(&self.arena, branch, *index);
                }
            }
            TreeEvent::NodesRemoved { parent, index, count } => {
                let branch = self.loaded_branch(parent)?;
                if let Some(branch) = branch {
                    let len = self.loaded_child_count(branch);
                    let end = index.saturating_add(*count);
                    if end > len {
                        return Err(RowViewError::out_of_bounds(end - 1, len));
                    }
                }
                self.selection.nodes_removed(parent, *index, *count);
                self.checked.nodes_removed(parent, *index, *count);
                if let Some(branch) = branch {
                    self.rows.remove_children(&self.arena, branch, *index, Some(*count))?;
                    self.arena.remove_children(branch, *index, *count)?;
                }
            }
            TreeEvent::NodeUpdated { parent, index, node } => {
                if let Some(branch) = self.loaded_branch(parent)? {
                    let children = self.arena.record(branch).children().unwrap_or_default();
                    let current = *children
                        .get(*index)
                        .ok_or_else(|| RowViewError::out_of_bounds(*index, children.len()))?;
                    let record = self.arena.record(current);
                    let unchanged = record.is_branch() == node.is_branch
                        && record.item().is_some_and(|item| Arc::ptr_eq(item, &node.item));

                    if unchanged {
                        let flags = &mut self.arena.record_mut(current).flags;
                        flags.set_disabled(self.filters.is_disabled(&node.item));
                        flags.set_checkmark_disabled(self.filters.is_checkmark_disabled(&node.item));
                    } else {
                        self.selection.node_replaced(parent, *index);
                        self.checked.node_replaced(parent, *index);
                        self.rows.remove_children(&self.arena, branch, *index, Some(1))?;
                        self.arena.replace_child(branch, *index, node, &self.filters)?;
                        self.rows.add_child(&self.arena, branch, *index);
                    }
                }
            }
            TreeEvent::NodesCleared { parent } => {
                self.selection.descendants_cleared(parent);
                self.checked.descendants_cleared(parent);
                if let Some(branch) = self.loaded_branch(parent)? {
                    self.rows.remove_children(&self.arena, branch, 0, None)?;
                    self.arena.load_from(branch, &[], &self.filters);
                }
            }
            TreeEvent::NodesSorted { parent, children } => {
                self.selection.descendants_cleared(parent);
                self.checked.descendants_cleared(parent);
                if let Some(branch) = self.loaded_branch(parent)? {
                    self.rows.remove_children(&self.arena, branch, 0, None)?;
                    self.arena.load_from(branch, children, &self.filters);
                    if self.arena.record(branch).is_expanded() {
                        self.rows.add_children(&mut self.arena, source, &self.filters, branch)?;
                    }
                }
            }
            TreeEvent::Reset => return self.reload(source),
        }

        if let Some(highlighted) = self.highlighted
            && !self.arena.contains(highlighted)
        {
            self.highlighted = None;
        }
        self.refresh_state_flags();
        self.invalidate_layout();
        Ok(())
    }

    /// Apply every event buffered in `queue`, oldest first. Returns the
    /// number of events applied.
    ///
    /// A [`TreeEvent::Reset`] reloads from the source's current state, which
    /// already reflects every later event, so the rest are dropped.
    pub fn sync<S>(&mut self, source: &S, queue: &EventQueue<T>) -> Result<usize>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        let mut applied = 0;
        for event in queue.drain() {
            self.apply(source, &event)?;
            applied += 1;
            if matches!(event, TreeEvent::Reset) {
                break;
            }
        }
        tracing::trace!(target: targets::VISIBLE, applied, "tree events applied");
        Ok(applied)
    }

    /// The record for `parent` if its children are loaded.
    fn loaded_branch(&self, parent: &TreePath) -> Result<Option<NodeKey>> {
        let Some(key) = self.arena.find(parent.as_slice())? else {
            return Ok(None);
        };
        let record = self.arena.record(key);
        if !record.is_branch() {
            return Err(RowViewError::not_a_branch(parent.as_slice()));
        }
        Ok(record.is_loaded().then_some(key))
    }

    fn loaded_child_count(&self, branch: NodeKey) -> usize {
        self.arena.record(branch).children().map_or(0, <[NodeKey]>::len)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Mark the offsets stale. Geometry queries fail until the next
    /// [`layout`](Self::layout).
    pub fn invalidate_layout(&mut self) {
        self.layout_valid = false;
    }

    /// Whether geometry queries may be answered.
    pub fn is_layout_valid(&self) -> bool {
        self.layout_valid
    }

    /// Rebuild the row offsets for a view `width` pixels wide.
    pub fn layout<M>(&mut self, measure: &M, width: u32) -> Result<()>
    where
        M: RowMeasure<T> + ?Sized,
    {
        let _perf = PerfSpan::new("tree_layout");
        self.layout_valid = false;

        let min_height = self.config.min_row_height();
        let spacing = self.config.row_spacing;
        let offsets = match self.config.row_sizing {
            RowSizing::Fixed => {
                let height = match (self.config.fixed_row_height, self.rows.get(0)) {
                    (Some(height), _) => height,
                    (None, Some(first)) => self.measure_visible_row(measure, 0, first, width)?,
                    (None, None) => 0,
                };
                OffsetTable::fixed(height.max(min_height).saturating_add(spacing), self.rows.len())
            }
            RowSizing::Variable => OffsetTable::try_from_extents(self.rows.iter().enumerate().map(|(row, key)| {
                self.measure_visible_row(measure, row, key, width)
                    .map(|height| height.max(min_height).saturating_add(spacing))
            }))?,
        };

        self.offsets = offsets;
        self.width = width;
        self.layout_valid = true;
        tracing::debug!(
            target: targets::LAYOUT,
            rows = self.offsets.len(),
            total_height = self.offsets.total_extent(),
            "tree layout"
        );
        Ok(())
    }

    fn measure_visible_row<M>(&self, measure: &M, row: usize, key: NodeKey, width: u32) -> Result<u32>
    where
        M: RowMeasure<T> + ?Sized,
    {
        let record = self.arena.record(key);
        let item = record
            .item()
            .unwrap_or_else(|| panic!("the root record is never a visible row"));
        let depth = record.depth();
        let context = MeasureContext::for_row(&self.config, row, depth, width, self.node_indent(depth))
            .with_check_state(record.flags.check_state());
        measure_row(measure, &**item, &context)
    }

    fn require_layout(&self) -> Result<()> {
        if self.layout_valid { Ok(()) } else { Err(RowViewError::LayoutInvalid) }
    }

    /// The row offsets from the last layout pass.
    pub fn offsets(&self) -> Result<&OffsetTable> {
        self.require_layout()?;
        Ok(&self.offsets)
    }

    /// Total height of every visible row.
    pub fn total_height(&self) -> Result<u32> {
        self.require_layout()?;
        Ok(self.offsets.total_extent())
    }

    /// Horizontal offset of a node's content at `depth`.
    pub fn node_indent(&self, depth: usize) -> u32 {
        let indent = self.config.indent;
        let spacing = self.config.spacing;
        let mut node_indent = depth.saturating_sub(1) as u32 * indent.saturating_add(spacing);
        if self.config.show_branch_controls {
            node_indent += indent + spacing;
        }
        if let Some(metrics) = self.config.checkmarks {
            node_indent += metrics.width.max(indent) + spacing;
        }
        node_indent
    }

    // =========================================================================
    // Geometry Queries
    // =========================================================================

    /// The visible row at `y`.
    pub fn row_at(&self, y: i32) -> Result<Option<usize>> {
        self.require_layout()?;
        self.offsets.row_at(y)
    }

    /// The path of the node at `y`.
    pub fn node_at(&self, y: i32) -> Result<Option<TreePath>> {
        Ok(self.row_at(y)?.and_then(|row| self.path_at_row(row)))
    }

    /// The path of the node shown at `row`.
    pub fn path_at_row(&self, row: usize) -> Option<TreePath> {
        self.rows.get(row).map(|key| self.arena.path_of(key))
    }

    /// The item shown at `row`.
    pub fn item_at_row(&self, row: usize) -> Option<&Arc<T>> {
        self.rows.get(row).and_then(|key| self.arena.record(key).item())
    }

    /// The flags of the node shown at `row`.
    pub fn flags_at_row(&self, row: usize) -> Option<NodeFlags> {
        self.rows.get(row).map(|key| self.arena.record(key).flags)
    }

    /// The row showing the node at `path`, or `None` when it is not
    /// visible or not materialized.
    pub fn row_index(&self, path: &TreePath) -> Result<Option<usize>> {
        self.require_data()?;
        if path.is_root() {
            return Err(RowViewError::invalid_path(path.as_slice()));
        }
        Ok(self
            .arena
            .find(path.as_slice())?
            .and_then(|key| self.rows.position_of(key)))
    }

    /// Bounds of visible row `row`, excluding row spacing.
    pub fn row_bounds(&self, row: usize) -> Result<Bounds> {
        self.require_layout()?;
        let y = self.offsets.row_y(row)?;
        let height = self.offsets.row_height(row)?.saturating_sub(self.config.row_spacing);
        Ok(Bounds::new(0, y, self.width, height))
    }

    /// Bounds of the node at `path`, or `None` when it is not visible.
    pub fn node_bounds(&self, path: &TreePath) -> Result<Option<Bounds>> {
        self.require_layout()?;
        match self.row_index(path)? {
            Some(row) => Ok(Some(self.row_bounds(row)?)),
            None => Ok(None),
        }
    }

    /// The rows intersecting the clip band `clip_top..clip_top + clip_height`.
    pub fn visible_range(&self, clip_top: i32, clip_height: i32) -> Result<Option<RangeInclusive<usize>>> {
        self.require_layout()?;
        visible_range(&self.offsets, clip_top, clip_height)
    }

    /// Iterate over `rows`, yielding each row's path and record key.
    pub fn visible_nodes(&self, rows: RangeInclusive<usize>) -> Result<VisibleNodeIter<'_, T>> {
        self.rows.iter_paths(&self.arena, *rows.start(), *rows.end())
    }

    // =========================================================================
    // Highlight
    // =========================================================================

    /// Highlight the node shown at `row`, or nothing.
    pub fn set_highlighted_row(&mut self, row: Option<usize>) -> Result<()> {
        let key = match row {
            Some(row) => {
                check_index(row, self.rows.len())?;
                self.rows.get(row)
            }
            None => None,
        };
        self.set_highlighted_key(key);
        Ok(())
    }

    /// Remove the highlight.
    pub fn clear_highlight(&mut self) {
        self.set_highlighted_key(None);
    }

    /// The row of the highlighted node.
    pub fn highlighted_row(&self) -> Option<usize> {
        self.highlighted.and_then(|key| self.rows.position_of(key))
    }

    fn set_highlighted_key(&mut self, key: Option<NodeKey>) {
        if let Some(previous) = self.highlighted.take()
            && let Some(record) = self.arena.get_mut(previous)
        {
            record.flags.set_highlighted(false);
        }
        if let Some(key) = key {
            self.arena.record_mut(key).flags.set_highlighted(true);
            self.highlighted = Some(key);
        }
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Set the predicate that disables nodes and re-evaluate it for every
    /// materialized node.
    pub fn set_disabled_filter(&mut self, filter: Option<ItemFilter<T>>) {
        self.filters.disabled = filter;
        self.arena.refresh_filters(&self.filters);
    }

    /// Set the predicate that disables checkmarks and re-evaluate it for
    /// every materialized node.
    pub fn set_disabled_checkmark_filter(&mut self, filter: Option<ItemFilter<T>>) {
        self.filters.checkmark_disabled = filter;
        self.arena.refresh_filters(&self.filters);
    }

    /// Whether the node at `path` is disabled.
    pub fn is_node_disabled<S>(&mut self, source: &S, path: &TreePath) -> Result<bool>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.require_data()?;
        let key = self.arena.resolve(path.as_slice(), source, &self.filters)?;
        Ok(self.arena.record(key).flags.is_disabled())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// The path selection and its signals.
    pub fn selection(&self) -> &PathSelection {
        &self.selection
    }

    pub fn select_mode(&self) -> SelectMode {
        self.selection.select_mode()
    }

    /// Change the select mode, clearing the selection.
    pub fn set_select_mode(&mut self, mode: SelectMode) {
        if self.selection.select_mode() != mode {
            self.selection.set_select_mode(mode);
            self.arena.clear_flags(NodeFlags::SELECTED);
        }
    }

    /// The selected paths in tree order.
    pub fn selected_paths(&self) -> &[TreePath] {
        self.selection.paths()
    }

    /// The first selected path.
    pub fn selected_path(&self) -> Option<&TreePath> {
        self.selection.selected_path()
    }

    /// Whether the node at `path` is selected.
    pub fn is_node_selected(&self, path: &TreePath) -> bool {
        self.selection.contains(path)
    }

    /// Replace the selection. Every path must resolve.
    pub fn set_selected_paths<S>(&mut self, source: &S, paths: &[TreePath]) -> Result<()>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.require_data()?;
        for path in paths {
            self.arena.resolve(path.as_slice(), source, &self.filters)?;
        }
        self.selection.set_paths(paths)?;
        self.refresh_state_flags();
        Ok(())
    }

    /// Select exactly `path`, or nothing.
    pub fn set_selected_path<S>(&mut self, source: &S, path: Option<TreePath>) -> Result<()>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        match path {
            Some(path) => self.set_selected_paths(source, &[path]),
            None => self.set_selected_paths(source, &[]),
        }
    }

    /// Add `path` to a multi-select selection.
    pub fn add_selected_path<S>(&mut self, source: &S, path: &TreePath) -> Result<bool>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        self.require_data()?;
        if path.is_root() {
            return Err(RowViewError::invalid_path(path.as_slice()));
        }
        let key = self.arena.resolve(path.as_slice(), source, &self.filters)?;
        let added = self.selection.add_path(path.clone())?;
        self.arena.record_mut(key).flags.set_selected(true);
        Ok(added)
    }

    /// Remove `path` from a multi-select selection.
    pub fn remove_selected_path(&mut self, path: &TreePath) -> Result<bool> {
        let removed = self.selection.remove_path(path)?;
        if removed && let Some(key) = self.arena.find(path.as_slice())? {
            self.arena.record_mut(key).flags.set_selected(false);
        }
        Ok(removed)
    }

    /// Deselect every node.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.arena.clear_flags(NodeFlags::SELECTED);
    }

    // =========================================================================
    // Checkmarks
    // =========================================================================

    pub fn checkmarks_enabled(&self) -> bool {
        self.config.checkmarks_enabled()
    }

    /// Show or hide checkboxes. Either way every node is unchecked.
    pub fn set_checkmarks_enabled(&mut self, enabled: bool) {
        if enabled == self.checkmarks_enabled() {
            return;
        }
        self.config.checkmarks = enabled.then_some(self.checkbox);
        self.checked.clear();
        self.arena.clear_flags(NodeFlags::CHECK_STATE);
        self.invalidate_layout();
    }

    pub fn show_mixed_checkmark_state(&self) -> bool {
        self.show_mixed_checkmark_state
    }

    /// Report branches with checked descendants as [`CheckState::Mixed`].
    pub fn set_show_mixed_checkmark_state(&mut self, show: bool) {
        if self.show_mixed_checkmark_state != show {
            self.show_mixed_checkmark_state = show;
            self.refresh_branch_check_states();
        }
    }

    /// Recompute the cached check state of every materialized node.
    pub fn refresh_branch_check_states(&mut self) {
        self.refresh_state_flags();
    }

    /// The explicitly checked paths in tree order.
    pub fn checked_paths(&self) -> &[TreePath] {
        self.checked.paths()
    }

    /// Check state of the node at `path`. `Mixed` is reported only when
    /// mixed states are shown.
    pub fn node_check_state(&self, path: &TreePath) -> CheckState {
        if !self.checkmarks_enabled() {
            CheckState::Unchecked
        } else if self.checked.contains(path) {
            CheckState::Checked
        } else if self.show_mixed_checkmark_state && self.checked.has_descendant(path) {
            CheckState::Mixed
        } else {
            CheckState::Unchecked
        }
    }

    /// Check or uncheck the node at `path`.
    ///
    /// Emits `check_state_changed` for the node and, when mixed states are
    /// shown, for every ancestor whose derived state changed, deepest first.
    pub fn set_check_state<S>(&mut self, source: &S, path: &TreePath, checked: bool) -> Result<()>
    where
        S: TreeSource<Item = T> + ?Sized,
    {
        if !self.checkmarks_enabled() {
            return Err(RowViewError::CheckmarksDisabled);
        }
        self.require_data()?;
        if path.is_root() {
            return Err(RowViewError::invalid_path(path.as_slice()));
        }
        self.arena.resolve(path.as_slice(), source, &self.filters)?;
        if self.checked.contains(path) == checked {
            return Ok(());
        }

        let previous = self.node_check_state(path);
        let mut ancestors = Vec::new();
        let mut ancestor = path.parent();
        while let Some(current) = ancestor
            && !current.is_root()
        {
            let state = self.node_check_state(&current);
            ancestor = current.parent();
            ancestors.push((current, state));
        }

        if checked {
            self.checked.add_path(path.clone())?;
        } else {
            self.checked.remove_path(path)?;
        }
        self.refresh_state_flags();

        self.check_state_changed.emit((path.clone(), previous));
        if self.show_mixed_checkmark_state {
            for (ancestor, previous) in ancestors {
                if self.node_check_state(&ancestor) != previous {
                    self.check_state_changed.emit((ancestor, previous));
                }
            }
        }
        Ok(())
    }

    /// Rewrite the selected and check state flags of every materialized
    /// node from the selected and checked paths.
    fn refresh_state_flags(&mut self) {
        self.arena.clear_flags(NodeFlags::SELECTED | NodeFlags::CHECK_STATE);

        for path in self.selection.paths() {
            if let Ok(Some(key)) = self.arena.find(path.as_slice()) {
                self.arena.record_mut(key).flags.set_selected(true);
            }
        }

        if !self.config.checkmarks_enabled() {
            return;
        }
        let root = self.arena.root();
        for path in self.checked.paths() {
            let Ok(Some(key)) = self.arena.find(path.as_slice()) else {
                continue;
            };
            self.arena.record_mut(key).flags.set_check_state(CheckState::Checked);
            if !self.show_mixed_checkmark_state {
                continue;
            }
            let mut ancestor = self.arena.record(key).parent();
            while let Some(current) = ancestor
                && current != root
            {
                let flags = &mut self.arena.record_mut(current).flags;
                if flags.check_state() == CheckState::Unchecked {
                    flags.set_check_state(CheckState::Mixed);
                }
                ancestor = self.arena.record(current).parent();
            }
        }
    }

    // =========================================================================
    // Keyboard Navigation
    // =========================================================================

    /// The first enabled row after `from`, or from the top when `None`.
    pub fn next_enabled_row(&self, from: Option<usize>) -> Option<usize> {
        let start = from.map_or(0, |row| row + 1);
        (start..self.rows.len()).find(|&row| self.is_row_enabled(row))
    }

    /// The last enabled row before `from`, or from the bottom when `None`.
    pub fn previous_enabled_row(&self, from: Option<usize>) -> Option<usize> {
        let end = from.unwrap_or(self.rows.len()).min(self.rows.len());
        (0..end).rev().find(|&row| self.is_row_enabled(row))
    }

    fn is_row_enabled(&self, row: usize) -> bool {
        self.flags_at_row(row).is_some_and(|flags| !flags.is_disabled())
    }
}

impl<T: fmt::Display> TreeIndex<T> {
    /// Render the visible rows as an indented tree with their flags.
    pub fn debug_tree(&self) -> String {
        let rows: Vec<DebugRow> = self
            .rows
            .iter()
            .map(|key| {
                let record = self.arena.record(key);
                let label = record.item().map(|item| item.to_string()).unwrap_or_default();
                DebugRow::new(record.depth(), label).with_flags(record.flags.names())
            })
            .collect();
        RowTreeDebug::new().format(&rows)
    }
}
