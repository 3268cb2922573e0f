//! Row index for flat list views.
//!
//! A list's rows are its items, so the index keeps no per-item records.
//! Selection, checkmarks and the highlight are tracked by position and
//! shifted when the caller reports inserts and removals. Items are passed
//! in only where they are needed: to measure rows and to evaluate the
//! disabled predicates.

use std::fmt;
use std::ops::RangeInclusive;

use horizon_rowview_core::logging::targets;
use horizon_rowview_core::{PerfSpan, Result, RowViewError, Signal, check_index};

use crate::config::{LayoutConfig, RowSizing};
use crate::model::{
    Bounds, CheckState, ItemFilter, MeasureContext, NodeFilters, OffsetTable, RangeSelection, RowMeasure,
    SelectMode, SelectionTracker, Span, Viewport, measure_row, visible_range,
};

/// Geometry and state index for a list view.
///
/// # Signals
///
/// - `item_checked_changed(usize)`: an item's checkmark was toggled
///
/// Selection signals live on [`selection`](Self::selection).
pub struct ListIndex<T> {
    len: usize,
    config: LayoutConfig,
    offsets: OffsetTable,
    width: u32,
    layout_valid: bool,

    selection: SelectionTracker,
    checked: RangeSelection,
    highlighted: Option<usize>,
    filters: NodeFilters<T>,

    /// Emitted when an item is checked or unchecked. Args: item index.
    pub item_checked_changed: Signal<usize>,
}

impl<T> fmt::Debug for ListIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListIndex")
            .field("len", &self.len)
            .field("layout_valid", &self.layout_valid)
            .field("selection", &self.selection)
            .field("highlighted", &self.highlighted)
            .finish_non_exhaustive()
    }
}

impl<T> Default for ListIndex<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> ListIndex<T> {
    /// An index over `len` items with the default configuration.
    pub fn new(len: usize) -> Self {
        Self::with_config(len, LayoutConfig::default())
    }

    pub fn with_config(len: usize, config: LayoutConfig) -> Self {
        Self {
            len,
            config,
            offsets: OffsetTable::empty(),
            width: 0,
            layout_valid: false,
            selection: SelectionTracker::new(len),
            checked: RangeSelection::new(),
            highlighted: None,
            filters: NodeFilters::default(),
            item_checked_changed: Signal::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the layout configuration. Disabling checkmarks unchecks
    /// every item.
    pub fn set_config(&mut self, config: LayoutConfig) {
        if !config.checkmarks_enabled() {
            self.checked.clear();
        }
        self.config = config;
        self.invalidate_layout();
    }

    /// Replace the list data with `len` new items.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.selection.reset(len);
        self.checked.clear();
        self.highlighted = None;
        self.invalidate_layout();
        tracing::debug!(target: targets::VISIBLE, len, "list data reset");
    }

    // =========================================================================
    // Data Changes
    // =========================================================================

    /// `count` items were inserted at `index`.
    pub fn items_inserted(&mut self, index: usize, count: usize) -> Result<()> {
        self.selection.items_inserted(index, count)?;
        for _ in 0..count {
            self.checked.insert_index(index);
        }
        if let Some(highlighted) = self.highlighted
            && highlighted >= index
        {
            self.highlighted = Some(highlighted + count);
        }
        self.len += count;
        self.invalidate_layout();
        tracing::trace!(target: targets::VISIBLE, index, count, "list items inserted");
        Ok(())
    }

    /// `count` items were removed at `index`.
    pub fn items_removed(&mut self, index: usize, count: usize) -> Result<()> {
        self.selection.items_removed(index, count)?;
        self.checked.remove_indexes(index, count);
        self.highlighted = match self.highlighted {
            Some(highlighted) if highlighted >= index + count => Some(highlighted - count),
            Some(highlighted) if highlighted >= index => None,
            other => other,
        };
        self.len -= count;
        self.invalidate_layout();
        tracing::trace!(target: targets::VISIBLE, index, count, "list items removed");
        Ok(())
    }

    /// The item at `index` changed in place.
    pub fn items_updated(&mut self, index: usize) -> Result<()> {
        check_index(index, self.len)?;
        self.invalidate_layout();
        Ok(())
    }

    /// Every item was removed.
    pub fn items_cleared(&mut self) {
        self.selection.items_cleared();
        self.checked.clear();
        self.highlighted = None;
        self.len = 0;
        self.invalidate_layout();
    }

    /// The items were reordered. Positions no longer identify the same
    /// items, so selection and checkmarks are dropped.
    pub fn items_sorted(&mut self) {
        self.selection.items_sorted();
        self.checked.clear();
        self.highlighted = None;
        self.invalidate_layout();
    }

    // =========================================================================
    // Layout
    // =========================================================================

    pub fn invalidate_layout(&mut self) {
        self.layout_valid = false;
    }

    pub fn is_layout_valid(&self) -> bool {
        self.layout_valid
    }

    /// Rebuild the item offsets for a view `width` pixels wide.
    ///
    /// # Panics
    ///
    /// Panics if `items` does not hold exactly [`len`](Self::len) items,
    /// which means a data change was not reported.
    pub fn layout<M>(&mut self, items: &[T], measure: &M, width: u32) -> Result<()>
    where
        M: RowMeasure<T> + ?Sized,
    {
        assert_eq!(items.len(), self.len, "list items changed without a matching data event");
        let _perf = PerfSpan::new("list_layout");
        self.layout_valid = false;

        let min_height = self.config.min_row_height();
        let spacing = self.config.row_spacing;
        let offsets = match self.config.row_sizing {
            RowSizing::Fixed => {
                let height = match (self.config.fixed_row_height, items.first()) {
                    (Some(height), _) => height,
                    (None, Some(first)) => self.measure_item(measure, 0, first, width)?,
                    (None, None) => 0,
                };
                OffsetTable::fixed(height.max(min_height).saturating_add(spacing), self.len)
            }
            RowSizing::Variable => OffsetTable::try_from_extents(items.iter().enumerate().map(|(index, item)| {
                self.measure_item(measure, index, item, width)
                    .map(|height| height.max(min_height).saturating_add(spacing))
            }))?,
        };

        self.offsets = offsets;
        self.width = width;
        self.layout_valid = true;
        tracing::debug!(
            target: targets::LAYOUT,
            items = self.len,
            total_height = self.offsets.total_extent(),
            "list layout"
        );
        Ok(())
    }

    fn measure_item<M>(&self, measure: &M, index: usize, item: &T, width: u32) -> Result<u32>
    where
        M: RowMeasure<T> + ?Sized,
    {
        let context = MeasureContext::for_row(&self.config, index, 1, width, self.item_indent())
            .with_check_state(self.item_check_state(index));
        measure_row(measure, item, &context)
    }

    fn require_layout(&self) -> Result<()> {
        if self.layout_valid { Ok(()) } else { Err(RowViewError::LayoutInvalid) }
    }

    pub fn offsets(&self) -> Result<&OffsetTable> {
        self.require_layout()?;
        Ok(&self.offsets)
    }

    pub fn total_height(&self) -> Result<u32> {
        self.require_layout()?;
        Ok(self.offsets.total_extent())
    }

    /// Horizontal offset of item content, leaving room for the checkbox.
    pub fn item_indent(&self) -> u32 {
        self.config.checkmarks.map_or(0, |metrics| metrics.row_indent())
    }

    // =========================================================================
    // Geometry Queries
    // =========================================================================

    /// The item at `y`.
    pub fn item_at(&self, y: i32) -> Result<Option<usize>> {
        self.require_layout()?;
        self.offsets.row_at(y)
    }

    /// Bounds of item `index`, excluding row spacing.
    pub fn item_bounds(&self, index: usize) -> Result<Bounds> {
        self.require_layout()?;
        let y = self.offsets.row_y(index)?;
        let height = self.offsets.row_height(index)?.saturating_sub(self.config.row_spacing);
        Ok(Bounds::new(0, y, self.width, height))
    }

    /// The items intersecting the clip band `clip_top..clip_top + clip_height`.
    pub fn visible_range(&self, clip_top: i32, clip_height: i32) -> Result<Option<RangeInclusive<usize>>> {
        self.require_layout()?;
        visible_range(&self.offsets, clip_top, clip_height)
    }

    /// Bounds covering each selected span, in selection order. These are
    /// the areas to repaint when the selection changes.
    pub fn selection_bounds(&self) -> Result<Vec<Bounds>> {
        self.require_layout()?;
        self.selection.ranges().iter().map(|&span| self.span_bounds(span)).collect()
    }

    /// Bounds covering every item of `span`.
    pub fn span_bounds(&self, span: Span) -> Result<Bounds> {
        Ok(self.item_bounds(span.start)?.union(&self.item_bounds(span.end)?))
    }

    /// The scroll top that brings item `index` into `viewport`.
    pub fn scroll_to_item(&self, viewport: &Viewport, index: usize) -> Result<u32> {
        Ok(viewport.reveal(&self.item_bounds(index)?))
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// The selection tracker and its signals.
    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionTracker {
        &mut self.selection
    }

    pub fn select_mode(&self) -> SelectMode {
        self.selection.select_mode()
    }

    pub fn set_select_mode(&mut self, mode: SelectMode) {
        self.selection.set_select_mode(mode);
    }

    pub fn is_item_selected(&self, index: usize) -> Result<bool> {
        self.selection.is_selected(index)
    }

    // =========================================================================
    // Highlight
    // =========================================================================

    pub fn highlighted_item(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn set_highlighted_item(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(index) = index {
            check_index(index, self.len)?;
        }
        self.highlighted = index;
        Ok(())
    }

    // =========================================================================
    // Checkmarks
    // =========================================================================

    pub fn checkmarks_enabled(&self) -> bool {
        self.config.checkmarks_enabled()
    }

    pub fn checked_items(&self) -> impl Iterator<Item = usize> + '_ {
        self.checked.spans().iter().flat_map(|span| span.start..=span.end)
    }

    pub fn is_item_checked(&self, index: usize) -> Result<bool> {
        check_index(index, self.len)?;
        Ok(self.checked.contains_index(index))
    }

    fn item_check_state(&self, index: usize) -> CheckState {
        if self.checked.contains_index(index) {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }

    /// Check or uncheck item `index`.
    pub fn set_item_checked(&mut self, index: usize, checked: bool) -> Result<()> {
        if !self.checkmarks_enabled() {
            return Err(RowViewError::CheckmarksDisabled);
        }
        check_index(index, self.len)?;
        let changed = if checked {
            !self.checked.add_range(index, index).is_empty()
        } else {
            !self.checked.remove_range(index, index).is_empty()
        };
        if changed {
            self.item_checked_changed.emit(index);
        }
        Ok(())
    }

    // =========================================================================
    // Filters
    // =========================================================================

    pub fn set_disabled_filter(&mut self, filter: Option<ItemFilter<T>>) {
        self.filters.disabled = filter;
    }

    pub fn set_disabled_checkmark_filter(&mut self, filter: Option<ItemFilter<T>>) {
        self.filters.checkmark_disabled = filter;
    }

    pub fn is_item_disabled(&self, item: &T) -> bool {
        self.filters.is_disabled(item)
    }

    pub fn is_checkmark_disabled(&self, item: &T) -> bool {
        self.filters.is_checkmark_disabled(item)
    }

    /// The first enabled item after `from`, or from the top when `None`.
    pub fn next_enabled_item(&self, items: &[T], from: Option<usize>) -> Option<usize> {
        let start = from.map_or(0, |index| index + 1);
        (start..items.len()).find(|&index| !self.is_item_disabled(&items[index]))
    }

    /// The last enabled item before `from`, or from the bottom when `None`.
    pub fn previous_enabled_item(&self, items: &[T], from: Option<usize>) -> Option<usize> {
        let end = from.unwrap_or(items.len()).min(items.len());
        (0..end).rev().find(|&index| !self.is_item_disabled(&items[index]))
    }
}
