//! Row and column index for table views.
//!
//! Rows behave like list items. Columns are sized once per layout pass by
//! [`column_widths`]: fixed and auto columns take their width first, then
//! relative columns share what is left by weight. Every column is followed
//! by `column_spacing` pixels of grid line.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use horizon_rowview_core::logging::targets;
use horizon_rowview_core::{Axis, PerfSpan, Result, RowViewError, check_index, check_non_negative};

use crate::config::{LayoutConfig, RowSizing};
use crate::model::{
    Bounds, CellMeasure, ItemFilter, MeasureContext, NodeFilters, OffsetTable, SelectMode, SelectionTracker,
    Span, Viewport, visible_range,
};

// ============================================================================
// Columns
// ============================================================================

/// How a column's width is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnWidth {
    /// A width in pixels.
    Fixed(u32),
    /// A share of the width left after fixed and auto columns.
    Relative(u32),
    /// The widest preferred cell width in the column.
    Auto,
}

/// One table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub width: ColumnWidth,
    #[serde(default)]
    pub min_width: u32,
    #[serde(default = "unbounded")]
    pub max_width: u32,
}

fn unbounded() -> u32 {
    u32::MAX
}

impl ColumnSpec {
    pub fn fixed(width: u32) -> Self {
        Self::new(ColumnWidth::Fixed(width))
    }

    pub fn relative(weight: u32) -> Self {
        Self::new(ColumnWidth::Relative(weight))
    }

    pub fn auto() -> Self {
        Self::new(ColumnWidth::Auto)
    }

    fn new(width: ColumnWidth) -> Self {
        Self {
            width,
            min_width: 0,
            max_width: u32::MAX,
        }
    }

    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    fn clamp(&self, width: u32) -> u32 {
        width.max(self.min_width).min(self.max_width)
    }
}

/// Resolve `columns` to pixel widths for a table `width` pixels wide.
///
/// Auto columns ask `measure` for the preferred width of every cell in
/// `rows`. Relative shares are rounded to the nearest pixel, so their sum
/// may differ from the remaining width by a pixel per column.
pub fn column_widths<T, M>(columns: &[ColumnSpec], rows: &[T], measure: &M, width: u32, spacing: u32) -> Result<Vec<u32>>
where
    M: CellMeasure<T> + ?Sized,
{
    let mut widths = Vec::with_capacity(columns.len());
    let mut fixed_width: u64 = 0;
    let mut total_weight: u64 = 0;

    for (column, spec) in columns.iter().enumerate() {
        let resolved = match spec.width {
            ColumnWidth::Relative(weight) => {
                total_weight += u64::from(weight);
                widths.push(0);
                continue;
            }
            ColumnWidth::Fixed(width) => width,
            ColumnWidth::Auto => {
                let mut widest = 0;
                for row in rows {
                    let preferred = measure.cell_width(row, column).map_err(RowViewError::measure)?;
                    widest = widest.max(preferred);
                }
                widest
            }
        };
        let resolved = spec.clamp(resolved);
        fixed_width += u64::from(resolved);
        widths.push(resolved);
    }

    fixed_width += u64::from(spacing) * columns.len().saturating_sub(1) as u64;
    let remaining = u64::from(width).saturating_sub(fixed_width);

    for (spec, resolved) in columns.iter().zip(widths.iter_mut()) {
        if let ColumnWidth::Relative(weight) = spec.width {
            let share = if total_weight == 0 {
                0
            } else {
                (2 * u64::from(weight) * remaining + total_weight) / (2 * total_weight)
            };
            *resolved = spec.clamp(u32::try_from(share).unwrap_or(u32::MAX));
        }
    }
    Ok(widths)
}

// ============================================================================
// Table Index
// ============================================================================

/// Geometry and state index for a table view.
pub struct TableIndex<T> {
    len: usize,
    columns: Vec<ColumnSpec>,
    config: LayoutConfig,

    rows: OffsetTable,
    column_offsets: OffsetTable,
    column_widths: Vec<u32>,
    width: u32,
    layout_valid: bool,

    selection: SelectionTracker,
    highlighted: Option<usize>,
    filters: NodeFilters<T>,
}

impl<T> fmt::Debug for TableIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableIndex")
            .field("len", &self.len)
            .field("columns", &self.columns)
            .field("column_widths", &self.column_widths)
            .field("layout_valid", &self.layout_valid)
            .finish_non_exhaustive()
    }
}

impl<T> TableIndex<T> {
    /// An index over `len` rows and `columns` with the default configuration.
    pub fn new(len: usize, columns: Vec<ColumnSpec>) -> Self {
        Self::with_config(len, columns, LayoutConfig::default())
    }

    pub fn with_config(len: usize, columns: Vec<ColumnSpec>, config: LayoutConfig) -> Self {
        Self {
            len,
            columns,
            config,
            rows: OffsetTable::empty(),
            column_offsets: OffsetTable::empty(),
            column_widths: Vec::new(),
            width: 0,
            layout_valid: false,
            selection: SelectionTracker::new(len),
            highlighted: None,
            filters: NodeFilters::default(),
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

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.invalidate_layout();
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnSpec>) {
        self.columns = columns;
        self.invalidate_layout();
    }

    /// Replace the table data with `len` new rows.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.selection.reset(len);
        self.highlighted = None;
        self.invalidate_layout();
    }

    // =========================================================================
    // Data Changes
    // =========================================================================

    /// `count` rows were inserted at `index`.
    pub fn rows_inserted(&mut self, index: usize, count: usize) -> Result<()> {
        self.selection.items_inserted(index, count)?;
        if let Some(highlighted) = self.highlighted
            && highlighted >= index
        {
            self.highlighted = Some(highlighted + count);
        }
        self.len += count;
        self.invalidate_layout();
        tracing::trace!(target: targets::VISIBLE, index, count, "table rows inserted");
        Ok(())
    }

    /// `count` rows were removed at `index`.
    pub fn rows_removed(&mut self, index: usize, count: usize) -> Result<()> {
        self.selection.items_removed(index, count)?;
        self.highlighted = match self.highlighted {
            Some(highlighted) if highlighted >= index + count => Some(highlighted - count),
            Some(highlighted) if highlighted >= index => None,
            other => other,
        };
        self.len -= count;
        self.invalidate_layout();
        tracing::trace!(target: targets::VISIBLE, index, count, "table rows removed");
        Ok(())
    }

    /// Row `index` changed in place.
    pub fn rows_updated(&mut self, index: usize) -> Result<()> {
        check_index(index, self.len)?;
        self.invalidate_layout();
        Ok(())
    }

    pub fn rows_cleared(&mut self) {
        self.selection.items_cleared();
        self.highlighted = None;
        self.len = 0;
        self.invalidate_layout();
    }

    pub fn rows_sorted(&mut self) {
        self.selection.items_sorted();
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

    /// Resolve column widths and rebuild the row offsets for a table
    /// `width` pixels wide. A row is as tall as its tallest cell.
    ///
    /// # Panics
    ///
    /// Panics if `rows` does not hold exactly [`len`](Self::len) rows.
    pub fn layout<M>(&mut self, rows: &[T], measure: &M, width: u32) -> Result<()>
    where
        M: CellMeasure<T> + ?Sized,
    {
        assert_eq!(rows.len(), self.len, "table rows changed without a matching data event");
        let _perf = PerfSpan::new("table_layout");
        self.layout_valid = false;

        let column_spacing = self.config.column_spacing;
        let widths = column_widths(&self.columns, rows, measure, width, column_spacing)?;
        let row_spacing = self.config.row_spacing;

        let offsets = match self.config.row_sizing {
            RowSizing::Fixed => {
                let height = match (self.config.fixed_row_height, rows.first()) {
                    (Some(height), _) => height,
                    (None, Some(first)) => self.measure_row(measure, &widths, 0, first)?,
                    (None, None) => 0,
                };
                OffsetTable::fixed(height.saturating_add(row_spacing), self.len)
            }
            RowSizing::Variable => OffsetTable::try_from_extents(
                rows.iter()
                    .enumerate()
                    .map(|(index, row)| {
                        self.measure_row(measure, &widths, index, row)
                            .map(|height| height.saturating_add(row_spacing))
                    }),
            )?,
        };

        self.column_offsets =
            OffsetTable::from_extents(widths.iter().map(|width| width.saturating_add(column_spacing)));
        self.column_widths = widths;
        self.rows = offsets;
        self.width = width;
        self.layout_valid = true;
        tracing::debug!(
            target: targets::LAYOUT,
            rows = self.len,
            columns = self.columns.len(),
            total_height = self.rows.total_extent(),
            "table layout"
        );
        Ok(())
    }

    fn measure_row<M>(&self, measure: &M, widths: &[u32], index: usize, row: &T) -> Result<u32>
    where
        M: CellMeasure<T> + ?Sized,
    {
        let mut height = 0;
        for (column, &width) in widths.iter().enumerate() {
            let context = MeasureContext {
                row: index,
                depth: 1,
                width,
                check_state: None,
            };
            let cell = measure
                .cell_height(row, column, &context)
                .map_err(RowViewError::measure)?;
            height = height.max(cell);
        }
        Ok(height)
    }

    fn require_layout(&self) -> Result<()> {
        if self.layout_valid { Ok(()) } else { Err(RowViewError::LayoutInvalid) }
    }

    /// Column widths from the last layout pass.
    pub fn column_widths(&self) -> Result<&[u32]> {
        self.require_layout()?;
        Ok(&self.column_widths)
    }

    pub fn row_offsets(&self) -> Result<&OffsetTable> {
        self.require_layout()?;
        Ok(&self.rows)
    }

    pub fn total_height(&self) -> Result<u32> {
        self.require_layout()?;
        Ok(self.rows.total_extent())
    }

    // =========================================================================
    // Geometry Queries
    // =========================================================================

    pub fn row_at(&self, y: i32) -> Result<Option<usize>> {
        self.require_layout()?;
        self.rows.row_at(y)
    }

    /// The column at `x`. The grid line after a column belongs to it.
    pub fn column_at(&self, x: i32) -> Result<Option<usize>> {
        self.require_layout()?;
        let x = check_non_negative(Axis::X, x)?;
        Ok(self.column_offsets.row_at_unsigned(x))
    }

    /// The `(row, column)` cell at `(x, y)`.
    pub fn cell_at(&self, x: i32, y: i32) -> Result<Option<(usize, usize)>> {
        let column = self.column_at(x)?;
        let row = self.row_at(y)?;
        Ok(row.zip(column))
    }

    /// Bounds of `row` across the full table width, excluding row spacing.
    pub fn row_bounds(&self, row: usize) -> Result<Bounds> {
        self.require_layout()?;
        let y = self.rows.row_y(row)?;
        let height = self.rows.row_height(row)?.saturating_sub(self.config.row_spacing);
        Ok(Bounds::new(0, y, self.width, height))
    }

    /// Bounds of `column` over every row, excluding the grid line.
    pub fn column_bounds(&self, column: usize) -> Result<Bounds> {
        self.require_layout()?;
        let x = self.column_offsets.row_y(column)?;
        Ok(Bounds::new(x, 0, self.column_widths[column], self.rows.total_extent()))
    }

    pub fn cell_bounds(&self, row: usize, column: usize) -> Result<Bounds> {
        let row_bounds = self.row_bounds(row)?;
        let column_bounds = self.column_bounds(column)?;
        Ok(Bounds::new(column_bounds.x, row_bounds.y, column_bounds.width, row_bounds.height))
    }

    pub fn visible_range(&self, clip_top: i32, clip_height: i32) -> Result<Option<RangeInclusive<usize>>> {
        self.require_layout()?;
        visible_range(&self.rows, clip_top, clip_height)
    }

    /// The columns intersecting the clip band `clip_left..clip_left + clip_width`.
    pub fn visible_columns(&self, clip_left: i32, clip_width: i32) -> Result<Option<RangeInclusive<usize>>> {
        self.require_layout()?;
        check_non_negative(Axis::X, clip_left)?;
        check_non_negative(Axis::X, clip_width)?;
        visible_range(&self.column_offsets, clip_left, clip_width)
    }

    pub fn selection_bounds(&self) -> Result<Vec<Bounds>> {
        self.require_layout()?;
        self.selection.ranges().iter().map(|&span| self.span_bounds(span)).collect()
    }

    pub fn span_bounds(&self, span: Span) -> Result<Bounds> {
        Ok(self.row_bounds(span.start)?.union(&self.row_bounds(span.end)?))
    }

    pub fn scroll_to_row(&self, viewport: &Viewport, row: usize) -> Result<u32> {
        Ok(viewport.reveal(&self.row_bounds(row)?))
    }

    // =========================================================================
    // Selection, Highlight, Filters
    // =========================================================================

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

    pub fn highlighted_row(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn set_highlighted_row(&mut self, row: Option<usize>) -> Result<()> {
        if let Some(row) = row {
            check_index(row, self.len)?;
        }
        self.highlighted = row;
        Ok(())
    }

    pub fn set_disabled_filter(&mut self, filter: Option<ItemFilter<T>>) {
        self.filters.disabled = filter;
    }

    pub fn is_row_disabled(&self, row: &T) -> bool {
        self.filters.is_disabled(row)
    }

    pub fn next_enabled_row(&self, rows: &[T], from: Option<usize>) -> Option<usize> {
        let start = from.map_or(0, |index| index + 1);
        (start..rows.len()).find(|&index| !self.is_row_disabled(&rows[index]))
    }

    pub fn previous_enabled_row(&self, rows: &[T], from: Option<usize>) -> Option<usize> {
        let end = from.unwrap_or(rows.len()).min(rows.len());
        (0..end).rev().find(|&index| !self.is_row_disabled(&rows[index]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UniformHeight;
    use horizon_rowview_core::BoxedError;

    /// Cells measure as one pixel per character; height grows when the
    /// text wraps at the column width.
    struct TextCells;

    impl CellMeasure<Vec<&'static str>> for TextCells {
        fn cell_height(
            &self,
            row: &Vec<&'static str>,
            column: usize,
            context: &MeasureContext,
        ) -> std::result::Result<u32, BoxedError> {
            let len = row[column].len() as u32;
            let lines = if context.width == 0 { 1 } else { len.div_ceil(context.width).max(1) };
            Ok(lines * 10)
        }

        fn cell_width(&self, row: &Vec<&'static str>, column: usize) -> std::result::Result<u32, BoxedError> {
            Ok(row[column].len() as u32)
        }
    }

    #[test]
    fn test_column_widths() {
        let columns = vec![
            ColumnSpec::fixed(100),
            ColumnSpec::relative(1),
            ColumnSpec::relative(2),
        ];
        let widths = column_widths::<(), _>(&columns, &[], &UniformHeight(0), 402, 1).unwrap();
        // 402 - 100 - 2 grid pixels = 300 shared 1:2
        assert_eq!(widths, [100, 100, 200]);

        let widths = column_widths::<(), _>(&columns, &[], &UniformHeight(0), 50, 1).unwrap();
        assert_eq!(widths, [100, 0, 0]);
    }

    #[test]
    fn test_column_widths_clamped_and_rounded() {
        let columns = vec![
            ColumnSpec::fixed(10).with_min_width(30),
            ColumnSpec::relative(1).with_max_width(50),
            ColumnSpec::relative(2),
        ];
        let widths = column_widths::<(), _>(&columns, &[], &UniformHeight(0), 132, 1).unwrap();
        // remaining 100: 33.3 -> 33, 66.7 -> 67
        assert_eq!(widths, [30, 33, 67]);
    }

    #[test]
    fn test_auto_columns() {
        let rows = vec![vec!["abc", "x"], vec!["a", "xxxxxx"]];
        let columns = vec![ColumnSpec::auto(), ColumnSpec::auto().with_max_width(4)];
        let widths = column_widths(&columns, &rows, &TextCells, 100, 1).unwrap();
        assert_eq!(widths, [3, 4]);
    }

    #[test]
    fn test_variable_rows_take_tallest_cell() {
        let rows = vec![vec!["abc", "x"], vec!["a", "xxxxxx"]];
        let columns = vec![ColumnSpec::fixed(3), ColumnSpec::fixed(4)];
        let config = LayoutConfig::default().with_row_sizing(RowSizing::Variable).with_row_spacing(1);
        let mut table = TableIndex::with_config(rows.len(), columns, config);
        table.layout(&rows, &TextCells, 100).unwrap();

        assert_eq!(table.row_offsets().unwrap().boundaries().collect::<Vec<_>>(), [11, 32]);
        assert_eq!(table.row_bounds(1).unwrap(), Bounds::new(0, 11, 100, 20));
    }

    #[test]
    fn test_huge_extents_saturate() {
        let columns = vec![ColumnSpec::fixed(u32::MAX), ColumnSpec::fixed(10)];
        let config = LayoutConfig::default().with_row_spacing(1);
        let mut table = TableIndex::<()>::with_config(2, columns, config);
        table.layout(&[(), ()], &UniformHeight(u32::MAX), 100).unwrap();

        assert_eq!(table.total_height().unwrap(), u32::MAX);
        assert_eq!(table.column_at(0).unwrap(), Some(0));
    }

    #[test]
    fn test_hit_testing() {
        let columns = vec![ColumnSpec::fixed(50), ColumnSpec::fixed(30)];
        let mut table = TableIndex::<()>::new(4, columns);
        assert!(matches!(table.cell_at(0, 0), Err(RowViewError::LayoutInvalid)));
        table.layout(&[(), (), (), ()], &UniformHeight(20), 200).unwrap();

        assert_eq!(table.column_at(0).unwrap(), Some(0));
        assert_eq!(table.column_at(50).unwrap(), Some(0));
        assert_eq!(table.column_at(51).unwrap(), Some(1));
        assert_eq!(table.column_at(82).unwrap(), None);
        assert_eq!(table.cell_at(60, 45).unwrap(), Some((2, 1)));
        assert_eq!(table.cell_at(100, 45).unwrap(), None);
        assert!(matches!(table.column_at(-1), Err(RowViewError::NegativeCoordinate { axis: Axis::X, .. })));

        assert_eq!(table.column_bounds(1).unwrap(), Bounds::new(51, 0, 30, 80));
        assert_eq!(table.cell_bounds(2, 1).unwrap(), Bounds::new(51, 40, 30, 20));
        assert_eq!(table.visible_columns(40, 20).unwrap(), Some(0..=1));
    }

    #[test]
    fn test_rows_removed_keeps_selection_attached() {
        let mut table = TableIndex::<()>::new(6, vec![ColumnSpec::relative(1)]);
        table.set_select_mode(SelectMode::Multi);
        table.selection_mut().add_range(3, 5).unwrap();
        table.set_highlighted_row(Some(4)).unwrap();

        table.rows_removed(0, 2).unwrap();
        assert_eq!(table.selection().ranges(), &[Span::new(1, 3)]);
        assert_eq!(table.highlighted_row(), Some(2));
        assert!(table.rows_removed(3, 2).is_err());
    }
}
