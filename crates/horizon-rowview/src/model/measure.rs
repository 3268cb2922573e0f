//! Row and cell measurement.
//!
//! An index never knows how its rows are drawn. During layout it asks a
//! [`RowMeasure`] (or, for tables, a [`CellMeasure`]) for each row's
//! preferred height at the width left after indentation. Measurers may
//! fail; the error reaches the caller as [`RowViewError::Measure`].

use horizon_rowview_core::{BoxedError, Result, RowViewError};

use crate::config::LayoutConfig;

use super::node::CheckState;

/// What a measurer knows about the row it is sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureContext {
    /// Visible row index.
    pub row: usize,
    /// Tree depth; 1 for top-level rows and always 1 in flat views.
    pub depth: usize,
    /// Width available to the row's content.
    pub width: u32,
    /// Checkbox state when checkmarks are enabled.
    pub check_state: Option<CheckState>,
}

impl MeasureContext {
    /// Context for a row whose content starts at `indent` in a view
    /// `view_width` pixels wide.
    pub fn for_row(config: &LayoutConfig, row: usize, depth: usize, view_width: u32, indent: u32) -> Self {
        Self {
            row,
            depth,
            width: view_width.saturating_sub(indent),
            check_state: config.checkmarks.map(|_| CheckState::Unchecked),
        }
    }

    pub fn with_check_state(mut self, state: CheckState) -> Self {
        if self.check_state.is_some() {
            self.check_state = Some(state);
        }
        self
    }
}

/// Preferred height of one row.
pub trait RowMeasure<T: ?Sized> {
    fn row_height(&self, item: &T, context: &MeasureContext) -> std::result::Result<u32, BoxedError>;
}

impl<T, F> RowMeasure<T> for F
where
    T: ?Sized,
    F: Fn(&T, &MeasureContext) -> std::result::Result<u32, BoxedError>,
{
    fn row_height(&self, item: &T, context: &MeasureContext) -> std::result::Result<u32, BoxedError> {
        self(item, context)
    }
}

/// Measures every row as the same height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformHeight(pub u32);

impl<T: ?Sized> RowMeasure<T> for UniformHeight {
    fn row_height(&self, _item: &T, _context: &MeasureContext) -> std::result::Result<u32, BoxedError> {
        Ok(self.0)
    }
}

/// Preferred sizes of table cells.
pub trait CellMeasure<T: ?Sized> {
    /// Preferred height of cell `column` of `row` at `context.width`.
    fn cell_height(&self, row: &T, column: usize, context: &MeasureContext) -> std::result::Result<u32, BoxedError>;

    /// Preferred unconstrained width, used to size auto columns.
    fn cell_width(&self, row: &T, column: usize) -> std::result::Result<u32, BoxedError> {
        let _ = (row, column);
        Ok(0)
    }
}

impl<T: ?Sized> CellMeasure<T> for UniformHeight {
    fn cell_height(&self, _row: &T, _column: usize, _context: &MeasureContext) -> std::result::Result<u32, BoxedError> {
        Ok(self.0)
    }
}

/// Run a measurer, mapping its failure into the crate error.
pub(crate) fn measure_row<T, M>(measure: &M, item: &T, context: &MeasureContext) -> Result<u32>
where
    T: ?Sized,
    M: RowMeasure<T> + ?Sized,
{
    measure.row_height(item, context).map_err(RowViewError::measure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_width() {
        let config = LayoutConfig::default();
        let context = MeasureContext::for_row(&config, 3, 2, 200, 44);
        assert_eq!(context.width, 156);
        assert_eq!(context.check_state, None);
        assert_eq!(MeasureContext::for_row(&config, 0, 1, 10, 44).width, 0);
    }

    #[test]
    fn test_closure_measure() {
        let measure = |item: &str, context: &MeasureContext| -> std::result::Result<u32, BoxedError> {
            Ok(item.len() as u32 + context.depth as u32)
        };
        let context = MeasureContext::for_row(&LayoutConfig::default(), 0, 2, 100, 0);
        assert_eq!(measure_row(&measure, "abc", &context).unwrap(), 5);
    }

    #[test]
    fn test_measure_failure_is_wrapped() {
        let measure = |_: &str, _: &MeasureContext| -> std::result::Result<u32, BoxedError> { Err("no font".into()) };
        let context = MeasureContext::for_row(&LayoutConfig::default(), 0, 1, 100, 0);
        let error = measure_row(&measure, "abc", &context).unwrap_err();
        assert!(matches!(error, RowViewError::Measure { .. }));
        assert_eq!(error.to_string(), "row measurement failed: no font");
    }
}
