//! Index facades for the three row-based views.
//!
//! - [`TreeIndex`]: hierarchical rows, lazily loaded and expanded
//! - [`ListIndex`]: one row per item
//! - [`TableIndex`]: one row per record, plus resolved column geometry
//!
//! Each facade owns the offsets of its last layout pass. Any structural
//! change invalidates them, and geometry queries fail with
//! [`RowViewError::LayoutInvalid`](horizon_rowview_core::RowViewError::LayoutInvalid)
//! until `layout` runs again.

mod list;
mod table;
mod tree;

pub use list::ListIndex;
pub use table::{ColumnSpec, ColumnWidth, TableIndex, column_widths};
pub use tree::TreeIndex;
