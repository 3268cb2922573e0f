//! The index engine shared by list, table and tree views.
//!
//! Data flows through the model in one direction:
//!
//! 1. A [`TreeSource`] changes and reports a [`TreeEvent`].
//! 2. The [`NodeArena`] patches the materialized node records.
//! 3. [`VisibleRows`] patches the flat list of rows whose ancestors are
//!    all expanded.
//! 4. The next layout pass rebuilds the [`OffsetTable`].
//! 5. [`visible_range`] and the selection trackers answer paint and
//!    hit-testing queries.

mod measure;
mod node;
mod offsets;
mod path;
mod selection;
mod source;
mod viewport;
mod visible;

pub use measure::{CellMeasure, MeasureContext, RowMeasure, UniformHeight};
pub(crate) use measure::measure_row;
pub use node::{CheckState, ItemFilter, NodeArena, NodeFilters, NodeFlags, NodeKey, NodeRecord};
pub use offsets::OffsetTable;
pub use path::TreePath;
pub use selection::{PathSelection, RangeSelection, SelectMode, SelectionTracker, Span};
pub use source::{EventQueue, SourceNode, TreeEvent, TreeItem, TreeModel, TreeSource};
pub use viewport::{Bounds, Viewport, visible_range};
pub use visible::{VisibleNodeIter, VisibleRows};
