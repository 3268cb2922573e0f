//! Horizon RowView - virtualized row indexes for list, table and tree views.
//!
//! The crate answers the questions a collection view's painter and input
//! handler ask, without drawing anything itself:
//!
//! - which row is at this y coordinate, and where is this row
//! - which rows intersect the viewport
//! - which tree nodes are expanded, selected, checked or disabled
//!
//! Row heights may be uniform or measured per row. Tree children are loaded
//! from a [`TreeSource`](model::TreeSource) only when first needed, and
//! source changes are replayed as [`TreeEvent`](model::TreeEvent)s.
//!
//! # Example
//!
//! ```
//! use horizon_rowview::prelude::*;
//!
//! let model = TreeModel::<String>::from_items(vec![
//!     TreeItem::leaf("A"),
//!     TreeItem::branch("B", vec![TreeItem::leaf("B1"), TreeItem::leaf("B2")]),
//!     TreeItem::leaf("C"),
//! ]);
//!
//! let mut tree = TreeIndex::new();
//! tree.set_tree_data(&model)?;
//! tree.expand(&model, &TreePath::from([1]))?;
//! tree.layout(&UniformHeight(20), 300)?;
//!
//! assert_eq!(tree.row_count(), 5);
//! assert_eq!(tree.node_at(45)?, Some(TreePath::from([1, 0])));
//! assert_eq!(tree.visible_range(0, 50)?, Some(0..=2));
//! # Ok::<(), horizon_rowview::RowViewError>(())
//! ```

pub use horizon_rowview_core::*;

mod config;
pub mod model;
pub mod prelude;
pub mod view;

pub use config::{CheckboxMetrics, LayoutConfig, RowSizing};
