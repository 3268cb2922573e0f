//! Prelude module for Horizon RowView.
//!
//! ```
//! use horizon_rowview::prelude::*;
//! ```
//!
//! This provides access to:
//! - The index facades (`TreeIndex`, `ListIndex`, `TableIndex`)
//! - Tree data sources and change events (`TreeModel`, `TreeSource`, `TreeEvent`)
//! - Measurement (`RowMeasure`, `CellMeasure`, `UniformHeight`)
//! - Configuration and errors (`LayoutConfig`, `RowViewError`)

// ============================================================================
// Index Facades
// ============================================================================

pub use crate::view::{ColumnSpec, ColumnWidth, ListIndex, TableIndex, TreeIndex};

// ============================================================================
// Tree Data
// ============================================================================

pub use crate::model::{EventQueue, SourceNode, TreeEvent, TreeItem, TreeModel, TreePath, TreeSource};

// ============================================================================
// Measurement and Geometry
// ============================================================================

pub use crate::model::{Bounds, CellMeasure, MeasureContext, RowMeasure, UniformHeight, Viewport};

// ============================================================================
// State
// ============================================================================

pub use crate::model::{CheckState, NodeFlags, SelectMode, Span};

// ============================================================================
// Configuration, Errors and Signals
// ============================================================================

pub use crate::config::{CheckboxMetrics, LayoutConfig, RowSizing};
pub use horizon_rowview_core::{Result, RowViewError, Signal};
